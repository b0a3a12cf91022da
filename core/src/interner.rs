//! Deduplicated, reference-counted storage for index terms.
//!
//! Every term stored by the index is a [`Term`] handed out by an [`Interner`].
//! Handles share one allocation per distinct string, so postings, stop words
//! and match results can refer to the same text without copying it, and stay
//! valid however long the caller keeps them.

use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Canonical handle to an interned string. Compares, orders and hashes by content,
/// and borrows as `str` so maps keyed by `Term` can be queried with `&str`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term(Arc<str>);

impl Term {
    pub fn as_str(&self) -> &str { &self.0 }

    /// True when both handles point at the same interned allocation.
    pub fn ptr_eq(&self, other: &Term) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl Deref for Term {
    type Target = str;
    fn deref(&self) -> &str { &self.0 }
}

impl Borrow<str> for Term {
    fn borrow(&self) -> &str { &self.0 }
}

impl AsRef<str> for Term {
    fn as_ref(&self) -> &str { &self.0 }
}

impl PartialEq<str> for Term {
    fn eq(&self, other: &str) -> bool { &*self.0 == other }
}

impl PartialEq<&str> for Term {
    fn eq(&self, other: &&str) -> bool { &*self.0 == *other }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(&*self.0, f) }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Append-only set of terms. Entries are never evicted.
#[derive(Debug, Default)]
pub struct Interner {
    terms: HashSet<Term>,
}

impl Interner {
    pub fn new() -> Self { Self::default() }

    /// Returns the canonical handle for `text`, storing a copy on first sight.
    pub fn intern(&mut self, text: &str) -> Term {
        if let Some(term) = self.terms.get(text) {
            return term.clone();
        }
        let term = Term(Arc::from(text));
        self.terms.insert(term.clone());
        term
    }

    /// Looks up an already interned term without inserting.
    pub fn get(&self, text: &str) -> Option<&Term> { self.terms.get(text) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}
