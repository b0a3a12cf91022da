//! Forward and inverted postings plus per-document metadata.
//!
//! Both postings directions are keyed by interned [`Term`]s and are always
//! mutated together: a term is listed for a document in the inverted index
//! exactly when the document lists it in its forward postings, with the same
//! frequency.

use crate::config::{EngineConfig, ExecutionMode};
use crate::document::{compute_average_rating, DocId, DocumentData, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::interner::{Interner, Term};
use crate::tokenizer::{is_valid_word, split_into_words};
use rayon::prelude::*;
use std::collections::{btree_set, BTreeMap, BTreeSet};

static EMPTY_FREQUENCIES: BTreeMap<Term, f64> = BTreeMap::new();

/// term -> document -> term frequency
pub(crate) type InvertedPostings = BTreeMap<Term, BTreeMap<DocId, f64>>;
/// document -> term -> term frequency
pub(crate) type ForwardPostings = BTreeMap<DocId, BTreeMap<Term, f64>>;

/// In-memory full-text index.
///
/// Not internally synchronized: queries take `&self` and may run concurrently
/// with each other, but adding or removing documents needs `&mut self`, so
/// callers sharing an engine across threads must serialize mutation themselves.
#[derive(Debug, Default)]
pub struct SearchEngine {
    pub(crate) config: EngineConfig,
    interner: Interner,
    stop_words: BTreeSet<Term>,
    pub(crate) word_to_document_freqs: InvertedPostings,
    pub(crate) document_to_word_freqs: ForwardPostings,
    pub(crate) documents: BTreeMap<DocId, DocumentData>,
    document_ids: BTreeSet<DocId>,
}

impl SearchEngine {
    /// Creates an engine with the given stop words. Empty strings are ignored.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(EngineConfig::default(), stop_words)
    }

    /// Creates an engine whose stop words are the space-separated words of `text`.
    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn with_config<I, S>(config: EngineConfig, stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self { config, ..Self::default() };
        let words: Vec<S> = stop_words.into_iter().collect();
        if let Some(bad) = words.iter().map(|w| w.as_ref()).find(|w| !is_valid_word(w)) {
            return Err(SearchError::InvalidWord(bad.to_string()));
        }
        for word in words.iter().map(|w| w.as_ref()).filter(|w| !w.is_empty()) {
            let term = engine.interner.intern(word);
            engine.stop_words.insert(term);
        }
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn is_stop_word(&self, word: &str) -> bool { self.stop_words.contains(word) }

    pub fn stop_words(&self) -> impl Iterator<Item = &Term> + '_ { self.stop_words.iter() }

    /// Indexes a document. On error nothing is changed, including the interner.
    pub fn add_document(&mut self, document_id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        if document_id < 0 {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        if self.documents.contains_key(&document_id) {
            return Err(SearchError::DuplicateDocumentId(document_id));
        }
        let words: Vec<&str> = split_into_words(text).filter(|w| !self.is_stop_word(w)).collect();
        if let Some(bad) = words.iter().find(|w| !is_valid_word(w)) {
            return Err(SearchError::InvalidWord(bad.to_string()));
        }

        let inv_word_count = 1.0 / words.len() as f64;
        let mut freqs: BTreeMap<Term, f64> = BTreeMap::new();
        for word in &words {
            let term = self.interner.intern(word);
            *freqs.entry(term).or_insert(0.0) += inv_word_count;
        }
        for (term, &tf) in &freqs {
            self.word_to_document_freqs.entry(term.clone()).or_default().insert(document_id, tf);
        }
        let distinct = freqs.len();
        self.document_to_word_freqs.insert(document_id, freqs);
        self.documents.insert(document_id, DocumentData { rating: compute_average_rating(ratings), status });
        self.document_ids.insert(document_id);
        tracing::debug!(document_id, words = words.len(), distinct, "document added");
        Ok(())
    }

    pub fn remove_document(&mut self, document_id: DocId) {
        self.remove_document_in(ExecutionMode::Sequential, document_id)
    }

    /// Removes a document from every postings list. Unknown ids are ignored.
    ///
    /// In parallel mode the document's own postings lists are detached from the
    /// inverted index, cleaned on the rayon pool (one worker per term) and
    /// reattached, so the work stays proportional to the document's terms.
    pub fn remove_document_in(&mut self, mode: ExecutionMode, document_id: DocId) {
        let Some(words) = self.document_to_word_freqs.remove(&document_id) else {
            return;
        };
        match mode {
            ExecutionMode::Sequential => {
                for term in words.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(term) {
                        postings.remove(&document_id);
                        if postings.is_empty() {
                            self.word_to_document_freqs.remove(term);
                        }
                    }
                }
            }
            ExecutionMode::Parallel => {
                let mut detached: Vec<(Term, BTreeMap<DocId, f64>)> = words
                    .keys()
                    .filter_map(|term| self.word_to_document_freqs.remove_entry(term))
                    .collect();
                detached.par_iter_mut().for_each(|(_, postings)| {
                    postings.remove(&document_id);
                });
                self.word_to_document_freqs
                    .extend(detached.into_iter().filter(|(_, postings)| !postings.is_empty()));
            }
        }
        self.documents.remove(&document_id);
        self.document_ids.remove(&document_id);
        tracing::debug!(document_id, words = words.len(), ?mode, "document removed");
    }

    pub fn document_count(&self) -> usize { self.documents.len() }

    pub fn exists(&self, document_id: DocId) -> bool { self.document_ids.contains(&document_id) }

    /// Term frequencies of a document; empty for an unknown id.
    pub fn word_frequencies(&self, document_id: DocId) -> &BTreeMap<Term, f64> {
        self.document_to_word_freqs.get(&document_id).unwrap_or(&EMPTY_FREQUENCIES)
    }

    pub fn document_status(&self, document_id: DocId) -> Option<DocumentStatus> {
        self.documents.get(&document_id).map(|d| d.status)
    }

    pub fn document_rating(&self, document_id: DocId) -> Option<i32> {
        self.documents.get(&document_id).map(|d| d.rating)
    }

    /// Live document ids in ascending order.
    pub fn iter(&self) -> std::iter::Copied<btree_set::Iter<'_, DocId>> { self.document_ids.iter().copied() }

    /// Number of distinct terms currently present in the inverted index.
    pub fn term_count(&self) -> usize { self.word_to_document_freqs.len() }
}

impl<'a> IntoIterator for &'a SearchEngine {
    type Item = DocId;
    type IntoIter = std::iter::Copied<btree_set::Iter<'a, DocId>>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        SearchEngine::from_stop_words_text("in the").unwrap()
    }

    #[test]
    fn add_document_fills_both_postings() {
        let mut e = engine();
        e.add_document(1, "cat in the city cat", DocumentStatus::Actual, &[1, 2, 3]).unwrap();
        let freqs = e.word_frequencies(1);
        assert_eq!(freqs.len(), 2);
        assert!((freqs["cat"] - 2.0 / 3.0).abs() < 1e-12);
        assert!((freqs["city"] - 1.0 / 3.0).abs() < 1e-12);
        assert!(!freqs.contains_key("in"));
        assert_eq!(e.word_to_document_freqs["cat"][&1], freqs["cat"]);
        assert_eq!(e.document_rating(1), Some(2));
        assert_eq!(e.document_status(1), Some(DocumentStatus::Actual));
    }

    #[test]
    fn forward_terms_share_interned_storage() {
        let mut e = engine();
        e.add_document(1, "cat city", DocumentStatus::Actual, &[]).unwrap();
        e.add_document(2, "cat village", DocumentStatus::Actual, &[]).unwrap();
        let (a, _) = e.word_frequencies(1).iter().next().unwrap();
        let (b, _) = e.word_frequencies(2).iter().next().unwrap();
        assert!(a.ptr_eq(b));
    }

    #[test]
    fn rejects_bad_ids_and_words_without_mutation() {
        let mut e = engine();
        assert_eq!(e.add_document(-1, "cat", DocumentStatus::Actual, &[]), Err(SearchError::InvalidDocumentId(-1)));
        e.add_document(1, "cat", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(e.add_document(1, "dog", DocumentStatus::Actual, &[]), Err(SearchError::DuplicateDocumentId(1)));
        let err = e.add_document(2, "dog near vil\u{3}lage", DocumentStatus::Actual, &[]).unwrap_err();
        assert_eq!(err, SearchError::InvalidWord("vil\u{3}lage".into()));
        assert!(!e.exists(2));
        assert_eq!(e.document_count(), 1);
        assert!(!e.word_to_document_freqs.contains_key("dog"));
        assert!(e.interner.get("dog").is_none());
    }

    #[test]
    fn invalid_stop_words_are_rejected() {
        assert!(matches!(SearchEngine::new(["ok", "b\u{7}d"]), Err(SearchError::InvalidWord(_))));
        let e = SearchEngine::new(["", "a", "a"]).unwrap();
        assert_eq!(e.stop_words().count(), 1);
    }

    #[test]
    fn stop_word_only_document_is_registered() {
        let mut e = engine();
        e.add_document(5, "in the", DocumentStatus::Banned, &[4]).unwrap();
        assert!(e.exists(5));
        assert!(e.word_frequencies(5).is_empty());
        e.remove_document(5);
        assert!(!e.exists(5));
    }

    #[test]
    fn remove_document_cleans_everything() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let mut e = engine();
            e.add_document(1, "cat city", DocumentStatus::Actual, &[]).unwrap();
            e.add_document(2, "cat village", DocumentStatus::Actual, &[]).unwrap();
            e.remove_document_in(mode, 1);
            assert!(!e.exists(1));
            assert_eq!(e.document_count(), 1);
            assert!(e.word_frequencies(1).is_empty());
            assert!(!e.word_to_document_freqs.contains_key("city"));
            assert_eq!(e.word_to_document_freqs["cat"].len(), 1);
            assert_eq!(e.term_count(), 2);
            e.remove_document_in(mode, 42);
            assert_eq!(e.document_count(), 1);
        }
    }

    #[test]
    fn parallel_removal_leaves_unrelated_terms_alone() {
        let mut e = engine();
        for id in 0..5_000 {
            e.add_document(id, &format!("shared w{id}"), DocumentStatus::Actual, &[]).unwrap();
        }
        assert_eq!(e.term_count(), 5_001);
        for id in (0..5_000).step_by(50) {
            e.remove_document_in(ExecutionMode::Parallel, id);
        }
        assert_eq!(e.document_count(), 4_900);
        assert_eq!(e.term_count(), 4_901);
        assert_eq!(e.word_to_document_freqs["shared"].len(), 4_900);
        assert!(!e.word_to_document_freqs.contains_key("w50"));
        assert_eq!(e.word_to_document_freqs["w51"][&51], 0.5);
        assert!(e.word_to_document_freqs.values().all(|p| !p.is_empty()));
    }

    #[test]
    fn iterates_ids_in_order() {
        let mut e = engine();
        for id in [5, 1, 3] {
            e.add_document(id, "word", DocumentStatus::Actual, &[]).unwrap();
        }
        assert_eq!(e.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        let ids: Vec<DocId> = (&e).into_iter().collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
