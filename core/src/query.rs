//! Query parsing, TF-IDF ranking and per-document matching.

use crate::concurrent_map::ConcurrentMap;
use crate::config::ExecutionMode;
use crate::document::{DocId, Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::SearchEngine;
use crate::interner::Term;
use crate::tokenizer::split_query_words;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Parsed query. Both lists are sorted, deduplicated and free of stop words.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

impl SearchEngine {
    pub fn parse_query<'q>(&self, raw_query: &'q str) -> Result<Query<'q>> {
        let mut query = Query::default();
        for word in split_query_words(raw_query)? {
            if self.is_stop_word(word.text) {
                continue;
            }
            if word.is_minus {
                query.minus_words.push(word.text);
            } else {
                query.plus_words.push(word.text);
            }
        }
        for words in [&mut query.plus_words, &mut query.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
        Ok(query)
    }

    /// Top documents with status `Actual`.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(&self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.find_top_documents_with(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn find_top_documents_with<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_in(ExecutionMode::Sequential, raw_query, predicate)
    }

    /// Ranks documents containing at least one plus word and no minus word.
    ///
    /// `predicate(id, status, rating)` filters candidates before their relevance
    /// is accumulated. Results are ordered by relevance, then rating, and
    /// truncated to `max_results`. Both modes return the same order.
    pub fn find_top_documents_in<P>(&self, mode: ExecutionMode, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = self.parse_query(raw_query)?;
        let mut matched = match mode {
            ExecutionMode::Sequential => self.find_all_documents(&query, &predicate),
            ExecutionMode::Parallel => self.find_all_documents_par(&query, &predicate),
        };
        sort_by_relevance(&mut matched, self.config.relevance_epsilon, mode);
        matched.truncate(self.config.max_results);
        Ok(matched)
    }

    // Callers only pass terms present in the index, so postings are never empty.
    fn inverse_document_freq(&self, postings: &BTreeMap<DocId, f64>) -> f64 {
        (self.document_count() as f64 / postings.len() as f64).ln()
    }

    fn find_all_documents<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                continue;
            };
            let idf = self.inverse_document_freq(postings);
            for (&document_id, &tf) in postings {
                let Some(data) = self.documents.get(&document_id) else {
                    continue;
                };
                if predicate(document_id, data.status, data.rating) {
                    *document_to_relevance.entry(document_id).or_insert(0.0) += tf * idf;
                }
            }
        }
        for word in &query.minus_words {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for document_id in postings.keys() {
                    document_to_relevance.remove(document_id);
                }
            }
        }
        self.collect_documents(document_to_relevance)
    }

    fn find_all_documents_par<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocId, f64> = ConcurrentMap::new(self.config.shard_count);
        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                return;
            };
            let idf = self.inverse_document_freq(postings);
            for (&document_id, &tf) in postings {
                let Some(data) = self.documents.get(&document_id) else {
                    continue;
                };
                if predicate(document_id, data.status, data.rating) {
                    *document_to_relevance.access(document_id) += tf * idf;
                }
            }
        });
        query.minus_words.par_iter().for_each(|word| {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for &document_id in postings.keys() {
                    document_to_relevance.erase(document_id);
                }
            }
        });
        self.collect_documents(document_to_relevance.into_map())
    }

    fn collect_documents(&self, document_to_relevance: BTreeMap<DocId, f64>) -> Vec<Document> {
        document_to_relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.documents.get(&id).map(|data| Document::new(id, relevance, data.rating))
            })
            .collect()
    }

    pub fn match_document(&self, raw_query: &str, document_id: DocId) -> Result<(Vec<Term>, DocumentStatus)> {
        self.match_document_in(ExecutionMode::Sequential, raw_query, document_id)
    }

    /// Plus words of the query present in the document, or nothing when any minus word is.
    ///
    /// The returned terms are the index's own interned strings. Fails with
    /// [`SearchError::DocumentNotFound`] for an unknown id.
    pub fn match_document_in(&self, mode: ExecutionMode, raw_query: &str, document_id: DocId) -> Result<(Vec<Term>, DocumentStatus)> {
        let query = self.parse_query(raw_query)?;
        let status = self.document_status(document_id).ok_or(SearchError::DocumentNotFound(document_id))?;
        let words = self.word_frequencies(document_id);
        let lookup = |word: &&str| words.get_key_value(*word).map(|(term, _)| term.clone());

        let matched = match mode {
            ExecutionMode::Sequential => {
                if query.minus_words.iter().any(|w| words.contains_key(*w)) {
                    return Ok((Vec::new(), status));
                }
                query.plus_words.iter().filter_map(lookup).collect()
            }
            ExecutionMode::Parallel => {
                if query.minus_words.par_iter().any(|w| words.contains_key(*w)) {
                    return Ok((Vec::new(), status));
                }
                query.plus_words.par_iter().filter_map(lookup).collect()
            }
        };
        Ok((matched, status))
    }
}

/// Relevance descending; runs whose relevance lies within `epsilon` of the run's
/// first entry are reordered by rating descending, then id. Relevance is not
/// consulted inside a run, so accumulation-order rounding cannot reorder it.
fn sort_by_relevance(documents: &mut [Document], epsilon: f64, mode: ExecutionMode) {
    let by_relevance = |a: &Document, b: &Document| {
        b.relevance.total_cmp(&a.relevance).then(b.rating.cmp(&a.rating)).then(a.id.cmp(&b.id))
    };
    match mode {
        ExecutionMode::Sequential => documents.sort_by(by_relevance),
        ExecutionMode::Parallel => documents.par_sort_by(by_relevance),
    }

    let mut start = 0;
    while start < documents.len() {
        let head = documents[start].relevance;
        let run = documents[start + 1..].iter().take_while(|d| (head - d.relevance).abs() < epsilon).count();
        let end = start + 1 + run;
        documents[start..end].sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let mut e = SearchEngine::from_stop_words_text("and in on").unwrap();
        e.add_document(1, "white cat and fashionable collar", DocumentStatus::Actual, &[8, -3]).unwrap();
        e.add_document(2, "fluffy cat fluffy tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
        e.add_document(3, "groomed dog expressive eyes", DocumentStatus::Actual, &[5, -12, 2, 1]).unwrap();
        e.add_document(4, "groomed starling eugene", DocumentStatus::Banned, &[9]).unwrap();
        e
    }

    #[test]
    fn parse_query_splits_and_dedups() {
        let e = engine();
        let q = e.parse_query("cat -dog cat in -dog collar").unwrap();
        assert_eq!(q.plus_words, vec!["cat", "collar"]);
        assert_eq!(q.minus_words, vec!["dog"]);
        let q = e.parse_query("-in on").unwrap();
        assert!(q.plus_words.is_empty());
        assert!(q.minus_words.is_empty());
    }

    #[test]
    fn parse_query_propagates_errors() {
        let e = engine();
        assert_eq!(e.parse_query("cat -"), Err(SearchError::EmptyMinusWord));
        assert_eq!(e.parse_query("--cat"), Err(SearchError::DoubleMinusWord("--cat".into())));
        assert!(matches!(e.parse_query("c\u{1f}at"), Err(SearchError::InvalidWord(_))));
    }

    #[test]
    fn ranks_by_tf_idf() {
        let e = engine();
        let found = e.find_top_documents("fluffy groomed cat").unwrap();
        let ids: Vec<DocId> = found.iter().map(|d| d.id).collect();
        // 1 and 3 tie on relevance, 1 has the higher rating
        assert_eq!(ids, vec![2, 1, 3]);
        // fluffy: 2/4 * ln(4/1), cat: 1/4 * ln(4/2)
        let expected = 0.5 * 4f64.ln() + 0.25 * 2f64.ln();
        assert!((found[0].relevance - expected).abs() < 1e-12);
        assert_eq!(found[0].rating, 5);
        assert_eq!(found[1].relevance, found[2].relevance);
    }

    #[test]
    fn status_and_predicate_filter_candidates() {
        let e = engine();
        let banned = e.find_top_documents_by_status("groomed", DocumentStatus::Banned).unwrap();
        assert_eq!(banned.iter().map(|d| d.id).collect::<Vec<_>>(), vec![4]);
        let even = e.find_top_documents_with("cat groomed", |id, _, _| id % 2 == 0).unwrap();
        assert_eq!(even.iter().map(|d| d.id).collect::<Vec<_>>(), vec![4, 2]);
    }

    #[test]
    fn minus_words_exclude_documents() {
        let e = engine();
        let found = e.find_top_documents("cat -fluffy").unwrap();
        assert_eq!(found.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1]);
        assert!(e.find_top_documents("-cat").unwrap().is_empty());
    }

    #[test]
    fn equal_relevance_falls_back_to_rating() {
        let mut docs = vec![
            Document::new(1, 0.5, 1),
            Document::new(2, 0.5 + 1e-9, 3),
            Document::new(3, 0.7, -5),
            Document::new(4, 0.5, 3),
        ];
        sort_by_relevance(&mut docs, 1e-6, ExecutionMode::Sequential);
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 2, 4, 1]);
    }

    #[test]
    fn zero_epsilon_still_terminates() {
        let mut docs = vec![Document::new(1, 0.5, 1), Document::new(2, 0.5, 3)];
        sort_by_relevance(&mut docs, 0.0, ExecutionMode::Parallel);
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn match_document_modes_agree() {
        let e = engine();
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let (words, status) = e.match_document_in(mode, "fluffy cat tail dog", 2).unwrap();
            assert_eq!(words, vec!["cat", "fluffy", "tail"]);
            assert_eq!(status, DocumentStatus::Actual);
            let (words, _) = e.match_document_in(mode, "fluffy -tail", 2).unwrap();
            assert!(words.is_empty());
            assert_eq!(e.match_document_in(mode, "cat", 99), Err(SearchError::DocumentNotFound(99)));
        }
    }

    #[test]
    fn matched_terms_borrow_index_storage() {
        let e = engine();
        let (words, _) = e.match_document("collar", 1).unwrap();
        let (stored, _) = e.word_frequencies(1).get_key_value("collar").unwrap();
        assert!(words[0].ptr_eq(stored));
    }
}
