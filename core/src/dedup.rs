use crate::document::DocId;
use crate::index::SearchEngine;
use crate::interner::Term;
use std::collections::BTreeSet;

/// Removes every document whose set of distinct words equals that of a document
/// with a smaller id. Returns the removed ids in ascending order.
///
/// Word sets come from the index, so stop words never take part in the comparison.
pub fn remove_duplicates(engine: &mut SearchEngine) -> Vec<DocId> {
    let mut seen: BTreeSet<BTreeSet<Term>> = BTreeSet::new();
    let mut duplicates = Vec::new();
    for document_id in engine.iter() {
        let words: BTreeSet<Term> = engine.word_frequencies(document_id).keys().cloned().collect();
        if !seen.insert(words) {
            duplicates.push(document_id);
        }
    }
    for &document_id in &duplicates {
        tracing::info!(document_id, "found duplicate document");
        engine.remove_document(document_id);
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    #[test]
    fn removes_later_documents_with_same_word_set() {
        let mut engine = SearchEngine::from_stop_words_text("and with").unwrap();
        let docs = [
            (1, "funny pet and nasty rat"),
            (2, "funny pet with curly hair"),
            (3, "funny pet with curly hair"),
            (4, "funny pet and curly hair"),
            (5, "funny funny pet and nasty nasty rat"),
            (6, "funny pet and not very nasty rat"),
            (7, "very nasty rat and not very funny pet"),
            (8, "pet with rat and rat and rat"),
            (9, "nasty rat with curly hair"),
        ];
        for (id, text) in docs {
            engine.add_document(id, text, DocumentStatus::Actual, &[1, 2]).unwrap();
        }
        assert_eq!(engine.document_count(), 9);
        let removed = remove_duplicates(&mut engine);
        assert_eq!(removed, vec![3, 4, 5, 7]);
        assert_eq!(engine.document_count(), 5);
        assert_eq!(engine.iter().collect::<Vec<_>>(), vec![1, 2, 6, 8, 9]);
    }

    #[test]
    fn empty_documents_collapse_into_one() {
        let mut engine = SearchEngine::from_stop_words_text("a").unwrap();
        engine.add_document(1, "a a", DocumentStatus::Actual, &[]).unwrap();
        engine.add_document(2, "", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(remove_duplicates(&mut engine), vec![2]);
    }
}
