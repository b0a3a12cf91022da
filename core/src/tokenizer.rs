use crate::error::{Result, SearchError};

/// Split text on ASCII spaces, skipping the empty pieces between consecutive separators.
/// Other whitespace is part of the word.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|word| !word.is_empty())
}

/// A word is valid when it carries no control characters (code points below space).
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| c < ' ')
}

/// A single classified query token; `text` has the minus prefix already stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWord<'a> {
    pub text: &'a str,
    pub is_minus: bool,
}

/// Classifies one non-empty token produced by [`split_into_words`].
fn parse_query_word(word: &str) -> Result<QueryWord<'_>> {
    if !is_valid_word(word) {
        return Err(SearchError::InvalidWord(word.to_string()));
    }
    match word.strip_prefix('-') {
        Some("") => Err(SearchError::EmptyMinusWord),
        Some(rest) if rest.starts_with('-') => Err(SearchError::DoubleMinusWord(word.to_string())),
        Some(rest) => Ok(QueryWord { text: rest, is_minus: true }),
        None => Ok(QueryWord { text: word, is_minus: false }),
    }
}

/// Tokenize a query in query mode. Fails on the first invalid token.
pub fn split_query_words(text: &str) -> Result<Vec<QueryWord<'_>>> {
    split_into_words(text).map(parse_query_word).collect()
}
