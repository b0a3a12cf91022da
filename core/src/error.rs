use crate::document::DocId;
use thiserror::Error;

/// Errors raised by engine operations. Any operation that fails leaves the index unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("document id {0} is negative")]
    InvalidDocumentId(DocId),

    #[error("document id {0} already exists")]
    DuplicateDocumentId(DocId),

    #[error("word {0:?} contains a control character")]
    InvalidWord(String),

    #[error("query contains a bare minus sign")]
    EmptyMinusWord,

    #[error("query word {0:?} starts with a double minus")]
    DoubleMinusWord(String),

    #[error("document {0} not found")]
    DocumentNotFound(DocId),
}

/// Coarse classification used by callers that map errors onto their own protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::DocumentNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
