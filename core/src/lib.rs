//! In-memory full-text search engine with TF-IDF ranking.
//!
//! Documents are indexed by whitespace-delimited terms. Queries carry required
//! words and `-`-prefixed forbidden words, and results are ranked by relevance,
//! falling back to rating when relevances are indistinguishable.

pub mod batch;
pub mod concurrent_map;
pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod ingest;
pub mod interner;
pub mod paginate;
pub mod query;
pub mod request_queue;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ConcurrentMap;
pub use config::{EngineConfig, ExecutionMode};
pub use dedup::remove_duplicates;
pub use document::{DocId, Document, DocumentStatus};
pub use error::{ErrorKind, Result, SearchError};
pub use index::SearchEngine;
pub use interner::{Interner, Term};
pub use paginate::{paginate, Paginator};
pub use query::Query;
pub use request_queue::{RequestLog, RequestQueue};
