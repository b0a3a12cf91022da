//! Rolling log of recent search requests.

use crate::config::REQUEST_WINDOW;
use crate::document::{DocId, Document, DocumentStatus};
use crate::error::Result;
use crate::index::SearchEngine;
use std::collections::VecDeque;

/// Remembers whether each of the last `capacity` requests returned any documents.
#[derive(Debug, Clone)]
pub struct RequestLog {
    capacity: usize,
    outcomes: VecDeque<bool>,
    empty: usize,
}

impl Default for RequestLog {
    fn default() -> Self { Self::new(REQUEST_WINDOW) }
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, outcomes: VecDeque::with_capacity(capacity.min(REQUEST_WINDOW)), empty: 0 }
    }

    /// Records one request outcome, evicting the oldest once the window is full.
    pub fn record(&mut self, results: &[Document]) {
        if self.capacity == 0 {
            return;
        }
        if self.outcomes.len() == self.capacity {
            if let Some(true) = self.outcomes.pop_front() {
                self.empty -= 1;
            }
        }
        let is_empty = results.is_empty();
        self.outcomes.push_back(is_empty);
        if is_empty {
            self.empty += 1;
        }
    }

    pub fn no_result_requests(&self) -> usize { self.empty }

    pub fn len(&self) -> usize { self.outcomes.len() }

    pub fn is_empty(&self) -> bool { self.outcomes.is_empty() }

    pub fn capacity(&self) -> usize { self.capacity }
}

/// Runs searches against a borrowed engine and logs their outcomes.
/// Requests that fail to parse are returned as errors and not logged.
pub struct RequestQueue<'a> {
    engine: &'a SearchEngine,
    log: RequestLog,
}

impl<'a> RequestQueue<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self { Self::with_capacity(engine, REQUEST_WINDOW) }

    pub fn with_capacity(engine: &'a SearchEngine, capacity: usize) -> Self {
        Self { engine, log: RequestLog::new(capacity) }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn add_find_request_by_status(&mut self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.add_find_request_with(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn add_find_request_with<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let results = self.engine.find_top_documents_with(raw_query, predicate)?;
        self.log.record(&results);
        Ok(results)
    }

    pub fn no_result_requests(&self) -> usize { self.log.no_result_requests() }

    pub fn log(&self) -> &RequestLog { &self.log }
}
