//! Runs many queries against one engine on the rayon pool.

use crate::document::Document;
use crate::error::Result;
use crate::index::SearchEngine;
use rayon::prelude::*;

/// Results for each query, in query order. The first invalid query fails the whole batch.
pub fn process_queries<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries.par_iter().map(|query| engine.find_top_documents(query.as_ref())).collect()
}

/// Results of all queries concatenated in query order.
pub fn process_queries_joined<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(engine, queries)?.into_iter().flatten().collect())
}
