//! Engine defaults and runtime tuning.

/// Maximum number of documents returned by a single ranked search.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

/// Relevances closer than this are considered equal and ordered by rating.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Number of independently locked partitions used for parallel relevance accumulation.
pub const DEFAULT_SHARD_COUNT: usize = 100;

/// Number of most recent requests retained by a request log (one day of minutes).
pub const REQUEST_WINDOW: usize = 1440;

/// How an engine operation distributes its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Single thread, fully deterministic iteration order.
    #[default]
    Sequential,
    /// Fan out over independent partitions (terms) on the rayon pool.
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub max_results: usize,
    pub relevance_epsilon: f64,
    pub shard_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}
