use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Empty in-memory store, mostly useful for local testing.
    Memory,
    Filesystem {
        path: String,
    },
    Remote {
        url: String,
    },
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FirstPass {
    #[default]
    Sequential,
    Parallel,
}

/// Upper bound for `max_backfill_iterations`. Keeps a fetch within
/// `categories * 6` store queries.
pub const MAX_BACKFILL_ITERATIONS: usize = 5;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct FetcherConfig {
    pub max_backfill_iterations: usize,
    pub first_pass: FirstPass,
    /// Re-sort the final selection by the request's sort spec. When false the
    /// result keeps category-major order.
    pub global_resort: bool,
    pub timeout_ms: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            max_backfill_iterations: MAX_BACKFILL_ITERATIONS,
            first_pass: FirstPass::Sequential,
            global_resort: false,
            timeout_ms: None,
        }
    }
}
