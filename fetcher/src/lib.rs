pub mod balanced;
pub mod config;
pub mod metrics_defs;
pub mod query;
pub mod remote_store;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutils;

use std::sync::Arc;

pub use balanced::{BalancedFetcher, FetchError, FetchOutcome, FetchRequest};
pub use config::{FetcherConfig, StoreConfig};
pub use store::{ArticleStore, StoreError};
pub use types::{Article, Category, CategorySet};

/// Builds the store selected in config.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn ArticleStore>, StoreError> {
    let store: Arc<dyn ArticleStore> = match config {
        StoreConfig::Memory => {
            tracing::warn!("using an empty in-memory article store");
            Arc::new(store::MemoryStore::default())
        }
        StoreConfig::Filesystem { path } => Arc::new(store::FilesystemStore::open(path)?),
        StoreConfig::Remote { url } => Arc::new(remote_store::RemoteStore::new(url)),
    };
    Ok(store)
}
