use fetcher::config::MAX_BACKFILL_ITERATIONS;
use fetcher::{FetcherConfig, StoreConfig};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("At least one category is required")]
    NoCategories,

    #[error("Empty category name")]
    EmptyCategory,

    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),

    #[error("default_limit {default_limit} exceeds max_limit {max_limit}")]
    DefaultLimitTooLarge {
        default_limit: usize,
        max_limit: usize,
    },

    #[error("max_backfill_iterations {value} exceeds the maximum of {max}")]
    TooManyBackfillIterations { value: usize, max: usize },
}

fn default_limit() -> usize {
    12
}

fn default_max_limit() -> usize {
    100
}

/// Dispatch API configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Fixed category enumeration, in the order fetches walk it
    pub categories: Vec<String>,
    pub store: StoreConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Used when a request does not pass `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Requested limits above this are clamped
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.categories.is_empty() {
            return Err(ValidationError::NoCategories);
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.is_empty() {
                return Err(ValidationError::EmptyCategory);
            }
            if !seen.insert(category) {
                return Err(ValidationError::DuplicateCategory(category.clone()));
            }
        }

        if self.default_limit > self.max_limit {
            return Err(ValidationError::DefaultLimitTooLarge {
                default_limit: self.default_limit,
                max_limit: self.max_limit,
            });
        }

        if self.fetcher.max_backfill_iterations > MAX_BACKFILL_ITERATIONS {
            return Err(ValidationError::TooManyBackfillIterations {
                value: self.fetcher.max_backfill_iterations,
                max: MAX_BACKFILL_ITERATIONS,
            });
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
