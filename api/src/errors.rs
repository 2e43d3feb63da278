use crate::config::ValidationError;
use crate::params::ParamsError;
use fetcher::{FetchError, StoreError};
use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur in the dispatch API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(#[from] ParamsError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("response serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("could not build article store: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(FetchError::Store { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Fetch(FetchError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Serialization(_)
            | ApiError::InvalidConfig(_)
            | ApiError::Store(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
