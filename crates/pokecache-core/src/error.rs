//! Error types shared by the whole library.

use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown API endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("Unknown sprite category '{0}'")]
    UnknownCategory(String),

    #[error("Bad id '{0}'")]
    InvalidId(String),

    #[error("Invalid sprite options: {0}")]
    InvalidSpriteOptions(String),

    #[error("No {endpoint} entry matches '{key}'")]
    NotFound { endpoint: String, key: String },

    #[error("{owner} has no field '{field}'")]
    UnknownField { owner: String, field: String },

    #[error("Field '{field}' is not {expected}")]
    FieldType { field: String, expected: &'static str },

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// True when the failure came back from the remote catalog.
    pub fn is_remote(&self) -> bool {
        matches!(self, CatalogError::Remote(_))
    }
}
