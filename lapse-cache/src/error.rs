//! Error types for the cache.
//!
//! Cache reads and writes never fail; absence is reported through `Option`.
//! These errors only cover construction-time edges.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised while configuring or constructing a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The background sweep thread could not be spawned.
    #[error("Failed to spawn sweep thread: {0}")]
    SweeperSpawn(#[from] std::io::Error),

    /// Cache configuration could not be parsed.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::InvalidConfig(err.to_string())
    }
}
