//! Error types for treefell
//!
//! Only infrastructure failures live here. Refusals that are part of normal
//! play (not enough durability, a tree already being felled, ...) are
//! reported through outcome enums instead.

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
