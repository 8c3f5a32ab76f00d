//! Errors surfaced at the lifecycle and configuration boundaries
//!
//! The per-tick simulation itself is infallible; only entry points that take
//! outside input (player counts, settings files) can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("player count must be between 2 and 4, got {0}")]
    InvalidPlayerCount(usize),

    #[error("maze grid must be at least 2x2, got {rows}x{cols}")]
    InvalidGrid { rows: usize, cols: usize },

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: &'static str,
    },

    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read settings file: {0}")]
    Io(#[from] std::io::Error),
}
