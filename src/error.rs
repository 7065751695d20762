//! Typed errors for the deduction engine and the profile reader.
//!
//! The engine never aborts a whole function: `DeductionError` values are
//! raised at the variable or round level and handled by the caller (reject
//! the variable, or force the round's set to UNSUITABLE). The binary wraps
//! everything else in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeductionError {
    #[error("invalid variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("degenerate allocation round: partition factors of {pending} pending variables sum to zero")]
    DegenerateRound { pending: usize },
}

impl DeductionError {
    pub fn zero_size(name: &str) -> Self {
        Self::InvalidVariable {
            name: name.to_string(),
            reason: "size is zero, access density is undefined".to_string(),
        }
    }

    pub fn bad_metric(name: &str, metric: &str, value: f64) -> Self {
        Self::InvalidVariable {
            name: name.to_string(),
            reason: format!("{} is {}, expected a finite non-negative value", metric, value),
        }
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile {0} has no header row")]
    Empty(String),
}
