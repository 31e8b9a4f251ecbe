//! Error types shared by every RA2CE crate.
//!
//! [`Ra2ceError`] separates the failure classes the analyses care about:
//! configuration problems are raised when an analysis is constructed,
//! data-completeness problems when a lookup misses, and type mismatches when a
//! dynamically typed attribute is fed into an arithmetic operator. Numeric edge
//! cases (no detour, missing speed) are never errors; they become NaN or zero
//! in the result tables.
//!
//! # Example
//!
//! ```ignore
//! use ra2ce_core::{Ra2ceError, Ra2ceResult};
//!
//! fn curve_for(key: &str) -> Ra2ceResult<()> {
//!     Err(Ra2ceError::DataCompleteness(format!("no resilience curve for {key}")))
//! }
//! ```

use thiserror::Error;

/// Unified error type for all RA2CE operations.
#[derive(Error, Debug)]
pub enum Ra2ceError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or inconsistent configuration: a required file, column or setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An input table lacks an entry that the analysis needs.
    #[error("Data completeness error: {0}")]
    DataCompleteness(String),

    /// An arithmetic operator received an operand it is not defined for.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Unknown node or edge, or a structurally invalid graph.
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using Ra2ceError.
pub type Ra2ceResult<T> = Result<T, Ra2ceError>;

impl From<anyhow::Error> for Ra2ceError {
    fn from(err: anyhow::Error) -> Self {
        Ra2ceError::Other(err.to_string())
    }
}

impl From<String> for Ra2ceError {
    fn from(s: String) -> Self {
        Ra2ceError::Other(s)
    }
}

impl From<&str> for Ra2ceError {
    fn from(s: &str) -> Self {
        Ra2ceError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for Ra2ceError {
    fn from(err: serde_json::Error) -> Self {
        Ra2ceError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for Ra2ceError {
    fn from(err: serde_yaml::Error) -> Self {
        Ra2ceError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Ra2ceError {
    fn from(err: toml::de::Error) -> Self {
        Ra2ceError::Parse(err.to_string())
    }
}
