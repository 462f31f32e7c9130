//! Error types for energydocs.
//!
//! Library crates use [`EnergyDocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all energydocs operations.
#[derive(Debug, thiserror::Error)]
pub enum EnergyDocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Partial or unusable credentials for a distribution target.
    ///
    /// Distinct from the absence of credentials, which is "feature disabled"
    /// and never an error.
    #[error("credential error: {message}")]
    Credentials { message: String },

    /// Network/HTTP error during crawl or distribution.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Remote upload failure (Drive or dataset registry).
    #[error("upload error: {0}")]
    Upload(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (serialization, schema mismatch, bad input).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EnergyDocsError>;

impl EnergyDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a credential error from any displayable message.
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EnergyDocsError::config("missing output directory");
        assert_eq!(err.to_string(), "config error: missing output directory");

        let err = EnergyDocsError::credentials("OAuth client id set but secret missing");
        assert!(err.to_string().contains("secret missing"));
    }
}
