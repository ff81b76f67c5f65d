//! Error types for Huddle.
//!
//! Library crates use [`HuddleError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Huddle operations.
#[derive(Debug, thiserror::Error)]
pub enum HuddleError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Knowledge file (rules, vocabularies, replies) failed to load or validate.
    #[error("knowledge error: {message}")]
    Knowledge { message: String },

    /// Network/HTTP error talking to the search provider.
    #[error("network error: {0}")]
    Network(String),

    /// Search provider answered with something we could not use.
    #[error("search provider error: {0}")]
    Provider(String),

    /// A pipeline stage failed in a way the stage itself did not anticipate.
    #[error("unexpected failure in {stage}: {message}")]
    Unexpected { stage: &'static str, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HuddleError>;

impl HuddleError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a knowledge error from any displayable message.
    pub fn knowledge(msg: impl Into<String>) -> Self {
        Self::Knowledge {
            message: msg.into(),
        }
    }

    /// Create an unexpected-failure error attributed to a pipeline stage.
    pub fn unexpected(stage: &'static str, msg: impl Into<String>) -> Self {
        Self::Unexpected {
            stage,
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
        let err = HuddleError::config("port must be non-zero");
        assert_eq!(err.to_string(), "config error: port must be non-zero");

        let err = HuddleError::knowledge("duplicate rule id 'puntos'");
        assert!(err.to_string().contains("duplicate rule id"));

        let err = HuddleError::unexpected("search", "task panicked");
        assert_eq!(
            err.to_string(),
            "unexpected failure in search: task panicked"
        );
    }
}
