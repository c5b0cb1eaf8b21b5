//! Engine error taxonomy
//!
//! Three outcomes matter to callers: the expected UI state never showed up
//! (retryable), a template asset is missing from disk (a packaging bug),
//! or something on screen was found but could not be parsed.

use std::path::PathBuf;
use std::time::Duration;

/// Errors produced by the perception/navigation engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The expected UI state did not appear within the wait budget.
    /// Callers typically retry the surrounding transition or fall back.
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    /// A named template asset could not be resolved on disk. Fatal:
    /// a missing asset is a configuration bug, not a transient condition.
    #[error("template asset not found: {name} (searched {searched:?})")]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// A match was found but its content could not be parsed (e.g. OCR
    /// produced non-numeric text where digits were expected). The
    /// offending crop is saved for diagnosis when a debug dir is set.
    #[error("recognition failed: {message}")]
    Recognition {
        message: String,
        image: Option<PathBuf>,
    },

    /// Transport failure from the capture/input collaborator, propagated
    /// uninterpreted.
    #[error(transparent)]
    Device(#[from] anyhow::Error),

    /// Filesystem failure in an engine-owned store (label cache, debug
    /// image dump).
    #[error("store i/o: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that are expected during normal operation and
    /// usually absorbed by a caller-side retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            what: "return_button".to_string(),
            waited: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("return_button"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_not_found_is_not_timeout() {
        let err = Error::NotFound {
            name: "missing".to_string(),
            searched: vec![PathBuf::from("/assets")],
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("missing"));
    }
}
