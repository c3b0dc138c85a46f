//! Unified error types for pageplus

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unified error type for all pageplus operations
#[derive(Error, Debug)]
pub enum PageError {
    // Lookup errors
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("No option with text \"{text}\" in select {selector}")]
    OptionNotFound { selector: String, text: String },

    // Waiting errors
    #[error("Timed out after {after:?}: {what}")]
    Timeout { what: String, after: Duration },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    // Caller errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Driver errors
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Unexpected script result: {0}")]
    Script(String),

    // Persistence errors
    #[error("File error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl PageError {
    /// Wrap an I/O error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PageError::File {
            path: path.into(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PageError::NotFound(_) | PageError::OptionNotFound { .. }
        )
    }
}

/// Result type alias using PageError
pub type Result<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_subject() {
        let err = PageError::Timeout {
            what: "page https://example.com does not contain \"Welcome\"".to_string(),
            after: Duration::from_secs(60),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com"));
        assert!(msg.contains("Welcome"));
        assert!(err.is_timeout());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_option_not_found_is_not_found() {
        let err = PageError::OptionNotFound {
            selector: "#country".to_string(),
            text: "Narnia".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "No option with text \"Narnia\" in select #country"
        );
    }

    #[test]
    fn test_file_error_includes_path() {
        let err = PageError::file(
            "/tmp/cookies.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/cookies.json"));
    }
}
