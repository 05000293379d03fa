//! Error types for paged-fetch
//!
//! Every failure in a pagination run, whatever its origin, is one of these
//! variants. The run stops at the first one and returns it unchanged.

use thiserror::Error;

use crate::types::ResourceKind;

/// Result type alias for paged-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for paged-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// The remote address for a resource could not be resolved
    #[error("cannot resolve address for {kind}: {message}")]
    Resolution {
        /// Resource kind that failed to resolve
        kind: ResourceKind,
        /// Why resolution failed
        message: String,
    },

    /// A page request failed or returned an unusable response
    #[error("transport error for {url}: {message}")]
    Transport {
        /// The requested URL
        url: String,
        /// Underlying failure description
        message: String,
    },

    /// HTTP client error not tied to a specific page request
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Writing a page to the store failed
    #[error("failed to store page {key}: {source}")]
    StoreWrite {
        /// Store key being written
        key: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Reading a page back from the store failed
    #[error("failed to read page {key}: {source}")]
    StoreRead {
        /// Store key being read
        key: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The probe page's total-count field could not be decoded
    #[error("cannot decode total page count: {0}")]
    Decode(String),

    /// Page indices are 1-based
    #[error("invalid page index {0}: pages start at 1")]
    InvalidPage(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fetch worker aborted because the run already terminated
    #[error("fetch cancelled")]
    Cancelled,
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Resolution { .. } => "resolution_error",
            Error::Transport { .. } | Error::Network(_) => "transport_error",
            Error::StoreWrite { .. } => "store_write_error",
            Error::StoreRead { .. } => "store_read_error",
            Error::Decode(_) => "decode_error",
            Error::InvalidPage(_) => "invalid_page",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Cancelled => "cancelled",
        }
    }

    /// Whether the error ends a pagination run.
    ///
    /// There is no retry layer, so every error except a worker's own
    /// cancellation is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Cancelled)
    }

    pub(crate) fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct_per_category() {
        let cases = vec![
            (Error::config("zero", "concurrency"), "config_error"),
            (
                Error::Resolution {
                    kind: ResourceKind::Details,
                    message: "not paginated".into(),
                },
                "resolution_error",
            ),
            (
                Error::transport("http://x/1", "connection refused"),
                "transport_error",
            ),
            (
                Error::StoreWrite {
                    key: "1".into(),
                    source: std::io::Error::other("disk full"),
                },
                "store_write_error",
            ),
            (
                Error::StoreRead {
                    key: "1".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                },
                "store_read_error",
            ),
            (Error::Decode("missing field".into()), "decode_error"),
            (Error::InvalidPage(0), "invalid_page"),
            (Error::Cancelled, "cancelled"),
        ];

        for (err, code) in cases {
            assert_eq!(err.error_code(), code, "wrong code for {err}");
        }
    }

    #[test]
    fn only_cancellation_is_non_fatal() {
        assert!(!Error::Cancelled.is_fatal());
        assert!(Error::Decode("x".into()).is_fatal());
        assert!(Error::transport("u", "m").is_fatal());
    }

    #[test]
    fn store_errors_mention_the_key() {
        let err = Error::StoreWrite {
            key: "42".into(),
            source: std::io::Error::other("read-only filesystem"),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"), "message should include key: {msg}");
        assert!(msg.contains("read-only filesystem"));
    }

    #[test]
    fn config_error_keeps_offending_key() {
        match Error::config("must be at least 1", "concurrency") {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("concurrency"));
                assert_eq!(message, "must be at least 1");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
