//! Error types shared by the geometry core and the catalog store.
//!
//! Three failure kinds cover the whole system:
//!
//! | Variant | Raised by | Retry? |
//! |---------|-----------|--------|
//! | [`Configuration`](Error::Configuration) | sampler bounds, search radius, batch size | No |
//! | [`Domain`](Error::Domain) | non-finite angles, \|dec\| > 90°, zero vectors | No |
//! | [`Storage`](Error::Storage) | index unavailable, corrupt, write rejected, I/O | Caller decides |
//!
//! Configuration and domain errors are caller mistakes and are surfaced
//! immediately. Storage errors are the only kind [`Error::is_retryable`]
//! reports as worth retrying; no layer in this workspace retries on its own.

use thiserror::Error;

/// Unified error type for catalog geometry, generation and storage.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter was rejected before any computation was attempted.
    #[error("Configuration error in {parameter}: {message}")]
    Configuration { parameter: String, message: String },

    /// An input falls outside the mathematical domain of the operation.
    #[error("Domain error in {operation}: {message}")]
    Domain { operation: String, message: String },

    /// The spatial index rejected a write or could not answer a query.
    #[error("Storage error ({operation}): {message}")]
    Storage { operation: String, message: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(parameter: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    pub fn domain(operation: &str, message: impl Into<String>) -> Self {
        Self::Domain {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn storage(operation: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// True for storage failures (including I/O); false for caller mistakes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = Error::configuration("cap_min", "must be >= 0, got -0.1");
        assert_eq!(
            err.to_string(),
            "Configuration error in cap_min: must be >= 0, got -0.1"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn domain_error_is_not_retryable() {
        let err = Error::domain("to_spherical", "zero-length vector");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("to_spherical"));
    }

    #[test]
    fn storage_and_io_are_retryable() {
        assert!(Error::storage("commit", "disk full").is_retryable());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("Storage I/O error"));
    }
}
