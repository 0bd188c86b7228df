//! Unified error types for minestats.
//!
//! Only genuine storage unavailability is meant to reach a caller as a
//! failure. A missing ledger file or a torn final record are not errors;
//! see [`crate::storage::FileLedger`] for the read-side policy.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for minestats operations.
#[derive(Error, Debug)]
pub enum StatsError {
    /// I/O errors from ledger, watermark or config file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Encoding errors for records or the watermark file.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A complete frame in the middle of the ledger could not be decoded.
    #[error("corrupt ledger {path} at line {line}: {message}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A record that violates the ledger invariants.
    #[error("invalid record: {message}")]
    InvalidRecord { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for minestats operations.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a corruption error for a frame at `line` (1-based).
    pub fn corrupt(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether retrying the whole operation later may succeed.
    ///
    /// Only storage faults are transient. Corruption and invalid input stay
    /// wrong no matter how often the caller retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<io::Error> for StatsError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling at outer surfaces.
///
/// Logs the error and returns a safe default instead of propagating it.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the minestats CLI.
pub mod exit_codes {
    /// The command completed.
    pub const SUCCESS: i32 = 0;

    /// The command failed (storage unavailable, invalid input).
    pub const ERROR: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StatsError::storage(
            "/tmp/stats",
            io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/stats"));
    }

    #[test]
    fn test_corrupt_error_display() {
        let err = StatsError::corrupt("/tmp/stats", 4, "expected value");
        assert_eq!(
            err.to_string(),
            "corrupt ledger /tmp/stats at line 4: expected value"
        );
    }

    #[test]
    fn test_invalid_record_error_display() {
        let err = StatsError::invalid_record("width must be positive");
        assert_eq!(err.to_string(), "invalid record: width must be positive");
    }

    #[test]
    fn test_config_error_display() {
        let err = StatsError::config("invalid TOML");
        assert_eq!(err.to_string(), "config error: invalid TOML");
    }

    #[test]
    fn test_only_storage_is_transient() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk gone");
        assert!(StatsError::storage("/tmp/x", io_err).is_transient());

        assert!(!StatsError::serde("bad").is_transient());
        assert!(!StatsError::corrupt("/tmp/x", 1, "bad").is_transient());
        assert!(!StatsError::invalid_record("bad").is_transient());
        assert!(!StatsError::config("bad").is_transient());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: StatsError = io_err.into();
        assert!(matches!(err, StatsError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: StatsError = json_err.into();
        assert!(matches!(err, StatsError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<u64>> = Err(StatsError::serde("test"));
        assert!(result.fail_open_default("test context").is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<u64> = Err(StatsError::config("test"));
        assert_eq!(result.fail_open_with("test context", 42), 42);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<u64> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }
}
