//! Error types for bluepic-core operations.
//! Keep SessionFfiError minimal and stable to avoid breaking FFI clients.

use serde::Serialize;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// Carries only a message string so UniFFI can lower it without extra types.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SessionFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for SessionFfiError {
    fn from(message: String) -> Self {
        SessionFfiError::General { message }
    }
}

impl From<&str> for SessionFfiError {
    fn from(message: &str) -> Self {
        SessionFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<CoreError> for SessionFfiError {
    fn from(err: CoreError) -> Self {
        SessionFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised by persistence and configuration code.
///
/// Launch and feed failures are not represented here: they become
/// [`crate::LaunchOutcome`] values and never cross the reconciler boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No storage path configured for preference store")]
    NoStoragePath,

    #[error("Preference {key} has unexpected type (expected {expected})")]
    PreferenceType { key: String, expected: &'static str },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Preference file write failed: {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Launch Errors (converted to outcomes)
// ═══════════════════════════════════════════════════════════════════════════════

/// Why the connectivity precheck did not pass.
///
/// The `Display` text is what observers show to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectivityError {
    #[error("Server is not set")]
    ServerNotSet,

    #[error("Bad server URL: {address}")]
    ProbeFailed { address: String, reason: String },
}

/// Opaque failure reported by the feed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct FeedFetchError {
    pub message: String,
}

impl FeedFetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_messages() {
        assert_eq!(ConnectivityError::ServerNotSet.to_string(), "Server is not set");

        let err = ConnectivityError::ProbeFailed {
            address: "http://photos.local:8090".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Bad server URL: http://photos.local:8090");
    }

    #[test]
    fn test_core_error_into_ffi() {
        let err = CoreError::PreferenceType {
            key: "hasPressedLater".to_string(),
            expected: "bool",
        };
        let ffi: SessionFfiError = err.into();
        assert!(ffi.to_string().contains("hasPressedLater"));
    }
}
