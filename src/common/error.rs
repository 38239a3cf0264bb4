//! Error types for the Jasmine session adapter
//!
//! Every error raised while preparing, registering, collecting or reducing
//! ends up in exactly one `sessionFailed` report, so messages are written
//! for the person reading the host's output.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the session adapter
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    #[error("Jasmine standalone loading failed: not ready after {timeout_ms} ms")]
    PreparationTimeout { timeout_ms: u64 },

    #[error("Failed to load Jasmine runtime asset: {0}")]
    AssetLoadFailure(String),

    #[error("Spec registration failed: {0}")]
    SpecRegistration(String),

    #[error("Lifecycle protocol violation: {0}")]
    ProtocolViolation(String),

    // === Framework Process Errors ===
    #[error("Test framework '{name}' not found. Searched: {searched}")]
    FrameworkNotFound { name: String, searched: String },

    #[error("Test framework failed to start: {0}")]
    FrameworkStartFailed(String),

    #[error("Test framework exited unexpectedly")]
    FrameworkCrashed,

    #[error("Framework protocol error: {0}")]
    FrameworkProtocol(String),

    #[error("Framework request '{command}' failed: {message}")]
    FrameworkRequestFailed { command: String, message: String },

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a framework not found error with search paths
    pub fn framework_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::FrameworkNotFound {
            name: name.to_string(),
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a framework request failed error
    pub fn request_failed(command: &str, message: &str) -> Self {
        Self::FrameworkRequestFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol_violation(detail: impl Into<String>) -> Self {
        Self::ProtocolViolation(detail.into())
    }
}

/// Host-serializable error for `sessionFailed` reports
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HostError {
    pub code: String,
    pub message: String,
}

impl From<&Error> for HostError {
    fn from(e: &Error) -> Self {
        let code = match e {
            Error::PreparationTimeout { .. } => "PREPARATION_TIMEOUT",
            Error::AssetLoadFailure(_) => "ASSET_LOAD_FAILURE",
            Error::SpecRegistration(_) => "SPEC_REGISTRATION_FAILED",
            Error::ProtocolViolation(_) => "PROTOCOL_VIOLATION",
            Error::FrameworkNotFound { .. } => "FRAMEWORK_NOT_FOUND",
            Error::FrameworkStartFailed(_) => "FRAMEWORK_START_FAILED",
            Error::FrameworkCrashed => "FRAMEWORK_CRASHED",
            Error::FrameworkRequestFailed { .. } => "FRAMEWORK_REQUEST_FAILED",
            Error::ConfigParse(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        }
        .to_string();

        Self {
            code,
            message: e.to_string(),
        }
    }
}
