#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the protected download engine
//!
//! This crate provides fine-grained error types organized by the stage of a
//! download that produces them. All error types implement Clone so a failure
//! can be both logged to telemetry and returned to the caller.

use std::borrow::Cow;

use thiserror::Error;

pub mod attestation;
pub mod authorization;
pub mod config;
pub mod crypto;
pub mod network;
pub mod storage;
pub mod validation;

// Re-export all error types at the root
pub use attestation::AttestationError;
pub use authorization::AuthorizationError;
pub use config::ConfigError;
pub use crypto::CryptoError;
pub use network::NetworkError;
pub use storage::StorageError;
pub use validation::ValidationError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("unauthorized: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("attestation error: {0}")]
    Attestation(#[from] AttestationError),

    #[error("protected download is disabled")]
    FeatureDisabled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        #[cfg_attr(feature = "serde", serde(with = "io_kind_as_str"))]
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Transport status reported to whoever invoked the engine.
    #[must_use]
    pub fn rpc_status(&self) -> RpcStatus {
        match self {
            Error::Validation(_) => RpcStatus::InvalidArgument,
            Error::Authorization(_) => RpcStatus::PermissionDenied,
            Error::FeatureDisabled => RpcStatus::FailedPrecondition,
            Error::Network(_) => RpcStatus::Unavailable,
            Error::Cancelled => RpcStatus::Cancelled,
            _ => RpcStatus::Internal,
        }
    }
}

/// Coarse status codes for the outer RPC surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RpcStatus {
    InvalidArgument,
    PermissionDenied,
    FailedPrecondition,
    Unavailable,
    Cancelled,
    Internal,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Validation(err) => err.user_message(),
            Error::Network(err) => err.user_message(),
            Error::Crypto(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Validation(err) => err.user_hint(),
            Error::Authorization(err) => err.user_hint(),
            Error::Network(err) => err.user_hint(),
            Error::Storage(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::FeatureDisabled => Some("Set `general.enabled = true` in the configuration."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            Error::Storage(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Validation(err) => err.user_code(),
            Error::Authorization(err) => err.user_code(),
            Error::Network(err) => err.user_code(),
            Error::Crypto(err) => err.user_code(),
            Error::Storage(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Attestation(err) => err.user_code(),
            Error::FeatureDisabled => Some("error.feature_disabled"),
            Error::Internal(_) => Some("error.internal"),
            Error::Cancelled => Some("error.cancelled"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}

#[cfg(feature = "serde")]
mod io_kind_as_str {
    use serde::{Deserialize, Deserializer, Serializer};
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(kind: &std::io::ErrorKind, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&format!("{kind:?}"))
    }
    pub fn deserialize<'de, D>(deserializer: D) -> Result<std::io::ErrorKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Best effort mapping; default to Other
        Ok(match s.as_str() {
            "NotFound" => std::io::ErrorKind::NotFound,
            "PermissionDenied" => std::io::ErrorKind::PermissionDenied,
            "AlreadyExists" => std::io::ErrorKind::AlreadyExists,
            "InvalidInput" => std::io::ErrorKind::InvalidInput,
            "InvalidData" => std::io::ErrorKind::InvalidData,
            "TimedOut" => std::io::ErrorKind::TimedOut,
            "Interrupted" => std::io::ErrorKind::Interrupted,
            "UnexpectedEof" => std::io::ErrorKind::UnexpectedEof,
            _ => std::io::ErrorKind::Other,
        })
    }
}
