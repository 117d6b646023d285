use serde::{Deserialize, Serialize};

use crate::EventSource;
use pd_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable dotted error code, e.g. `crypto.decrypt_failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod attestation;
pub mod download;
pub mod general;
pub mod persistence;

pub use attestation::*;
pub use download::*;
pub use general::*;
pub use persistence::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings, errors and debug notes
    General(GeneralEvent),

    /// Download and manifest operations as seen by the network-usage log
    Download(DownloadEvent),

    /// Cursor state reads and writes
    Persistence(PersistenceEvent),

    /// Integrity attestation results
    Attestation(AttestationEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::General,
            Self::Download(_) => EventSource::Download,
            Self::Persistence(_) => EventSource::Persistence,
            Self::Attestation(_) => EventSource::Attestation,
        }
    }

    /// Operation a download-domain event belongs to
    #[must_use]
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Self::Download(
                DownloadEvent::Started { operation, .. }
                | DownloadEvent::Completed { operation, .. }
                | DownloadEvent::Failed { operation, .. },
            ) => Some(*operation),
            _ => None,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. }) | Self::Download(DownloadEvent::Failed { .. }) => {
                Level::ERROR
            }

            Self::General(GeneralEvent::Warning { .. })
            | Self::Download(DownloadEvent::Unrecognized { .. })
            | Self::Attestation(AttestationEvent::Completed {
                status: pd_types::AttestationStatus::Failed,
                ..
            }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. }) | Self::Persistence(_) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "pd::events::general",
            Self::Download(_) => "pd::events::download",
            Self::Persistence(_) => "pd::events::persistence",
            Self::Attestation(_) => "pd::events::attestation",
        }
    }
}
