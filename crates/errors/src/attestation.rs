//! Attestation error types
//!
//! These never fail a download; the attestor adapter downgrades them to a
//! status carried in the outgoing request.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AttestationError {
    #[error("attestation measurement failed: {0}")]
    MeasurementFailed(String),

    #[error("attestation unsupported on this device")]
    Unsupported,
}

impl UserFacingError for AttestationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::MeasurementFailed(_) => Some("attestation.measurement_failed"),
            Self::Unsupported => Some("attestation.unsupported"),
        }
    }
}
