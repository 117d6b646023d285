#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Best-effort device integrity attestation
//!
//! The [`Attestor`] asks an optional [`AttestationClient`] for a measurement
//! bound to a request's content-binding hash. It never fails: an absent
//! client yields `NOT_RUN` and a failing one yields `FAILED`, and the request
//! proceeds either way. The distribution service decides what an
//! unattested request may receive.

mod command;

pub use command::CommandAttestationClient;
pub use pd_types::{AttestationOutcome, AttestationStatus};

use async_trait::async_trait;
use pd_errors::AttestationError;
use std::sync::Arc;
use std::time::Duration;

/// How long a measurement stays valid once issued
pub const ATTESTATION_MEASUREMENT_TTL: Duration = Duration::from_secs(10 * 60);

/// Measurement request bound to one download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRequest {
    pub content_binding: String,
    pub ttl: Duration,
}

impl MeasurementRequest {
    pub fn new(content_binding: impl Into<String>) -> Self {
        Self {
            content_binding: content_binding.into(),
            ttl: ATTESTATION_MEASUREMENT_TTL,
        }
    }
}

/// Produces attestation tokens
#[async_trait]
pub trait AttestationClient: Send + Sync {
    /// Request a measurement token for `request`.
    async fn request_measurement(
        &self,
        request: &MeasurementRequest,
    ) -> Result<Vec<u8>, AttestationError>;
}

/// Adapter that turns attestation into a status value
#[derive(Clone, Default)]
pub struct Attestor {
    client: Option<Arc<dyn AttestationClient>>,
}

impl Attestor {
    #[must_use]
    pub fn new(client: Option<Arc<dyn AttestationClient>>) -> Self {
        Self { client }
    }

    /// An attestor with no client; every outcome is `NOT_RUN`
    #[must_use]
    pub fn disabled() -> Self {
        Self { client: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Attest `content_binding`. Never fails.
    pub async fn attest(&self, content_binding: &str) -> AttestationOutcome {
        let Some(client) = &self.client else {
            return AttestationOutcome::not_run();
        };

        match client
            .request_measurement(&MeasurementRequest::new(content_binding))
            .await
        {
            Ok(token) => {
                tracing::debug!(token_len = token.len(), "attestation succeeded");
                AttestationOutcome::success(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "attestation failed, continuing without a token");
                AttestationOutcome::failed()
            }
        }
    }
}

impl std::fmt::Debug for Attestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attestor")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
