//! Structured logging integration for events
//!
//! Converts engine events into tracing records with structured fields so
//! they end up in the same sink as the engine's own diagnostics.

use pd_events::{
    AppEvent, AttestationEvent, DownloadEvent, EventMessage, GeneralEvent, PersistenceEvent,
};
use tracing::{debug, error, info, warn};

/// Log an event message at its level with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::Download(download_event) => match download_event {
            DownloadEvent::Started {
                client_id,
                operation,
            } => {
                info!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    client_id = %client_id,
                    operation = operation.as_str(),
                    "Operation started"
                );
            }
            DownloadEvent::Completed {
                client_id,
                operation,
                size,
            } => {
                info!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    client_id = %client_id,
                    operation = operation.as_str(),
                    size = size,
                    "Operation completed"
                );
            }
            DownloadEvent::Failed {
                client_id,
                operation,
                size,
                failure,
            } => {
                error!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    client_id = %client_id,
                    operation = operation.as_str(),
                    size = size,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            }
            DownloadEvent::Unrecognized { client_id } => {
                warn!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    client_id = %client_id,
                    "Request from unrecognized client"
                );
            }
        },

        AppEvent::Persistence(persistence_event) => match persistence_event {
            PersistenceEvent::StateLoaded { client_id } => {
                debug!(target: "pd::events", client_id = %client_id, "Cursor state loaded");
            }
            PersistenceEvent::StateCreated { client_id } => {
                debug!(target: "pd::events", client_id = %client_id, "Cursor state created");
            }
            PersistenceEvent::StateCommitted {
                client_id,
                page_token_advanced,
            } => {
                debug!(
                    target: "pd::events",
                    client_id = %client_id,
                    page_token_advanced = page_token_advanced,
                    "Cursor state committed"
                );
            }
        },

        AppEvent::Attestation(AttestationEvent::Completed { client_id, status }) => {
            if matches!(status, pd_types::AttestationStatus::Failed) {
                warn!(
                    target: "pd::events",
                    client_id = %client_id,
                    status = status.as_str(),
                    "Attestation failed"
                );
            } else {
                info!(
                    target: "pd::events",
                    client_id = %client_id,
                    status = status.as_str(),
                    "Attestation completed"
                );
            }
        }

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    client_id = ?meta.client_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    client_id = ?meta.client_id,
                    details = ?details,
                    "{message}"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    target: "pd::events",
                    source = meta.source.as_str(),
                    context = ?context,
                    "{message}"
                );
            }
        },
    }
}
