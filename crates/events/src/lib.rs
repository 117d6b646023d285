#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for the protected download engine
//!
//! Every stage of an operation reports through an unbounded channel of
//! [`EventMessage`]s. The front end drains the channel and forwards each event
//! to `tracing`; the network-usage log records its per-operation telemetry
//! through the same channel.
//!
//! ## Architecture
//!
//! - **Domain events**: `General`, `Download`, `Persistence` and `Attestation`
//! - **`EventEmitter` trait**: one API for anything holding a sender
//! - **`NetworkUsageLog`**: allow-list check and success/failure accounting

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, AttestationEvent, DownloadEvent, FailureContext, GeneralEvent, OperationKind,
    PersistenceEvent,
};

pub mod network_usage;
pub use network_usage::{
    DownloadOutcome, EventNetworkUsageLog, NetworkUsageLog, NetworkUsageSnapshot,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its emission metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap `event` with metadata derived from its domain and level
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }
}

pub type EventSender = UnboundedSender<EventMessage>;

pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events
///
/// Implemented by the raw [`EventSender`] and by anything that holds an
/// optional one. Emission never fails; a dropped receiver silently discards.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event with explicit metadata
    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    /// Emit an event, deriving its metadata
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(EventMessage::from_event(event));
        }
    }

    /// Emit an event correlated to one client's operation
    fn emit_for_client(&self, client_id: &str, event: AppEvent) {
        let meta = EventMeta::new(event.log_level(), event.event_source())
            .for_client(client_id)
            .with_operation(event.operation());
        self.emit_with_meta(meta, event);
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_debug_with_context(
        &self,
        message: impl Into<String>,
        context: std::collections::HashMap<String, String>,
    ) {
        self.emit(AppEvent::General(GeneralEvent::debug_with_context(
            message, context,
        )));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    fn emit_error_with_details(&self, message: impl Into<String>, details: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error_with_details(
            message, details,
        )));
    }

    fn emit_download_started(&self, client_id: &str, operation: OperationKind) {
        self.emit_for_client(
            client_id,
            AppEvent::Download(DownloadEvent::Started {
                client_id: client_id.to_string(),
                operation,
            }),
        );
    }

    fn emit_state_loaded(&self, client_id: &str) {
        self.emit_for_client(
            client_id,
            AppEvent::Persistence(PersistenceEvent::StateLoaded {
                client_id: client_id.to_string(),
            }),
        );
    }

    fn emit_state_created(&self, client_id: &str) {
        self.emit_for_client(
            client_id,
            AppEvent::Persistence(PersistenceEvent::StateCreated {
                client_id: client_id.to_string(),
            }),
        );
    }

    fn emit_state_committed(&self, client_id: &str, page_token_advanced: bool) {
        self.emit_for_client(
            client_id,
            AppEvent::Persistence(PersistenceEvent::StateCommitted {
                client_id: client_id.to_string(),
                page_token_advanced,
            }),
        );
    }

    fn emit_attestation_completed(&self, client_id: &str, status: pd_types::AttestationStatus) {
        self.emit_for_client(
            client_id,
            AppEvent::Attestation(AttestationEvent::Completed {
                client_id: client_id.to_string(),
                status,
            }),
        );
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
