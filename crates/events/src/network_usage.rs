//! Network-usage accounting for engine operations
//!
//! The log decides which client ids may touch the network at all and records
//! exactly one success or failure per operation that passed that check.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use pd_errors::AuthorizationError;

use crate::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext, OperationKind};

/// How a logged operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Succeeded,
    Failed(FailureContext),
}

/// Allow-list check and per-operation telemetry
pub trait NetworkUsageLog: Send + Sync {
    /// Refuse clients that may not make network requests.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnrecognizedClient` if `client_id` is not
    /// allowed.
    fn check_allowed_request(&self, client_id: &str) -> Result<(), AuthorizationError>;

    /// Record the end of an operation with the approximate bytes received
    fn log_download(&self, client_id: &str, operation: OperationKind, outcome: DownloadOutcome, size: u64);
}

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkUsageSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub unrecognized: u64,
    pub bytes_received: u64,
}

/// Network-usage log that reports through the event channel
#[derive(Debug, Default)]
pub struct EventNetworkUsageLog {
    allowed_clients: HashSet<String>,
    events: Option<EventSender>,
    succeeded: AtomicU64,
    failed: AtomicU64,
    unrecognized: AtomicU64,
    bytes_received: AtomicU64,
}

impl EventNetworkUsageLog {
    #[must_use]
    pub fn new(allowed_clients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_clients: allowed_clients.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn is_allowed(&self, client_id: &str) -> bool {
        self.allowed_clients.contains(client_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> NetworkUsageSnapshot {
        NetworkUsageSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

impl EventEmitter for EventNetworkUsageLog {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl NetworkUsageLog for EventNetworkUsageLog {
    fn check_allowed_request(&self, client_id: &str) -> Result<(), AuthorizationError> {
        if self.is_allowed(client_id) {
            return Ok(());
        }
        self.unrecognized.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(client_id, "refusing network request from unrecognized client");
        self.emit_for_client(
            client_id,
            AppEvent::Download(DownloadEvent::Unrecognized {
                client_id: client_id.to_string(),
            }),
        );
        Err(AuthorizationError::UnrecognizedClient {
            client_id: client_id.to_string(),
        })
    }

    fn log_download(&self, client_id: &str, operation: OperationKind, outcome: DownloadOutcome, size: u64) {
        self.bytes_received.fetch_add(size, Ordering::Relaxed);
        let event = match outcome {
            DownloadOutcome::Succeeded => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                DownloadEvent::Completed {
                    client_id: client_id.to_string(),
                    operation,
                    size,
                }
            }
            DownloadOutcome::Failed(failure) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                DownloadEvent::Failed {
                    client_id: client_id.to_string(),
                    operation,
                    size,
                    failure,
                }
            }
        };
        self.emit_for_client(client_id, AppEvent::Download(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_client_is_counted_and_refused() {
        let log = EventNetworkUsageLog::new(["a"]);
        assert!(log.check_allowed_request("a").is_ok());
        let err = log.check_allowed_request("b").unwrap_err();
        assert!(matches!(err, AuthorizationError::UnrecognizedClient { ref client_id } if client_id == "b"));
        assert_eq!(log.snapshot().unrecognized, 1);
    }

    #[test]
    fn outcomes_update_counters() {
        let log = EventNetworkUsageLog::new(["a"]);
        log.log_download("a", OperationKind::Download, DownloadOutcome::Succeeded, 10);
        log.log_download(
            "a",
            OperationKind::Manifest,
            DownloadOutcome::Failed(FailureContext::new(None::<String>, "boom", None::<String>, false)),
            0,
        );
        assert_eq!(
            log.snapshot(),
            NetworkUsageSnapshot {
                succeeded: 1,
                failed: 1,
                unrecognized: 0,
                bytes_received: 10,
            }
        );
    }
}
