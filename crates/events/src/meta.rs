use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;
use uuid::Uuid;

use crate::OperationKind;

/// Emission metadata carried next to every event.
///
/// `client_id` and `operation` are the keys a consumer groups on: every event
/// of one download or manifest fetch shares both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    pub emitted_at: DateTime<Utc>,
    pub level: EventLevel,
    pub source: EventSource,
}

impl EventMeta {
    #[must_use]
    pub fn new(level: impl Into<EventLevel>, source: EventSource) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            client_id: None,
            operation: None,
            emitted_at: Utc::now(),
            level: level.into(),
            source,
        }
    }

    /// Tie the event to the client whose operation produced it
    #[must_use]
    pub fn for_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: Option<OperationKind>) -> Self {
        self.operation = operation;
        self
    }
}

/// Severity of an event
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Level> for EventLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::TRACE => EventLevel::Trace,
            Level::DEBUG => EventLevel::Debug,
            Level::INFO => EventLevel::Info,
            Level::WARN => EventLevel::Warn,
            Level::ERROR => EventLevel::Error,
        }
    }
}

/// Engine domain that emitted the event
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    General,
    Download,
    Persistence,
    Attestation,
}

impl EventSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Download => "download",
            Self::Persistence => "persistence",
            Self::Attestation => "attestation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_meta_omits_client_keys() {
        let meta = EventMeta::new(Level::INFO, EventSource::Download);
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("clientId").is_none());
        assert!(json.get("operation").is_none());
        assert_eq!(json["source"], "download");
        assert_eq!(json["level"], "info");
    }

    #[test]
    fn client_meta_round_trips() {
        let meta = EventMeta::new(EventLevel::Warn, EventSource::Persistence)
            .for_client("org.pd.scanner")
            .with_operation(Some(OperationKind::Manifest));
        let json = serde_json::to_string(&meta).unwrap();
        let back: EventMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
