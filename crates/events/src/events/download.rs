use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Which engine operation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Download,
    Manifest,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Manifest => "manifest",
        }
    }
}

/// Network usage of download and manifest operations.
///
/// `size` is the approximate number of response bytes received; it is zero
/// when the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    Started {
        client_id: String,
        operation: OperationKind,
    },

    Completed {
        client_id: String,
        operation: OperationKind,
        size: u64,
    },

    Failed {
        client_id: String,
        operation: OperationKind,
        size: u64,
        failure: FailureContext,
    },

    /// A request from a client outside the allow-list was refused
    Unrecognized { client_id: String },
}

impl DownloadEvent {
    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::Started { client_id, .. }
            | Self::Completed { client_id, .. }
            | Self::Failed { client_id, .. }
            | Self::Unrecognized { client_id } => client_id,
        }
    }
}
