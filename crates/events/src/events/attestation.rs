use pd_types::AttestationStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttestationEvent {
    Completed {
        client_id: String,
        status: AttestationStatus,
    },
}
