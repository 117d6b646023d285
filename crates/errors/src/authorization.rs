//! Client authorization error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AuthorizationError {
    #[error("unrecognized network request from client {client_id}")]
    UnrecognizedClient { client_id: String },

    #[error("client {client} has no registered id")]
    UnknownClient { client: String },
}

impl UserFacingError for AuthorizationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnrecognizedClient { .. } => {
                Some("Add the client id to `network_usage.allowed_clients`.")
            }
            Self::UnknownClient { .. } => Some("Register an id for the client under `[clients]`."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnrecognizedClient { .. } => "authorization.unrecognized_client",
            Self::UnknownClient { .. } => "authorization.unknown_client",
        };
        Some(code)
    }
}
