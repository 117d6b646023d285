//! Request validation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ValidationError {
    #[error("unexpected api key size: expected {expected}, got {actual}")]
    ApiKeyLength { expected: usize, actual: usize },

    #[error("api key contains illegal characters")]
    ApiKeyCharacters,

    #[error("missing public key")]
    MissingPublicKey,
}

impl UserFacingError for ValidationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ApiKeyLength { .. } | Self::ApiKeyCharacters => {
                Some("API keys are 39 characters of letters, digits or underscore.")
            }
            Self::MissingPublicKey => Some("Attach the caller's public key to the request."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ApiKeyLength { .. } => "validation.api_key_length",
            Self::ApiKeyCharacters => "validation.api_key_characters",
            Self::MissingPublicKey => "validation.missing_public_key",
        };
        Some(code)
    }
}
