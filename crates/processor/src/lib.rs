#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Protected download orchestration
//!
//! Ties the key manager, attestor, cursor store, translator and blob service
//! together into the two operations callers see: downloading the next blob
//! for a client and fetching a client's manifest.

mod builder;
mod clock;
mod processor;
mod validation;

pub use builder::ProtectedDownloadProcessorBuilder;
pub use clock::{Clock, FixedClock, SystemClock};
pub use processor::ProtectedDownloadProcessor;
pub use tokio_util::sync::CancellationToken;
pub use validation::{validate_api_key, validate_request, EXPECTED_API_KEY_LEN};
