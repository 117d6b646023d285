#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network transport for protected downloads
//!
//! The engine talks to the distribution service only through the
//! [`ProgramBlobService`] trait. [`HttpBlobService`] implements it as JSON
//! over HTTPS with timeouts and a response size cap.

mod client;
mod service;

pub use client::{NetClient, NetConfig, API_KEY_HEADER, DEFAULT_MAX_RESPONSE_BYTES};
pub use service::{
    Endpoints, HttpBlobService, ProgramBlobService, DOWNLOAD_BLOB_PATH, GET_MANIFEST_CONFIG_PATH,
};
