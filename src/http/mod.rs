//! HTTP client module with bounded timeouts and error classification.

mod client;
mod status;

pub use client::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_METADATA_TIMEOUT, HttpClient};
pub use status::{HttpStatusError, check_status, classify_status};
