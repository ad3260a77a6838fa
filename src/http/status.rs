//! Classification of unsuccessful HTTP responses into user-legible errors.

use reqwest::{Response, StatusCode};
use thiserror::Error;

/// An HTTP response that did not carry the requested resource.
#[derive(Debug, Error, PartialEq)]
pub enum HttpStatusError {
    #[error("rate limit exceeded (HTTP {0}). Try again later or set the GITHUB_TOKEN environment variable")]
    RateLimitExceeded(u16),

    #[error("authentication failed (HTTP 401). Check your GITHUB_TOKEN")]
    AuthenticationFailed,

    #[error("access forbidden (HTTP 403). You may need authentication")]
    Forbidden,

    #[error("not found (HTTP 404)")]
    NotFound,

    #[error("request rejected (HTTP {0})")]
    ClientError(u16),

    #[error("server error (HTTP {0})")]
    ServerError(u16),
}

/// Classifies a non-success status. `rate_limited` reports whether the
/// server signalled an exhausted quota (GitHub answers 403 in that case).
pub fn classify_status(status: StatusCode, rate_limited: bool) -> HttpStatusError {
    match status {
        StatusCode::UNAUTHORIZED => HttpStatusError::AuthenticationFailed,
        StatusCode::FORBIDDEN if rate_limited => {
            HttpStatusError::RateLimitExceeded(status.as_u16())
        }
        StatusCode::FORBIDDEN => HttpStatusError::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => HttpStatusError::RateLimitExceeded(status.as_u16()),
        StatusCode::NOT_FOUND => HttpStatusError::NotFound,
        s if s.is_client_error() => HttpStatusError::ClientError(s.as_u16()),
        s => HttpStatusError::ServerError(s.as_u16()),
    }
}

/// Passes successful responses through and turns everything else into an
/// [`HttpStatusError`].
pub fn check_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    Err(classify_status(status, rate_limited).into())
}
