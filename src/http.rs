//! Failure classification for HTTP call sites.
//!
//! Both functions are meant to be used as retry predicates, e.g.
//! `RetryPolicy::new().retry_if(reattempt::http::is_transient)`.
use reqwest::StatusCode;

/// Whether a response status is worth retrying: request timeouts, rate limiting and server
/// errors. Every other client error is terminal.
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Whether a `reqwest` failure is worth retrying. Timeouts and connection failures are,
/// status errors (from `Response::error_for_status`) are classified by
/// [`is_transient_status`], and anything else (bad urls, decoding errors) is not.
pub fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    err.status().map_or(false, is_transient_status)
}
