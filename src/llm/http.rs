// src/llm/http.rs
// Shared HTTP client for provider calls

use std::time::Duration;

/// Create the HTTP client used for all provider calls.
///
/// No request timeout is set unless one is configured; a slow call is bounded
/// only by the transport.
pub fn create_client(request_timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("csl-metrix/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}
