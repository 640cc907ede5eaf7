use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

const USER_AGENT: &str = concat!("fashion-trend-setter/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client. Both provider transports clone it, so they
/// share one connection pool and one request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

pub fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}
