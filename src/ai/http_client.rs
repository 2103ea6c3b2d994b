//! Shared HTTP Client Module
//!
//! Provides global, lazy-initialized HTTP clients with connection pooling so
//! repeated analysis and chat calls reuse TLS sessions and TCP connections.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global HTTP client for the chat-completions provider (DeepSeek)
///
/// Statement analysis of long statements can take a while to generate,
/// hence the generous timeout.
pub static COMPLETION_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create completion HTTP client")
});

/// Global HTTP client for the vision / structured-generation provider (Gemini)
///
/// Requests carry inline page images, so bodies can be several megabytes.
pub static GENERATION_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(180))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .expect("Failed to create generation HTTP client")
});

#[inline]
pub fn completion_client() -> &'static Client {
    &COMPLETION_CLIENT
}

#[inline]
pub fn generation_client() -> &'static Client {
    &GENERATION_CLIENT
}
