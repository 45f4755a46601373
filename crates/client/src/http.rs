//! Shared reqwest client construction.
//!
//! Two flavours: lookup clients talk to services whose bodies we consume
//! ourselves, so they may negotiate compression; passthrough clients relay
//! bytes to visitors and must leave encodings and redirects untouched.

use std::time::Duration;

use reqwest::Client;
use sitegate_core::{AppConfig, Error};

/// Transport settings shared by every outbound client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent string (default: "sitegate/0.1")
    pub user_agent: String,

    /// Per-call timeout (default: 10s)
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { user_agent: "sitegate/0.1".to_string(), timeout: Duration::from_millis(10_000) }
    }
}

impl From<&AppConfig> for HttpConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// Client for origin-authority lookups and object-store reads.
pub fn lookup_client(config: &HttpConfig) -> Result<Client, Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(3))
        .use_rustls_tls()
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| Error::Upstream(format!("failed to build HTTP client: {e}")))
}

/// Client for verbatim request forwarding.
///
/// No decompression, no redirect following, no default user agent: what
/// the origin answers is what the visitor gets.
pub fn passthrough_client(config: &HttpConfig) -> Result<Client, Error> {
    Client::builder()
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::none())
        .use_rustls_tls()
        .gzip(false)
        .brotli(false)
        .deflate(false)
        .build()
        .map_err(|e| Error::Upstream(format!("failed to build HTTP client: {e}")))
}

/// Join a base URL and a path without `Url::join`'s last-segment replacement.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
