//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been loaded from environment,
//! files, or defaults.

use crate::config::{AppConfig, ObjectStoreBackend};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, format!("unsupported scheme: {scheme}"))),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `platform_domain`, `listen_addr` or `user_agent` is empty
    /// - an origin URL is not an http(s) URL
    /// - `api_prefix` does not start with `/`
    /// - `site_id_header` is not a valid header name
    /// - `resolve_ttl_secs` is 0 or exceeds one day
    /// - `negative_ttl_secs` exceeds one day
    /// - `purge_interval_secs` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_body_bytes` is 0 or exceeds 50MB
    ///
    /// Returns `ConfigError::Missing` if the http object store has no URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(invalid("listen_addr", "must not be empty"));
        }
        if self.platform_domain.trim().is_empty() {
            return Err(invalid("platform_domain", "must not be empty"));
        }

        check_url("dashboard_origin", &self.dashboard_origin)?;
        check_url("origin_authority_url", &self.origin_authority_url)?;
        check_url("dynamic_origin_url", &self.dynamic_origin_url)?;

        if !self.api_prefix.starts_with('/') || self.api_prefix.len() < 2 {
            return Err(invalid("api_prefix", "must start with '/' and name a path"));
        }

        let header_ok = !self.site_id_header.is_empty()
            && self
                .site_id_header
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
        if !header_ok {
            return Err(invalid("site_id_header", "must be a valid HTTP header name"));
        }

        if self.resolve_ttl_secs == 0 {
            return Err(invalid("resolve_ttl_secs", "must be greater than 0"));
        }
        if self.resolve_ttl_secs > 86_400 {
            return Err(invalid("resolve_ttl_secs", "must not exceed one day (86400s)"));
        }
        if self.negative_ttl_secs > 86_400 {
            return Err(invalid("negative_ttl_secs", "must not exceed one day (86400s)"));
        }

        if self.purge_interval_secs == 0 {
            return Err(invalid("purge_interval_secs", "must be greater than 0"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes", "must be greater than 0"));
        }
        if self.max_body_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_body_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.object_store == ObjectStoreBackend::Http {
            let url = self.object_store_url.as_deref().ok_or_else(|| ConfigError::Missing {
                field: "object_store_url".into(),
                hint: "Set SITEGATE_OBJECT_STORE_URL when object_store = \"http\"".into(),
            })?;
            check_url("object_store_url", url)?;
        }

        if self.negative_ttl_secs > self.resolve_ttl_secs {
            tracing::warn!(
                negative_ttl_secs = self.negative_ttl_secs,
                resolve_ttl_secs = self.resolve_ttl_secs,
                "negative_ttl_secs exceeds resolve_ttl_secs; \
                 newly mapped domains will stay dark longer than reassigned ones"
            );
        }

        Ok(())
    }
}
