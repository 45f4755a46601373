//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITEGATE_*)
//! 2. TOML config file (if SITEGATE_CONFIG_FILE set, or passed explicitly)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::artifact::CacheTtls;
use crate::host::PlatformDomains;

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "SITEGATE_";

/// Which key-value cache backs the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

/// Which object store holds published artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    /// Files under `object_store_root`.
    Fs,
    /// HTTP GET against `object_store_url` (S3-compatible public endpoint).
    Http,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITEGATE_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the edge listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// The platform's own domain; managed subdomains hang off it.
    #[serde(default = "default_platform_domain")]
    pub platform_domain: String,

    /// Extra hostnames that serve the dashboard, besides the platform
    /// domain and its `www.`/`app.` aliases.
    #[serde(default)]
    pub dashboard_hosts: Vec<String>,

    /// Front-end origin for dashboard traffic.
    #[serde(default = "default_dashboard_origin")]
    pub dashboard_origin: String,

    /// Base URL of the hostname lookup service (`/sites/resolve` is appended).
    #[serde(default = "default_origin_authority_url")]
    pub origin_authority_url: String,

    /// Application origin for tenant API calls.
    #[serde(default = "default_dynamic_origin_url")]
    pub dynamic_origin_url: String,

    /// Path prefix routed to the dynamic origin.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Request header carrying the resolved site to the dynamic origin.
    #[serde(default = "default_site_id_header")]
    pub site_id_header: String,

    /// How long a resolved hostname stays cached, in seconds.
    #[serde(default = "default_resolve_ttl_secs")]
    pub resolve_ttl_secs: u64,

    /// How long an unmapped hostname is remembered, in seconds. 0 disables
    /// negative caching.
    #[serde(default)]
    pub negative_ttl_secs: u64,

    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackend,

    /// Path to the SQLite cache database (sqlite backend only).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interval between expired-entry sweeps, in seconds.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    #[serde(default = "default_object_store")]
    pub object_store: ObjectStoreBackend,

    /// Root directory for the fs object store.
    #[serde(default = "default_object_store_root")]
    pub object_store_root: PathBuf,

    /// Base URL for the http object store.
    #[serde(default)]
    pub object_store_url: Option<String>,

    #[serde(default = "default_html_max_age_secs")]
    pub html_max_age_secs: u64,

    #[serde(default = "default_asset_max_age_secs")]
    pub asset_max_age_secs: u64,

    /// `max-age` on 404 pages.
    #[serde(default = "default_not_found_max_age_secs")]
    pub not_found_max_age_secs: u64,

    /// User-Agent for outbound lookups and store reads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-call transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest request body forwarded to an origin.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_platform_domain() -> String {
    "platform.local".into()
}

fn default_dashboard_origin() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_origin_authority_url() -> String {
    "http://127.0.0.1:4000/api".into()
}

fn default_dynamic_origin_url() -> String {
    "http://127.0.0.1:4000".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_site_id_header() -> String {
    "x-site-id".into()
}

fn default_resolve_ttl_secs() -> u64 {
    300
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sitegate-cache.sqlite")
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_object_store() -> ObjectStoreBackend {
    ObjectStoreBackend::Fs
}

fn default_object_store_root() -> PathBuf {
    PathBuf::from("./published")
}

fn default_html_max_age_secs() -> u64 {
    300
}

fn default_asset_max_age_secs() -> u64 {
    31_536_000 // one year
}

fn default_not_found_max_age_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    "sitegate/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            platform_domain: default_platform_domain(),
            dashboard_hosts: Vec::new(),
            dashboard_origin: default_dashboard_origin(),
            origin_authority_url: default_origin_authority_url(),
            dynamic_origin_url: default_dynamic_origin_url(),
            api_prefix: default_api_prefix(),
            site_id_header: default_site_id_header(),
            resolve_ttl_secs: default_resolve_ttl_secs(),
            negative_ttl_secs: 0,
            cache_backend: default_cache_backend(),
            db_path: default_db_path(),
            purge_interval_secs: default_purge_interval_secs(),
            object_store: default_object_store(),
            object_store_root: default_object_store_root(),
            object_store_url: None,
            html_max_age_secs: default_html_max_age_secs(),
            asset_max_age_secs: default_asset_max_age_secs(),
            not_found_max_age_secs: default_not_found_max_age_secs(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn resolve_ttl(&self) -> Duration {
        Duration::from_secs(self.resolve_ttl_secs)
    }

    /// Negative-cache TTL, if negative caching is enabled.
    pub fn negative_ttl(&self) -> Option<Duration> {
        (self.negative_ttl_secs > 0).then(|| Duration::from_secs(self.negative_ttl_secs))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    pub fn platform_domains(&self) -> PlatformDomains {
        PlatformDomains::new(&self.platform_domain, &self.dashboard_hosts)
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls { html_max_age_secs: self.html_max_age_secs, asset_max_age_secs: self.asset_max_age_secs }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SITEGATE_`
    /// 2. TOML file from `config_file`, else from `SITEGATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let env_file = std::env::var(format!("{ENV_PREFIX}CONFIG_FILE")).ok().map(PathBuf::from);
        if let Some(path) = config_file.map(Path::to_path_buf).or(env_file) {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.site_id_header, "x-site-id");
        assert_eq!(config.resolve_ttl_secs, 300);
        assert_eq!(config.negative_ttl_secs, 0);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.object_store, ObjectStoreBackend::Fs);
        assert!(config.dashboard_hosts.is_empty());
        assert!(config.object_store_url.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.resolve_ttl(), Duration::from_secs(300));
        assert_eq!(config.negative_ttl(), None);

        let config = AppConfig { negative_ttl_secs: 30, ..Default::default() };
        assert_eq!(config.negative_ttl(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sitegate.toml",
                r#"
                platform_domain = "platform.com"
                cache_backend = "sqlite"
                resolve_ttl_secs = 120
                "#,
            )?;
            jail.set_env("SITEGATE_RESOLVE_TTL_SECS", "600");
            jail.set_env("SITEGATE_OBJECT_STORE", "http");
            jail.set_env("SITEGATE_OBJECT_STORE_URL", "https://bucket.example.net");

            let config = AppConfig::load(Some(Path::new("sitegate.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.platform_domain, "platform.com");
            assert_eq!(config.cache_backend, CacheBackend::Sqlite);
            assert_eq!(config.resolve_ttl_secs, 600);
            assert_eq!(config.object_store, ObjectStoreBackend::Http);
            assert_eq!(config.object_store_url.as_deref(), Some("https://bucket.example.net"));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SITEGATE_API_PREFIX", "api");
            let result = AppConfig::load(None);
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_prefix"));
            Ok(())
        });
    }

    #[test]
    fn test_platform_domains_from_config() {
        let config = AppConfig {
            platform_domain: "platform.com".into(),
            dashboard_hosts: vec!["admin.example.org".into()],
            ..Default::default()
        };
        let domains = config.platform_domains();
        assert_eq!(domains.domain(), "platform.com");
    }
}
