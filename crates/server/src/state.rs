//! Shared request state and its assembly from configuration.

use std::sync::Arc;

use axum::http::HeaderName;
use sitegate_client::{Forwarder, HttpConfig, HttpObjectStore, HttpOriginAuthority, lookup_client, passthrough_client};
use sitegate_core::{
    AppConfig, CacheBackend, CacheTtls, Error, FsObjectStore, KvCache, MemoryKvCache, ObjectStore, ObjectStoreBackend,
    OriginAuthority, PlatformDomains, SqliteKvCache,
};

use crate::artifacts::ArtifactAdapter;
use crate::resolver::Resolver;

/// The configured cache backend, kept concrete so it can be swept.
#[derive(Clone)]
pub enum CacheHandle {
    Memory(MemoryKvCache),
    Sqlite(SqliteKvCache),
}

impl CacheHandle {
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        match config.cache_backend {
            CacheBackend::Memory => Ok(CacheHandle::Memory(MemoryKvCache::new())),
            CacheBackend::Sqlite => Ok(CacheHandle::Sqlite(SqliteKvCache::open(&config.db_path).await?)),
        }
    }

    pub fn kv(&self) -> Arc<dyn KvCache> {
        match self {
            CacheHandle::Memory(cache) => Arc::new(cache.clone()),
            CacheHandle::Sqlite(cache) => Arc::new(cache.clone()),
        }
    }

    /// Drop expired entries, returning how many went.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        match self {
            CacheHandle::Memory(cache) => Ok(cache.cleanup_expired().await as u64),
            CacheHandle::Sqlite(cache) => cache.purge_expired().await,
        }
    }
}

/// The outbound ports the edge depends on.
pub struct Ports {
    pub cache: Arc<dyn KvCache>,
    pub authority: Arc<dyn OriginAuthority>,
    pub store: Arc<dyn ObjectStore>,
}

impl Ports {
    /// HTTP authority plus the configured object store backend.
    pub fn from_config(config: &AppConfig, cache: &CacheHandle) -> Result<Self, Error> {
        let lookup = lookup_client(&HttpConfig::from(config))?;
        let authority = Arc::new(HttpOriginAuthority::new(lookup.clone(), &config.origin_authority_url));

        let store: Arc<dyn ObjectStore> = match config.object_store {
            ObjectStoreBackend::Fs => Arc::new(FsObjectStore::new(&config.object_store_root)),
            ObjectStoreBackend::Http => {
                let url = config
                    .object_store_url
                    .as_deref()
                    .ok_or_else(|| Error::InvalidInput("object_store_url is required for the http store".into()))?;
                Arc::new(HttpObjectStore::new(lookup, url))
            }
        };

        Ok(Self { cache: cache.kv(), authority, store })
    }
}

/// Everything a request handler needs, shared behind an `Arc`.
pub struct EdgeState {
    pub domains: PlatformDomains,
    pub resolver: Resolver,
    pub artifacts: ArtifactAdapter,
    pub forwarder: Forwarder,
    pub dashboard_origin: String,
    pub dynamic_origin: String,
    pub api_prefix: String,
    pub site_id_header: HeaderName,
    pub cache_ttls: CacheTtls,
    pub not_found_max_age_secs: u64,
    pub max_body_bytes: usize,
}

impl EdgeState {
    pub fn new(config: &AppConfig, ports: Ports) -> Result<Self, Error> {
        let site_id_header = HeaderName::from_bytes(config.site_id_header.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("site_id_header: {e}")))?;
        let forwarder = Forwarder::new(passthrough_client(&HttpConfig::from(config))?);

        let resolver = Resolver::new(config.platform_domains(), ports.cache, ports.authority, config.resolve_ttl())
            .with_negative_ttl(config.negative_ttl());

        Ok(Self {
            domains: config.platform_domains(),
            resolver,
            artifacts: ArtifactAdapter::new(ports.store),
            forwarder,
            dashboard_origin: config.dashboard_origin.clone(),
            dynamic_origin: config.dynamic_origin_url.clone(),
            api_prefix: config.api_prefix.clone(),
            site_id_header,
            cache_ttls: config.cache_ttls(),
            not_found_max_age_secs: config.not_found_max_age_secs,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Whether `path` belongs to the dynamic origin. `/api` matches the
    /// `/api/` prefix; `/apiary` does not.
    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.api_prefix) || path == self.api_prefix.trim_end_matches('/')
    }
}
