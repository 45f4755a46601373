//! Cache-aside hostname resolution.
//!
//! Lookup order: the managed-subdomain key, then the custom-domain key, then
//! the origin authority. Authority answers are written back with a fixed
//! TTL. The cache is an optimization only: when it fails, resolution falls
//! through to the authority; when the authority fails, resolution fails
//! closed.

use std::sync::Arc;
use std::time::Duration;

use sitegate_core::{CacheKey, HostClass, Hostname, KvCache, OriginAuthority, PlatformDomains, SiteId};

pub struct Resolver {
    domains: PlatformDomains,
    cache: Arc<dyn KvCache>,
    authority: Arc<dyn OriginAuthority>,
    ttl: Duration,
    negative_ttl: Option<Duration>,
}

impl Resolver {
    pub fn new(
        domains: PlatformDomains, cache: Arc<dyn KvCache>, authority: Arc<dyn OriginAuthority>, ttl: Duration,
    ) -> Self {
        Self { domains, cache, authority, ttl, negative_ttl: None }
    }

    /// Remember unmapped hostnames for `ttl`. `None` keeps every miss going
    /// to the authority.
    pub fn with_negative_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.negative_ttl = ttl;
        self
    }

    /// Resolve a hostname to its site, or `None` when no site answers to it.
    pub async fn resolve(&self, host: &Hostname) -> Option<SiteId> {
        let domain_key = CacheKey::Domain(host.as_str().to_string());
        let write_key = match self.domains.classify(host) {
            HostClass::ManagedSubdomain { slug } => {
                let key = CacheKey::Subdomain(slug);
                if let Some(site) = self.cached(&key).await {
                    return Some(site);
                }
                key
            }
            HostClass::Platform | HostClass::CustomDomain => domain_key.clone(),
        };

        if let Some(site) = self.cached(&domain_key).await {
            return Some(site);
        }

        let negative_key = CacheKey::Negative(host.as_str().to_string());
        if self.negative_ttl.is_some() && self.is_known_missing(&negative_key).await {
            tracing::debug!(%host, "negative cache hit");
            return None;
        }

        let site = match self.authority.resolve(host).await {
            Ok(Some(site)) => site,
            Ok(None) => {
                tracing::debug!(%host, "no site mapped to hostname");
                if let Some(ttl) = self.negative_ttl {
                    self.store(&negative_key, "1", ttl).await;
                }
                return None;
            }
            Err(e) => {
                tracing::warn!(%host, error = %e, "origin authority lookup failed");
                return None;
            }
        };

        self.store(&write_key, site.as_str(), self.ttl).await;
        tracing::debug!(%host, site_id = %site, key = %write_key, "resolved via origin authority");
        Some(site)
    }

    /// Cached site for `key`; cache failures and unusable values count as misses.
    async fn cached(&self, key: &CacheKey) -> Option<SiteId> {
        match self.cache.get(&key.render()).await {
            Ok(Some(value)) => match SiteId::new(value) {
                Ok(site) => Some(site),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "ignoring unusable cached value");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache lookup failed; treating as miss");
                None
            }
        }
    }

    async fn is_known_missing(&self, key: &CacheKey) -> bool {
        match self.cache.get(&key.render()).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache lookup failed; treating as miss");
                false
            }
        }
    }

    async fn store(&self, key: &CacheKey, value: &str, ttl: Duration) {
        if let Err(e) = self.cache.set(&key.render(), value, ttl).await {
            tracing::warn!(%key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sitegate_core::{Error, MemoryKvCache, StaticAuthority};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authority that counts calls and can be made to fail.
    #[derive(Default)]
    struct CountingAuthority {
        inner: StaticAuthority,
        calls: AtomicUsize,
        down: bool,
    }

    #[async_trait]
    impl OriginAuthority for CountingAuthority {
        async fn resolve(&self, host: &Hostname) -> Result<Option<SiteId>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down {
                return Err(Error::OriginUnavailable("connection refused".into()));
            }
            self.inner.resolve(host).await
        }
    }

    /// Cache that is never reachable.
    struct DeadCache;

    #[async_trait]
    impl KvCache for DeadCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
            Err(Error::CacheUnavailable("connection reset".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), Error> {
            Err(Error::CacheUnavailable("connection reset".into()))
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    fn domains() -> PlatformDomains {
        PlatformDomains::new("platform.com", &[])
    }

    fn host(raw: &str) -> Hostname {
        Hostname::parse(raw).unwrap()
    }

    fn site(raw: &str) -> SiteId {
        SiteId::new(raw).unwrap()
    }

    async fn authority_with(host: &str, id: &str) -> Arc<CountingAuthority> {
        let authority = CountingAuthority::default();
        authority.inner.insert(host, site(id)).await;
        Arc::new(authority)
    }

    #[tokio::test]
    async fn test_cold_subdomain_queries_authority_and_caches() {
        let cache = MemoryKvCache::new();
        let authority = authority_with("acme.platform.com", "site_42").await;
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority.clone(), TTL);

        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, Some(site("site_42")));
        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("subdomain:acme").await.unwrap().as_deref(), Some("site_42"));
        assert!(cache.get("domain:acme.platform.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warm_subdomain_skips_authority() {
        let cache = MemoryKvCache::new();
        cache.set("subdomain:acme", "site_42", TTL).await.unwrap();
        let authority = Arc::new(CountingAuthority::default());
        let resolver = Resolver::new(domains(), Arc::new(cache), authority.clone(), TTL);

        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, Some(site("site_42")));
        assert_eq!(authority.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_resolution_within_ttl_uses_cache() {
        let cache = MemoryKvCache::new();
        let authority = authority_with("shop.example.com", "site_7").await;
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority.clone(), TTL);

        for _ in 0..3 {
            assert_eq!(resolver.resolve(&host("shop.example.com")).await, Some(site("site_7")));
        }
        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("domain:shop.example.com").await.unwrap().as_deref(), Some("site_7"));
    }

    #[tokio::test]
    async fn test_expired_entry_goes_back_to_authority() {
        let cache = MemoryKvCache::new();
        let authority = authority_with("shop.example.com", "site_7").await;
        let resolver = Resolver::new(domains(), Arc::new(cache), authority.clone(), Duration::ZERO);

        resolver.resolve(&host("shop.example.com")).await;
        resolver.resolve(&host("shop.example.com")).await;
        assert_eq!(authority.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subdomain_falls_back_to_domain_key() {
        let cache = MemoryKvCache::new();
        cache.set("domain:acme.platform.com", "site_42", TTL).await.unwrap();
        let authority = Arc::new(CountingAuthority::default());
        let resolver = Resolver::new(domains(), Arc::new(cache), authority.clone(), TTL);

        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, Some(site("site_42")));
        assert_eq!(authority.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmapped_is_not_cached_by_default() {
        let cache = MemoryKvCache::new();
        let authority = Arc::new(CountingAuthority::default());
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority.clone(), TTL);

        assert_eq!(resolver.resolve(&host("www.acme-shop.com")).await, None);
        assert_eq!(resolver.resolve(&host("www.acme-shop.com")).await, None);
        assert_eq!(authority.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_negative_cache_when_enabled() {
        let cache = MemoryKvCache::new();
        let authority = Arc::new(CountingAuthority::default());
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority.clone(), TTL)
            .with_negative_ttl(Some(Duration::from_secs(30)));

        assert_eq!(resolver.resolve(&host("www.acme-shop.com")).await, None);
        assert_eq!(resolver.resolve(&host("www.acme-shop.com")).await, None);
        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("negative:www.acme-shop.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dead_cache_degrades_to_authority() {
        let authority = authority_with("acme.platform.com", "site_42").await;
        let resolver = Resolver::new(domains(), Arc::new(DeadCache), authority.clone(), TTL)
            .with_negative_ttl(Some(Duration::from_secs(30)));

        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, Some(site("site_42")));
        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, Some(site("site_42")));
        assert_eq!(authority.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authority_down_fails_closed() {
        let authority = Arc::new(CountingAuthority { down: true, ..Default::default() });
        let cache = MemoryKvCache::new();
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority, TTL)
            .with_negative_ttl(Some(Duration::from_secs(30)));

        assert_eq!(resolver.resolve(&host("acme.platform.com")).await, None);
        // An outage is not remembered as absence.
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_garbage_cache_value_is_a_miss() {
        let cache = MemoryKvCache::new();
        cache.set("domain:shop.example.com", "   ", TTL).await.unwrap();
        let authority = authority_with("shop.example.com", "site_7").await;
        let resolver = Resolver::new(domains(), Arc::new(cache.clone()), authority.clone(), TTL);

        assert_eq!(resolver.resolve(&host("shop.example.com")).await, Some(site("site_7")));
        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("domain:shop.example.com").await.unwrap().as_deref(), Some("site_7"));
    }

    #[tokio::test]
    async fn test_concurrent_first_resolutions_agree() {
        let cache = MemoryKvCache::new();
        let authority = authority_with("fresh.example.com", "site_9").await;
        let resolver = Arc::new(Resolver::new(domains(), Arc::new(cache.clone()), authority, TTL));

        let (h1, h2) = (host("fresh.example.com"), host("fresh.example.com"));
        let (a, b) = tokio::join!(resolver.resolve(&h1), resolver.resolve(&h2));

        assert_eq!(a, Some(site("site_9")));
        assert_eq!(a, b);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("domain:fresh.example.com").await.unwrap().as_deref(), Some("site_9"));
    }
}
