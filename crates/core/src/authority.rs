//! Origin authority port.
//!
//! The authoritative (and slower) hostname-to-site lookup, typically the
//! main application's own API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Error, Hostname, SiteId};

#[async_trait]
pub trait OriginAuthority: Send + Sync {
    /// Resolve a hostname to its site.
    ///
    /// `Ok(None)` means the authority answered and has no mapping; `Err`
    /// means it could not answer.
    async fn resolve(&self, host: &Hostname) -> Result<Option<SiteId>, Error>;
}

/// Fixed hostname table, for fixtures and tests.
#[derive(Clone, Default)]
pub struct StaticAuthority {
    mappings: Arc<RwLock<HashMap<String, SiteId>>>,
}

impl StaticAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, host: &str, site: SiteId) {
        self.mappings.write().await.insert(host.to_ascii_lowercase(), site);
    }

    pub async fn remove(&self, host: &str) -> Option<SiteId> {
        self.mappings.write().await.remove(&host.to_ascii_lowercase())
    }
}

#[async_trait]
impl OriginAuthority for StaticAuthority {
    async fn resolve(&self, host: &Hostname) -> Result<Option<SiteId>, Error> {
        Ok(self.mappings.read().await.get(host.as_str()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_authority() {
        let authority = StaticAuthority::new();
        authority.insert("Acme.Platform.com", SiteId::new("site_42").unwrap()).await;

        let host = Hostname::parse("acme.platform.com").unwrap();
        assert_eq!(authority.resolve(&host).await.unwrap(), Some(SiteId::new("site_42").unwrap()));

        authority.remove("acme.platform.com").await;
        assert_eq!(authority.resolve(&host).await.unwrap(), None);
    }
}
