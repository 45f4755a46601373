//! Key-value cache port and its implementations.
//!
//! The resolver only needs `GET key` and `SET key value TTL`, so any store
//! with those two operations can sit behind [`KvCache`]:
//!
//! - [`MemoryKvCache`]: process-local map, for single-node deployments and tests
//! - [`SqliteKvCache`]: persistent SQLite table shared by workers on one host
//!
//! Keys are namespaced by hostname class (see [`CacheKey`]) so managed
//! subdomains and custom domains never collide.

pub mod connection;
pub mod memory;
pub mod migrations;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use crate::Error;

pub use connection::SqliteKvCache;
pub use memory::MemoryKvCache;

/// A key-value store with per-entry time-to-live.
///
/// Implementations must treat expired entries as absent.
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Look up a key; `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store a value under a key for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;
}

/// A namespaced cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `subdomain:{slug}`
    Subdomain(String),
    /// `domain:{hostname}`
    Domain(String),
    /// `negative:{hostname}`, remembered absence of a mapping.
    Negative(String),
}

impl CacheKey {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Subdomain(slug) => write!(f, "subdomain:{slug}"),
            CacheKey::Domain(host) => write!(f, "domain:{host}"),
            CacheKey::Negative(host) => write!(f, "negative:{host}"),
        }
    }
}
