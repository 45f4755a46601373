//! Core types and shared functionality for sitegate.
//!
//! This crate provides:
//! - Hostname classification and site identifiers
//! - Artifact keys, content types and cache policy
//! - The key-value cache port (in-memory and SQLite implementations)
//! - The object store and origin authority ports
//! - Unified error types
//! - Configuration structures

pub mod artifact;
pub mod authority;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod site;
pub mod store;

pub use artifact::{Artifact, CachePolicy, CacheTtls};
pub use authority::{OriginAuthority, StaticAuthority};
pub use cache::{CacheKey, KvCache, MemoryKvCache, SqliteKvCache};
pub use config::{AppConfig, CacheBackend, ConfigError, ObjectStoreBackend};
pub use error::Error;
pub use host::{HostClass, HostError, Hostname, PlatformDomains};
pub use site::SiteId;
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore, StoredObject};
