//! Outbound HTTP adapters for sitegate.
//!
//! This crate implements the core ports over reqwest: the origin authority
//! lookup, an HTTP object store, and the forwarder used for dashboard
//! passthrough and tenant API proxying.

pub mod authority;
pub mod forward;
pub mod http;
pub mod store;

pub use authority::HttpOriginAuthority;
pub use forward::{ForwardRequest, Forwarder, strip_hop_by_hop};
pub use http::{HttpConfig, lookup_client, passthrough_client};
pub use store::HttpObjectStore;
