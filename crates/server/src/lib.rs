//! The sitegate edge: hostname dispatch, site resolution, static serving
//! and API proxying over axum.

pub mod artifacts;
pub mod dispatch;
pub mod error;
pub mod proxy;
pub mod resolver;
pub mod state;

use std::sync::Arc;

use axum::Router;

pub use artifacts::ArtifactAdapter;
pub use dispatch::{Route, route};
pub use error::EdgeError;
pub use resolver::Resolver;
pub use state::{CacheHandle, EdgeState, Ports};

/// Build the edge router. Every path and method lands in the dispatcher.
pub fn build_router(state: Arc<EdgeState>) -> Router {
    Router::new().fallback(dispatch::dispatch).with_state(state)
}
