//! Per-request routing.
//!
//! Every request is classified by its hostname. Dashboard traffic streams
//! straight through to the dashboard origin. Tenant traffic is resolved to
//! a site and then either proxied to the dynamic origin (API paths, with a
//! buffered and size-capped body) or served from published artifacts.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use sitegate_client::ForwardRequest;
use sitegate_core::{HostClass, Hostname, PlatformDomains, SiteId};

use crate::artifacts::artifact_response;
use crate::error::EdgeError;
use crate::proxy::{forward_request, origin_response, stream_request};
use crate::state::EdgeState;

/// Where a hostname's traffic goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Tenant(HostClass),
}

pub fn route(domains: &PlatformDomains, host: &Hostname) -> Route {
    match domains.classify(host) {
        HostClass::Platform => Route::Dashboard,
        class => Route::Tenant(class),
    }
}

/// Host from the `Host` header, or the URI authority for HTTP/2.
fn request_host(request: &Request) -> Result<Hostname, EdgeError> {
    let raw = match request.headers().get(header::HOST) {
        Some(value) => value
            .to_str()
            .map_err(|_| EdgeError::InvalidHost("host header is not ascii".into()))?,
        None => request
            .uri()
            .authority()
            .map(|a| a.as_str())
            .ok_or_else(|| EdgeError::InvalidHost("missing host".into()))?,
    };
    Ok(Hostname::parse(raw)?)
}

/// Fallback handler for every request the edge receives.
pub async fn dispatch(State(state): State<Arc<EdgeState>>, request: Request) -> Response {
    match handle(&state, request).await {
        Ok(response) => response,
        Err(err) => {
            let mut response = err.into_response();
            if response.status() == StatusCode::NOT_FOUND
                && let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", state.not_found_max_age_secs))
            {
                response.headers_mut().insert(header::CACHE_CONTROL, value);
            }
            response
        }
    }
}

async fn handle(state: &EdgeState, request: Request) -> Result<Response, EdgeError> {
    let host = request_host(&request).inspect_err(|e| tracing::debug!(error = %e, "rejecting request"))?;

    match route(&state.domains, &host) {
        Route::Dashboard => {
            tracing::debug!(%host, path = request.uri().path(), "dashboard passthrough");
            proxy(state, &state.dashboard_origin, &host, stream_request(request)).await
        }
        Route::Tenant(_) => {
            let site = state.resolver.resolve(&host).await.ok_or(EdgeError::SiteNotFound)?;
            if state.is_api_path(request.uri().path()) {
                tracing::debug!(%host, site_id = %site, path = request.uri().path(), "api proxy");
                let forward = forward_request(request, state.max_body_bytes)
                    .await?
                    .with_site(&state.site_id_header, &site)?;
                proxy(state, &state.dynamic_origin, &host, forward).await
            } else {
                serve_static(state, &site, request).await
            }
        }
    }
}

async fn proxy(
    state: &EdgeState, origin: &str, host: &Hostname, forward: ForwardRequest,
) -> Result<Response, EdgeError> {
    let forward = forward.with_forwarded_host(host.as_str());
    let upstream = state.forwarder.forward(origin, forward).await.map_err(|e| {
        tracing::warn!(%host, origin, error = %e, "origin unreachable");
        EdgeError::from(e)
    })?;
    Ok(origin_response(upstream))
}

async fn serve_static(state: &EdgeState, site: &SiteId, request: Request) -> Result<Response, EdgeError> {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return Err(EdgeError::MethodNotAllowed);
    }

    let path = request.uri().path();
    let artifact = state.artifacts.fetch(site, path).await.map_err(|e| {
        tracing::error!(site_id = %site, path, error = %e, "object store lookup failed");
        EdgeError::from(e)
    })?;

    match artifact {
        Some(artifact) => {
            tracing::debug!(site_id = %site, path, key = %artifact.key, "serving artifact");
            Ok(artifact_response(artifact, &state.cache_ttls, method, request.headers()))
        }
        None => {
            tracing::debug!(site_id = %site, path, "no artifact for path");
            Err(EdgeError::PageNotFound)
        }
    }
}
