//! Published artifact lookup and the responses built from it.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use sitegate_core::{
    Artifact, CacheTtls, Error, ObjectStore, SiteId,
    artifact::{artifact_key, root_key},
};

/// Maps `(site, path)` onto object store keys.
pub struct ArtifactAdapter {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactAdapter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch the artifact for `path`, falling back to the site root for
    /// client-side routes.
    ///
    /// `Ok(None)` means neither the path nor the site root exists, or the
    /// path cannot name a file at all.
    pub async fn fetch(&self, site: &SiteId, path: &str) -> Result<Option<Artifact>, Error> {
        let Some(key) = artifact_key(site, path) else {
            tracing::debug!(site_id = %site, path, "path does not name a file");
            return Ok(None);
        };
        if let Some(object) = self.store.get(&key).await? {
            return Ok(Some(Artifact::new(key, object.bytes, object.etag)));
        }

        let root = root_key(site);
        if root == key {
            return Ok(None);
        }

        tracing::debug!(site_id = %site, %key, "artifact missing; falling back to site root");
        Ok(self
            .store
            .get(&root)
            .await?
            .map(|object| Artifact::new(root, object.bytes, object.etag)))
    }
}

/// Whether an `If-None-Match` header matches `etag`. Weak comparison.
fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    let ours = strip(etag);

    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|candidate| candidate.trim() == "*" || strip(candidate) == ours)
}

/// Build the visitor response for an artifact.
///
/// HEAD gets headers only; a matching `If-None-Match` gets `304`.
pub fn artifact_response(artifact: Artifact, ttls: &CacheTtls, method: &Method, request_headers: &HeaderMap) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type));
    if let Ok(value) = HeaderValue::from_str(&ttls.header_value(artifact.cache_policy)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Some(etag) = artifact.etag.as_deref()
        && let Ok(value) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, value);
    }

    if let Some(etag) = artifact.etag.as_deref()
        && etag_matches(request_headers, etag)
    {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(artifact.bytes.len()));
    let body = if *method == Method::HEAD { Body::empty() } else { Body::from(artifact.bytes) };
    (StatusCode::OK, headers, body).into_response()
}
