//! Artifact addressing, content typing and cache policy.
//!
//! Published sites live in the object store under `sites/{siteId}/...`.
//! Everything in this module is a pure function of the request path, so the
//! same path always maps to the same key, content type and cache header.

use std::borrow::Cow;

use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::SiteId;

/// Root document of every site.
pub const INDEX_FILE: &str = "index.html";

/// Content type served when the extension is not in the table.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Normalize a request path into the path of a concrete file.
///
/// - each segment is percent-decoded before anything else looks at it
/// - `.` and empty segments are dropped, `..` pops a segment but never
///   climbs above the site root
/// - `/` and paths ending in `/` map to their `index.html`
/// - a final segment without an extension is a directory: `/about` becomes
///   `/about/index.html`
///
/// Returns `None` when a segment decodes to something that cannot be a
/// file name: invalid UTF-8, or a `/`, `\` or NUL byte.
pub fn normalize_path(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let mut segments: Vec<Cow<'_, str>> = Vec::new();
    for raw in path.split('/') {
        let segment = percent_decode_str(raw).decode_utf8().ok()?;
        if segment.contains(['/', '\\', '\0']) {
            return None;
        }
        match segment.as_ref() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let is_dir = path.ends_with('/') || segments.last().is_none_or(|last| extension(last).is_none());
    if is_dir {
        segments.push(Cow::Borrowed(INDEX_FILE));
    }

    Some(format!("/{}", segments.join("/")))
}

/// Object-store key for a site-relative request path, or `None` when the
/// path cannot name a file.
pub fn artifact_key(site: &SiteId, path: &str) -> Option<String> {
    normalize_path(path).map(|path| format!("sites/{}{path}", site.as_str()))
}

/// Key of the site's root page, used as the single-page-app fallback.
pub fn root_key(site: &SiteId) -> String {
    format!("sites/{}/{INDEX_FILE}", site.as_str())
}

/// Extension of the last path segment, without the dot.
fn extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Content type for a key, from its extension.
///
/// Total: anything outside the table is `text/plain`.
pub fn content_type(path: &str) -> &'static str {
    let Some(ext) = extension(path) else {
        return DEFAULT_CONTENT_TYPE;
    };

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// How long browsers and CDNs may keep a served artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// HTML documents change on every publish; keep them briefly.
    Html,
    /// Fingerprinted assets never change under the same name.
    Immutable,
}

impl CachePolicy {
    pub fn for_path(path: &str) -> Self {
        if content_type(path) == "text/html" { CachePolicy::Html } else { CachePolicy::Immutable }
    }
}

/// Max-age settings backing each [`CachePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub html_max_age_secs: u64,
    pub asset_max_age_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self { html_max_age_secs: 300, asset_max_age_secs: 31_536_000 }
    }
}

impl CacheTtls {
    /// `Cache-Control` header value for a policy.
    pub fn header_value(&self, policy: CachePolicy) -> String {
        match policy {
            CachePolicy::Html => format!("public, max-age={}", self.html_max_age_secs),
            CachePolicy::Immutable => format!("public, max-age={}, immutable", self.asset_max_age_secs),
        }
    }
}

/// A static file ready to be served.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Key the bytes were read from (after any fallback).
    pub key: String,
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub cache_policy: CachePolicy,
    pub etag: Option<String>,
}

impl Artifact {
    pub fn new(key: String, bytes: Bytes, etag: Option<String>) -> Self {
        let content_type = content_type(&key);
        let cache_policy = CachePolicy::for_path(&key);
        Self { key, bytes, content_type, cache_policy, etag }
    }
}
