//! Object store reached over plain HTTP.
//!
//! Works against any bucket exposed through an S3-compatible public
//! endpoint: `GET {base}/{key}`.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode, header};
use sitegate_core::{Error, ObjectStore, StoredObject};

use crate::http::join;

/// Everything except RFC 3986 unreserved characters is escaped in a key
/// segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    http: Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    /// URL of `key`, one escaped path segment per key segment.
    ///
    /// Dot and empty segments are refused: URL parsers resolve them (and
    /// their escaped forms) against the base, which would leave the bucket
    /// prefix the key was built under.
    fn object_url(&self, key: &str) -> Result<String, Error> {
        let mut encoded = Vec::new();
        for segment in key.split('/') {
            if matches!(segment, "" | "." | "..") {
                return Err(Error::InvalidInput(format!("object key has an empty or dot segment: {key}")));
            }
            encoded.push(utf8_percent_encode(segment, SEGMENT).to_string());
        }
        Ok(join(&self.base_url, &encoded.join("/")))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Error> {
        let response = self
            .http
            .get(self.object_url(key)?)
            .send()
            .await
            .map_err(|e| Error::Store(format!("network error: {e}")))?;

        match response.status() {
            StatusCode::OK => {}
            // Buckets without list permission answer 403 for missing keys.
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => return Ok(None),
            status => return Err(Error::Store(format!("status {} for {key}", status.as_u16()))),
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Store(format!("failed to read {key}: {e}")))?;

        tracing::debug!(key, bytes = bytes.len(), "object store hit");

        Ok(Some(StoredObject { bytes, etag }))
    }
}
