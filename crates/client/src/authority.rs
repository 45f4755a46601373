//! HTTP client for the origin authority.
//!
//! `GET {base}/sites/resolve?hostname=H` answers `200 {"siteId": "..."}`
//! for a mapped hostname and `404` for an unmapped one. Anything else means
//! the authority could not answer.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sitegate_core::{Error, Hostname, OriginAuthority, SiteId};

use crate::http::join;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    #[serde(default)]
    site_id: Option<String>,
}

/// Origin authority reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOriginAuthority {
    http: Client,
    endpoint: String,
}

impl HttpOriginAuthority {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, endpoint: join(base_url, "sites/resolve") }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl OriginAuthority for HttpOriginAuthority {
    async fn resolve(&self, host: &Hostname) -> Result<Option<SiteId>, Error> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("hostname", host.as_str())])
            .send()
            .await
            .map_err(|e| Error::OriginUnavailable(format!("network error: {e}")))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            status => return Err(Error::OriginUnavailable(format!("status {}", status.as_u16()))),
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| Error::OriginUnavailable(format!("malformed resolve response: {e}")))?;

        match body.site_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => SiteId::new(id).map(Some),
            None => Ok(None),
        }
    }
}
