//! Verbatim HTTP forwarding to an origin.
//!
//! Used for both dashboard passthrough and tenant API calls. Method, path,
//! query, end-to-end headers and body go through untouched; hop-by-hop
//! headers and `Host` are dropped so the connection to the origin is
//! negotiated on its own terms.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, Method, Response};
use sitegate_core::{Error, SiteId};

use crate::http::join;

/// Header carrying the visitor-facing hostname to the origin.
pub const FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Headers that describe a single connection rather than the message.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any the `Connection` header names.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// A request on its way to an origin.
///
/// The body is either buffered or a stream read from the visitor while the
/// origin receives it.
#[derive(Debug)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path plus optional `?query`, as received.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ForwardRequest {
    /// Attach the resolved site, replacing any value the client sent.
    pub fn with_site(mut self, header_name: &HeaderName, site: &SiteId) -> Result<Self, Error> {
        let value = HeaderValue::from_str(site.as_str())
            .map_err(|e| Error::InvalidInput(format!("site id is not a valid header value: {e}")))?;
        self.headers.insert(header_name.clone(), value);
        Ok(self)
    }

    /// Record the visitor-facing hostname.
    pub fn with_forwarded_host(mut self, host: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(host) {
            self.headers.insert(FORWARDED_HOST, value);
        }
        self
    }
}

/// Sends [`ForwardRequest`]s to an origin base URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: Client,
}

impl Forwarder {
    /// `http` should come from [`crate::http::passthrough_client`].
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Forward a request to `origin`, returning the origin's response as-is.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` when the origin cannot be reached or the
    /// transport times out. HTTP error statuses are not errors.
    pub async fn forward(&self, origin: &str, request: ForwardRequest) -> Result<Response, Error> {
        let ForwardRequest { method, path_and_query, mut headers, body } = request;
        let url = join(origin, &path_and_query);

        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        // Streams keep the visitor's declared length; buffered bodies get theirs from reqwest.
        if body.as_bytes().is_some() {
            headers.remove(header::CONTENT_LENGTH);
        }

        tracing::debug!(%method, %url, "forwarding request");

        self.http
            .request(method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Upstream(format!("timed out waiting for {origin}"))
                } else {
                    Error::Upstream(format!("network error: {e}"))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpConfig, passthrough_client};
    use axum::{
        Json, Router,
        body::Bytes as AxumBytes,
        http::{HeaderMap as AxumHeaders, Method as AxumMethod, StatusCode, Uri},
        response::IntoResponse,
    };

    async fn echo(method: AxumMethod, uri: Uri, headers: AxumHeaders, body: AxumBytes) -> axum::response::Response {
        if uri.path() == "/teapot" {
            return (StatusCode::IM_A_TEAPOT, [("x-origin", "yes")], "short and stout").into_response();
        }
        let headers: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_str().unwrap_or_default().to_string())))
            .collect();
        Json(serde_json::json!({
            "method": method.to_string(),
            "uri": uri.to_string(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        }))
        .into_response()
    }

    async fn spawn_origin() -> String {
        let app = Router::new().fallback(echo);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{port}")
    }

    fn forwarder() -> Forwarder {
        Forwarder::new(passthrough_client(&HttpConfig::default()).unwrap())
    }

    fn request(method: Method, path: &str, body: &'static str) -> ForwardRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("acme.platform.com"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-hop"));
        headers.insert("x-hop", HeaderValue::from_static("1"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        ForwardRequest { method, path_and_query: path.to_string(), headers, body: body.into() }
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = request(Method::GET, "/", "").headers;
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        strip_hop_by_hop(&mut headers);

        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(headers.get("x-hop").is_none());
        assert_eq!(headers.get("x-custom").unwrap(), "kept");
    }

    #[test]
    fn test_with_site_replaces_spoofed_value() {
        let name = HeaderName::from_static("x-site-id");
        let mut req = request(Method::GET, "/", "");
        req.headers.insert(name.clone(), HeaderValue::from_static("someone_else"));

        let req = req.with_site(&name, &SiteId::new("site_42").unwrap()).unwrap();
        let values: Vec<HeaderValue> = req.headers.get_all(&name).iter().cloned().collect();
        assert_eq!(values, vec![HeaderValue::from_static("site_42")]);
    }

    #[tokio::test]
    async fn test_forward_preserves_method_path_body_headers() {
        let origin = spawn_origin().await;
        let req = request(Method::POST, "/api/orders?page=2", r#"{"qty":1}"#)
            .with_site(&HeaderName::from_static("x-site-id"), &SiteId::new("site_42").unwrap())
            .unwrap()
            .with_forwarded_host("acme.platform.com");

        let response = forwarder().forward(&origin, req).await.unwrap();
        assert_eq!(response.status(), 200);

        let echoed: serde_json::Value = response.json().await.unwrap();
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["uri"], "/api/orders?page=2");
        assert_eq!(echoed["body"], r#"{"qty":1}"#);
        assert_eq!(echoed["headers"]["x-site-id"], "site_42");
        assert_eq!(echoed["headers"]["x-custom"], "kept");
        assert_eq!(echoed["headers"]["content-type"], "application/json");
        assert_eq!(echoed["headers"]["x-forwarded-host"], "acme.platform.com");
        assert!(echoed["headers"].get("x-hop").is_none());
        assert_ne!(echoed["headers"]["host"], "acme.platform.com");
    }

    #[tokio::test]
    async fn test_forward_passes_error_status_through() {
        let origin = spawn_origin().await;
        let response = forwarder().forward(&origin, request(Method::GET, "/teapot", "")).await.unwrap();
        assert_eq!(response.status(), 418);
        assert_eq!(response.headers().get("x-origin").unwrap(), "yes");
        assert_eq!(response.text().await.unwrap(), "short and stout");
    }

    #[tokio::test]
    async fn test_forward_unreachable_origin() {
        let result = forwarder().forward("http://127.0.0.1:9", request(Method::GET, "/", "")).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn test_forward_streamed_body() {
        let origin = spawn_origin().await;
        let payload = "x".repeat(64 * 1024);
        let mut req = request(Method::POST, "/upload", "");
        req.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(payload.len()));
        req.body = Body::wrap_stream(axum::body::Body::from(payload.clone()).into_data_stream());

        let response = forwarder().forward(&origin, req).await.unwrap();
        assert_eq!(response.status(), 200);

        let echoed: serde_json::Value = response.json().await.unwrap();
        assert_eq!(echoed["body"].as_str().unwrap().len(), payload.len());
        assert_eq!(echoed["headers"]["content-length"], payload.len().to_string());
    }

    #[tokio::test]
    async fn test_forward_buffered_body_drops_stale_length() {
        let origin = spawn_origin().await;
        let mut req = request(Method::POST, "/api/orders", r#"{"qty":1}"#);
        req.headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("9999"));

        let response = forwarder().forward(&origin, req).await.unwrap();
        let echoed: serde_json::Value = response.json().await.unwrap();
        assert_eq!(echoed["body"], r#"{"qty":1}"#);
        assert_eq!(echoed["headers"]["content-length"], "9");
    }
}
