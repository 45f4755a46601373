//! Edge failures and the responses visitors see for them.

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

const SITE_NOT_FOUND_PAGE: &str = "<!doctype html>\n<html><head><title>Site not found</title></head>\
<body><h1>Site not found</h1><p>No site is published at this address.</p></body></html>\n";

const PAGE_NOT_FOUND_PAGE: &str = "<!doctype html>\n<html><head><title>Page not found</title></head>\
<body><h1>Page not found</h1><p>This page does not exist.</p></body></html>\n";

/// Every way a request can fail at the edge.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Missing or malformed `Host`.
    #[error("INVALID_HOST: {0}")]
    InvalidHost(String),

    /// The request body could not be read.
    #[error("BAD_REQUEST: {0}")]
    BadRequest(String),

    /// No site is mapped to the hostname.
    #[error("SITE_NOT_FOUND")]
    SiteNotFound,

    /// The site exists but has no artifact at the path.
    #[error("PAGE_NOT_FOUND")]
    PageNotFound,

    /// Static artifacts only answer GET and HEAD.
    #[error("METHOD_NOT_ALLOWED")]
    MethodNotAllowed,

    #[error("PAYLOAD_TOO_LARGE: limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// An origin or the object store could not be reached.
    #[error("BAD_GATEWAY: {0}")]
    BadGateway(String),

    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl EdgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EdgeError::InvalidHost(_) | EdgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EdgeError::SiteNotFound | EdgeError::PageNotFound => StatusCode::NOT_FOUND,
            EdgeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            EdgeError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            EdgeError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            EdgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sitegate_core::Error> for EdgeError {
    fn from(err: sitegate_core::Error) -> Self {
        use sitegate_core::Error;

        match err {
            Error::Store(msg) | Error::Upstream(msg) => EdgeError::BadGateway(msg),
            Error::OriginUnavailable(_) => EdgeError::SiteNotFound,
            other => EdgeError::Internal(other.to_string()),
        }
    }
}

impl From<sitegate_core::HostError> for EdgeError {
    fn from(err: sitegate_core::HostError) -> Self {
        EdgeError::InvalidHost(err.to_string())
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            EdgeError::SiteNotFound => (status, Html(SITE_NOT_FOUND_PAGE)).into_response(),
            EdgeError::PageNotFound => (status, Html(PAGE_NOT_FOUND_PAGE)).into_response(),
            EdgeError::MethodNotAllowed => {
                (status, [(header::ALLOW, "GET, HEAD")], "method not allowed\n").into_response()
            }
            EdgeError::PayloadTooLarge(limit) => {
                (status, format!("request body exceeds {limit} bytes\n")).into_response()
            }
            // Internal detail stays in the logs.
            EdgeError::BadGateway(_) => (status, "bad gateway\n").into_response(),
            EdgeError::Internal(_) => (status, "internal error\n").into_response(),
            EdgeError::InvalidHost(msg) => (status, format!("bad request: {msg}\n")).into_response(),
            EdgeError::BadRequest(_) => (status, "bad request\n").into_response(),
        }
    }
}
