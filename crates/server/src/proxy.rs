//! Conversion between axum requests/responses and the forwarder.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{Uri, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use sitegate_client::{ForwardRequest, strip_hop_by_hop};

use crate::error::EdgeError;

/// Buffer an inbound request into a [`ForwardRequest`], enforcing `limit`
/// on the body.
pub async fn forward_request(request: Request, limit: usize) -> Result<ForwardRequest, EdgeError> {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(EdgeError::PayloadTooLarge(limit));
    }

    let body = axum::body::to_bytes(body, limit).await.map_err(|e| read_error(&e, limit))?;

    Ok(ForwardRequest {
        method: parts.method,
        path_and_query: path_and_query(&parts.uri),
        headers: parts.headers,
        body: body.into(),
    })
}

/// Hand an inbound request to the forwarder with its body still streaming.
/// No size limit applies.
pub fn stream_request(request: Request) -> ForwardRequest {
    let (parts, body) = request.into_parts();

    // Bodiless requests must not turn into chunked ones upstream.
    let body = if body.size_hint().exact() == Some(0) {
        reqwest::Body::from(Bytes::new())
    } else {
        reqwest::Body::wrap_stream(body.into_data_stream())
    };

    ForwardRequest { method: parts.method, path_and_query: path_and_query(&parts.uri), headers: parts.headers, body }
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Only hitting the limit is a 413; anything else means the visitor's
/// upload broke off.
fn read_error(err: &axum::Error, limit: usize) -> EdgeError {
    if std::error::Error::source(err).is_some_and(|source| source.is::<LengthLimitError>()) {
        EdgeError::PayloadTooLarge(limit)
    } else {
        tracing::debug!(error = %err, "failed to read request body");
        EdgeError::BadRequest(format!("failed to read request body: {err}"))
    }
}

/// Stream an origin response back to the visitor untouched, minus
/// hop-by-hop headers.
pub fn origin_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
