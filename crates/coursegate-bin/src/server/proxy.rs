//! Same-origin proxy to the backend API.
//!
//! Forwards method, path, query, body, `cookie` and `authorization`; returns
//! status, body, content type and every `set-cookie` unchanged.

use super::{EdgeError, EdgeState};
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::Response;
use std::sync::Arc;
use tracing::debug;

const FORWARDED_REQUEST_HEADERS: [header::HeaderName; 3] =
    [header::COOKIE, header::AUTHORIZATION, header::CONTENT_TYPE];

pub async fn forward(
    State(state): State<Arc<EdgeState>>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, EdgeError> {
    let mut url = format!("{}/{}", state.api_base, path);
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }

    let mut upstream = state.http.request(method.clone(), &url);
    for name in FORWARDED_REQUEST_HEADERS {
        for value in headers.get_all(&name) {
            upstream = upstream.header(name.clone(), value.clone());
        }
    }
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    let response = upstream.send().await?;
    let status = response.status();
    debug!(method = %method, path = %path, status = status.as_u16(), "Proxied request");

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }
    for cookie in response.headers().get_all(header::SET_COOKIE) {
        builder = builder.header(header::SET_COOKIE, cookie.clone());
    }

    let bytes = response.bytes().await?;
    Ok(builder.body(Body::from(bytes))?)
}
