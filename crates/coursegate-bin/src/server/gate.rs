//! Route gate middleware.
//!
//! Applies the route policy to every page request from its cookies, before
//! any page content is served.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use coursegate_auth::route_policy::{self, RouteContext, RouteDecision};
use coursegate_storage::StorageKeys;
use std::collections::HashMap;
use tracing::debug;

/// Cookies of a request by name. Later duplicates win.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub async fn route_gate(request: Request, next: Next) -> Response {
    let cookies = parse_cookies(request.headers());
    let ctx = RouteContext {
        has_session: cookies
            .get(StorageKeys::ACCESS_TOKEN)
            .is_some_and(|token| !token.is_empty()),
        role: cookies.get(StorageKeys::USER_ROLE).map(String::as_str),
    };

    match route_policy::evaluate(request.uri().path(), ctx) {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::Redirect(target) => {
            debug!(path = %request.uri().path(), target, "Route gate redirect");
            Redirect::temporary(target).into_response()
        }
    }
}
