//! Edge server error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Backend unreachable or the response could not be read
    #[error("upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Response could not be assembled from the upstream parts
    #[error("response error: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = match &self {
            EdgeError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            EdgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EdgeError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(status = status.as_u16(), error = %self, "Proxy request failed");
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
