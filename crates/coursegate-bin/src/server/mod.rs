//! Edge server: route gate, API proxy and the front-end bundle.

mod error;
mod gate;
mod proxy;

pub use error::EdgeError;
use gate::route_gate;

use axum::extract::Request;
use axum::http::{HeaderValue, Uri};
use axum::middleware::{from_fn, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use coursegate_config::Config;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Shared state of the edge server.
pub struct EdgeState {
    /// Backend base URL without a trailing slash.
    pub api_base: String,
    pub http: reqwest::Client,
    pub static_dir: Option<PathBuf>,
}

impl EdgeState {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base: config.api_base().to_string(),
            http: reqwest::Client::new(),
            static_dir: config.static_dir.clone(),
        }
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Shown for allowed pages when no bundle directory is configured.
async fn placeholder(uri: Uri) -> impl IntoResponse {
    Html(format!(
        "<!doctype html><title>coursegate</title><p>coursegate edge server: {}</p>",
        uri.path()
    ))
}

async fn request_id(mut request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert("x-request-id", value.clone());
        let mut response = next.run(request).await;
        response.headers_mut().insert("x-request-id", value);
        response
    } else {
        next.run(request).await
    }
}

/// Page routes, gated by the route policy.
fn pages(static_dir: Option<&PathBuf>) -> Router {
    let pages = match static_dir {
        // Client-side routes fall back to the bundle's index page.
        Some(dir) => Router::new().fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => Router::new().fallback(placeholder),
    };
    pages.layer(from_fn(route_gate))
}

pub fn router(state: Arc<EdgeState>) -> Router {
    let pages = pages(state.static_dir.as_ref());

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/proxy/{*path}", any(proxy::forward))
        .fallback_service(pages)
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the edge server until interrupted.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let addr = config.listen_addr()?;
    let state = Arc::new(EdgeState::new(config));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %addr,
        api_base = %config.api_base(),
        static_dir = ?config.static_dir,
        "Edge server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
            }
        })
        .await?;

    info!("Edge server stopped");
    Ok(())
}
