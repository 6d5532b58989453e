#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use coursegate_auth::Gateway;
use coursegate_storage::{KeyValueStore, MemoryStore, StorageKeys, StorageResult, StoredEntry, TokenStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Mutable behavior and call counters of the mock backend.
pub struct MockState {
    pub valid_token: Mutex<String>,
    pub expected_refresh: Mutex<String>,
    pub next_access: Mutex<String>,
    pub rotated_refresh: Mutex<Option<String>>,
    pub user: Mutex<Value>,
    pub refresh_fails: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub me_delay_ms: AtomicU64,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub rejecting_calls: AtomicUsize,
}

impl MockState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }
}

/// In-process backend bound to an ephemeral local port.
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn user_json(id: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": "Learner",
        "email": format!("{}@example.com", id),
        "role": role,
        "completedLevels": [],
        "completedSections": []
    })
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized" })),
    )
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.me_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let user = state.user.lock().unwrap().clone();
    (StatusCode::OK, Json(user))
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let expected = state.expected_refresh.lock().unwrap().clone();
    let presented = body.get("refreshToken").and_then(Value::as_str);
    if state.refresh_fails.load(Ordering::SeqCst) || presented != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid refresh token" })),
        );
    }

    let access = state.next_access.lock().unwrap().clone();
    state.set_valid_token(&access);

    let mut response = json!({
        "accessToken": access,
        "user": state.user.lock().unwrap().clone()
    });
    if let Some(rotated) = state.rotated_refresh.lock().unwrap().clone() {
        response["refreshToken"] = Value::String(rotated);
    }
    (StatusCode::OK, Json(response))
}

async fn levels(State(state): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!([])))
}

async fn level_missing() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Level not found" })),
    )
}

async fn always_rejects(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.rejecting_calls.fetch_add(1, Ordering::SeqCst);
    unauthorized()
}

/// Start a backend that accepts `a1` now, and hands out `a2` for refresh
/// token `r1`.
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(MockState {
        valid_token: Mutex::new("a1".to_string()),
        expected_refresh: Mutex::new("r1".to_string()),
        next_access: Mutex::new("a2".to_string()),
        rotated_refresh: Mutex::new(None),
        user: Mutex::new(user_json("u1", "user")),
        refresh_fails: AtomicBool::new(false),
        refresh_delay_ms: AtomicU64::new(0),
        me_delay_ms: AtomicU64::new(0),
        refresh_calls: AtomicUsize::new(0),
        me_calls: AtomicUsize::new(0),
        rejecting_calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .route("/levels", get(levels))
        .route("/levels/{id}", get(level_missing))
        .route("/always-unauthorized", get(always_rejects))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        state,
        handle,
    }
}

/// Memory backend that counts credential removals.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub access_removals: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        self.inner.get_entry(key)
    }

    fn set_entries(&self, entries: &[(&str, StoredEntry)]) -> StorageResult<()> {
        self.inner.set_entries(entries)
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        if key == StorageKeys::ACCESS_TOKEN {
            self.access_removals.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove(key)
    }
}

pub fn token_store(backend: Arc<dyn KeyValueStore>) -> TokenStore {
    TokenStore::new(backend, 7 * 24 * 3600, 900)
}

/// Gateway over a fresh memory store holding `a1`/`r1`.
pub fn logged_in_gateway(backend: &MockBackend) -> Arc<Gateway> {
    let tokens = token_store(Arc::new(MemoryStore::new()));
    tokens.set("a1", "r1").unwrap();
    Arc::new(Gateway::new(&backend.base_url, tokens))
}
