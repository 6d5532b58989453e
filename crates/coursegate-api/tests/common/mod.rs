#![allow(dead_code)]

use axum::extract::{Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use coursegate_api::Client;
use coursegate_storage::{MemoryStore, TokenStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SIGNUP_OTP: &str = "123456";
pub const RESET_OTP: &str = "654321";
pub const ADMIN_PASSWORD: &str = "Admin#123";
pub const LEARNER_PASSWORD: &str = "Learn#123";

type Reply = (StatusCode, Json<Value>);

/// Records held by the mock backend. Users keep their password.
#[derive(Default)]
pub struct Db {
    pub users: Vec<Value>,
    pub levels: Vec<Value>,
    pub sections: Vec<Value>,
    pub pending_signups: Vec<Value>,
    next_id: usize,
}

impl Db {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<usize> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())?
            .strip_prefix("Bearer tok-")?;
        self.users.iter().position(|u| u["_id"] == token)
    }

    fn completed_section(&self, id: &Value) -> Option<Value> {
        self.sections
            .iter()
            .find(|s| s["_id"] == *id)
            .map(|s| json!({ "_id": s["_id"], "order": s["order"], "level": s["level"] }))
    }

    fn completed_level(&self, id: &Value) -> Option<Value> {
        self.levels
            .iter()
            .find(|l| l["_id"] == *id)
            .map(|l| json!({ "_id": l["_id"], "order": l["order"] }))
    }
}

pub struct MockState {
    pub db: Mutex<Db>,
    pub calls: AtomicUsize,
    pub signout_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl MockState {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user(&self, email: &str) -> Option<Value> {
        self.db
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u["email"] == email)
            .cloned()
    }
}

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

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn message(status: StatusCode, text: &str) -> Reply {
    reply(status, json!({ "message": text }))
}

fn public(user: &Value) -> Value {
    let mut user = user.clone();
    if let Some(fields) = user.as_object_mut() {
        fields.remove("password");
    }
    user
}

fn user_record(id: &str, email: &str, password: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": "Seeded",
        "email": email,
        "password": password,
        "role": role,
        "age": 30,
        "phonenumber": "01000000000",
        "gender": "male",
        "completedLevels": [],
        "completedSections": []
    })
}

async fn count_calls(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

// ==========================================
// Auth
// ==========================================

async fn signin(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let db = state.db.lock().unwrap();
    match db
        .users
        .iter()
        .find(|u| u["email"] == body["email"] && u["password"] == body["password"])
    {
        Some(user) => {
            let id = user["_id"].as_str().unwrap_or_default();
            reply(
                StatusCode::OK,
                json!({
                    "accessToken": format!("tok-{}", id),
                    "refreshToken": format!("ref-{}", id),
                    "user": public(user)
                }),
            )
        }
        None => message(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn refresh(State(state): State<Arc<MockState>>) -> Reply {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    message(StatusCode::UNAUTHORIZED, "Invalid refresh token")
}

async fn signout(State(state): State<Arc<MockState>>) -> Reply {
    state.signout_calls.fetch_add(1, Ordering::SeqCst);
    message(StatusCode::OK, "Signed out")
}

async fn signup(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let mut db = state.db.lock().unwrap();
    if db.users.iter().any(|u| u["email"] == body["email"]) {
        return message(StatusCode::CONFLICT, "Email already registered");
    }
    db.pending_signups.retain(|p| p["email"] != body["email"]);
    db.pending_signups.push(body);
    message(StatusCode::CREATED, "OTP sent")
}

async fn verify_signup(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    if body["otp"] != SIGNUP_OTP {
        return message(StatusCode::BAD_REQUEST, "Invalid OTP");
    }
    let mut db = state.db.lock().unwrap();
    let Some(index) = db.pending_signups.iter().position(|p| p["email"] == body["email"]) else {
        return message(StatusCode::BAD_REQUEST, "No pending registration");
    };
    let pending = db.pending_signups.remove(index);
    let id = db.next_id("user");
    db.users.push(json!({
        "_id": id,
        "name": pending["name"],
        "email": pending["email"],
        "password": pending["password"],
        "role": "user",
        "age": pending["age"],
        "phonenumber": pending["phonenumber"],
        "gender": pending["gender"],
        "completedLevels": [],
        "completedSections": []
    }));
    message(StatusCode::CREATED, "Registered")
}

async fn forgot_password(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let db = state.db.lock().unwrap();
    if db.users.iter().any(|u| u["email"] == body["email"]) {
        message(StatusCode::OK, "OTP sent")
    } else {
        message(StatusCode::NOT_FOUND, "User not found")
    }
}

async fn verify_forgot_password(Json(body): Json<Value>) -> Reply {
    if body["otp"] == RESET_OTP {
        message(StatusCode::OK, "OTP verified")
    } else {
        message(StatusCode::BAD_REQUEST, "Invalid OTP")
    }
}

async fn change_password(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let mut db = state.db.lock().unwrap();
    match db.users.iter_mut().find(|u| u["email"] == body["email"]) {
        Some(user) => {
            user["password"] = body["newPassword"].clone();
            message(StatusCode::OK, "Password changed")
        }
        None => message(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    let db = state.db.lock().unwrap();
    match db.user_for(&headers) {
        Some(index) => reply(StatusCode::OK, public(&db.users[index])),
        None => message(StatusCode::UNAUTHORIZED, "Unauthorized"),
    }
}

// ==========================================
// Users
// ==========================================

async fn list_users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    let db = state.db.lock().unwrap();
    let Some(index) = db.user_for(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    if db.users[index]["role"] != "admin" {
        return message(StatusCode::FORBIDDEN, "Forbidden resource");
    }
    reply(StatusCode::OK, Value::Array(db.users.iter().map(public).collect()))
}

async fn update_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = state.db.lock().unwrap();
    if db.user_for(&headers).is_none() {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let Some(index) = db.users.iter().position(|u| u["_id"] == id) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };

    let sections = body["completedSections"].as_array().map(|ids| {
        ids.iter()
            .filter_map(|id| db.completed_section(id))
            .collect::<Vec<_>>()
    });
    let levels = body["completedLevels"].as_array().map(|ids| {
        ids.iter()
            .filter_map(|id| db.completed_level(id))
            .collect::<Vec<_>>()
    });

    let user = &mut db.users[index];
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            if key != "completedSections" && key != "completedLevels" {
                user[key] = value.clone();
            }
        }
    }
    if let Some(sections) = sections {
        user["completedSections"] = Value::Array(sections);
    }
    if let Some(levels) = levels {
        user["completedLevels"] = Value::Array(levels);
    }
    reply(StatusCode::OK, public(user))
}

async fn delete_user(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Reply {
    let mut db = state.db.lock().unwrap();
    db.users.retain(|u| u["_id"] != id);
    message(StatusCode::OK, "User deleted")
}

// ==========================================
// Levels and sections
// ==========================================

async fn list_levels(State(state): State<Arc<MockState>>) -> Reply {
    let db = state.db.lock().unwrap();
    reply(StatusCode::OK, Value::Array(db.levels.clone()))
}

async fn create_level(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let mut db = state.db.lock().unwrap();
    let mut level = body;
    level["_id"] = Value::String(db.next_id("level"));
    db.levels.push(level.clone());
    reply(StatusCode::CREATED, level)
}

async fn get_level(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    match db.levels.iter().find(|l| l["_id"] == id) {
        Some(level) => reply(StatusCode::OK, level.clone()),
        None => message(StatusCode::NOT_FOUND, "Level not found"),
    }
}

async fn delete_level(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Reply {
    let mut db = state.db.lock().unwrap();
    let before = db.levels.len();
    db.levels.retain(|l| l["_id"] != id);
    if db.levels.len() == before {
        return message(StatusCode::NOT_FOUND, "Level not found");
    }
    db.sections.retain(|s| s["level"] != id);
    message(StatusCode::OK, "Level deleted")
}

async fn list_sections(State(state): State<Arc<MockState>>, Query(query): Query<HashMap<String, String>>) -> Reply {
    let db = state.db.lock().unwrap();
    let level_id = query.get("levelId").map(String::as_str).unwrap_or_default();
    let sections = db
        .sections
        .iter()
        .filter(|s| level_id.is_empty() || s["level"] == level_id)
        .cloned()
        .collect();
    reply(StatusCode::OK, Value::Array(sections))
}

async fn create_section(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let mut db = state.db.lock().unwrap();
    let mut section = body;
    section["_id"] = Value::String(db.next_id("section"));
    db.sections.push(section.clone());
    reply(StatusCode::CREATED, section)
}

async fn get_section(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    match db.sections.iter().find(|s| s["_id"] == id) {
        Some(section) => reply(StatusCode::OK, section.clone()),
        None => message(StatusCode::NOT_FOUND, "Section not found"),
    }
}

fn seed() -> Db {
    let section = |id: &str, order: u32, level: &str| {
        json!({ "_id": id, "name": format!("Part {}", order), "videoId": format!("vid/{}", id), "order": order, "level": level })
    };
    Db {
        users: vec![
            user_record("admin1", "admin@example.com", ADMIN_PASSWORD, "admin"),
            user_record("u1", "learner@example.com", LEARNER_PASSWORD, "user"),
        ],
        levels: vec![
            json!({ "_id": "L1", "name": "Basics", "order": 1 }),
            json!({ "_id": "L2", "name": "Grammar", "order": 2 }),
        ],
        sections: vec![section("S1", 1, "L1"), section("S2", 2, "L1"), section("S3", 1, "L2")],
        pending_signups: Vec::new(),
        next_id: 0,
    }
}

/// Start a seeded backend: an admin, a learner, two levels and three
/// sections (two in `L1`, one in `L2`).
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(MockState {
        db: Mutex::new(seed()),
        calls: AtomicUsize::new(0),
        signout_calls: AtomicUsize::new(0),
        refresh_calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", post(refresh))
        .route("/auth/signout", post(signout))
        .route("/auth/signup", post(signup))
        .route("/auth/verify-registration", post(verify_signup))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/verify-forgot-password", post(verify_forgot_password))
        .route("/auth/change-password", post(change_password))
        .route("/auth/me", get(me))
        .route("/users", get(list_users))
        .route("/users/{id}", axum::routing::patch(update_user).delete(delete_user))
        .route("/levels", get(list_levels).post(create_level))
        .route("/levels/{id}", get(get_level).delete(delete_level))
        .route("/sections", get(list_sections).post(create_section))
        .route("/sections/{id}", get(get_section))
        .layer(from_fn_with_state(state.clone(), count_calls))
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

/// Client over a fresh memory store.
pub fn client(backend: &MockBackend) -> Client {
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()), 7 * 24 * 3600, 900);
    Client::connect(&backend.base_url, tokens)
}
