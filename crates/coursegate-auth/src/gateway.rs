//! Authenticated request gateway with single-flight token refresh.
//!
//! Every backend call goes through [`Gateway::send`]. A `401` triggers at
//! most one refresh call per expired token process-wide; concurrent callers
//! that hit `401` queue on the refresh lock, see the rotated token and retry
//! once with it.

use crate::refresh_lock::RefreshLock;
use crate::{AuthError, AuthResult};
use coursegate_storage::{TokenKind, TokenStore};
use parking_lot::Mutex;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Backend refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Called when the gateway gives up on the session.
pub type SignOutCallback = Arc<dyn Fn() + Send + Sync>;

/// A backend call, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Send without a bearer token and without refresh handling.
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> AuthResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Mark as a credential-less call (signin, signup, OTP flows).
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// Status and decoded body of a backend response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// JSON body; `Null` when empty, a JSON string when not JSON.
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Backend error message, read from the JSON `message` field when present.
    pub fn error_message(&self) -> String {
        match self.body.get("message") {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Array(messages)) => {
                let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
                if !joined.is_empty() {
                    return joined.join(", ");
                }
            }
            _ => {}
        }
        if let Value::String(text) = &self.body {
            if !text.is_empty() {
                return text.clone();
            }
        }
        self.status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    }

    /// Turn a non-success status into [`AuthError::Api`].
    pub fn error_for_status(self) -> AuthResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::Api {
                status: self.status.as_u16(),
                message: self.error_message(),
            })
        }
    }

    /// Decode the body of a successful response.
    pub fn json<T: DeserializeOwned>(self) -> AuthResult<T> {
        let response = self.error_for_status()?;
        Ok(serde_json::from_value(response.body)?)
    }
}

/// Refresh endpoint response. The refresh token is only rotated by some
/// backends.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Backend client that owns bearer attachment and token refresh.
pub struct Gateway {
    base_url: String,
    http: Client,
    tokens: TokenStore,
    refresh_lock: RefreshLock,
    sign_out_callbacks: Mutex<Vec<SignOutCallback>>,
}

impl Gateway {
    pub fn new(base_url: &str, tokens: TokenStore) -> Self {
        Self::with_client(base_url, tokens, Client::new())
    }

    pub fn with_client(base_url: &str, tokens: TokenStore, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
            refresh_lock: RefreshLock::new(),
            sign_out_callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn refresh_lock(&self) -> &RefreshLock {
        &self.refresh_lock
    }

    /// Register a callback fired once per terminal refresh failure.
    pub fn on_sign_out(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.sign_out_callbacks.lock().push(Arc::new(callback));
    }

    /// Send a request, refreshing the access token once on `401`.
    ///
    /// Non-`401` failures are returned as responses; use
    /// [`Gateway::send_json`] or [`ApiResponse::error_for_status`] to turn
    /// them into errors.
    pub async fn send(&self, request: &ApiRequest) -> AuthResult<ApiResponse> {
        if request.anonymous {
            return self.execute(request, None).await;
        }

        if self.refresh_lock.is_locked() {
            debug!(path = %request.path, "Refresh in flight, waiting before request");
            self.refresh_lock.wait_for_unlock().await;
        }

        let used_token = self.tokens.get(TokenKind::Access);
        let response = self.execute(request, used_token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %request.path, "Request unauthorized");

        // Late arrivals find the token already rotated and skip the call.
        {
            let _guard = self.refresh_lock.acquire().await;
            self.refresh_cycle(used_token.as_deref()).await?;
        }

        let Some(token) = self.tokens.get(TokenKind::Access) else {
            return Err(AuthError::SessionExpired);
        };

        debug!(path = %request.path, "Retrying request after refresh");
        self.execute(request, Some(&token)).await
    }

    /// Send and decode a successful JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> AuthResult<T> {
        self.send(request).await?.json()
    }

    /// Send and discard the body of a successful response.
    pub async fn send_ok(&self, request: &ApiRequest) -> AuthResult<()> {
        self.send(request).await?.error_for_status()?;
        Ok(())
    }

    /// Run one refresh cycle. The caller holds the refresh lock.
    async fn refresh_cycle(&self, used_token: Option<&str>) -> AuthResult<()> {
        let current = self.tokens.get(TokenKind::Access);
        if current.is_some() && current.as_deref() != used_token {
            debug!("Access token already rotated by an earlier refresh");
            return Ok(());
        }

        let Some(refresh_token) = self.tokens.get(TokenKind::Refresh) else {
            // Nothing left to clear means an earlier cycle already signed out.
            if current.is_some() {
                warn!("Unauthorized and no refresh token available, signing out");
                self.expire_session();
            }
            return Err(AuthError::SessionExpired);
        };

        match self.request_refresh(&refresh_token).await {
            Ok(refreshed) => {
                let next_refresh = refreshed.refresh_token.as_deref().unwrap_or(&refresh_token);
                if let Err(e) = self.tokens.set(&refreshed.access_token, next_refresh) {
                    warn!(error = %e, "Could not store refreshed tokens, signing out");
                    self.expire_session();
                    return Err(AuthError::SessionExpired);
                }
                info!(
                    rotated_refresh = refreshed.refresh_token.is_some(),
                    "Access token refreshed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, signing out");
                self.expire_session();
                Err(AuthError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> AuthResult<RefreshResponse> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))?;
        self.execute(&request, None).await?.json()
    }

    fn expire_session(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear credentials");
        }

        let callbacks: Vec<SignOutCallback> = self.sign_out_callbacks.lock().clone();
        for callback in callbacks {
            callback();
        }
    }

    async fn execute(&self, request: &ApiRequest, access_token: Option<&str>) -> AuthResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => Value::String(text),
            }
        };

        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "API response"
        );

        Ok(ApiResponse { status, body })
    }
}
