mod common;

use common::{logged_in_gateway, spawn_backend, token_store, CountingStore};
use coursegate_auth::{ApiRequest, AuthError, Gateway};
use coursegate_storage::{MemoryStore, TokenKind};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn valid_token_is_sent_without_refresh() {
    let backend = spawn_backend().await;
    let gateway = logged_in_gateway(&backend);

    let user: Value = gateway.send_json(&ApiRequest::get("/auth/me")).await.unwrap();

    assert_eq!(user["_id"], "u1");
    assert_eq!(backend.state.refresh_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("a2");
    backend.state.refresh_delay_ms.store(100, Ordering::SeqCst);
    let gateway = logged_in_gateway(&backend);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let gateway = gateway.clone();
        tasks.push(tokio::spawn(async move {
            gateway.send(&ApiRequest::get("/levels")).await
        }));
    }

    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert!(response.is_success(), "status {}", response.status);
    }

    assert_eq!(backend.state.refresh_calls(), 1);
    assert_eq!(gateway.tokens().get(TokenKind::Access).as_deref(), Some("a2"));
    // Backend did not rotate, so the old refresh token is kept.
    assert_eq!(gateway.tokens().get(TokenKind::Refresh).as_deref(), Some("r1"));
    assert!(!gateway.refresh_lock().is_locked());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_observers_never_suppress_a_refresh() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("a2");
    let gateway = logged_in_gateway(&backend);

    // Keeps polling the lock the way waiting requests do.
    let stop = Arc::new(AtomicBool::new(false));
    let observer = {
        let gateway = gateway.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                let _ = gateway.refresh_lock().is_locked();
                gateway.refresh_lock().wait_for_unlock().await;
                tokio::task::yield_now().await;
            }
        })
    };

    let rounds = 100;
    for round in 0..rounds {
        gateway.tokens().set("stale", "r1").unwrap();
        let response = gateway.send(&ApiRequest::get("/levels")).await.unwrap();
        assert!(response.is_success(), "round {} got {}", round, response.status);
    }

    stop.store(true, Ordering::SeqCst);
    observer.await.unwrap();

    assert_eq!(backend.state.refresh_calls(), rounds);
    assert_eq!(gateway.tokens().get(TokenKind::Access).as_deref(), Some("a2"));
}

#[tokio::test]
async fn rotated_refresh_token_is_stored() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("a2");
    *backend.state.rotated_refresh.lock().unwrap() = Some("r2".to_string());
    let gateway = logged_in_gateway(&backend);

    gateway.send_ok(&ApiRequest::get("/levels")).await.unwrap();

    assert_eq!(gateway.tokens().get(TokenKind::Access).as_deref(), Some("a2"));
    assert_eq!(gateway.tokens().get(TokenKind::Refresh).as_deref(), Some("r2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_failure_signs_out_once() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("revoked");
    backend.state.refresh_fails.store(true, Ordering::SeqCst);
    backend.state.refresh_delay_ms.store(100, Ordering::SeqCst);

    let store = Arc::new(CountingStore::default());
    let tokens = token_store(store.clone());
    tokens.set("a1", "r1").unwrap();
    let gateway = Arc::new(Gateway::new(&backend.base_url, tokens));

    let sign_outs = Arc::new(AtomicUsize::new(0));
    {
        let sign_outs = sign_outs.clone();
        gateway.on_sign_out(move || {
            sign_outs.fetch_add(1, Ordering::SeqCst);
        });
    }

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let gateway = gateway.clone();
        tasks.push(tokio::spawn(async move {
            gateway.send(&ApiRequest::get("/levels")).await
        }));
    }

    for task in tasks {
        let result = task.await.unwrap();
        assert!(matches!(result, Err(AuthError::SessionExpired)), "{:?}", result);
    }

    assert_eq!(backend.state.refresh_calls(), 1);
    assert_eq!(sign_outs.load(Ordering::SeqCst), 1);
    assert_eq!(store.access_removals.load(Ordering::SeqCst), 1);
    assert!(gateway.tokens().get(TokenKind::Access).is_none());
    assert!(gateway.tokens().get(TokenKind::Refresh).is_none());
}

#[tokio::test]
async fn missing_refresh_token_signs_out_without_calling_backend() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("other");

    let tokens = token_store(Arc::new(MemoryStore::new()));
    tokens.set("a1", "r1").unwrap();
    tokens.remove("refreshToken").unwrap();
    let gateway = Gateway::new(&backend.base_url, tokens);

    let sign_outs = Arc::new(AtomicUsize::new(0));
    {
        let sign_outs = sign_outs.clone();
        gateway.on_sign_out(move || {
            sign_outs.fetch_add(1, Ordering::SeqCst);
        });
    }

    let result = gateway.send(&ApiRequest::get("/levels")).await;

    assert!(matches!(result, Err(AuthError::SessionExpired)));
    assert_eq!(backend.state.refresh_calls(), 0);
    assert_eq!(sign_outs.load(Ordering::SeqCst), 1);
    assert!(gateway.tokens().get(TokenKind::Access).is_none());
}

#[tokio::test]
async fn request_is_retried_at_most_once() {
    let backend = spawn_backend().await;
    backend.state.set_valid_token("a-stale");
    let gateway = logged_in_gateway(&backend);

    let response = gateway
        .send(&ApiRequest::get("/always-unauthorized"))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(backend.state.refresh_calls(), 1);
    assert_eq!(backend.state.rejecting_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn requests_wait_for_in_flight_refresh() {
    let backend = spawn_backend().await;
    let gateway = logged_in_gateway(&backend);

    let guard = gateway.refresh_lock().acquire().await;

    let pending = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.send(&ApiRequest::get("/auth/me")).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert_eq!(backend.state.me_calls(), 0);

    // The "refresh" rotates the token before releasing.
    backend.state.set_valid_token("a9");
    gateway.tokens().set("a9", "r1").unwrap();
    drop(guard);

    let response = pending.await.unwrap().unwrap();
    assert!(response.is_success());
    assert_eq!(backend.state.me_calls(), 1);
    assert_eq!(backend.state.refresh_calls(), 0);
}

#[tokio::test]
async fn backend_error_message_is_surfaced() {
    let backend = spawn_backend().await;
    let gateway = logged_in_gateway(&backend);

    let err = gateway
        .send_json::<Value>(&ApiRequest::get("/levels/L404"))
        .await
        .unwrap_err();

    match err {
        AuthError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Level not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.state.refresh_calls(), 0);
}

#[tokio::test]
async fn anonymous_requests_skip_bearer_and_refresh() {
    let backend = spawn_backend().await;
    let gateway = logged_in_gateway(&backend);

    let response = gateway
        .send(&ApiRequest::get("/auth/me").anonymous())
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(backend.state.refresh_calls(), 0);
    assert_eq!(gateway.tokens().get(TokenKind::Access).as_deref(), Some("a1"));
}
