mod common;

use chrono::{Duration, Utc};
use common::{client, spawn_backend, ADMIN_PASSWORD, LEARNER_PASSWORD, RESET_OTP, SIGNUP_OTP};
use coursegate_api::{ApiError, SignupForm};
use coursegate_auth::{AuthError, SessionState};
use coursegate_storage::{StorageKeys, TokenKind};
use std::sync::atomic::Ordering;

fn signup_form() -> SignupForm {
    SignupForm {
        name: "Mona Ali".into(),
        email: "mona@example.com".into(),
        age: "20".into(),
        phone_number: "01012345678".into(),
        gender: "female".into(),
        password: "Secret#123".into(),
        confirm_password: "Secret#123".into(),
    }
}

#[tokio::test]
async fn signup_keeps_pending_entry_until_otp_verified() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    let before = Utc::now();
    assert_eq!(client.signup(&signup_form()).await.unwrap(), "/signup/verify");

    let expiry = client.tokens().expires_at(StorageKeys::PENDING_SIGNUP).unwrap();
    assert!(expiry - before >= Duration::minutes(15));
    assert!(expiry - before < Duration::minutes(16));
    assert_eq!(client.pending_signup().unwrap().email, "mona@example.com");

    // A wrong code keeps the pending signup for another try.
    let err = client.verify_signup("000000").await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::Api { status: 400, .. })));
    assert!(client.pending_signup().is_ok());

    assert_eq!(client.verify_signup(SIGNUP_OTP).await.unwrap(), "/login");
    assert!(client.tokens().get_value(StorageKeys::PENDING_SIGNUP).is_none());
    assert!(matches!(client.pending_signup(), Err(ApiError::NoPendingSignup)));

    assert_eq!(client.login("mona@example.com", "Secret#123").await.unwrap(), "/");
}

#[tokio::test]
async fn verify_without_pending_signup_fails_locally() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    let err = client.verify_signup(SIGNUP_OTP).await.unwrap_err();
    assert!(matches!(err, ApiError::NoPendingSignup));
    assert_eq!(backend.state.calls(), 0);
}

#[tokio::test]
async fn invalid_input_never_reaches_backend() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    let mut form = signup_form();
    form.phone_number = "0101".into();
    form.confirm_password = "Other#123".into();
    match client.signup(&form).await.unwrap_err() {
        ApiError::Validation(errors) => {
            assert!(errors.get("phonenumber").is_some());
            assert_eq!(errors.get("confirmPassword"), Some("Passwords don't match"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(matches!(client.login("", "").await, Err(ApiError::Validation(_))));
    assert!(matches!(client.forgot_password("nope").await, Err(ApiError::Validation(_))));
    assert_eq!(backend.state.calls(), 0);
}

#[tokio::test]
async fn login_lands_by_role() {
    let backend = spawn_backend().await;

    let admin = client(&backend);
    assert_eq!(admin.login("admin@example.com", ADMIN_PASSWORD).await.unwrap(), "/admin/users");
    assert_eq!(admin.tokens().role().as_deref(), Some("admin"));
    assert_eq!(admin.gate().state(), SessionState::Authenticated);

    let learner = client(&backend);
    assert_eq!(learner.login("learner@example.com", LEARNER_PASSWORD).await.unwrap(), "/");
    assert_eq!(learner.tokens().get(TokenKind::Access).as_deref(), Some("tok-u1"));
}

#[tokio::test]
async fn wrong_password_does_not_refresh_or_sign_out() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    let err = client.login("learner@example.com", "Wrong#123").await.unwrap_err();
    match err {
        ApiError::Auth(AuthError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.gate().state(), SessionState::Unauthenticated);
    assert!(client.tokens().credentials().is_none());
}

#[tokio::test]
async fn password_reset_flow() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    assert_eq!(
        client.forgot_password("learner@example.com").await.unwrap(),
        "/forgot-password/verify"
    );
    assert_eq!(client.pending_reset_email().unwrap(), "learner@example.com");
    let expiry = client.tokens().expires_at(StorageKeys::FORGOT_EMAIL).unwrap();
    assert!(expiry <= Utc::now() + Duration::minutes(15));

    assert_eq!(client.verify_forgot_password(RESET_OTP).await.unwrap(), "/change-password");
    assert_eq!(client.change_password("Fresh#456", "Fresh#456").await.unwrap(), "/login");
    assert!(matches!(client.pending_reset_email(), Err(ApiError::NoPendingReset)));

    assert!(client.login("learner@example.com", LEARNER_PASSWORD).await.is_err());
    assert_eq!(client.login("learner@example.com", "Fresh#456").await.unwrap(), "/");
}

#[tokio::test]
async fn unknown_email_keeps_no_reset_state() {
    let backend = spawn_backend().await;
    let client = client(&backend);

    let err = client.forgot_password("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::Api { status: 404, .. })));
    assert!(matches!(client.pending_reset_email(), Err(ApiError::NoPendingReset)));
}

#[tokio::test]
async fn logout_clears_everything() {
    let backend = spawn_backend().await;
    let client = client(&backend);
    client.login("learner@example.com", LEARNER_PASSWORD).await.unwrap();

    assert_eq!(client.logout().await, "/login");

    assert_eq!(backend.state.signout_calls.load(Ordering::SeqCst), 1);
    assert!(client.tokens().credentials().is_none());
    assert!(client.tokens().role().is_none());
    assert!(client.gate().user().is_none());
    assert_eq!(client.gate().state(), SessionState::Unauthenticated);
}
