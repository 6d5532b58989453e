//! Login, signup, password reset and logout flows.
//!
//! Each flow returns the page the caller should navigate to next.

use crate::models::{
    ChangePasswordPayload, EmailOtpPayload, EmailPayload, LoginPayload, LoginResponse, PendingSignup,
    SignupForm, VerifySignupPayload,
};
use crate::validation::{validate_email, validate_login, validate_otp, validate_password_change, validate_signup};
use crate::{ApiError, ApiResult, Client};
use coursegate_auth::{navigation, ApiRequest};
use coursegate_storage::StorageKeys;
use tracing::{debug, info, warn};

pub const SIGNIN_PATH: &str = "/auth/signin";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const VERIFY_SIGNUP_PATH: &str = "/auth/verify-registration";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const VERIFY_FORGOT_PASSWORD_PATH: &str = "/auth/verify-forgot-password";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
pub const SIGNOUT_PATH: &str = "/auth/signout";

impl Client {
    /// Sign in and establish the session. Admins land on the user list.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<&'static str> {
        validate_login(email, password)?;

        self.gate().begin_login()?;
        let request = ApiRequest::post(SIGNIN_PATH)
            .json(&LoginPayload { email, password })?
            .anonymous();

        match self.gateway().send_json::<LoginResponse>(&request).await {
            Ok(response) => {
                let landing = self.gate().complete_login(
                    &response.access_token,
                    &response.refresh_token,
                    response.user,
                )?;
                Ok(landing)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.gate().fail_login();
                Err(e.into())
            }
        }
    }

    /// Register and keep the payload until the emailed OTP is verified.
    pub async fn signup(&self, form: &SignupForm) -> ApiResult<&'static str> {
        let pending = validate_signup(form)?;

        self.post_signup(&pending).await?;
        self.tokens()
            .put_pending_json(StorageKeys::PENDING_SIGNUP, &pending)?;

        info!(email = %pending.email, "Signup started, awaiting OTP");
        Ok(navigation::SIGNUP_VERIFY)
    }

    pub async fn resend_signup_otp(&self) -> ApiResult<()> {
        let pending = self.pending_signup()?;
        self.post_signup(&pending).await?;
        debug!(email = %pending.email, "Signup OTP resent");
        Ok(())
    }

    pub async fn verify_signup(&self, otp: &str) -> ApiResult<&'static str> {
        validate_otp(otp)?;
        let pending = self.pending_signup()?;

        let request = ApiRequest::post(VERIFY_SIGNUP_PATH)
            .json(&VerifySignupPayload {
                signup: &pending,
                otp,
            })?
            .anonymous();
        self.gateway().send_ok(&request).await?;

        self.tokens().remove(StorageKeys::PENDING_SIGNUP)?;
        info!(email = %pending.email, "Signup verified");
        Ok(navigation::LOGIN)
    }

    /// Pending signup, if one was started in the last 15 minutes.
    pub fn pending_signup(&self) -> ApiResult<PendingSignup> {
        self.tokens()
            .get_json(StorageKeys::PENDING_SIGNUP)
            .ok_or(ApiError::NoPendingSignup)
    }

    async fn post_signup(&self, pending: &PendingSignup) -> ApiResult<()> {
        let request = ApiRequest::post(SIGNUP_PATH).json(pending)?.anonymous();
        self.gateway().send_ok(&request).await?;
        Ok(())
    }

    // ==========================================
    // Password reset
    // ==========================================

    pub async fn forgot_password(&self, email: &str) -> ApiResult<&'static str> {
        validate_email(email)?;

        self.post_forgot_password(email).await?;
        self.tokens().put_pending(StorageKeys::FORGOT_EMAIL, email)?;

        info!(email, "Password reset requested");
        Ok(navigation::FORGOT_PASSWORD_VERIFY)
    }

    pub async fn resend_forgot_otp(&self) -> ApiResult<()> {
        let email = self.pending_reset_email()?;
        self.post_forgot_password(&email).await
    }

    pub async fn verify_forgot_password(&self, otp: &str) -> ApiResult<&'static str> {
        validate_otp(otp)?;
        let email = self.pending_reset_email()?;

        let request = ApiRequest::post(VERIFY_FORGOT_PASSWORD_PATH)
            .json(&EmailOtpPayload { email: &email, otp })?
            .anonymous();
        self.gateway().send_ok(&request).await?;

        Ok(navigation::CHANGE_PASSWORD)
    }

    pub async fn change_password(&self, new_password: &str, confirm_password: &str) -> ApiResult<&'static str> {
        validate_password_change(new_password, confirm_password)?;
        let email = self.pending_reset_email()?;

        let request = ApiRequest::post(CHANGE_PASSWORD_PATH)
            .json(&ChangePasswordPayload {
                email: &email,
                new_password,
            })?
            .anonymous();
        self.gateway().send_ok(&request).await?;

        self.tokens().remove(StorageKeys::FORGOT_EMAIL)?;
        info!(email = %email, "Password changed");
        Ok(navigation::LOGIN)
    }

    pub fn pending_reset_email(&self) -> ApiResult<String> {
        self.tokens()
            .get_value(StorageKeys::FORGOT_EMAIL)
            .ok_or(ApiError::NoPendingReset)
    }

    async fn post_forgot_password(&self, email: &str) -> ApiResult<()> {
        let request = ApiRequest::post(FORGOT_PASSWORD_PATH)
            .json(&EmailPayload { email })?
            .anonymous();
        self.gateway().send_ok(&request).await?;
        Ok(())
    }

    // ==========================================
    // Logout
    // ==========================================

    /// Tell the backend (best effort), then drop all local session state.
    pub async fn logout(&self) -> &'static str {
        if let Err(e) = self.gateway().send_ok(&ApiRequest::post(SIGNOUT_PATH)).await {
            debug!(error = %e, "Backend signout failed, clearing locally");
        }
        self.gate().logout()
    }
}
