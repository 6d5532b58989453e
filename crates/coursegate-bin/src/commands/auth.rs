//! Authentication commands.

use super::prompt;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use coursegate_api::{Client, SignupForm};
use coursegate_auth::{GateOutcome, SessionState};
use coursegate_storage::{StorageKeys, TokenKind};

/// Login with email and password.
pub async fn login(client: &Client, email: Option<String>, format: &OutputFormat) -> Result<()> {
    if let Some(user) = client.gate().user() {
        if client.tokens().credentials().is_some() {
            output::print_success(&format!("Already logged in as {}", user.email), None, format);
            return Ok(());
        }
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;

    let landing = client.login(&email, &password).await?;
    output::print_success(&format!("Logged in as {}", email), Some(landing), format);
    Ok(())
}

/// Logout and clear the session.
pub async fn logout(client: &Client, format: &OutputFormat) -> Result<()> {
    let next = client.logout().await;
    output::print_success("Logged out successfully", Some(next), format);
    Ok(())
}

/// Check authentication status.
pub async fn status(client: &Client, format: &OutputFormat) -> Result<()> {
    let tokens = client.tokens();
    let has_token = tokens.get(TokenKind::Access).is_some();

    if has_token {
        if let GateOutcome::Stale = client.gate().check("/").await? {
            bail!("Session check was superseded, try again");
        }
    }

    let state = client.gate().state();
    let session = client.gate().session();
    let logged_in = state == SessionState::Authenticated && session.user.is_some();
    let expires_at = tokens.expires_at(StorageKeys::ACCESS_TOKEN);

    match format {
        OutputFormat::Text => {
            match (&session.user, logged_in) {
                (Some(user), true) => {
                    println!("Auth:     logged in");
                    println!("User:     {} <{}>", user.name, user.email);
                    println!("Role:     {}", user.role);
                    if let Some(expires_at) = expires_at {
                        println!("Expires:  {}", expires_at.to_rfc3339());
                    }
                }
                _ => println!("Auth:     not logged in"),
            }
            if let Ok(pending) = client.pending_signup() {
                println!("Signup:   awaiting OTP for {}", pending.email);
            }
            if let Ok(email) = client.pending_reset_email() {
                println!("Reset:    awaiting OTP for {}", email);
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "logged_in": logged_in,
            "state": state,
            "user": session.user,
            "role": session.role,
            "expires_at": expires_at,
            "pending_signup": client.pending_signup().ok().map(|p| p.email),
            "pending_reset": client.pending_reset_email().ok(),
        })),
    }

    Ok(())
}

/// Register a new account. Password and confirmation are prompted.
pub async fn signup(client: &Client, mut form: SignupForm, format: &OutputFormat) -> Result<()> {
    form.password = rpassword::prompt_password("Password: ")?;
    form.confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let next = client.signup(&form).await?;
    output::print_success(
        &format!("Verification code sent to {}", form.email.trim()),
        Some(next),
        format,
    );
    Ok(())
}

pub async fn verify_signup(client: &Client, otp: Option<&str>, resend: bool, format: &OutputFormat) -> Result<()> {
    if resend {
        client.resend_signup_otp().await?;
        output::print_success("A new verification code was sent", None, format);
        return Ok(());
    }
    let Some(otp) = otp else {
        bail!("Enter the 6-digit code, or pass --resend");
    };

    let next = client.verify_signup(otp).await?;
    output::print_success("Account verified, you can log in now", Some(next), format);
    Ok(())
}

pub async fn forgot_password(client: &Client, email: &str, format: &OutputFormat) -> Result<()> {
    let next = client.forgot_password(email).await?;
    output::print_success(&format!("Reset code sent to {}", email), Some(next), format);
    Ok(())
}

pub async fn verify_reset(client: &Client, otp: Option<&str>, resend: bool, format: &OutputFormat) -> Result<()> {
    if resend {
        client.resend_forgot_otp().await?;
        output::print_success("A new reset code was sent", None, format);
        return Ok(());
    }
    let Some(otp) = otp else {
        bail!("Enter the 6-digit code, or pass --resend");
    };

    let next = client.verify_forgot_password(otp).await?;
    output::print_success("Code verified, choose a new password", Some(next), format);
    Ok(())
}

pub async fn change_password(client: &Client, format: &OutputFormat) -> Result<()> {
    let email = client.pending_reset_email()?;
    println!("Changing password for {}", email);

    let new_password = rpassword::prompt_password("New password: ")?;
    let confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let next = client.change_password(&new_password, &confirm_password).await?;
    output::print_success("Password changed", Some(next), format);
    Ok(())
}
