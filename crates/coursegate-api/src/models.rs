//! Backend records and request payloads.

use serde::{Deserialize, Serialize};

pub use coursegate_auth::{CompletedLevel, CompletedSection, Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: u32,
}

/// A section's level: a bare id or the populated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelRef {
    Id(String),
    Embedded(Level),
}

impl LevelRef {
    pub fn id(&self) -> &str {
        match self {
            LevelRef::Id(id) => id,
            LevelRef::Embedded(level) => &level.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    pub order: u32,
    pub level: LevelRef,
}

// ==========================================
// Auth payloads
// ==========================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Signup form as entered; validated into a [`PendingSignup`].
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub age: String,
    pub phone_number: String,
    pub gender: String,
    pub password: String,
    pub confirm_password: String,
}

/// Signup payload kept until the OTP is verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: u32,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    pub gender: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifySignupPayload<'a> {
    #[serde(flatten)]
    pub signup: &'a PendingSignup,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailPayload<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailOtpPayload<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePasswordPayload<'a> {
    pub email: &'a str,
    pub new_password: &'a str,
}

// ==========================================
// Admin payloads
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: u32,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    pub gender: String,
    pub role: Role,
}

/// Partial user update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "phonenumber", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_levels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_sections: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLevel {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateLevelPayload<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub order: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSection {
    pub name: String,
    pub description: Option<String>,
    pub video_id: String,
    pub level: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSectionPayload<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub video_id: &'a str,
    pub level: &'a str,
    pub order: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteSectionPayload {
    pub order: u32,
}
