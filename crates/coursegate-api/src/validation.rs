//! Form validation, run before any network call.

use crate::models::{LevelUpdate, NewLevel, NewSection, NewUser, PendingSignup, SectionUpdate, SignupForm, UserUpdate};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const SIGNUP_PHONE_LEN: usize = 11;
pub const OTP_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(email) {
        errors.add("email", "Invalid email address");
    }
}

fn check_gender(errors: &mut ValidationErrors, gender: &str) {
    if gender != "male" && gender != "female" {
        errors.add("gender", "Please select a gender");
    }
}

fn check_name(errors: &mut ValidationErrors, name: &str, min: usize, message: &str) {
    if name.trim().chars().count() < min {
        errors.add("name", message);
    }
}

/// Password strength rules shared by signup and password change.
fn check_password(errors: &mut ValidationErrors, field: &'static str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(field, "Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.add(field, "Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.add(field, "Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.add(field, "Password must contain at least one number");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        errors.add(field, "Password must contain at least one special character");
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

/// Validate a signup form and produce the payload sent to the backend.
pub fn validate_signup(form: &SignupForm) -> Result<PendingSignup, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_email(&mut errors, &form.email);
    check_name(&mut errors, &form.name, 3, "Invalid username");

    let age = form.age.trim().parse::<u32>().ok().filter(|age| *age > 12);
    if age.is_none() {
        errors.add("age", "Age must be a number greater than 12");
    }

    if form.phone_number.chars().count() != SIGNUP_PHONE_LEN {
        errors.add("phonenumber", "phone number must be 11 characters");
    }
    check_gender(&mut errors, &form.gender);
    check_password(&mut errors, "password", &form.password);
    if form.password != form.confirm_password {
        errors.add("confirmPassword", "Passwords don't match");
    }

    errors.into_result()?;

    Ok(PendingSignup {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        age: age.unwrap_or_default(),
        phone_number: form.phone_number.clone(),
        gender: form.gender.clone(),
    })
}

pub fn validate_email(email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, email);
    errors.into_result()
}

/// OTPs are six ASCII digits.
pub fn validate_otp(otp: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if otp.len() != OTP_LEN || !otp.chars().all(|c| c.is_ascii_digit()) {
        errors.add("otp", "OTP must be 6 digits");
    }
    errors.into_result()
}

pub fn validate_password_change(new_password: &str, confirm_password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_password(&mut errors, "newPassword", new_password);
    if confirm_password.is_empty() {
        errors.add("confirmPassword", "Confirm password is required");
    } else if new_password != confirm_password {
        errors.add("confirmPassword", "Passwords don't match");
    }
    errors.into_result()
}

// ==========================================
// Admin forms
// ==========================================

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, &user.name, 2, "Name must be at least 2 characters");
    check_email(&mut errors, &user.email);
    if user.age < 12 {
        errors.add("age", "Must be at least 12 years old");
    }
    check_gender(&mut errors, &user.gender);
    if user.phone_number.chars().count() < 10 {
        errors.add("phonenumber", "Phone number is required");
    }
    if user.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_user_update(update: &UserUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &update.name {
        check_name(&mut errors, name, 2, "Name must be at least 2 characters");
    }
    if let Some(email) = &update.email {
        check_email(&mut errors, email);
    }
    if update.age.is_some_and(|age| age < 12) {
        errors.add("age", "Must be at least 12 years old");
    }
    if let Some(gender) = &update.gender {
        check_gender(&mut errors, gender);
    }
    if update
        .phone_number
        .as_ref()
        .is_some_and(|phone| phone.chars().count() < 10)
    {
        errors.add("phonenumber", "Phone number is required");
    }
    errors.into_result()
}

pub fn validate_new_level(level: &NewLevel) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, &level.name, 2, "Name must be at least 2 characters");
    errors.into_result()
}

pub fn validate_level_update(update: &LevelUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &update.name {
        check_name(&mut errors, name, 2, "Name must be at least 2 characters");
    }
    if update.order == Some(0) {
        errors.add("order", "Order must be greater than 0");
    }
    errors.into_result()
}

pub fn validate_new_section(section: &NewSection) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, &section.name, 2, "Name must be at least 2 characters");
    if section.level.trim().is_empty() {
        errors.add("level", "Choose a level");
    }
    if section.video_id.trim().is_empty() {
        errors.add("videoId", "Upload a video");
    }
    errors.into_result()
}

pub fn validate_section_update(update: &SectionUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &update.name {
        check_name(&mut errors, name, 2, "Name must be at least 2 characters");
    }
    if update.order == Some(0) {
        errors.add("order", "Order must be greater than 0");
    }
    if update.video_id.as_deref().is_some_and(|v| v.trim().is_empty()) {
        errors.add("videoId", "Upload a video");
    }
    errors.into_result()
}
