//! Typed backend client for coursegate.
//!
//! Wraps the authenticated gateway with resource operations (users, levels,
//! sections), the signup/login/reset flows and the learner progress rules.

mod auth;
mod client;
mod error;
mod levels;
pub mod models;
pub mod progress;
mod sections;
mod users;
pub mod validation;

pub use auth::{
    CHANGE_PASSWORD_PATH, FORGOT_PASSWORD_PATH, SIGNIN_PATH, SIGNOUT_PATH, SIGNUP_PATH,
    VERIFY_FORGOT_PASSWORD_PATH, VERIFY_SIGNUP_PATH,
};
pub use client::Client;
pub use error::{ApiError, ApiResult};
pub use models::{
    Level, LevelRef, LevelUpdate, NewLevel, NewSection, NewUser, PendingSignup, Role, Section, SectionUpdate,
    SignupForm, User, UserUpdate,
};
pub use progress::{LevelProgress, ProgressOverview, SectionCompletion, SectionProgress};
pub use validation::{FieldError, ValidationErrors};
