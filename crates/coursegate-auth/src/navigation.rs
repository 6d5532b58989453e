//! Navigation targets produced by the gate and by post-action flows.

pub const LOGIN: &str = "/login";
pub const HOME: &str = "/";
pub const SIGNUP_VERIFY: &str = "/signup/verify";
pub const FORGOT_PASSWORD_VERIFY: &str = "/forgot-password/verify";
pub const CHANGE_PASSWORD: &str = "/change-password";
pub const ADMIN_USERS: &str = "/admin/users";
pub const ADMIN_LEVELS: &str = "/admin/levels";
pub const ADMIN_SECTIONS: &str = "/admin/sections";

/// Learner view of a level.
pub fn level(level_id: &str) -> String {
    format!("/levels/{}", level_id)
}

/// Learner view of a section inside a level.
pub fn section(level_id: &str, section_id: &str) -> String {
    format!("/levels/{}/sections/{}", level_id, section_id)
}
