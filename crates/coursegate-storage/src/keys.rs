//! Storage key constants.
//!
//! The names match the cookies the browser front-end used, so a jar written
//! by one can be read by the other.

/// Keys used in the persisted cookie jar.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer access token
    pub const ACCESS_TOKEN: &'static str = "accessToken";

    /// Refresh token
    pub const REFRESH_TOKEN: &'static str = "refreshToken";

    /// Plaintext role side-channel read by server-side routing
    pub const USER_ROLE: &'static str = "userRole";

    /// Pending signup payload awaiting OTP verification (JSON)
    pub const PENDING_SIGNUP: &'static str = "user";

    /// Email of an in-progress password reset
    pub const FORGOT_EMAIL: &'static str = "forgotEmail";

    /// Session snapshot used to rehydrate client state (JSON)
    pub const SESSION: &'static str = "session";
}
