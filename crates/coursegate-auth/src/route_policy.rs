//! Per-navigation route authorization.
//!
//! Pure and stateless: the decision depends only on the path, whether a
//! session cookie is present, and the role hint.

use crate::navigation;

/// Exact public pages. A path matches when it equals one of these or
/// continues with `/`.
pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/signup",
    "/forgot-password",
    "/change-password",
];

/// Framework, static and API prefixes that always pass.
pub const PUBLIC_PREFIXES: &[&str] = &["/_next", "/static", "/api"];

/// Static asset extensions served without a session.
pub const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "svg", "gif", "webp", "avif", "ico", "bmp", "ttf", "woff", "woff2",
];

const ADMIN_PREFIX: &str = "/admin";

/// Result of evaluating the policy for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

impl RouteDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

/// What the router knows about the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteContext<'a> {
    /// A non-empty access token cookie is present.
    pub has_session: bool,
    /// Value of the role side-channel.
    pub role: Option<&'a str>,
}

/// `prefix` itself or `prefix/...`.
fn matches_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn has_asset_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ASSET_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| matches_segment(path, p))
        || PUBLIC_PREFIXES.iter().any(|p| matches_segment(path, p))
        || has_asset_extension(path)
}

pub fn is_admin_path(path: &str) -> bool {
    matches_segment(path, ADMIN_PREFIX)
}

/// Decide whether a navigation may render.
pub fn evaluate(path: &str, ctx: RouteContext<'_>) -> RouteDecision {
    if is_public_path(path) {
        return RouteDecision::Allow;
    }

    if !ctx.has_session {
        return RouteDecision::Redirect(navigation::LOGIN);
    }

    if is_admin_path(path) && ctx.role != Some("admin") {
        return RouteDecision::Redirect(navigation::HOME);
    }

    RouteDecision::Allow
}
