//! CLI command implementations.

mod admin;
mod auth;
mod content;
mod progress;

pub use admin::{users_delete, users_list};
pub use auth::{
    change_password, forgot_password, login, logout, signup, status, verify_reset, verify_signup,
};
pub use content::{levels_delete, levels_list, levels_show, sections_list};
pub use progress::{progress_complete, progress_show};

use anyhow::{bail, Result};
use coursegate_api::{Client, User};
use coursegate_auth::route_policy::{self, RouteContext, RouteDecision};
use coursegate_auth::{navigation, GateOutcome};
use coursegate_config::{Config, Paths};
use coursegate_storage::{FileStore, TokenKind, TokenStore};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

/// Build a client over the on-disk cookie jar.
pub fn open_client(paths: &Paths, config: &Config) -> Result<Client> {
    paths.ensure_dirs()?;
    let jar = FileStore::open(paths.cookie_jar_file())?;
    let tokens = TokenStore::new(
        Arc::new(jar),
        config.credential_ttl_secs,
        config.pending_flow_ttl_secs,
    );
    Ok(Client::connect(config.api_base(), tokens))
}

/// Run the session check and route policy for `path` before a command
/// touches protected data.
pub async fn ensure_access(client: &Client, path: &str) -> Result<()> {
    match client.gate().check(path).await? {
        GateOutcome::Render => {}
        GateOutcome::Redirect(target) => return Err(redirect_error(target)),
        GateOutcome::Stale => bail!("Session check was superseded, try again"),
    }

    let tokens = client.tokens();
    let role = tokens.role();
    let decision = route_policy::evaluate(
        path,
        RouteContext {
            has_session: tokens.get(TokenKind::Access).is_some(),
            role: role.as_deref(),
        },
    );
    debug!(path, decision = ?decision, "Route policy evaluated");
    match decision {
        RouteDecision::Allow => Ok(()),
        RouteDecision::Redirect(target) => Err(redirect_error(target)),
    }
}

/// Session user, fetched when the gate has not loaded one yet.
async fn current_user(client: &Client) -> Result<User> {
    match client.gate().user() {
        Some(user) => Ok(user),
        None => Ok(client.me().await?),
    }
}

fn redirect_error(target: &str) -> anyhow::Error {
    if target == navigation::LOGIN {
        anyhow::anyhow!("Not logged in. Run 'coursegate login' first")
    } else {
        anyhow::anyhow!("Not allowed for this account (redirected to {})", target)
    }
}

/// Read one trimmed line from stdin after a prompt.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask user for confirmation.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
