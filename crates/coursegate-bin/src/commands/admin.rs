//! User administration commands.

use super::{confirm, ensure_access};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use coursegate_api::Client;
use coursegate_auth::navigation;

/// List users.
pub async fn users_list(client: &Client, format: &OutputFormat) -> Result<()> {
    ensure_access(client, navigation::ADMIN_USERS).await?;
    let users = client.list_users().await?;

    match format {
        OutputFormat::Text => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            output::print_heading(&format!("Users ({})", users.len()));
            for user in &users {
                println!("{}", user.id);
                output::print_row("Name", &user.name);
                output::print_row("Email", &user.email);
                output::print_row("Role", user.role.as_str());
                output::print_row(
                    "Progress",
                    &format!(
                        "{} levels, {} sections",
                        user.completed_levels.len(),
                        user.completed_sections.len()
                    ),
                );
            }
        }
        OutputFormat::Json => output::print_json(&users),
    }
    Ok(())
}

/// Delete a user.
pub async fn users_delete(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    ensure_access(client, navigation::ADMIN_USERS).await?;

    if matches!(format, OutputFormat::Text) && !confirm(&format!("Delete user {}?", id)) {
        println!("Aborted.");
        return Ok(());
    }

    let next = client.delete_user(id).await?;
    output::print_success(&format!("User {} deleted", id), Some(next), format);
    Ok(())
}
