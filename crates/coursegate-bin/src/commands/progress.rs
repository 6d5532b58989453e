//! Learner progress commands.

use super::ensure_access;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use coursegate_api::{progress, Client};
use coursegate_auth::navigation;

/// Show completion across levels.
pub async fn progress_show(client: &Client, format: &OutputFormat) -> Result<()> {
    ensure_access(client, navigation::HOME).await?;
    let user = client.me().await?;
    let levels = client.list_levels().await?;
    let overview = progress::overview(&user, &levels);

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("Progress for {}", user.name));
            output::print_row(
                "Levels",
                &format!(
                    "{}/{} ({:.0}%)",
                    overview.completed_levels,
                    overview.total_levels,
                    overview.ratio * 100.0
                ),
            );
            output::print_row("Sections", &user.completed_sections.len().to_string());
            if let Some(next) = overview.levels.iter().find(|entry| !entry.completed && !entry.locked) {
                output::print_row("Up next", &format!("{} ({})", next.level.name, next.level.id));
            }
        }
        OutputFormat::Json => output::print_json(&overview),
    }
    Ok(())
}

/// Record a watched section.
pub async fn progress_complete(client: &Client, level_id: &str, section_id: &str, format: &OutputFormat) -> Result<()> {
    ensure_access(client, &navigation::section(level_id, section_id)).await?;

    let completion = client.complete_section(level_id, section_id).await?;
    let message = if completion.recorded {
        format!("Section {} completed", section_id)
    } else {
        format!("Section {} was already completed", section_id)
    };
    output::print_success(&message, completion.next.as_deref(), format);
    Ok(())
}
