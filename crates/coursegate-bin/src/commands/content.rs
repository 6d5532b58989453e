//! Level and section commands.

use super::{confirm, current_user, ensure_access};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use coursegate_api::progress;
use coursegate_api::Client;
use coursegate_auth::navigation;

fn lock_label(locked: bool, completed: bool) -> &'static str {
    match (locked, completed) {
        (_, true) => "completed",
        (true, false) => "locked",
        (false, false) => "open",
    }
}

/// List levels with lock state.
pub async fn levels_list(client: &Client, format: &OutputFormat) -> Result<()> {
    ensure_access(client, navigation::HOME).await?;
    let levels = client.list_levels().await?;
    let user = current_user(client).await?;
    let overview = progress::overview(&user, &levels);

    match format {
        OutputFormat::Text => {
            if overview.levels.is_empty() {
                println!("No levels yet.");
                return Ok(());
            }
            output::print_heading(&format!("Levels ({})", overview.total_levels));
            for entry in &overview.levels {
                println!(
                    "{:>3}. {:<32} {:<10} {}",
                    entry.level.order,
                    entry.level.name,
                    lock_label(entry.locked, entry.completed),
                    entry.level.id
                );
            }
        }
        OutputFormat::Json => output::print_json(&overview.levels),
    }
    Ok(())
}

/// Show a level and its sections.
pub async fn levels_show(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    ensure_access(client, &navigation::level(id)).await?;
    let level = client.get_level(id).await?;
    let sections = client.list_sections(Some(id)).await?;
    let user = current_user(client).await?;
    let entries = progress::level_sections(&user, &sections);

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("Level {}: {}", level.order, level.name));
            if let Some(description) = &level.description {
                println!("{}", description);
            }
            output::print_row(
                "Locked",
                if progress::is_level_locked(&user, &level) { "yes" } else { "no" },
            );
            for entry in &entries {
                println!(
                    "{:>3}. {:<32} {:<10} {}",
                    entry.section.order,
                    entry.section.name,
                    lock_label(entry.locked, entry.completed),
                    entry.section.id
                );
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "level": level,
            "locked": progress::is_level_locked(&user, &level),
            "sections": entries,
        })),
    }
    Ok(())
}

/// Delete a level (admin).
pub async fn levels_delete(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    ensure_access(client, navigation::ADMIN_LEVELS).await?;

    if matches!(format, OutputFormat::Text) && !confirm(&format!("Delete level {} and its sections?", id)) {
        println!("Aborted.");
        return Ok(());
    }

    let next = client.delete_level(id).await?;
    output::print_success(&format!("Level {} deleted", id), Some(next), format);
    Ok(())
}

/// List sections, optionally of one level.
pub async fn sections_list(client: &Client, level: Option<&str>, format: &OutputFormat) -> Result<()> {
    let page = match level {
        Some(id) => navigation::level(id),
        None => navigation::ADMIN_SECTIONS.to_string(),
    };
    ensure_access(client, &page).await?;

    let mut sections = client.list_sections(level).await?;
    sections.sort_by(|a, b| a.level.id().cmp(b.level.id()).then(a.order.cmp(&b.order)));

    match format {
        OutputFormat::Text => {
            if sections.is_empty() {
                println!("No sections found.");
                return Ok(());
            }
            output::print_heading(&format!("Sections ({})", sections.len()));
            for section in &sections {
                println!(
                    "{:<12} {:>3}. {:<32} {}",
                    section.level.id(),
                    section.order,
                    section.name,
                    section.id
                );
            }
        }
        OutputFormat::Json => output::print_json(&sections),
    }
    Ok(())
}
