//! Learner progress and content locking.
//!
//! A level unlocks once the level before it is completed; within a level a
//! section unlocks once the section before it is completed.

use crate::models::{Level, Section, User, UserUpdate};
use crate::{ApiError, ApiResult, Client};
use coursegate_auth::navigation;
use serde::Serialize;
use tracing::{debug, info};

/// Highest completed level order, 0 when nothing is completed.
pub fn highest_completed_level(user: &User) -> u32 {
    user.completed_levels
        .iter()
        .map(|level| level.order)
        .max()
        .unwrap_or(0)
}

/// Highest completed section order inside `level_id`, 0 when none.
pub fn highest_completed_section(user: &User, level_id: &str) -> u32 {
    user.completed_sections
        .iter()
        .filter(|section| section.level == level_id)
        .map(|section| section.order)
        .max()
        .unwrap_or(0)
}

pub fn is_level_locked(user: &User, level: &Level) -> bool {
    level.order > highest_completed_level(user) + 1
}

pub fn is_level_completed(user: &User, level_id: &str) -> bool {
    user.completed_levels.iter().any(|level| level.id == level_id)
}

pub fn is_section_locked(user: &User, section: &Section) -> bool {
    section.order > highest_completed_section(user, section.level.id()) + 1
}

pub fn is_section_completed(user: &User, section_id: &str) -> bool {
    user.completed_sections
        .iter()
        .any(|section| section.id == section_id)
}

/// Completed share of `total`, in `[0, 1]`.
pub fn completion_ratio(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed.min(total) as f64) / (total as f64)
}

/// Whether `section` is the last of its level.
pub fn is_last_section(section: &Section, level_sections: &[Section]) -> bool {
    level_sections.len() as u32 == section.order
}

/// Page to show after finishing `section`.
///
/// The last section leads back to the level; otherwise to the section with
/// the next order, if the level has one.
pub fn next_navigation(level_id: &str, section: &Section, level_sections: &[Section]) -> Option<String> {
    if is_last_section(section, level_sections) {
        return Some(navigation::level(section.level.id()));
    }
    level_sections
        .iter()
        .find(|candidate| candidate.order == section.order + 1)
        .map(|next| navigation::section(level_id, &next.id))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: Level,
    pub locked: bool,
    pub completed: bool,
}

/// Progress across all levels, sorted by order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub completed_levels: usize,
    pub total_levels: usize,
    pub ratio: f64,
    pub levels: Vec<LevelProgress>,
}

pub fn overview(user: &User, levels: &[Level]) -> ProgressOverview {
    let mut sorted = levels.to_vec();
    sorted.sort_by_key(|level| level.order);

    let levels: Vec<LevelProgress> = sorted
        .into_iter()
        .map(|level| LevelProgress {
            locked: is_level_locked(user, &level),
            completed: is_level_completed(user, &level.id),
            level,
        })
        .collect();

    let completed_levels = user.completed_levels.len();
    ProgressOverview {
        completed_levels,
        total_levels: levels.len(),
        ratio: completion_ratio(completed_levels, levels.len()),
        levels,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionProgress {
    pub section: Section,
    pub locked: bool,
    pub completed: bool,
}

/// Sections of one level with their lock state, sorted by order.
pub fn level_sections(user: &User, sections: &[Section]) -> Vec<SectionProgress> {
    let mut sorted = sections.to_vec();
    sorted.sort_by_key(|section| section.order);
    sorted
        .into_iter()
        .map(|section| SectionProgress {
            locked: is_section_locked(user, &section),
            completed: is_section_completed(user, &section.id),
            section,
        })
        .collect()
}

/// Outcome of watching a section to the end.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionCompletion {
    pub user: User,
    /// False when the section was already completed.
    pub recorded: bool,
    pub next: Option<String>,
}

impl Client {
    /// Record `section_id` as watched for the signed-in user.
    ///
    /// Completing the last section of a level also completes the level.
    /// The session user is refreshed from the backend afterwards.
    pub async fn complete_section(&self, level_id: &str, section_id: &str) -> ApiResult<SectionCompletion> {
        let user = match self.gate().user() {
            Some(user) => user,
            None => self.me().await?,
        };
        let section = self.get_section(section_id).await?;
        if section.level.id() != level_id {
            return Err(ApiError::NotFound(format!(
                "section {} in level {}",
                section_id, level_id
            )));
        }
        let level_sections = self.list_sections(Some(level_id)).await?;
        let next = next_navigation(level_id, &section, &level_sections);

        if is_section_completed(&user, section_id) {
            debug!(section_id, "Section already completed");
            return Ok(SectionCompletion {
                user,
                recorded: false,
                next,
            });
        }

        let mut completed_sections: Vec<String> =
            user.completed_sections.iter().map(|s| s.id.clone()).collect();
        completed_sections.push(section.id.clone());

        let completes_level = is_last_section(&section, &level_sections);
        let completed_levels = completes_level.then(|| {
            let mut ids: Vec<String> = user.completed_levels.iter().map(|l| l.id.clone()).collect();
            if !ids.iter().any(|id| id == level_id) {
                ids.push(level_id.to_string());
            }
            ids
        });

        let update = UserUpdate {
            completed_sections: Some(completed_sections),
            completed_levels,
            ..Default::default()
        };
        self.update_user(&user.id, &update).await?;

        let refreshed = self.me().await?;
        self.gate().update_user(refreshed.clone());

        info!(
            user_id = %refreshed.id,
            section_id,
            level_completed = completes_level,
            "Section completed"
        );

        Ok(SectionCompletion {
            user: refreshed,
            recorded: true,
            next,
        })
    }
}
