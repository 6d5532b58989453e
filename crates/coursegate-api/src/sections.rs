//! Section management.

use crate::models::{CreateSectionPayload, DeleteSectionPayload, NewSection, Section, SectionUpdate};
use crate::validation::{validate_new_section, validate_section_update};
use crate::{ApiResult, Client};
use coursegate_auth::{navigation, ApiRequest};
use tracing::info;

impl Client {
    /// Sections of one level, or every section when `level_id` is `None`.
    pub async fn list_sections(&self, level_id: Option<&str>) -> ApiResult<Vec<Section>> {
        let request = ApiRequest::get("/sections").query("levelId", level_id.unwrap_or_default());
        Ok(self.gateway().send_json(&request).await?)
    }

    pub async fn get_section(&self, id: &str) -> ApiResult<Section> {
        Ok(self
            .gateway()
            .send_json(&ApiRequest::get(format!("/sections/{}", id)))
            .await?)
    }

    /// Append a section after the existing sections of its level.
    pub async fn create_section(&self, section: &NewSection) -> ApiResult<Section> {
        validate_new_section(section)?;
        let order = self.list_sections(Some(&section.level)).await?.len() as u32 + 1;

        let request = ApiRequest::post("/sections").json(&CreateSectionPayload {
            name: section.name.trim(),
            description: section.description.as_deref(),
            video_id: &section.video_id,
            level: &section.level,
            order,
        })?;
        let created: Section = self.gateway().send_json(&request).await?;
        info!(section_id = %created.id, level_id = %section.level, order, "Section created");
        Ok(created)
    }

    pub async fn update_section(&self, id: &str, update: &SectionUpdate) -> ApiResult<Section> {
        validate_section_update(update)?;
        let request = ApiRequest::patch(format!("/sections/{}", id)).json(update)?;
        Ok(self.gateway().send_json(&request).await?)
    }

    /// Delete a section. The backend reorders the rest from `order`.
    pub async fn delete_section(&self, id: &str, order: u32) -> ApiResult<&'static str> {
        let request =
            ApiRequest::delete(format!("/sections/{}", id)).json(&DeleteSectionPayload { order })?;
        self.gateway().send_ok(&request).await?;
        info!(section_id = %id, order, "Section deleted");
        Ok(navigation::ADMIN_SECTIONS)
    }
}
