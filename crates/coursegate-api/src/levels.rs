//! Level management.

use crate::models::{CreateLevelPayload, Level, LevelUpdate, NewLevel};
use crate::validation::{validate_level_update, validate_new_level};
use crate::{ApiResult, Client};
use coursegate_auth::{navigation, ApiRequest};
use tracing::info;

impl Client {
    pub async fn list_levels(&self) -> ApiResult<Vec<Level>> {
        Ok(self.gateway().send_json(&ApiRequest::get("/levels")).await?)
    }

    pub async fn get_level(&self, id: &str) -> ApiResult<Level> {
        Ok(self
            .gateway()
            .send_json(&ApiRequest::get(format!("/levels/{}", id)))
            .await?)
    }

    /// Append a level after the existing ones.
    pub async fn create_level(&self, level: &NewLevel) -> ApiResult<Level> {
        validate_new_level(level)?;
        let order = self.list_levels().await?.len() as u32 + 1;

        let request = ApiRequest::post("/levels").json(&CreateLevelPayload {
            name: level.name.trim(),
            description: level.description.as_deref(),
            order,
        })?;
        let created: Level = self.gateway().send_json(&request).await?;
        info!(level_id = %created.id, order, "Level created");
        Ok(created)
    }

    pub async fn update_level(&self, id: &str, update: &LevelUpdate) -> ApiResult<Level> {
        validate_level_update(update)?;
        let request = ApiRequest::patch(format!("/levels/{}", id)).json(update)?;
        Ok(self.gateway().send_json(&request).await?)
    }

    /// Delete a level. Returns the admin level list.
    pub async fn delete_level(&self, id: &str) -> ApiResult<&'static str> {
        self.gateway()
            .send_ok(&ApiRequest::delete(format!("/levels/{}", id)))
            .await?;
        info!(level_id = %id, "Level deleted");
        Ok(navigation::ADMIN_LEVELS)
    }
}
