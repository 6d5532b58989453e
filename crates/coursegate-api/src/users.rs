//! Admin user management.

use crate::models::{NewUser, User, UserUpdate};
use crate::validation::{validate_new_user, validate_user_update};
use crate::{ApiResult, Client};
use coursegate_auth::{navigation, ApiRequest, PROFILE_PATH};
use tracing::info;

impl Client {
    /// Current user as the backend sees it.
    pub async fn me(&self) -> ApiResult<User> {
        Ok(self.gateway().send_json(&ApiRequest::get(PROFILE_PATH)).await?)
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.gateway().send_json(&ApiRequest::get("/users")).await?)
    }

    pub async fn get_user(&self, id: &str) -> ApiResult<User> {
        Ok(self
            .gateway()
            .send_json(&ApiRequest::get(format!("/users/{}", id)))
            .await?)
    }

    pub async fn create_user(&self, user: &NewUser) -> ApiResult<User> {
        validate_new_user(user)?;
        let request = ApiRequest::post("/users").json(user)?;
        let created: User = self.gateway().send_json(&request).await?;
        info!(user_id = %created.id, role = %created.role, "User created");
        Ok(created)
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> ApiResult<User> {
        validate_user_update(update)?;
        let request = ApiRequest::patch(format!("/users/{}", id)).json(update)?;
        Ok(self.gateway().send_json(&request).await?)
    }

    /// Delete a user. Returns the admin user list.
    pub async fn delete_user(&self, id: &str) -> ApiResult<&'static str> {
        self.gateway()
            .send_ok(&ApiRequest::delete(format!("/users/{}", id)))
            .await?;
        info!(user_id = %id, "User deleted");
        Ok(navigation::ADMIN_USERS)
    }
}
