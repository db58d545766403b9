use super::HttpLibraryApi;
use crate::domain::{User, UserId, UserUpdate};
use crate::ports::{Result, UserApi};
use async_trait::async_trait;

#[async_trait]
impl UserApi for HttpLibraryApi {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.get("/users").await
    }

    async fn get_user(&self, user_id: UserId) -> Result<User> {
        self.get(&format!("/users/{user_id}")).await
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        self.put(&format!("/users/{user_id}"), &update).await
    }
}
