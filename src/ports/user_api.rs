use crate::domain::{User, UserId, UserUpdate};
use async_trait::async_trait;

use super::Result;

/// 利用者APIポート（/users）
#[async_trait]
pub trait UserApi: Send + Sync {
    /// 全利用者
    async fn list_users(&self) -> Result<Vec<User>>;

    /// IDで利用者を取得する
    async fn get_user(&self, user_id: UserId) -> Result<User>;

    /// 利用者を部分更新する
    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User>;
}
