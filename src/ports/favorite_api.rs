use crate::domain::{Book, BookId, UserId};
use async_trait::async_trait;

use super::Result;

/// お気に入りAPIポート（/favorites）
#[async_trait]
pub trait FavoriteApi: Send + Sync {
    /// 利用者のお気に入り書籍
    async fn favorites(&self, user_id: UserId) -> Result<Vec<Book>>;

    /// お気に入りに追加する（登録済みなら 400）
    async fn add_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()>;

    /// お気に入りから外す（未登録なら 404）
    async fn remove_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()>;

    /// お気に入り登録済みか
    async fn check_favorite(&self, user_id: UserId, book_id: BookId) -> Result<bool>;
}
