use super::HttpLibraryApi;
use super::books::checked;
use crate::domain::{Book, BookId, Favorite, FavoriteStatus, UserId};
use crate::ports::{FavoriteApi, Result};
use async_trait::async_trait;

#[async_trait]
impl FavoriteApi for HttpLibraryApi {
    async fn favorites(&self, user_id: UserId) -> Result<Vec<Book>> {
        let books: Vec<Book> = self.get(&format!("/favorites/user/{user_id}")).await?;
        books.into_iter().map(checked).collect()
    }

    async fn add_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()> {
        self.post_discard("/favorites/", &Favorite::new(user_id, book_id))
            .await
    }

    async fn remove_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()> {
        self.delete(&format!("/favorites/{user_id}/{book_id}")).await
    }

    async fn check_favorite(&self, user_id: UserId, book_id: BookId) -> Result<bool> {
        let status: FavoriteStatus = self
            .get(&format!("/favorites/check/{user_id}/{book_id}"))
            .await?;
        Ok(status.is_favorite)
    }
}
