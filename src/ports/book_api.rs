use crate::domain::{Book, BookId, BookUpdate, NewBook};
use async_trait::async_trait;

use super::Result;

/// 書籍APIポート（/books）
#[async_trait]
pub trait BookApi: Send + Sync {
    /// 全書籍を取得する
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// IDで書籍を取得する
    async fn get_book(&self, book_id: BookId) -> Result<Book>;

    /// 書籍を登録する（管理者）
    async fn add_book(&self, book: NewBook) -> Result<Book>;

    /// 書籍を部分更新する（管理者）
    async fn update_book(&self, book_id: BookId, update: BookUpdate) -> Result<Book>;

    /// 書籍を削除する（管理者）
    async fn delete_book(&self, book_id: BookId) -> Result<()>;
}
