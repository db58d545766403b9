use super::HttpLibraryApi;
use crate::domain::{Book, BookId, BookUpdate, NewBook};
use crate::ports::{ApiError, BookApi, Result};
use async_trait::async_trait;

/// 受信した書籍の蔵書数の不変条件を確認する
pub(super) fn checked(book: Book) -> Result<Book> {
    book.check_copies()
        .map_err(|e| ApiError::Decode(format!("book {}: {}", book.id, e)))?;
    Ok(book)
}

#[async_trait]
impl BookApi for HttpLibraryApi {
    async fn list_books(&self) -> Result<Vec<Book>> {
        let books: Vec<Book> = self.get("/books").await?;
        books.into_iter().map(checked).collect()
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book> {
        checked(self.get(&format!("/books/{book_id}")).await?)
    }

    async fn add_book(&self, book: NewBook) -> Result<Book> {
        checked(self.post("/books", &book).await?)
    }

    async fn update_book(&self, book_id: BookId, update: BookUpdate) -> Result<Book> {
        checked(self.put(&format!("/books/{book_id}"), &update).await?)
    }

    async fn delete_book(&self, book_id: BookId) -> Result<()> {
        self.delete(&format!("/books/{book_id}")).await
    }
}
