use super::HttpLibraryApi;
use crate::domain::commands::BorrowBook;
use crate::domain::{BorrowId, BorrowedBook, UserId};
use crate::ports::{ApiError, BorrowApi, Result};
use async_trait::async_trait;

/// 埋め込まれた書籍に蔵書数が両方あるときだけ不変条件を確認する
fn checked_record(record: BorrowedBook) -> Result<BorrowedBook> {
    record
        .book
        .check_copies()
        .map_err(|e| ApiError::Decode(format!("borrow {} book {}: {}", record.id, record.book.id, e)))?;
    Ok(record)
}

fn checked_records(records: Vec<BorrowedBook>) -> Result<Vec<BorrowedBook>> {
    records.into_iter().map(checked_record).collect()
}

#[async_trait]
impl BorrowApi for HttpLibraryApi {
    async fn borrow_book(&self, cmd: BorrowBook) -> Result<BorrowedBook> {
        checked_record(self.post("/borrowed/", &cmd).await?)
    }

    async fn return_book(&self, borrow_id: BorrowId) -> Result<BorrowedBook> {
        checked_record(self.post_empty(&format!("/borrowed/return/{borrow_id}")).await?)
    }

    async fn user_borrows(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        checked_records(self.get(&format!("/borrowed/user/{user_id}")).await?)
    }

    async fn user_history(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        checked_records(self.get(&format!("/borrowed/history/{user_id}")).await?)
    }

    async fn active_borrows(&self) -> Result<Vec<BorrowedBook>> {
        checked_records(self.get("/borrowed/active").await?)
    }
}
