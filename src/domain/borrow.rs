use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::timestamp;
use super::{Book, BookId, BookSummary, BorrowId, ReturnBookError, UserId};

/// 貸出期間（日数）
pub const BORROW_PERIOD_DAYS: i64 = 30;

/// 返却期限を計算する
pub fn due_date_for(borrow_date: DateTime<Utc>) -> DateTime<Utc> {
    borrow_date + Duration::days(BORROW_PERIOD_DAYS)
}

/// 貸出記録
///
/// ライフサイクル：
/// - 貸出時に作成される（return_date = None）
/// - 返却時に一度だけ更新される（return_date を設定）
/// - 返却後は履歴として不変
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub id: BorrowId,
    pub book_id: BookId,
    pub user_id: UserId,
    #[serde(with = "timestamp")]
    pub borrow_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub due_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub return_date: Option<DateTime<Utc>>,
    /// 非正規化された書籍（サーバーの応答時点の状態）
    pub book: BookSummary,
}

/// 貸出記録の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowStatus {
    /// 貸出中
    Active,
    /// 返却済み（終端）
    Returned(DateTime<Utc>),
}

impl BorrowedBook {
    /// 新しい貸出記録を作成する
    ///
    /// 返却期限は貸出日 + 30日。`book` は減算後の書籍。
    pub fn open(id: BorrowId, user_id: UserId, book: &Book, borrow_date: DateTime<Utc>) -> Self {
        Self {
            id,
            book_id: book.id,
            user_id,
            borrow_date,
            due_date: due_date_for(borrow_date),
            return_date: None,
            book: BookSummary::from(book),
        }
    }

    pub fn status(&self) -> BorrowStatus {
        match self.return_date {
            Some(at) => BorrowStatus::Returned(at),
            None => BorrowStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// 延滞判定
    ///
    /// 延滞 = 現在時刻が返却期限を過ぎている かつ 未返却。保存はせず常に計算する。
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_date
    }

    /// 返却する
    ///
    /// Active → Returned の遷移は一度だけ。既に返却済みならエラー。
    pub fn mark_returned(&self, returned_at: DateTime<Utc>) -> Result<Self, ReturnBookError> {
        if !self.is_active() {
            return Err(ReturnBookError::AlreadyReturned);
        }
        Ok(Self {
            return_date: Some(returned_at),
            ..self.clone()
        })
    }
}
