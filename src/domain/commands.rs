use serde::{Deserialize, Serialize};

use super::{BookId, UserId};

/// コマンド：書籍を借りる
///
/// POST /borrowed/ のボディもこの形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowBook {
    pub user_id: UserId,
    pub book_id: BookId,
}

/// コマンド：お気に入りを切り替える
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavorite {
    pub book_id: BookId,
    /// 最後に把握しているお気に入り状態
    pub last_known: bool,
}

/// コマンド：レビューを投稿する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReview {
    pub book_id: BookId,
    pub rating: i64,
    pub comment: String,
}
