use serde::{Deserialize, Serialize};

use super::{BookId, UserId};

/// お気に入り（利用者 × 書籍の所属関係のみ、ペイロードなし）
///
/// POST /favorites/ のボディもこの形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: UserId,
    pub book_id: BookId,
}

impl Favorite {
    pub fn new(user_id: UserId, book_id: BookId) -> Self {
        Self { user_id, book_id }
    }
}

/// お気に入り確認（GET /favorites/check/{u}/{b} の応答）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

/// トグル操作の向き
///
/// 最後に把握している状態から決め、送信前にサーバーへ再確認はしない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Add,
    Remove,
}

impl FavoriteToggle {
    pub fn from_last_known(is_favorite: bool) -> Self {
        if is_favorite {
            FavoriteToggle::Remove
        } else {
            FavoriteToggle::Add
        }
    }

    /// 成功後の状態
    pub fn resulting_state(&self) -> bool {
        matches!(self, FavoriteToggle::Add)
    }
}
