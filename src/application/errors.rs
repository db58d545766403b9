use crate::domain::ValidationError;
use crate::ports::ApiError;
use thiserror::Error;

/// アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LibraryError {
    /// ログインしていない
    #[error("Not authenticated")]
    NotAuthenticated,

    /// 管理者権限が必要
    #[error("Administrator role required")]
    AdminRequired,

    /// 手元の書籍情報では貸出可能数が0（参考判定）
    #[error("Book is not available for borrowing")]
    BookUnavailable,

    /// メッセージの相手となる管理者が見つからない
    #[error("No administrator to message")]
    NoAdministrator,

    /// 同じ操作のリクエストが処理中
    #[error("Request already in flight: {0}")]
    RequestInFlight(String),

    /// ページがアンマウント済みのため応答を破棄した
    #[error("Page has been unmounted")]
    Unmounted,

    /// 入力検証エラー
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// API呼び出しの失敗
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl LibraryError {
    /// サーバーが拒否したときのHTTPステータス
    pub fn http_status(&self) -> Option<u16> {
        match self {
            LibraryError::Api(e) => e.http_status(),
            _ => None,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryError>;
