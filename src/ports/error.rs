use thiserror::Error;

/// API呼び出しの失敗
///
/// すべてのクライアント関数はこの型で失敗を返す。空の結果や `false` で失敗を表すことはない。
/// 再試行はしない（すべての呼び出しは高々1回）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// ネットワーク・通信の失敗
    #[error("transport error: {0}")]
    Transport(String),

    /// 成功以外のHTTPステータス
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 想定外のペイロード
    #[error("unexpected payload: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::status(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::status(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::status(409, message)
    }

    /// HTTPステータス（ステータス系の失敗のみ）
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.http_status() == Some(409)
    }
}

/// ポート層の Result型
pub type Result<T> = std::result::Result<T, ApiError>;
