use thiserror::Error;

/// 蔵書数のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopiesError {
    /// 貸出可能数が所蔵数を超えている
    #[error("available copies ({available}) exceed total copies ({total})")]
    AvailableExceedsTotal { available: u32, total: u32 },
}

/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BorrowBookError {
    /// 貸出可能な冊数が0
    #[error("no copies available")]
    NoCopiesAvailable,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnBookError {
    /// 既に返却済み
    #[error("borrow record already returned")]
    AlreadyReturned,
}

/// 評価値のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    /// 1〜5の範囲外
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i64),
}

/// 入力値のエラー
///
/// フォームの必須項目など、送信前に検出できる不備。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必須項目が空
    #[error("{0} is required")]
    Required(&'static str),

    #[error(transparent)]
    Copies(#[from] CopiesError),

    #[error(transparent)]
    Rating(#[from] RatingError),
}
