use crate::domain::{BorrowId, BorrowedBook, UserId, commands::BorrowBook};
use async_trait::async_trait;

use super::Result;

/// 貸出APIポート（/borrowed）
///
/// 貸出可能数の減算はサーバーが唯一の判定者となる（0より大きい場合のみの原子的な減算）。
/// クライアント側の事前確認は参考情報にすぎない。
#[async_trait]
pub trait BorrowApi: Send + Sync {
    /// 書籍を借りる
    ///
    /// 成功時は作成された貸出記録（減算後の書籍を埋め込み）を返す。
    /// 在庫がない場合は 409。
    async fn borrow_book(&self, cmd: BorrowBook) -> Result<BorrowedBook>;

    /// 書籍を返却する
    ///
    /// 成功時は返却済みの貸出記録（加算後の書籍を埋め込み）を返す。
    /// 二度目の返却は 409。
    async fn return_book(&self, borrow_id: BorrowId) -> Result<BorrowedBook>;

    /// 利用者の貸出中の記録
    async fn user_borrows(&self, user_id: UserId) -> Result<Vec<BorrowedBook>>;

    /// 利用者の返却済みの記録（履歴）
    async fn user_history(&self, user_id: UserId) -> Result<Vec<BorrowedBook>>;

    /// 全利用者の貸出中の記録（管理者）
    async fn active_borrows(&self) -> Result<Vec<BorrowedBook>>;
}
