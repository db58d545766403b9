use crate::domain::commands::BorrowBook;
use crate::domain::{Book, BookSummary, BorrowId, BorrowedBook, User, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::deps::ServiceDependencies;
use super::errors::{LibraryError, Result};

/// 書籍を借りる
///
/// ビジネスルール：
/// - 利用者は自分の名義でのみ借りられる（管理者は任意の利用者の名義で貸し出せる）
/// - 手元の書籍で貸出可能数が0ならリクエストしない（参考判定）
/// - 最終判定はサーバーが行う。参考判定を通っても 409 で拒否されうる
///
/// 成功時の応答にはサーバーが減算した後の書籍が埋め込まれている。
/// 呼び出し側は [`current_book`] でローカルの書籍を置き換える（自前で減算しない）。
///
/// # 引数
/// * `actor` - 操作する利用者
/// * `cmd` - 借り手と書籍
/// * `known` - 呼び出し側が把握している書籍（あれば参考判定に使う）
///
/// # エラー
/// - AdminRequired: 一般利用者による他人名義の貸出
/// - BookUnavailable: 手元の書籍で貸出可能数が0
/// - Api: サーバーの拒否・通信失敗
pub async fn borrow_book(
    deps: &ServiceDependencies,
    actor: &User,
    cmd: BorrowBook,
    known: Option<&Book>,
) -> Result<BorrowedBook> {
    if cmd.user_id != actor.id && !actor.is_admin() {
        return Err(LibraryError::AdminRequired);
    }
    if known.is_some_and(|book| book.id == cmd.book_id && !book.is_available()) {
        return Err(LibraryError::BookUnavailable);
    }

    let record = deps.borrows.borrow_book(cmd).await?;

    info!(
        borrow_id = %record.id,
        book_id = %record.book_id,
        user_id = %record.user_id,
        available_copies = ?record.book.available_copies,
        "book borrowed"
    );
    Ok(record)
}

/// 書籍を返却する（管理者のみ）
///
/// 二度目の返却はサーバーが拒否する（返却は一度だけ適用される）。
pub async fn return_book(
    deps: &ServiceDependencies,
    actor: &User,
    borrow_id: BorrowId,
) -> Result<BorrowedBook> {
    if !actor.is_admin() {
        return Err(LibraryError::AdminRequired);
    }

    let record = deps.borrows.return_book(borrow_id).await?;

    info!(
        borrow_id = %record.id,
        book_id = %record.book_id,
        available_copies = ?record.book.available_copies,
        "book returned"
    );
    Ok(record)
}

/// 貸出記録に埋め込まれた書籍から、ローカルで保持する書籍を得る
///
/// 要約に蔵書数があり `known` が同じ書籍なら、要約を反映した書籍を返す。
/// そうでなければ `/books/{id}` を取り直す。蔵書数を推測で補うことはしない。
pub async fn current_book(
    deps: &ServiceDependencies,
    summary: &BookSummary,
    known: Option<&Book>,
) -> Result<Book> {
    if let Some(book) = known.and_then(|book| summary.merged_into(book)) {
        return Ok(book);
    }
    debug!(book_id = %summary.id, "refetching book for borrow record");
    Ok(deps.books.get_book(summary.id).await?)
}

/// 利用者の貸出中の記録
pub async fn active_borrows_of(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<BorrowedBook>> {
    Ok(deps.borrows.user_borrows(user_id).await?)
}

/// 利用者の返却履歴
pub async fn history_of(deps: &ServiceDependencies, user_id: UserId) -> Result<Vec<BorrowedBook>> {
    Ok(deps.borrows.user_history(user_id).await?)
}

/// 全利用者の貸出中の記録（管理者のみ）
pub async fn all_active_borrows(
    deps: &ServiceDependencies,
    actor: &User,
) -> Result<Vec<BorrowedBook>> {
    if !actor.is_admin() {
        return Err(LibraryError::AdminRequired);
    }
    Ok(deps.borrows.active_borrows().await?)
}

/// 延滞中の記録のみを取り出す
pub fn overdue(records: &[BorrowedBook], now: DateTime<Utc>) -> Vec<BorrowedBook> {
    records
        .iter()
        .filter(|r| r.is_overdue(now))
        .cloned()
        .collect()
}

/// 貸出管理の状態フィルタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorrowFilter {
    #[default]
    All,
    Overdue,
    /// 貸出中で延滞していないもの
    Active,
}

impl BorrowFilter {
    pub fn matches(&self, record: &BorrowedBook, now: DateTime<Utc>) -> bool {
        match self {
            BorrowFilter::All => true,
            BorrowFilter::Overdue => record.is_overdue(now),
            BorrowFilter::Active => record.is_active() && !record.is_overdue(now),
        }
    }
}

/// 貸出記録を状態と検索語で絞り込む
///
/// 検索対象：書名、著者、借り手のユーザー名（大文字小文字を区別しない）
pub fn filter_borrows(
    records: &[BorrowedBook],
    users: &[User],
    filter: BorrowFilter,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<BorrowedBook> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| filter.matches(r, now))
        .filter(|r| {
            if query.is_empty() {
                return true;
            }
            let borrower = users
                .iter()
                .find(|u| u.id == r.user_id)
                .map(|u| u.username.to_lowercase())
                .unwrap_or_default();
            r.book.title.to_lowercase().contains(&query)
                || r.book.author.to_lowercase().contains(&query)
                || borrower.contains(&query)
        })
        .cloned()
        .collect()
}
