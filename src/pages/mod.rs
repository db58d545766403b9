//! ページごとの状態コンテナ
//!
//! 各ページは `PageScope` と処理中キーを持ち、サーバーの応答を受けてから
//! ローカル状態を置き換える。

pub mod admin_messages;
pub mod book_details;
pub mod borrowed_books;
pub mod browse_books;
pub mod dashboard;
pub mod favorites;
mod lifecycle;
pub mod manage_books;
pub mod manage_borrows;
pub mod messages;
pub mod profile;

#[allow(unused_imports)]
pub use lifecycle::{InFlight, InFlightGuard, PageScope};
