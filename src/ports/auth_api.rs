use crate::domain::{AuthSession, Credentials, Registration};
use async_trait::async_trait;

use super::Result;

/// 認証APIポート
///
/// ログイン・登録で得たトークンは実装側が保持し、以降のすべてのリクエストに付与する。
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// 資格情報を交換してセッションを得る
    async fn login(&self, credentials: Credentials) -> Result<AuthSession>;

    /// 新規登録してセッションを得る
    async fn register(&self, registration: Registration) -> Result<AuthSession>;

    /// 保持しているトークンを破棄する
    async fn logout(&self) -> Result<()>;
}
