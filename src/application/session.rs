use crate::domain::{Credentials, Registration, User};
use crate::ports::{AuthApi, Result as ApiResult};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use super::errors::{LibraryError, Result};

/// セッションの状態（ある時点のコピー）
///
/// ルートガードと各ページはこのスナップショットを読む。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_admin: bool,
    /// ログイン・登録の処理中
    pub loading: bool,
    /// 直近のログイン・登録の失敗
    pub error: Option<String>,
}

impl SessionSnapshot {
    fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            is_admin: user.is_admin(),
            user: Some(user),
            loading: false,
            error: None,
        }
    }
}

/// セッションコンテキスト
///
/// プロセス全体で1つ作成し、ページへ明示的に渡す。
/// 書き込むのはログイン・登録・ログアウトのみ。
///
/// ロックはawaitをまたいで保持しない。
pub struct SessionContext {
    auth: Arc<dyn AuthApi>,
    state: RwLock<SessionSnapshot>,
}

impl SessionContext {
    /// 空のセッションで作成する
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        Self {
            auth,
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// ログイン中の利用者
    ///
    /// # エラー
    /// - NotAuthenticated: 未ログイン
    pub fn current_user(&self) -> Result<User> {
        self.snapshot().user.ok_or(LibraryError::NotAuthenticated)
    }

    /// ログイン中の管理者
    ///
    /// # エラー
    /// - NotAuthenticated: 未ログイン
    /// - AdminRequired: 一般利用者
    pub fn require_admin(&self) -> Result<User> {
        let user = self.current_user()?;
        if !user.is_admin() {
            return Err(LibraryError::AdminRequired);
        }
        Ok(user)
    }

    /// 資格情報でログインする
    pub async fn login(&self, credentials: Credentials) -> Result<User> {
        credentials.validate()?;
        let email = credentials.email.clone();
        self.begin_loading();
        let outcome = self.establish(self.auth.login(credentials).await.map(|s| s.user));
        match &outcome {
            Ok(user) => info!(user_id = %user.id, role = user.role.as_str(), "logged in"),
            Err(e) => warn!(%email, error = %e, "login failed"),
        }
        outcome
    }

    /// 新規登録してログインする
    pub async fn register(&self, registration: Registration) -> Result<User> {
        registration.validate()?;
        self.begin_loading();
        let outcome = self.establish(self.auth.register(registration).await.map(|s| s.user));
        if let Ok(user) = &outcome {
            info!(user_id = %user.id, "registered");
        }
        outcome
    }

    /// ログアウトする
    ///
    /// バックエンドの結果に関わらずローカルのセッションは空に戻す。
    pub async fn logout(&self) -> Result<()> {
        let result = self.auth.logout().await;
        self.replace(SessionSnapshot::default());
        info!("logged out");
        result.map_err(LibraryError::from)
    }

    /// ログイン中の利用者情報を置き換える（プロフィール更新後）
    pub fn refresh_user(&self, user: User) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.user.as_ref().map(|u| u.id) == Some(user.id) {
            *state = SessionSnapshot::signed_in(user);
        }
    }

    fn establish(&self, result: ApiResult<User>) -> Result<User> {
        match result {
            Ok(user) => {
                self.replace(SessionSnapshot::signed_in(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.replace(SessionSnapshot {
                    error: Some(e.to_string()),
                    ..SessionSnapshot::default()
                });
                Err(e.into())
            }
        }
    }

    /// 処理中フラグを立てる（ルートガードは Pending を返す）
    pub fn begin_loading(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.loading = true;
        state.error = None;
    }

    fn replace(&self, next: SessionSnapshot) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_populates_session() {
        // Arrange
        let session = SessionContext::new(Arc::new(InMemoryLibrary::with_sample_data()));
        assert!(!session.snapshot().is_authenticated);

        // Act
        let user = session
            .login(credentials("admin1@example.com", "password"))
            .await
            .unwrap();

        // Assert
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(snapshot.is_admin);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.user, Some(user));
        assert!(session.require_admin().is_ok());
    }

    #[tokio::test]
    async fn test_failed_login_records_error() {
        let session = SessionContext::new(Arc::new(InMemoryLibrary::with_sample_data()));

        let result = session
            .login(credentials("user1@example.com", "wrong"))
            .await;

        assert!(matches!(result, Err(LibraryError::Api(_))));
        let snapshot = session.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.error.is_some());
        assert!(matches!(
            session.current_user(),
            Err(LibraryError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let session = SessionContext::new(Arc::new(InMemoryLibrary::with_sample_data()));
        session
            .login(credentials("user1@example.com", "password"))
            .await
            .unwrap();
        assert!(matches!(
            session.require_admin(),
            Err(LibraryError::AdminRequired)
        ));

        session.logout().await.unwrap();

        assert_eq!(session.snapshot(), SessionSnapshot::default());
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected_before_request() {
        let session = SessionContext::new(Arc::new(InMemoryLibrary::with_sample_data()));

        let result = session.login(credentials(" ", "password")).await;

        assert!(matches!(result, Err(LibraryError::Validation(_))));
        assert!(session.snapshot().error.is_none());
    }
}
