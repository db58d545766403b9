use super::HttpLibraryApi;
use crate::domain::{AuthSession, Credentials, Registration};
use crate::ports::{AuthApi, Result};
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl AuthApi for HttpLibraryApi {
    async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let session: AuthSession = self.post("/login", &credentials).await?;
        self.set_token(Some(session.token.clone()));
        debug!(user_id = %session.user.id, "bearer token stored");
        Ok(session)
    }

    async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let session: AuthSession = self.post("/register", &registration).await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    /// サーバー側のログアウトはないため、保持しているトークンを破棄するだけ
    async fn logout(&self) -> Result<()> {
        self.set_token(None);
        Ok(())
    }
}
