use crate::application::{Result, ServiceDependencies, SessionContext};
use crate::domain::{User, UserUpdate, ValidationError};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::lifecycle::{InFlight, PageScope, lock};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileState {
    pub user: Option<User>,
    pub saved: bool,
    pub error: Option<String>,
}

/// プロフィールページ
pub struct ProfilePage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<ProfileState>,
    saving: InFlight<&'static str>,
}

impl ProfilePage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(ProfileState::default()),
            saving: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> ProfileState {
        lock(&self.state).clone()
    }

    pub async fn load(&self) -> Result<()> {
        let viewer = self.session.current_user()?;
        let result = self.deps.users.get_user(viewer.id).await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        match result {
            Ok(user) => {
                state.user = Some(user);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// 利用者名・メールアドレスを更新する
    ///
    /// 応答の利用者でページとセッションの両方を置き換える。
    pub async fn update(&self, update: UserUpdate) -> Result<User> {
        let _guard = self.saving.begin("save")?;
        let viewer = self.session.current_user()?;
        if update.username.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::Required("username").into());
        }
        if update.email.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::Required("email").into());
        }

        let user = self.deps.users.update_user(viewer.id, update).await?;
        info!(user_id = %user.id, "profile updated");
        self.session.refresh_user(user.clone());
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.user = Some(user.clone());
        state.saved = true;
        Ok(user)
    }
}
