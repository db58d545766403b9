use crate::application::dashboard::{
    AdminDashboard, UserDashboard, load_admin_dashboard, load_user_dashboard,
};
use crate::application::{Result, ServiceDependencies, SessionContext};
use chrono::Utc;
use std::sync::{Arc, Mutex};

use super::lifecycle::{PageScope, lock};

/// 役割ごとの集計
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    User(UserDashboard),
    Admin(AdminDashboard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub view: Option<DashboardView>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            view: None,
            loading: true,
            error: None,
        }
    }
}

/// ダッシュボードページ
///
/// ログイン中の利用者の役割で利用者用と管理者用を切り替える。
pub struct DashboardPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<DashboardState>,
}

impl DashboardPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    pub async fn load(&self) -> Result<()> {
        let viewer = self.session.current_user()?;
        let now = Utc::now();
        let result = if viewer.is_admin() {
            load_admin_dashboard(&self.deps, &viewer, now)
                .await
                .map(DashboardView::Admin)
        } else {
            load_user_dashboard(&self.deps, &viewer, now)
                .await
                .map(DashboardView::User)
        };
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok(view) => {
                state.view = Some(view);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;
    use crate::application::LibraryError;
    use crate::domain::Credentials;

    async fn page_for(email: &str) -> DashboardPage {
        let deps = ServiceDependencies::from_backend(Arc::new(InMemoryLibrary::with_sample_data()));
        let session = Arc::new(SessionContext::new(deps.auth.clone()));
        session
            .login(Credentials {
                email: email.to_string(),
                password: "password".to_string(),
            })
            .await
            .unwrap();
        DashboardPage::new(deps, session)
    }

    #[tokio::test]
    async fn test_view_follows_role() {
        let user_page = page_for("user1@example.com").await;
        let admin_page = page_for("admin1@example.com").await;

        user_page.load().await.unwrap();
        admin_page.load().await.unwrap();

        assert!(matches!(
            user_page.state().view,
            Some(DashboardView::User(ref d)) if d.available_books == 6
        ));
        assert!(matches!(
            admin_page.state().view,
            Some(DashboardView::Admin(ref d)) if d.total_users == 3
        ));
    }

    #[tokio::test]
    async fn test_unmounted_page_discards_result() {
        let page = page_for("user1@example.com").await;
        page.scope().unmount();

        let result = page.load().await;

        assert!(matches!(result, Err(LibraryError::Unmounted)));
        assert!(page.state().loading);
        assert_eq!(page.state().view, None);
    }
}
