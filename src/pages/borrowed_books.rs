use crate::application::{Result, ServiceDependencies, SessionContext, borrow};
use crate::domain::BorrowedBook;
use chrono::{DateTime, Utc};
use futures::try_join;
use std::sync::{Arc, Mutex};

use super::lifecycle::{PageScope, lock};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowedBooksState {
    /// 貸出中
    pub active: Vec<BorrowedBook>,
    /// 返却済み
    pub history: Vec<BorrowedBook>,
    pub loaded: bool,
    pub error: Option<String>,
}

impl BorrowedBooksState {
    /// 延滞中の記録
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<BorrowedBook> {
        borrow::overdue(&self.active, now)
    }
}

/// 利用者の貸出中一覧と返却履歴のページ
pub struct BorrowedBooksPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<BorrowedBooksState>,
}

impl BorrowedBooksPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(BorrowedBooksState::default()),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> BorrowedBooksState {
        lock(&self.state).clone()
    }

    pub async fn load(&self) -> Result<()> {
        let user = self.session.current_user()?;
        let result = try_join!(
            borrow::active_borrows_of(&self.deps, user.id),
            borrow::history_of(&self.deps, user.id),
        );
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loaded = true;
        match result {
            Ok((active, history)) => {
                state.active = active;
                state.history = history;
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
