use crate::application::{Result, ServiceDependencies, SessionContext, favorites};
use crate::domain::commands::ToggleFavorite;
use crate::domain::{Book, BookId};
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesState {
    pub books: Vec<Book>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for FavoritesState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// お気に入り一覧ページ
pub struct FavoritesPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<FavoritesState>,
    removing: InFlight<BookId>,
}

impl FavoritesPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(FavoritesState::default()),
            removing: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> FavoritesState {
        lock(&self.state).clone()
    }

    pub async fn load(&self) -> Result<()> {
        let user = self.session.current_user()?;
        let result = favorites::favorites_of(&self.deps, user.id).await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok(books) => {
                state.books = books;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// お気に入りから外し、確認後に一覧から除く
    pub async fn remove(&self, book_id: BookId) -> Result<()> {
        let _guard = self.removing.begin(book_id)?;
        let user = self.session.current_user()?;

        let cmd = ToggleFavorite {
            book_id,
            last_known: true,
        };
        favorites::toggle_favorite(&self.deps, user.id, cmd).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).books.retain(|b| b.id != book_id);
        Ok(())
    }
}
