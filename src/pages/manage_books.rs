use crate::application::catalog;
use crate::application::{Result, ServiceDependencies, SessionContext};
use crate::domain::{Book, BookId, BookUpdate, NewBook};
use crate::ports::ApiError;
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

/// 新規登録フォームの初期値（今年の出版、所蔵1冊・貸出可能1冊）
pub fn blank_book() -> NewBook {
    NewBook {
        title: String::new(),
        author: String::new(),
        description: String::new(),
        cover_image: String::new(),
        isbn: String::new(),
        publish_year: Utc::now().year(),
        category: String::new(),
        total_copies: 1,
        available_copies: Some(1),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManageBooksState {
    pub books: Vec<Book>,
    pub query: String,
    /// 編集中の下書き（書籍ごと）
    pub drafts: HashMap<BookId, BookUpdate>,
    pub loaded: bool,
    pub error: Option<String>,
}

impl ManageBooksState {
    pub fn visible(&self) -> Vec<Book> {
        catalog::search_inventory(&self.books, &self.query)
    }
}

/// 蔵書管理ページ（管理者）
pub struct ManageBooksPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<ManageBooksState>,
    in_flight: InFlight<BookId>,
    adding: InFlight<&'static str>,
}

impl ManageBooksPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(ManageBooksState::default()),
            in_flight: InFlight::new(),
            adding: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> ManageBooksState {
        lock(&self.state).clone()
    }

    pub async fn load(&self) -> Result<()> {
        self.session.require_admin()?;
        let result = self.deps.books.list_books().await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loaded = true;
        match result {
            Ok(books) => {
                state.books = books;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn set_query(&self, query: &str) {
        lock(&self.state).query = query.to_string();
    }

    /// 書籍を登録し、応答の書籍を一覧に加える
    pub async fn add(&self, book: NewBook) -> Result<Book> {
        let _guard = self.adding.begin("add")?;
        let admin = self.session.require_admin()?;

        let created = catalog::add_book(&self.deps, &admin, book).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).books.push(created.clone());
        Ok(created)
    }

    /// 編集を開始する（現在の値で下書きを作る）
    pub fn begin_edit(&self, book_id: BookId) -> Result<()> {
        let mut state = lock(&self.state);
        let book = state
            .books
            .iter()
            .find(|b| b.id == book_id)
            .ok_or_else(|| ApiError::not_found("Book not found"))?;
        let draft = BookUpdate::from(book);
        state.drafts.insert(book_id, draft);
        Ok(())
    }

    /// 下書きを書き換える
    pub fn edit(&self, book_id: BookId, change: impl FnOnce(&mut BookUpdate)) {
        if let Some(draft) = lock(&self.state).drafts.get_mut(&book_id) {
            change(draft);
        }
    }

    pub fn cancel_edit(&self, book_id: BookId) {
        lock(&self.state).drafts.remove(&book_id);
    }

    /// 下書きを保存し、応答の書籍で一覧の該当書籍を置き換える
    pub async fn save_edit(&self, book_id: BookId) -> Result<Book> {
        let _guard = self.in_flight.begin(book_id)?;
        let admin = self.session.require_admin()?;
        let (current, draft) = {
            let state = lock(&self.state);
            let current = state.books.iter().find(|b| b.id == book_id).cloned();
            let draft = state.drafts.get(&book_id).cloned();
            (current, draft)
        };
        let (Some(current), Some(draft)) = (current, draft) else {
            return Err(ApiError::not_found("No draft for book").into());
        };

        let updated = catalog::update_book(&self.deps, &admin, &current, draft).await?;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        if let Some(slot) = state.books.iter_mut().find(|b| b.id == book_id) {
            *slot = updated.clone();
        }
        state.drafts.remove(&book_id);
        Ok(updated)
    }

    /// 削除し、サーバーの確認後に一覧から外す
    pub async fn delete(&self, book_id: BookId) -> Result<()> {
        let _guard = self.in_flight.begin(book_id)?;
        let admin = self.session.require_admin()?;

        catalog::delete_book(&self.deps, &admin, book_id).await?;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.books.retain(|b| b.id != book_id);
        state.drafts.remove(&book_id);
        Ok(())
    }
}
