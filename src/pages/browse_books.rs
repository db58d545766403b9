use crate::application::catalog::{self, ALL_CATEGORIES};
use crate::application::{Result, ServiceDependencies};
use crate::domain::Book;
use std::sync::Mutex;

use super::lifecycle::{PageScope, lock};

/// 蔵書一覧ページの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseBooksState {
    pub books: Vec<Book>,
    pub query: String,
    pub category: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for BrowseBooksState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            loading: true,
            error: None,
        }
    }
}

impl BrowseBooksState {
    /// 検索語とカテゴリで絞り込んだ書籍
    pub fn visible(&self) -> Vec<Book> {
        catalog::browse(&self.books, &self.query, &self.category)
    }

    pub fn categories(&self) -> Vec<String> {
        catalog::categories(&self.books)
    }
}

/// 蔵書一覧ページ
pub struct BrowseBooksPage {
    deps: ServiceDependencies,
    scope: PageScope,
    state: Mutex<BrowseBooksState>,
}

impl BrowseBooksPage {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self {
            deps,
            scope: PageScope::new(),
            state: Mutex::new(BrowseBooksState::default()),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> BrowseBooksState {
        lock(&self.state).clone()
    }

    /// マウント時の読み込み
    pub async fn load(&self) -> Result<()> {
        let result = self.deps.books.list_books().await;
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
                Err(e.into())
            }
        }
    }

    pub fn set_query(&self, query: &str) {
        lock(&self.state).query = query.to_string();
    }

    /// カテゴリを選ぶ（空文字は「すべて」）
    pub fn set_category(&self, category: &str) {
        let category = if category.is_empty() {
            ALL_CATEGORIES
        } else {
            category
        };
        lock(&self.state).category = category.to_string();
    }
}
