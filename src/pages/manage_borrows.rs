use crate::application::borrow::{self, BorrowFilter};
use crate::application::{LibraryError, Result, ServiceDependencies, SessionContext, catalog};
use crate::domain::commands::BorrowBook;
use crate::domain::{Book, BookId, BorrowId, BorrowedBook, User, UserId, ValidationError};
use chrono::{DateTime, Utc};
use futures::try_join;
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManageBorrowsState {
    pub borrows: Vec<BorrowedBook>,
    pub users: Vec<User>,
    /// 新規貸出フォームで選べる書籍（貸出可能なもののみ）
    pub available_books: Vec<Book>,
    pub filter: BorrowFilter,
    pub query: String,
    pub selected_user: Option<UserId>,
    pub selected_book: Option<BookId>,
    pub loaded: bool,
    pub error: Option<String>,
}

impl ManageBorrowsState {
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<BorrowedBook> {
        borrow::filter_borrows(&self.borrows, &self.users, self.filter, &self.query, now)
    }

    /// 借り手のユーザー名
    pub fn borrower_name(&self, record: &BorrowedBook) -> &str {
        self.users
            .iter()
            .find(|u| u.id == record.user_id)
            .map(|u| u.username.as_str())
            .unwrap_or("Unknown User")
    }
}

/// 貸出管理ページ（管理者）
pub struct ManageBorrowsPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<ManageBorrowsState>,
    returning: InFlight<BorrowId>,
    issuing: InFlight<&'static str>,
}

impl ManageBorrowsPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(ManageBorrowsState::default()),
            returning: InFlight::new(),
            issuing: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> ManageBorrowsState {
        lock(&self.state).clone()
    }

    pub fn is_returning(&self, borrow_id: BorrowId) -> bool {
        self.returning.is_pending(&borrow_id)
    }

    /// 貸出中の記録・利用者・書籍を読み込む
    pub async fn load(&self) -> Result<()> {
        let admin = self.session.require_admin()?;
        let result = try_join!(
            borrow::all_active_borrows(&self.deps, &admin),
            async { Ok::<_, LibraryError>(self.deps.users.list_users().await?) },
            async { Ok::<_, LibraryError>(self.deps.books.list_books().await?) },
        );
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loaded = true;
        match result {
            Ok((borrows, users, books)) => {
                state.borrows = borrows;
                state.users = users;
                state.available_books = catalog::available_books(&books);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_filter(&self, filter: BorrowFilter) {
        lock(&self.state).filter = filter;
    }

    pub fn set_query(&self, query: &str) {
        lock(&self.state).query = query.to_string();
    }

    pub fn select_user(&self, user_id: Option<UserId>) {
        lock(&self.state).selected_user = user_id;
    }

    pub fn select_book(&self, book_id: Option<BookId>) {
        lock(&self.state).selected_book = book_id;
    }

    /// 返却を記録し、確認後に一覧から外す
    ///
    /// 貸出可能な書籍一覧の該当書籍は応答の書籍で置き換える。
    pub async fn return_borrow(&self, borrow_id: BorrowId) -> Result<BorrowedBook> {
        let _guard = self.returning.begin(borrow_id)?;
        let admin = self.session.require_admin()?;

        let returned = borrow::return_book(&self.deps, &admin, borrow_id).await?;
        let known = lock(&self.state)
            .available_books
            .iter()
            .find(|b| b.id == returned.book_id)
            .cloned();
        let book = borrow::current_book(&self.deps, &returned.book, known.as_ref()).await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.borrows.retain(|r| r.id != borrow_id);
        match book {
            Ok(book) => replace_available(&mut state.available_books, book),
            Err(e) => state.error = Some(e.to_string()),
        }
        Ok(returned)
    }

    /// 選択中の利用者の名義で選択中の書籍を貸し出す
    ///
    /// 成功後は貸出中一覧と貸出可能な書籍一覧をサーバーから取り直す。
    pub async fn issue_borrow(&self) -> Result<BorrowedBook> {
        let _guard = self.issuing.begin("issue")?;
        let admin = self.session.require_admin()?;
        let (user_id, book_id, known) = {
            let state = lock(&self.state);
            let known = state
                .available_books
                .iter()
                .find(|b| Some(b.id) == state.selected_book)
                .cloned();
            (state.selected_user, state.selected_book, known)
        };
        let user_id = user_id.ok_or(ValidationError::Required("user"))?;
        let book_id = book_id.ok_or(ValidationError::Required("book"))?;

        let cmd = BorrowBook { user_id, book_id };
        let record = borrow::borrow_book(&self.deps, &admin, cmd, known.as_ref()).await?;

        let refreshed = try_join!(
            borrow::all_active_borrows(&self.deps, &admin),
            async { Ok::<_, LibraryError>(self.deps.books.list_books().await?) },
        );
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.selected_user = None;
        state.selected_book = None;
        match refreshed {
            Ok((borrows, books)) => {
                state.borrows = borrows;
                state.available_books = catalog::available_books(&books);
            }
            Err(e) => {
                state.borrows.push(record.clone());
                state.error = Some(e.to_string());
            }
        }
        Ok(record)
    }
}

/// 貸出可能な書籍一覧の該当書籍をサーバーの書籍で置き換える
fn replace_available(books: &mut Vec<Book>, book: Book) {
    match books.iter().position(|b| b.id == book.id) {
        Some(index) if book.is_available() => books[index] = book,
        Some(index) => {
            books.remove(index);
        }
        None if book.is_available() => books.push(book),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;
    use crate::domain::Credentials;

    async fn open() -> (Arc<InMemoryLibrary>, ManageBorrowsPage) {
        let library = Arc::new(InMemoryLibrary::with_sample_data());
        let deps = ServiceDependencies::from_backend(library.clone());
        let session = Arc::new(SessionContext::new(deps.auth.clone()));
        session
            .login(Credentials {
                email: "admin1@example.com".to_string(),
                password: "password".to_string(),
            })
            .await
            .unwrap();
        let page = ManageBorrowsPage::new(deps, session);
        page.load().await.unwrap();
        (library, page)
    }

    #[tokio::test]
    async fn test_issue_borrow_requires_selection() {
        let (_library, page) = open().await;
        page.select_book(Some(BookId::new(2)));

        let result = page.issue_borrow().await;

        assert!(matches!(
            result,
            Err(LibraryError::Validation(ValidationError::Required("user")))
        ));
    }

    #[tokio::test]
    async fn test_issue_then_return() {
        // Arrange
        let (library, page) = open().await;
        page.select_user(Some(UserId::new(1)));
        page.select_book(Some(BookId::new(2)));

        // Act: 貸出
        let record = page.issue_borrow().await.unwrap();

        // Assert: 一覧と貸出可能な書籍が取り直されている
        let state = page.state();
        assert_eq!(state.borrows.len(), 1);
        assert_eq!(state.borrower_name(&state.borrows[0]), "user1");
        assert!(state.available_books.iter().all(|b| b.id != BookId::new(2)));
        assert_eq!(state.selected_book, None);

        // Act: 返却
        let returned = page.return_borrow(record.id).await.unwrap();

        // Assert
        assert_eq!(returned.book.available_copies, Some(1));
        let state = page.state();
        assert!(state.borrows.is_empty());
        assert!(state.available_books.iter().any(|b| b.id == BookId::new(2)));
        assert_eq!(
            library.book_snapshot(BookId::new(2)).unwrap().available_copies,
            1
        );

        // Act: 二度目の返却
        let again = page.return_borrow(record.id).await;
        assert_eq!(again.unwrap_err().http_status(), Some(409));
    }

    #[tokio::test]
    async fn test_return_replaces_listed_book_counts() {
        // Arrange: To Kill a Mockingbird（所蔵5冊・貸出可能3冊）を1冊貸し出す
        let (library, page) = open().await;
        page.select_user(Some(UserId::new(1)));
        page.select_book(Some(BookId::new(1)));
        let record = page.issue_borrow().await.unwrap();
        let listed = |page: &ManageBorrowsPage| {
            page.state()
                .available_books
                .into_iter()
                .find(|b| b.id == BookId::new(1))
                .unwrap()
                .available_copies
        };
        assert_eq!(listed(&page), 2);

        // Act
        page.return_borrow(record.id).await.unwrap();

        // Assert: 一覧に残っていた書籍もサーバーの値に置き換わる
        assert_eq!(listed(&page), 3);
        assert_eq!(
            library.book_snapshot(BookId::new(1)).unwrap().available_copies,
            3
        );
    }

    #[test]
    fn test_replace_available_drops_exhausted_book() {
        let mut books = Vec::new();
        let mut book = crate::domain::book::fixtures::sample_book(1, 3);
        replace_available(&mut books, book.clone());
        assert_eq!(books.len(), 1);

        book.available_copies = 0;
        replace_available(&mut books, book);
        assert!(books.is_empty());
    }
}
