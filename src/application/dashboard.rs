use crate::domain::{BorrowedBook, User};
use chrono::{DateTime, Utc};
use futures::try_join;

use super::borrow::overdue;
use super::catalog::{CategoryCount, available_books, popular_categories};
use super::deps::ServiceDependencies;
use super::errors::{LibraryError, Result};

/// 利用者ダッシュボードの集計
#[derive(Debug, Clone, PartialEq)]
pub struct UserDashboard {
    pub available_books: usize,
    pub active_borrows: Vec<BorrowedBook>,
    pub overdue_borrows: usize,
    pub popular_categories: Vec<CategoryCount>,
    pub unread_messages: u64,
}

impl UserDashboard {
    /// 表示するカテゴリ数（人気カテゴリの件数）
    pub fn category_count(&self) -> usize {
        self.popular_categories.len()
    }
}

/// 管理者ダッシュボードの集計
#[derive(Debug, Clone, PartialEq)]
pub struct AdminDashboard {
    pub total_books: usize,
    pub total_users: usize,
    pub active_borrows: Vec<BorrowedBook>,
    pub overdue_borrows: usize,
    pub popular_categories: Vec<CategoryCount>,
    pub unread_messages: u64,
}

/// 利用者ダッシュボードを読み込む
///
/// 書籍・貸出・未読件数を並行に取得する。
pub async fn load_user_dashboard(
    deps: &ServiceDependencies,
    viewer: &User,
    now: DateTime<Utc>,
) -> Result<UserDashboard> {
    let (books, borrows, unread) = try_join!(
        deps.books.list_books(),
        deps.borrows.user_borrows(viewer.id),
        deps.messages.unread_count(viewer.id),
    )?;

    Ok(UserDashboard {
        available_books: available_books(&books).len(),
        overdue_borrows: overdue(&borrows, now).len(),
        active_borrows: borrows,
        popular_categories: popular_categories(&books),
        unread_messages: unread,
    })
}

/// 管理者ダッシュボードを読み込む（管理者のみ）
pub async fn load_admin_dashboard(
    deps: &ServiceDependencies,
    viewer: &User,
    now: DateTime<Utc>,
) -> Result<AdminDashboard> {
    if !viewer.is_admin() {
        return Err(LibraryError::AdminRequired);
    }

    let (books, users, borrows, unread) = try_join!(
        deps.books.list_books(),
        deps.users.list_users(),
        deps.borrows.active_borrows(),
        deps.messages.unread_count(viewer.id),
    )?;

    Ok(AdminDashboard {
        total_books: books.len(),
        total_users: users.len(),
        overdue_borrows: overdue(&borrows, now).len(),
        active_borrows: borrows,
        popular_categories: popular_categories(&books),
        unread_messages: unread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;
    use crate::domain::commands::BorrowBook;
    use crate::domain::{BookId, NewMessage, Role, UserId};
    use chrono::Duration;
    use std::sync::Arc;

    fn user(id: i64, role: Role) -> User {
        User {
            id: UserId::new(id),
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            role,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_admin_dashboard_counts() {
        // Arrange
        let library = Arc::new(InMemoryLibrary::with_sample_data());
        let deps = ServiceDependencies::from_backend(library.clone());
        let now = Utc::now();
        library
            .borrow_at(
                BorrowBook {
                    user_id: UserId::new(1),
                    book_id: BookId::new(2),
                },
                now - Duration::days(31),
            )
            .unwrap();
        library
            .borrow_at(
                BorrowBook {
                    user_id: UserId::new(3),
                    book_id: BookId::new(4),
                },
                now,
            )
            .unwrap();
        library.insert_message(
            NewMessage {
                sender_id: UserId::new(1),
                receiver_id: UserId::new(2),
                content: "Hello".to_string(),
            },
            now,
        );

        // Act
        let dashboard = load_admin_dashboard(&deps, &user(2, Role::Admin), now)
            .await
            .unwrap();

        // Assert
        assert_eq!(dashboard.total_books, 6);
        assert_eq!(dashboard.total_users, 3);
        assert_eq!(dashboard.active_borrows.len(), 2);
        assert_eq!(dashboard.overdue_borrows, 1);
        assert_eq!(dashboard.unread_messages, 1);
        assert_eq!(dashboard.popular_categories[0].name, "Classic");
    }

    #[tokio::test]
    async fn test_user_dashboard_counts() {
        let library = Arc::new(InMemoryLibrary::with_sample_data());
        let deps = ServiceDependencies::from_backend(library.clone());
        library
            .borrow_at(
                BorrowBook {
                    user_id: UserId::new(1),
                    book_id: BookId::new(2),
                },
                Utc::now(),
            )
            .unwrap();

        let dashboard = load_user_dashboard(&deps, &user(1, Role::User), Utc::now())
            .await
            .unwrap();

        // 1984 の最後の1冊が貸し出されたため、貸出可能は5冊
        assert_eq!(dashboard.available_books, 5);
        assert_eq!(dashboard.active_borrows.len(), 1);
        assert_eq!(dashboard.overdue_borrows, 0);
        assert_eq!(dashboard.category_count(), 4);
        assert_eq!(dashboard.unread_messages, 0);
    }

    #[tokio::test]
    async fn test_admin_dashboard_requires_admin() {
        let deps = ServiceDependencies::from_backend(Arc::new(InMemoryLibrary::with_sample_data()));
        let result = load_admin_dashboard(&deps, &user(1, Role::User), Utc::now()).await;
        assert!(matches!(result, Err(LibraryError::AdminRequired)));
    }
}
