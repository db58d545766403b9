use crate::domain::{Book, BookId, BookUpdate, NewBook, User};
use tracing::info;

use super::deps::ServiceDependencies;
use super::errors::{LibraryError, Result};

/// カテゴリ絞り込みで「すべて」を表す疑似カテゴリ
pub const ALL_CATEGORIES: &str = "All";

/// 人気カテゴリとして表示する件数
pub const POPULAR_CATEGORY_LIMIT: usize = 5;

/// カテゴリごとの書籍数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// 蔵書検索（利用者向け）
///
/// 書名・著者・説明の部分一致（大文字小文字を区別しない）とカテゴリで絞り込む。
pub fn browse(books: &[Book], query: &str, category: &str) -> Vec<Book> {
    let query = query.trim().to_lowercase();
    books
        .iter()
        .filter(|b| category == ALL_CATEGORIES || category.is_empty() || b.category == category)
        .filter(|b| {
            query.is_empty()
                || contains(&b.title, &query)
                || contains(&b.author, &query)
                || contains(&b.description, &query)
        })
        .cloned()
        .collect()
}

/// 蔵書検索（管理者向け）
///
/// 書名・著者・ISBN・カテゴリの部分一致。
pub fn search_inventory(books: &[Book], query: &str) -> Vec<Book> {
    let query = query.trim().to_lowercase();
    books
        .iter()
        .filter(|b| {
            query.is_empty()
                || contains(&b.title, &query)
                || contains(&b.author, &query)
                || contains(&b.isbn, &query)
                || contains(&b.category, &query)
        })
        .cloned()
        .collect()
}

/// カテゴリ一覧（先頭は「すべて」、以降は初出順）
pub fn categories(books: &[Book]) -> Vec<String> {
    let mut names = vec![ALL_CATEGORIES.to_string()];
    for book in books {
        if !book.category.is_empty() && !names.contains(&book.category) {
            names.push(book.category.clone());
        }
    }
    names
}

/// 書籍数の多いカテゴリ上位5件
///
/// 同数の場合は初出順。
pub fn popular_categories(books: &[Book]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for book in books.iter().filter(|b| !b.category.is_empty()) {
        match counts.iter_mut().find(|c| c.name == book.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                name: book.category.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(POPULAR_CATEGORY_LIMIT);
    counts
}

/// 貸出可能な書籍のみ
pub fn available_books(books: &[Book]) -> Vec<Book> {
    books.iter().filter(|b| b.is_available()).cloned().collect()
}

fn require_admin(actor: &User) -> Result<()> {
    if !actor.is_admin() {
        return Err(LibraryError::AdminRequired);
    }
    Ok(())
}

/// 書籍を登録する（管理者のみ）
pub async fn add_book(deps: &ServiceDependencies, actor: &User, book: NewBook) -> Result<Book> {
    require_admin(actor)?;
    book.validate()?;

    let created = deps.books.add_book(book).await?;
    info!(book_id = %created.id, title = %created.title, "book added");
    Ok(created)
}

/// 書籍を更新する（管理者のみ）
///
/// 蔵書数の不変条件はリクエスト前に現在の書籍へ適用して確認する。
pub async fn update_book(
    deps: &ServiceDependencies,
    actor: &User,
    current: &Book,
    update: BookUpdate,
) -> Result<Book> {
    require_admin(actor)?;
    let mut preview = current.clone();
    preview
        .apply(&update)
        .map_err(|e| LibraryError::Validation(e.into()))?;

    let updated = deps.books.update_book(current.id, update).await?;
    info!(book_id = %updated.id, "book updated");
    Ok(updated)
}

/// 書籍を削除する（管理者のみ）
pub async fn delete_book(deps: &ServiceDependencies, actor: &User, book_id: BookId) -> Result<()> {
    require_admin(actor)?;
    deps.books.delete_book(book_id).await?;
    info!(%book_id, "book deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;
    use crate::domain::{Role, UserId, ValidationError};
    use crate::ports::BookApi;
    use std::sync::Arc;

    async fn sample_books() -> Vec<Book> {
        InMemoryLibrary::with_sample_data().list_books().await.unwrap()
    }

    fn admin() -> User {
        User {
            id: UserId::new(2),
            username: "admin1".to_string(),
            email: "admin1@example.com".to_string(),
            role: Role::Admin,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_browse_by_query_and_category() {
        let books = sample_books().await;

        assert_eq!(browse(&books, "", ALL_CATEGORIES).len(), 6);
        assert_eq!(browse(&books, "", "Classic").len(), 3);

        let hits = browse(&books, "DYSTOPIAN", ALL_CATEGORIES);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "1984");

        assert!(browse(&books, "orwell", "Fantasy").is_empty());
    }

    #[tokio::test]
    async fn test_inventory_search_matches_isbn_and_category() {
        let books = sample_books().await;

        assert_eq!(search_inventory(&books, "978-0-618").len(), 1);
        assert_eq!(search_inventory(&books, "romance").len(), 1);
    }

    #[tokio::test]
    async fn test_categories_in_first_seen_order() {
        let books = sample_books().await;
        assert_eq!(
            categories(&books),
            vec!["All", "Classic", "Science Fiction", "Fantasy", "Romance"]
        );
    }

    #[tokio::test]
    async fn test_popular_categories_sorted_by_count() {
        let books = sample_books().await;
        let popular = popular_categories(&books);

        assert_eq!(popular.len(), 4);
        assert_eq!(
            popular[0],
            CategoryCount {
                name: "Classic".to_string(),
                count: 3
            }
        );
        assert_eq!(popular[1].name, "Science Fiction");
    }

    #[tokio::test]
    async fn test_update_rejects_copies_invariant_before_request() {
        // Arrange
        let library = Arc::new(InMemoryLibrary::with_sample_data());
        let deps = ServiceDependencies::from_backend(library.clone());
        let current = library.book_snapshot(BookId::new(2)).unwrap();

        // Act
        let result = update_book(
            &deps,
            &admin(),
            &current,
            BookUpdate {
                available_copies: Some(9),
                ..Default::default()
            },
        )
        .await;

        // Assert
        assert!(matches!(
            result,
            Err(LibraryError::Validation(ValidationError::Copies(_)))
        ));
        assert_eq!(library.book_snapshot(BookId::new(2)).unwrap(), current);
    }

    #[tokio::test]
    async fn test_delete_requires_admin() {
        let deps = ServiceDependencies::from_backend(Arc::new(InMemoryLibrary::with_sample_data()));
        let user = User {
            role: Role::User,
            ..admin()
        };

        let result = delete_book(&deps, &user, BookId::new(1)).await;
        assert!(matches!(result, Err(LibraryError::AdminRequired)));

        delete_book(&deps, &admin(), BookId::new(1)).await.unwrap();
        assert!(deps.books.get_book(BookId::new(1)).await.unwrap_err().is_not_found());
    }
}
