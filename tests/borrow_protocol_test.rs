//! 貸出・返却プロトコルの統合テスト
//!
//! 利用者と管理者がそれぞれ別のクライアントでスタブサーバーに接続し、
//! サーバーの応答だけを根拠にローカル状態を更新することを確かめる。

use chrono::{Duration, Utc};
use rusty_library_client::adapters::http::HttpLibraryApi;
use rusty_library_client::adapters::mock::InMemoryLibrary;
use rusty_library_client::application::{LibraryError, ServiceDependencies, SessionContext, borrow};
use rusty_library_client::domain::commands::BorrowBook;
use rusty_library_client::domain::*;
use rusty_library_client::pages::book_details::BookDetailsPage;
use rusty_library_client::pages::manage_borrows::ManageBorrowsPage;
use std::sync::Arc;

mod common;

use common::{credentials, in_memory, sign_in, spawn_stub};

/// スタブに接続し、指定の利用者でログインしたクライアント
async fn signed_in(base_url: &str, username: &str) -> (ServiceDependencies, Arc<SessionContext>) {
    let api = Arc::new(HttpLibraryApi::new(base_url, None).unwrap());
    let deps = ServiceDependencies::from_backend(api);
    let session = Arc::new(SessionContext::new(deps.auth.clone()));
    session.login(credentials(username)).await.unwrap();
    (deps, session)
}

#[tokio::test]
async fn test_borrow_last_copy_then_admin_returns_it() {
    // Arrange
    let library = Arc::new(InMemoryLibrary::with_sample_data());
    let base_url = spawn_stub(library.clone()).await;
    let (user_deps, user_session) = signed_in(&base_url, "user1").await;
    let (admin_deps, admin_session) = signed_in(&base_url, "admin1").await;

    let details = BookDetailsPage::new(user_deps, user_session, BookId::new(2));
    details.load().await.unwrap();
    let before = details.state().book.unwrap();
    assert_eq!((before.title.as_str(), before.total_copies, before.available_copies), ("1984", 3, 1));

    // Act: user1 が最後の1冊を借りる
    details.borrow().await.unwrap();

    // Assert
    let after = details.state().book.unwrap();
    assert_eq!(after.available_copies, 0);
    assert!(!after.is_available());
    let wire = serde_json::to_value(&after).unwrap();
    assert_eq!(wire["available"], false);

    let manage = ManageBorrowsPage::new(admin_deps, admin_session);
    manage.load().await.unwrap();
    let state = manage.state();
    assert_eq!(state.borrows.len(), 1);
    let record = state.borrows[0].clone();
    assert_eq!(record.user_id, UserId::new(1));
    assert_eq!(record.return_date, None);
    assert_eq!(record.due_date, record.borrow_date + Duration::days(30));
    assert!(state.available_books.iter().all(|b| b.id != BookId::new(2)));

    // Act: 管理者が返却を記録する
    let returned = manage.return_borrow(record.id).await.unwrap();

    // Assert
    assert!(returned.return_date.is_some());
    assert_eq!(returned.book.available_copies, Some(1));
    assert_eq!(returned.book.is_available(), Some(true));
    assert!(manage
        .state()
        .available_books
        .iter()
        .any(|b| b.id == BookId::new(2) && b.available_copies == 1));
    assert!(manage.state().borrows.is_empty());
    assert!(matches!(
        library.borrow_snapshot(record.id).unwrap().status(),
        BorrowStatus::Returned(_)
    ));

    // Act: 二度目の返却は拒否され、在庫は二重に戻らない
    let again = manage.return_borrow(record.id).await.unwrap_err();
    assert_eq!(again.http_status(), Some(409));
    assert_eq!(
        library.book_snapshot(BookId::new(2)).unwrap().available_copies,
        1
    );
}

#[tokio::test]
async fn test_stale_view_is_rejected_by_server_and_state_unchanged() {
    // Arrange: 2人の利用者が貸出可能1冊の状態で詳細ページを開く
    let library = Arc::new(InMemoryLibrary::with_sample_data());
    let base_url = spawn_stub(library.clone()).await;
    let (deps1, session1) = signed_in(&base_url, "user1").await;
    let (deps2, session2) = signed_in(&base_url, "user2").await;
    let first = BookDetailsPage::new(deps1, session1, BookId::new(2));
    let second = BookDetailsPage::new(deps2, session2, BookId::new(2));
    first.load().await.unwrap();
    second.load().await.unwrap();

    // Act
    first.borrow().await.unwrap();
    let stale = second.state().book;
    let result = second.borrow().await;

    // Assert: 手元の判定は通るがサーバーが 409 で拒否する
    let err = result.unwrap_err();
    assert!(matches!(
        &err,
        LibraryError::Api(e) if e.is_conflict()
    ));
    assert_eq!(second.state().book, stale);
    assert_eq!(
        library.book_snapshot(BookId::new(2)).unwrap().available_copies,
        0
    );
}

#[tokio::test]
async fn test_concurrent_borrows_never_oversell() {
    // Arrange: 貸出可能2冊の書籍に5人が同時に申し込む
    let (library, deps) = in_memory();
    let admin = sign_in(&library, "admin1").await;
    let book_id = BookId::new(3);

    // Act
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let deps = deps.clone();
            let admin = admin.clone();
            tokio::spawn(async move {
                let cmd = BorrowBook {
                    user_id: UserId::new(1),
                    book_id,
                };
                borrow::borrow_book(&deps, &admin, cmd, None).await
            })
        })
        .collect();
    let mut granted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(LibraryError::Api(e)) if e.is_conflict() => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // Assert
    assert_eq!((granted, rejected), (2, 3));
    let book = library.book_snapshot(book_id).unwrap();
    assert_eq!(book.available_copies, 0);
    assert!(book.check_copies().is_ok());
}

#[tokio::test]
async fn test_overdue_is_computed_from_due_date() {
    // Arrange
    let (library, deps) = in_memory();
    let now = Utc::now();
    library
        .borrow_at(
            BorrowBook {
                user_id: UserId::new(1),
                book_id: BookId::new(4),
            },
            now - Duration::days(31),
        )
        .unwrap();
    library
        .borrow_at(
            BorrowBook {
                user_id: UserId::new(1),
                book_id: BookId::new(5),
            },
            now - Duration::days(29),
        )
        .unwrap();

    // Act
    let active = borrow::active_borrows_of(&deps, UserId::new(1)).await.unwrap();
    let overdue = borrow::overdue(&active, now);

    // Assert
    assert_eq!(active.len(), 2);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].book_id, BookId::new(4));
}

#[tokio::test]
async fn test_user_cannot_return_or_borrow_for_others() {
    let (library, deps) = in_memory();
    let user = sign_in(&library, "user1").await;
    let record = library
        .borrow_at(
            BorrowBook {
                user_id: UserId::new(1),
                book_id: BookId::new(1),
            },
            Utc::now(),
        )
        .unwrap();

    let for_other = borrow::borrow_book(
        &deps,
        &user,
        BorrowBook {
            user_id: UserId::new(3),
            book_id: BookId::new(1),
        },
        None,
    )
    .await;
    let own_return = borrow::return_book(&deps, &user, record.id).await;

    assert!(matches!(for_other, Err(LibraryError::AdminRequired)));
    assert!(matches!(own_return, Err(LibraryError::AdminRequired)));
    assert!(library.borrow_snapshot(record.id).unwrap().is_active());
}
