//! テスト用のスタブAPIサーバー
//!
//! `InMemoryLibrary` を axum のルーターで包み、実際の REST API と同じパスと
//! ワイヤ形式で応答する。`/login` と `/register` 以外は Bearer トークンを要求する。

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rusty_library_client::adapters::http::HttpLibraryApi;
use rusty_library_client::adapters::mock::InMemoryLibrary;
use rusty_library_client::application::ServiceDependencies;
use rusty_library_client::domain::commands::BorrowBook;
use rusty_library_client::domain::*;
use rusty_library_client::ports::*;
use serde_json::json;
use std::result::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type Shared = Arc<InMemoryLibrary>;

/// スタブのエラー応答（FastAPI と同じ `{detail}` 形式）
struct StubError(ApiError);

impl From<ApiError> for StubError {
    fn from(err: ApiError) -> Self {
        StubError(err)
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            ApiError::Status { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

type Reply<T> = Result<Json<T>, StubError>;

/// スタブのルーター
pub fn stub_router(library: Shared) -> Router {
    let protected = Router::new()
        .route("/books", get(list_books).post(add_book))
        .route("/books/:id", get(get_book).put(update_book).delete(delete_book))
        .route("/borrowed/", post(borrow_book))
        .route("/borrowed/return/:id", post(return_book))
        .route("/borrowed/user/:id", get(user_borrows))
        .route("/borrowed/history/:id", get(user_history))
        .route("/borrowed/active", get(active_borrows))
        .route("/messages/user/:id", get(user_messages))
        .route("/messages/send", post(send_message))
        .route("/messages/read/:id", post(mark_read))
        .route("/messages/unread/:id", get(unread_messages))
        .route("/messages/unread/count/:id", get(unread_count))
        .route("/favorites/", post(add_favorite))
        .route("/favorites/user/:user_id", get(favorites))
        .route("/favorites/check/:user_id/:book_id", get(check_favorite))
        .route("/favorites/:user_id/:book_id", axum::routing::delete(remove_favorite))
        .route("/reviews/", post(create_review))
        .route("/reviews/book/:id", get(book_reviews))
        .route("/reviews/:id", axum::routing::delete(delete_review))
        .route("/reviews/:id/like", put(like_review))
        .route("/reviews/:id/dislike", put(dislike_review))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).put(update_user))
        .route_layer(middleware::from_fn_with_state(library.clone(), require_token));

    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(library)
}

/// エフェメラルポートでスタブを起動し、ベースURLを返す
pub async fn spawn_stub(library: Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("Failed to read stub address");
    let app = stub_router(library);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });
    format!("http://{addr}")
}

/// サンプルデータ入りのスタブと、それに接続した HTTP アダプタ
pub async fn http_backend() -> (Arc<InMemoryLibrary>, Arc<HttpLibraryApi>) {
    let library = Arc::new(InMemoryLibrary::with_sample_data());
    let base_url = spawn_stub(library.clone()).await;
    let api = HttpLibraryApi::new(base_url, None).expect("Failed to build HTTP client");
    (library, Arc::new(api))
}

/// インメモリ実装に直結した依存関係
pub fn in_memory() -> (Arc<InMemoryLibrary>, ServiceDependencies) {
    let library = Arc::new(InMemoryLibrary::with_sample_data());
    let deps = ServiceDependencies::from_backend(library.clone());
    (library, deps)
}

/// インメモリ実装に直接ログインし、その利用者を返す
pub async fn sign_in(library: &InMemoryLibrary, username: &str) -> User {
    library
        .login(credentials(username))
        .await
        .expect("Failed to sign in")
        .user
}

pub fn credentials(username: &str) -> Credentials {
    Credentials {
        email: format!("{username}@example.com"),
        password: "password".to_string(),
    }
}

// ============================================================================
// 認証
// ============================================================================

async fn require_token(State(library): State<Shared>, req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token.and_then(|t| library.authenticate(t)) {
        Some(_) => next.run(req).await,
        None => StubError(ApiError::unauthorized("Not authenticated")).into_response(),
    }
}

async fn login(State(library): State<Shared>, Json(body): Json<Credentials>) -> Reply<AuthSession> {
    Ok(Json(library.login(body).await?))
}

async fn register(
    State(library): State<Shared>,
    Json(body): Json<Registration>,
) -> Reply<AuthSession> {
    Ok(Json(library.register(body).await?))
}

// ============================================================================
// 書籍
// ============================================================================

async fn list_books(State(library): State<Shared>) -> Reply<Vec<Book>> {
    Ok(Json(library.list_books().await?))
}

async fn get_book(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Book> {
    Ok(Json(library.get_book(BookId::new(id)).await?))
}

async fn add_book(State(library): State<Shared>, Json(body): Json<NewBook>) -> Reply<Book> {
    Ok(Json(library.add_book(body).await?))
}

async fn update_book(
    State(library): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<BookUpdate>,
) -> Reply<Book> {
    Ok(Json(library.update_book(BookId::new(id), body).await?))
}

async fn delete_book(
    State(library): State<Shared>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StubError> {
    library.delete_book(BookId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 貸出
// ============================================================================

async fn borrow_book(
    State(library): State<Shared>,
    Json(body): Json<BorrowBook>,
) -> Reply<BorrowedBook> {
    Ok(Json(library.borrow_book(body).await?))
}

async fn return_book(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<BorrowedBook> {
    Ok(Json(library.return_book(BorrowId::new(id)).await?))
}

async fn user_borrows(
    State(library): State<Shared>,
    Path(id): Path<i64>,
) -> Reply<Vec<BorrowedBook>> {
    Ok(Json(library.user_borrows(UserId::new(id)).await?))
}

async fn user_history(
    State(library): State<Shared>,
    Path(id): Path<i64>,
) -> Reply<Vec<BorrowedBook>> {
    Ok(Json(library.user_history(UserId::new(id)).await?))
}

async fn active_borrows(State(library): State<Shared>) -> Reply<Vec<BorrowedBook>> {
    Ok(Json(library.active_borrows().await?))
}

// ============================================================================
// メッセージ
// ============================================================================

async fn user_messages(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Vec<Message>> {
    Ok(Json(library.user_messages(UserId::new(id)).await?))
}

async fn send_message(
    State(library): State<Shared>,
    Json(body): Json<NewMessage>,
) -> Reply<Message> {
    Ok(Json(library.send_message(body).await?))
}

async fn mark_read(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Message> {
    Ok(Json(library.mark_read(MessageId::new(id)).await?))
}

async fn unread_messages(
    State(library): State<Shared>,
    Path(id): Path<i64>,
) -> Reply<Vec<Message>> {
    Ok(Json(library.unread_messages(UserId::new(id)).await?))
}

async fn unread_count(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<UnreadCount> {
    let unread_count = library.unread_count(UserId::new(id)).await?;
    Ok(Json(UnreadCount { unread_count }))
}

// ============================================================================
// お気に入り
// ============================================================================

async fn favorites(State(library): State<Shared>, Path(user_id): Path<i64>) -> Reply<Vec<Book>> {
    Ok(Json(library.favorites(UserId::new(user_id)).await?))
}

async fn add_favorite(
    State(library): State<Shared>,
    Json(body): Json<Favorite>,
) -> Result<StatusCode, StubError> {
    library.add_favorite(body.user_id, body.book_id).await?;
    Ok(StatusCode::CREATED)
}

async fn remove_favorite(
    State(library): State<Shared>,
    Path((user_id, book_id)): Path<(i64, i64)>,
) -> Result<StatusCode, StubError> {
    library
        .remove_favorite(UserId::new(user_id), BookId::new(book_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check_favorite(
    State(library): State<Shared>,
    Path((user_id, book_id)): Path<(i64, i64)>,
) -> Reply<FavoriteStatus> {
    let is_favorite = library
        .check_favorite(UserId::new(user_id), BookId::new(book_id))
        .await?;
    Ok(Json(FavoriteStatus { is_favorite }))
}

// ============================================================================
// レビュー
// ============================================================================

async fn book_reviews(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Vec<Review>> {
    Ok(Json(library.book_reviews(BookId::new(id)).await?))
}

async fn create_review(State(library): State<Shared>, Json(body): Json<NewReview>) -> Reply<Review> {
    Ok(Json(library.create_review(body).await?))
}

async fn like_review(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Review> {
    Ok(Json(library.like_review(ReviewId::new(id)).await?))
}

async fn dislike_review(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<Review> {
    Ok(Json(library.dislike_review(ReviewId::new(id)).await?))
}

async fn delete_review(
    State(library): State<Shared>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StubError> {
    library.delete_review(ReviewId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 利用者
// ============================================================================

async fn list_users(State(library): State<Shared>) -> Reply<Vec<User>> {
    Ok(Json(library.list_users().await?))
}

async fn get_user(State(library): State<Shared>, Path(id): Path<i64>) -> Reply<User> {
    Ok(Json(library.get_user(UserId::new(id)).await?))
}

async fn update_user(
    State(library): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<UserUpdate>,
) -> Reply<User> {
    Ok(Json(library.update_user(UserId::new(id), body).await?))
}
