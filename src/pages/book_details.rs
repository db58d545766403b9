use crate::application::{LibraryError, Result, ServiceDependencies, SessionContext};
use crate::application::{borrow, favorites, reviews};
use crate::domain::commands::{BorrowBook, PostReview, ToggleFavorite};
use crate::domain::{Book, BookId, Review, ReviewId, average_rating};
use crate::ports::ApiError;
use futures::try_join;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

/// 書籍詳細ページの操作（処理中キー）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailsAction {
    Borrow,
    Favorite,
    PostReview,
    Vote(ReviewId),
}

impl fmt::Display for DetailsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailsAction::Borrow => write!(f, "borrow"),
            DetailsAction::Favorite => write!(f, "favorite"),
            DetailsAction::PostReview => write!(f, "post-review"),
            DetailsAction::Vote(id) => write!(f, "vote:{id}"),
        }
    }
}

/// 操作結果の表示状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionStatus {
    #[default]
    Idle,
    Success,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetailsState {
    pub book: Option<Book>,
    pub reviews: Vec<Review>,
    pub is_favorite: bool,
    pub borrow_status: ActionStatus,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for BookDetailsState {
    fn default() -> Self {
        Self {
            book: None,
            reviews: Vec::new(),
            is_favorite: false,
            borrow_status: ActionStatus::Idle,
            loading: true,
            error: None,
        }
    }
}

impl BookDetailsState {
    pub fn average_rating(&self) -> Option<f64> {
        average_rating(&self.reviews)
    }

    /// 借りるボタンを押せるか
    pub fn can_borrow(&self) -> bool {
        self.book.as_ref().is_some_and(Book::is_available)
    }
}

/// 書籍詳細ページ
///
/// 書籍・レビュー・お気に入り状態を表示し、貸出・お気に入り・レビュー操作を受け付ける。
/// すべての操作はサーバーの応答を待ってからローカル状態を置き換える。
pub struct BookDetailsPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    book_id: BookId,
    scope: PageScope,
    state: Mutex<BookDetailsState>,
    in_flight: InFlight<DetailsAction>,
}

impl BookDetailsPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>, book_id: BookId) -> Self {
        Self {
            deps,
            session,
            book_id,
            scope: PageScope::new(),
            state: Mutex::new(BookDetailsState::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> BookDetailsState {
        lock(&self.state).clone()
    }

    pub fn is_pending(&self, action: DetailsAction) -> bool {
        self.in_flight.is_pending(&action)
    }

    /// 書籍・レビュー・お気に入り状態を並行に読み込む
    pub async fn load(&self) -> Result<()> {
        let user = self.session.current_user()?;
        let result = try_join!(
            async { Ok::<_, LibraryError>(self.deps.books.get_book(self.book_id).await?) },
            reviews::reviews_for(&self.deps, self.book_id),
            favorites::is_favorite(&self.deps, user.id, self.book_id),
        );
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok((book, reviews, is_favorite)) => {
                state.book = Some(book);
                state.reviews = reviews;
                state.is_favorite = is_favorite;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// 自分の名義で借りる
    ///
    /// 成功時は応答の書籍（蔵書数が無ければ取り直した書籍）でローカルの書籍を置き換える。
    pub async fn borrow(&self) -> Result<()> {
        let _guard = self.in_flight.begin(DetailsAction::Borrow)?;
        let user = self.session.current_user()?;
        let known = lock(&self.state).book.clone();

        let cmd = BorrowBook {
            user_id: user.id,
            book_id: self.book_id,
        };
        let result = borrow::borrow_book(&self.deps, &user, cmd, known.as_ref()).await;
        let refreshed = match &result {
            Ok(record) => Some(borrow::current_book(&self.deps, &record.book, known.as_ref()).await),
            Err(_) => None,
        };
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        match result {
            Ok(_) => {
                state.borrow_status = ActionStatus::Success;
                match refreshed {
                    Some(Ok(book)) => state.book = Some(book),
                    Some(Err(e)) => state.error = Some(e.to_string()),
                    None => {}
                }
                Ok(())
            }
            Err(e) => {
                state.borrow_status = ActionStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// お気に入りを切り替える
    pub async fn toggle_favorite(&self) -> Result<bool> {
        let _guard = self.in_flight.begin(DetailsAction::Favorite)?;
        let user = self.session.current_user()?;
        let last_known = lock(&self.state).is_favorite;

        let cmd = ToggleFavorite {
            book_id: self.book_id,
            last_known,
        };
        let is_favorite = favorites::toggle_favorite(&self.deps, user.id, cmd).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).is_favorite = is_favorite;
        Ok(is_favorite)
    }

    /// レビューを投稿する
    pub async fn post_review(&self, rating: i64, comment: &str) -> Result<Review> {
        let _guard = self.in_flight.begin(DetailsAction::PostReview)?;
        let user = self.session.current_user()?;

        let cmd = PostReview {
            book_id: self.book_id,
            rating,
            comment: comment.to_string(),
        };
        let review = reviews::post_review(&self.deps, &user, cmd).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).reviews.push(review.clone());
        Ok(review)
    }

    pub async fn like(&self, review_id: ReviewId) -> Result<Review> {
        self.vote(review_id, true).await
    }

    pub async fn dislike(&self, review_id: ReviewId) -> Result<Review> {
        self.vote(review_id, false).await
    }

    /// 応答のレビューでローカルの該当レビューを置き換える
    async fn vote(&self, review_id: ReviewId, up: bool) -> Result<Review> {
        let _guard = self.in_flight.begin(DetailsAction::Vote(review_id))?;
        let review = if up {
            reviews::like(&self.deps, review_id).await?
        } else {
            reviews::dislike(&self.deps, review_id).await?
        };
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        match state.reviews.iter().position(|r| r.id == review_id) {
            Some(index) => state.reviews[index] = review.clone(),
            None => state.reviews.push(review.clone()),
        }
        Ok(review)
    }

    /// 自分のレビュー（管理者は任意のレビュー）を削除する
    pub async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        let _guard = self.in_flight.begin(DetailsAction::Vote(review_id))?;
        let user = self.session.current_user()?;
        let review = lock(&self.state)
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Review not found"))?;

        reviews::delete_review(&self.deps, &user, &review).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).reviews.retain(|r| r.id != review_id);
        Ok(())
    }
}
