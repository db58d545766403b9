use crate::domain::{BookId, NewReview, Review, ReviewId};
use async_trait::async_trait;

use super::Result;

/// レビューAPIポート（/reviews）
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// 書籍のレビュー一覧
    async fn book_reviews(&self, book_id: BookId) -> Result<Vec<Review>>;

    /// レビューを投稿する（評価が範囲外なら 400）
    async fn create_review(&self, review: NewReview) -> Result<Review>;

    /// 「いいね」を1増やす
    async fn like_review(&self, review_id: ReviewId) -> Result<Review>;

    /// 「よくないね」を1増やす
    async fn dislike_review(&self, review_id: ReviewId) -> Result<Review>;

    /// レビューを削除する
    async fn delete_review(&self, review_id: ReviewId) -> Result<()>;
}
