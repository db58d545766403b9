use crate::domain::commands::PostReview;
use crate::domain::{BookId, NewReview, Review, ReviewId, User};
use tracing::info;

use super::deps::ServiceDependencies;
use super::errors::{LibraryError, Result};

pub async fn reviews_for(deps: &ServiceDependencies, book_id: BookId) -> Result<Vec<Review>> {
    Ok(deps.reviews.book_reviews(book_id).await?)
}

/// レビューを投稿する
///
/// 評価は1〜5。範囲外はリクエストせずに拒否する。
pub async fn post_review(deps: &ServiceDependencies, author: &User, cmd: PostReview) -> Result<Review> {
    let review = NewReview {
        book_id: cmd.book_id,
        user_id: author.id,
        rating: cmd.rating,
        comment: cmd.comment.trim().to_string(),
    };
    review.validate()?;

    let created = deps.reviews.create_review(review).await?;
    info!(review_id = %created.id, book_id = %created.book_id, "review posted");
    Ok(created)
}

/// 高評価する
///
/// 利用者ごとの重複排除はサーバーに委ねる（クライアントでは行わない）。
/// 応答のレビューでローカルの該当レビューを置き換えること。
pub async fn like(deps: &ServiceDependencies, review_id: ReviewId) -> Result<Review> {
    Ok(deps.reviews.like_review(review_id).await?)
}

/// 低評価する
pub async fn dislike(deps: &ServiceDependencies, review_id: ReviewId) -> Result<Review> {
    Ok(deps.reviews.dislike_review(review_id).await?)
}

/// レビューを削除する（投稿者本人または管理者）
pub async fn delete_review(deps: &ServiceDependencies, actor: &User, review: &Review) -> Result<()> {
    if review.user_id != actor.id && !actor.is_admin() {
        return Err(LibraryError::AdminRequired);
    }
    deps.reviews.delete_review(review.id).await?;
    info!(review_id = %review.id, "review deleted");
    Ok(())
}
