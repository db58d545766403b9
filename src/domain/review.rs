use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::timestamp;
use super::{BookId, RatingError, ReviewId, UserId, ValidationError};

/// 評価値
///
/// 不変条件：1〜5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(1..=5).contains(&value) {
            return Err(RatingError::OutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.0 as i64
    }
}

/// レビュー
///
/// Likes/Dislikes は単調増加のカウンタ。利用者ごとの重複排除はクライアントから見えない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub username: String,
}

/// 新規レビュー（POST /reviews/ のボディ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: i64,
    pub comment: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<Rating, ValidationError> {
        Ok(Rating::try_from(self.rating)?)
    }
}

/// 平均評価
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| r.rating.value() as u32).sum();
    Some(sum as f64 / reviews.len() as f64)
}
