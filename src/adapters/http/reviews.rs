use super::HttpLibraryApi;
use crate::domain::{BookId, NewReview, Review, ReviewId};
use crate::ports::{ReviewApi, Result};
use async_trait::async_trait;

#[async_trait]
impl ReviewApi for HttpLibraryApi {
    async fn book_reviews(&self, book_id: BookId) -> Result<Vec<Review>> {
        self.get(&format!("/reviews/book/{book_id}")).await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        self.post("/reviews/", &review).await
    }

    async fn like_review(&self, review_id: ReviewId) -> Result<Review> {
        self.put_empty(&format!("/reviews/{review_id}/like")).await
    }

    async fn dislike_review(&self, review_id: ReviewId) -> Result<Review> {
        self.put_empty(&format!("/reviews/{review_id}/dislike")).await
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        self.delete(&format!("/reviews/{review_id}")).await
    }
}
