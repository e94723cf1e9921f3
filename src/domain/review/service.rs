use std::sync::Arc;

use crate::repository::{ProductRepository, ReviewRepository, UserRepository};

use super::errors::ReviewError;
use super::review::{average_rating, NewReview, Review};

// ============================================================================
// Review Service
// ============================================================================

pub struct ReviewService {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            users,
            products,
            reviews,
        }
    }

    /// Create a review. A user may review a given product once.
    pub async fn create_review(&self, new_review: NewReview) -> Result<Review, ReviewError> {
        validate_rating(new_review.rating)?;

        let user = self
            .users
            .find_by_id(new_review.user_id)
            .await?
            .ok_or(ReviewError::UserNotFound(new_review.user_id))?;

        let product = self
            .products
            .find_by_id(new_review.product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound(new_review.product_id))?;

        if self
            .reviews
            .find_by_user_and_product(user.id, product.id)
            .await?
            .is_some()
        {
            return Err(ReviewError::AlreadyExists {
                user_id: user.id,
                product_id: product.id,
            });
        }

        let review = self.reviews.insert(new_review).await?;
        self.refresh_product_rating(product.id).await?;

        tracing::info!(
            review_id = review.id,
            user_id = user.id,
            product_id = product.id,
            "review created"
        );
        Ok(review)
    }

    pub async fn get_review(&self, product_id: i64, user_id: i64) -> Result<Review, ReviewError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ReviewError::UserNotFound(user_id))?;
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound(product_id))?;

        self.reviews
            .find_by_user_and_product(user_id, product_id)
            .await?
            .ok_or(ReviewError::NotFound {
                user_id,
                product_id,
            })
    }

    pub async fn update_review(
        &self,
        product_id: i64,
        user_id: i64,
        rating: f32,
        comment: String,
    ) -> Result<Review, ReviewError> {
        validate_rating(rating)?;

        let mut review = self.get_review(product_id, user_id).await?;
        let rating_changed = (review.rating - rating).abs() > f32::EPSILON;

        review.rating = rating;
        review.comment = comment;
        self.reviews.update(&review).await?;

        if rating_changed {
            self.refresh_product_rating(product_id).await?;
        }
        Ok(review)
    }

    pub async fn delete_review(&self, product_id: i64, user_id: i64) -> Result<(), ReviewError> {
        if !self.reviews.delete(user_id, product_id).await? {
            return Err(ReviewError::NotFound {
                user_id,
                product_id,
            });
        }
        self.refresh_product_rating(product_id).await?;
        Ok(())
    }

    /// Recompute the product's cached average from the full review set.
    async fn refresh_product_rating(&self, product_id: i64) -> Result<(), ReviewError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound(product_id))?;

        let ratings: Vec<f32> = self
            .reviews
            .list_by_product(product_id)
            .await?
            .iter()
            .map(|r| r.rating)
            .collect();

        let updated = product.with_rating(average_rating(&ratings));
        self.products.update(&updated).await?;
        Ok(())
    }
}

fn validate_rating(rating: f32) -> Result<(), ReviewError> {
    if !(1.0..=5.0).contains(&rating) {
        return Err(ReviewError::InvalidRating(rating));
    }
    Ok(())
}
