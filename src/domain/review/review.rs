use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Review Entity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub rating: f32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub user_id: i64,
    pub product_id: i64,
    pub rating: f32,
    pub comment: String,
}

/// Mean rating over `ratings`, rounded to two decimals and clamped to 0..=5.
/// An empty slice averages to 0.0 (no reviews yet).
pub fn average_rating(ratings: &[f32]) -> f32 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: f32 = ratings.iter().sum();
    let avg = total / ratings.len() as f32;
    ((avg * 100.0).round() / 100.0).clamp(0.0, 5.0)
}
