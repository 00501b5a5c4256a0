// src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Business review with AI enrichment columns
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub content: String,
    pub visit_date: Option<DateTime<Utc>>,
    pub ai_sentiment: Option<String>,
    pub ai_score: Option<f32>,
    pub taste_score: Option<f32>,
    pub service_score: Option<f32>,
    pub cleanliness_score: Option<f32>,
    pub price_score: Option<f32>,
    pub atmosphere_score: Option<f32>,
    pub ai_tags: Option<Vec<String>>,
    pub ai_summary: Option<String>,
    pub helpful_count: i32,
    pub is_verified_visit: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new review
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub business_id: Uuid,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(min = 10, max = 2000))]
    pub content: String,

    #[serde(default)]
    pub visit_date: Option<DateTime<Utc>>,
}

/// Request to update an existing review (author only)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,

    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 10, max = 2000))]
    pub content: Option<String>,

    pub visit_date: Option<DateTime<Utc>>,
}

/// Query parameters for GET /reviews
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub business_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub min_rating: Option<i32>,

    /// Sort order: newest | oldest | rating_high | rating_low | helpful
    pub sort_by: Option<String>,

    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Review DTO exposed via API
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub content: String,
    pub visit_date: Option<DateTime<Utc>>,
    pub ai_sentiment: Option<String>,
    pub ai_score: Option<f32>,
    pub category_scores: Option<ReviewCategoryScores>,
    pub ai_tags: Option<Vec<String>>,
    pub ai_summary: Option<String>,
    pub helpful_count: i32,
    pub is_verified_visit: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-dimension scores derived from the review text (0-10)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCategoryScores {
    pub taste: f32,
    pub service: f32,
    pub cleanliness: f32,
    pub price: f32,
    pub atmosphere: f32,
}

impl Review {
    /// Convert database Review into API response
    pub fn to_response(&self) -> ReviewResponse {
        // Category scores are written together; taste presence implies the rest
        let category_scores = self.taste_score.map(|taste| ReviewCategoryScores {
            taste,
            service: self.service_score.unwrap_or(taste),
            cleanliness: self.cleanliness_score.unwrap_or(taste),
            price: self.price_score.unwrap_or(taste),
            atmosphere: self.atmosphere_score.unwrap_or(taste),
        });

        ReviewResponse {
            id: self.id,
            business_id: self.business_id,
            user_id: self.user_id,
            rating: self.rating,
            title: self.title.clone(),
            content: self.content.clone(),
            visit_date: self.visit_date,
            ai_sentiment: self.ai_sentiment.clone(),
            ai_score: self.ai_score,
            category_scores,
            ai_tags: self.ai_tags.clone(),
            ai_summary: self.ai_summary.clone(),
            helpful_count: self.helpful_count,
            is_verified_visit: self.is_verified_visit,
            created_at: self.created_at,
        }
    }
}
