// src/db/review_repository.rs
// DOCUMENTATION: Review database operations
// PURPOSE: Handle CRUD operations for business reviews

use crate::errors::ApiError;
use crate::models::{CreateReviewRequest, Review, ReviewAnalysis, ReviewQuery, UpdateReviewRequest};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = r#"
    id, business_id, user_id, rating, title, content, visit_date,
    ai_sentiment, ai_score,
    taste_score, service_score, cleanliness_score, price_score, atmosphere_score,
    ai_tags, ai_summary,
    helpful_count, is_verified_visit,
    created_at, updated_at
"#;

/// Joined review/business facts used by the recommendation profile
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewedBusinessFact {
    pub business_id: Uuid,
    pub category: String,
    pub price_range: Option<String>,
    pub rating: i32,
    pub ai_tags: Option<Vec<String>>,
}

pub struct ReviewRepository;

impl ReviewRepository {
    /// Create a new review with its AI enrichment
    /// DOCUMENTATION: The unique (business_id, user_id) constraint backs up
    /// the handler-level duplicate check
    pub async fn create(
        pool: &PgPool,
        req: &CreateReviewRequest,
        user_id: Uuid,
        analysis: &ReviewAnalysis,
    ) -> Result<Review, ApiError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (
                business_id, user_id, rating, title, content, visit_date,
                ai_sentiment, ai_score,
                taste_score, service_score, cleanliness_score, price_score, atmosphere_score,
                ai_tags, ai_summary,
                helpful_count, is_verified_visit, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8,
                $9, $10, $11, $12, $13,
                $14, $15,
                0, false, NOW(), NOW()
            )
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(req.business_id)
        .bind(user_id)
        .bind(req.rating)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.visit_date)
        .bind(&analysis.sentiment)
        .bind(analysis.score)
        .bind(analysis.categories.taste)
        .bind(analysis.categories.service)
        .bind(analysis.categories.cleanliness)
        .bind(analysis.categories.price)
        .bind(analysis.categories.atmosphere)
        .bind(&analysis.tags)
        .bind(if analysis.summary.is_empty() {
            None
        } else {
            Some(analysis.summary.clone())
        })
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::AlreadyExists(
                        "You have already reviewed this business".to_string(),
                    );
                }
            }
            log::error!("Failed to create review: {}", e);
            ApiError::DatabaseError(format!("Create review failed: {}", e))
        })?;

        Ok(review)
    }

    /// Whether the user already reviewed this business
    pub async fn exists_for_user(
        pool: &PgPool,
        business_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE business_id = $1 AND user_id = $2)",
        )
        .bind(business_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(row.0)
    }

    /// Retrieve a review by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Review, ApiError> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    /// List reviews with filters, sorting and pagination
    /// DOCUMENTATION: Used for GET /reviews endpoint
    /// Returns tuple: (results, total_count) for pagination
    pub async fn list(
        pool: &PgPool,
        query: &ReviewQuery,
    ) -> Result<(Vec<Review>, i64), ApiError> {
        let limit = query.limit.unwrap_or(20).clamp(1, 50);
        let offset = query.offset.unwrap_or(0).max(0);

        let mut where_clauses = vec!["1=1".to_string()];
        if let Some(business_id) = query.business_id {
            where_clauses.push(format!("business_id = '{}'", business_id));
        }
        if let Some(user_id) = query.user_id {
            where_clauses.push(format!("user_id = '{}'", user_id));
        }
        if let Some(min_rating) = query.min_rating {
            where_clauses.push(format!("rating >= {}", min_rating.clamp(1, 5)));
        }
        let where_clause = format!("WHERE {}", where_clauses.join(" AND "));

        let order_clause = match query.sort_by.as_deref() {
            Some("oldest") => "ORDER BY created_at ASC",
            Some("rating_high") => "ORDER BY rating DESC, created_at DESC",
            Some("rating_low") => "ORDER BY rating ASC, created_at DESC",
            Some("helpful") => "ORDER BY helpful_count DESC, created_at DESC",
            _ => "ORDER BY created_at DESC",
        };

        let count_sql = format!("SELECT COUNT(*) FROM reviews {}", where_clause);
        let count_result: (i64,) = sqlx::query_as(&count_sql)
            .fetch_one(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        let sql = format!(
            "SELECT {} FROM reviews {} {} LIMIT {} OFFSET {}",
            REVIEW_COLUMNS, where_clause, order_clause, limit, offset
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Review listing query error: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        Ok((reviews, count_result.0))
    }

    /// Recent reviews for a business (detail pages)
    pub async fn recent_for_business(
        pool: &PgPool,
        business_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Review>, ApiError> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE business_id = $1 ORDER BY created_at DESC LIMIT $2",
            REVIEW_COLUMNS
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews for business {}: {}", business_id, e);
            ApiError::DatabaseError(format!("Fetch reviews failed: {}", e))
        })
    }

    /// All reviews written by a user, newest first
    /// Used to build the recommendation taste profile
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Review>, ApiError> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// Category, price range and rating of every business the user reviewed
    /// Feeds the recommendation taste profile
    pub async fn reviewed_business_facts(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ReviewedBusinessFact>, ApiError> {
        sqlx::query_as::<_, ReviewedBusinessFact>(
            r#"
            SELECT r.business_id, b.category, b.price_range, r.rating, r.ai_tags
            FROM reviews r
            JOIN businesses b ON b.id = r.business_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            LIMIT 200
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// Update a review, optionally replacing its AI enrichment
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateReviewRequest,
        analysis: Option<&ReviewAnalysis>,
    ) -> Result<Review, ApiError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET rating = COALESCE($1, rating),
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                visit_date = COALESCE($4, visit_date),
                ai_sentiment = COALESCE($5, ai_sentiment),
                ai_score = COALESCE($6, ai_score),
                taste_score = COALESCE($7, taste_score),
                service_score = COALESCE($8, service_score),
                cleanliness_score = COALESCE($9, cleanliness_score),
                price_score = COALESCE($10, price_score),
                atmosphere_score = COALESCE($11, atmosphere_score),
                ai_tags = COALESCE($12, ai_tags),
                ai_summary = COALESCE($13, ai_summary),
                updated_at = NOW()
            WHERE id = $14
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(req.rating)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.visit_date)
        .bind(analysis.map(|a| a.sentiment.clone()))
        .bind(analysis.map(|a| a.score))
        .bind(analysis.map(|a| a.categories.taste))
        .bind(analysis.map(|a| a.categories.service))
        .bind(analysis.map(|a| a.categories.cleanliness))
        .bind(analysis.map(|a| a.categories.price))
        .bind(analysis.map(|a| a.categories.atmosphere))
        .bind(analysis.map(|a| a.tags.clone()))
        .bind(analysis.and_then(|a| {
            if a.summary.is_empty() {
                None
            } else {
                Some(a.summary.clone())
            }
        }))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Update failed for review {}: {}", id, e);
            ApiError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        Ok(review)
    }

    /// Delete a review
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Increment the helpful counter, returning the updated review
    pub async fn increment_helpful(pool: &PgPool, id: Uuid) -> Result<Review, ApiError> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET helpful_count = helpful_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }
}
