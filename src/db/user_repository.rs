// src/db/user_repository.rs
// DOCUMENTATION: User database operations
// PURPOSE: Identity sync, profile updates and gamification counters

use crate::errors::ApiError;
use crate::models::{IdentityProfile, UpdateProfileRequest, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, external_id, email, name, avatar_url, city, district, bio,
    level, experience_points, total_reviews, helpful_votes,
    streak_days, last_review_at, is_local_hero,
    created_at, updated_at
"#;

pub struct UserRepository;

impl UserRepository {
    /// Retrieve user by internal ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    /// Retrieve user by identity-provider subject
    pub async fn get_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE external_id = $1",
            USER_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch user {}: {}", external_id, e);
            ApiError::DatabaseError(e.to_string())
        })
    }

    /// Create or refresh a user from identity-provider data
    /// DOCUMENTATION: Used by both the webhook and lazy provisioning,
    /// so replays and out-of-order deliveries stay harmless
    pub async fn upsert_identity(
        pool: &PgPool,
        profile: &IdentityProfile,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                external_id, email, name, avatar_url,
                level, experience_points, total_reviews, helpful_votes,
                streak_days, is_local_hero, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 'BEGINNER', 0, 0, 0, 0, false, NOW(), NOW())
            ON CONFLICT (external_id) DO UPDATE
            SET email = EXCLUDED.email,
                name = EXCLUDED.name,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&profile.external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to upsert user {}: {}", profile.external_id, e);
            ApiError::DatabaseError(e.to_string())
        })
    }

    /// Update profile fields (PUT /users/profile)
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                bio = COALESCE($2, bio),
                city = COALESCE($3, city),
                district = COALESCE($4, district),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&req.name)
        .bind(&req.bio)
        .bind(&req.city)
        .bind(&req.district)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    /// Remove a user when the identity provider deletes the account
    pub async fn delete_by_external_id(pool: &PgPool, external_id: &str) -> Result<(), ApiError> {
        let rows = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .rows_affected();

        if rows == 0 {
            log::warn!("Deletion webhook for unknown user: {}", external_id);
        }
        Ok(())
    }

    /// Add experience points, returning the user with the new total
    /// The caller recomputes and persists the level separately
    pub async fn add_experience(pool: &PgPool, id: Uuid, points: i32) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET experience_points = experience_points + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(points)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    /// Persist a level change
    pub async fn set_level(
        pool: &PgPool,
        id: Uuid,
        level: &str,
        is_local_hero: bool,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET level = $1, is_local_hero = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(level)
        .bind(is_local_hero)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Record a new review on the user row
    pub async fn record_review(
        pool: &PgPool,
        id: Uuid,
        streak_days: i32,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET total_reviews = total_reviews + 1,
                streak_days = $1,
                last_review_at = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(streak_days)
        .bind(reviewed_at)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Undo a review on the user row (review deleted)
    pub async fn remove_review(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET total_reviews = GREATEST(total_reviews - 1, 0), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Credit a helpful vote to a review author
    pub async fn add_helpful_vote(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET helpful_votes = helpful_votes + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
