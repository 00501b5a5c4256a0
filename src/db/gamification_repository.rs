// src/db/gamification_repository.rs
// DOCUMENTATION: Achievement database operations
// PURPOSE: Awarding and listing earned achievements

use crate::errors::ApiError;
use crate::models::UserAchievement;
use sqlx::PgPool;
use uuid::Uuid;

pub struct GamificationRepository;

impl GamificationRepository {
    /// Award an achievement to a user
    /// DOCUMENTATION: Idempotent thanks to the unique constraint; returns
    /// whether a new row was actually created
    pub async fn award(
        pool: &PgPool,
        user_id: Uuid,
        achievement_id: &str,
    ) -> Result<bool, ApiError> {
        let rows = sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id, earned_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to award {} to {}: {}", achievement_id, user_id, e);
            ApiError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        Ok(rows > 0)
    }

    /// Achievements earned by a user, oldest first
    pub async fn earned_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<UserAchievement>, ApiError> {
        sqlx::query_as::<_, UserAchievement>(
            r#"
            SELECT id, user_id, achievement_id, earned_at
            FROM user_achievements
            WHERE user_id = $1
            ORDER BY earned_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch achievements for {}: {}", user_id, e);
            ApiError::DatabaseError(e.to_string())
        })
    }

    /// Number of distinct businesses the user has reviewed
    /// Feeds the EXPLORER requirement
    pub async fn distinct_businesses_reviewed(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<i64, ApiError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT business_id) FROM reviews WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(row.0)
    }
}
