// src/services/review_service.rs
// DOCUMENTATION: Review lifecycle orchestration
// PURPOSE: Duplicate checks, AI enrichment, stats recompute and point awards

use crate::db::{BusinessRepository, ReviewRepository, UserRepository};
use crate::errors::ApiError;
use crate::models::*;
use crate::services::{GamificationService, OpenAiClient};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Response for POST /reviews: the review plus gamification outcome
#[derive(Debug, Serialize)]
pub struct CreatedReview {
    pub review: ReviewResponse,
    pub points_earned: i32,
    pub new_achievements: Vec<AchievementDef>,
}

pub struct ReviewService;

impl ReviewService {
    /// Create a review: enrich, insert, recompute stats, award points
    pub async fn create(
        pool: &PgPool,
        ai: &OpenAiClient,
        user: &User,
        req: CreateReviewRequest,
    ) -> Result<CreatedReview, ApiError> {
        // Business must exist and be active
        let business = BusinessRepository::get_by_id(pool, req.business_id).await?;

        // One review per user per business
        if ReviewRepository::exists_for_user(pool, business.id, user.id).await? {
            return Err(ApiError::AlreadyExists(
                "You have already reviewed this business".to_string(),
            ));
        }

        let analysis = Self::analyze(ai, &req.content, req.rating, &business.category).await;
        let review = ReviewRepository::create(pool, &req, user.id, &analysis).await?;

        BusinessRepository::recompute_stats(pool, business.id).await?;

        let now = Utc::now();
        let streak = GamificationService::next_streak(user.streak_days, user.last_review_at, now);
        UserRepository::record_review(pool, user.id, streak, now).await?;

        // Points and achievements are best effort; a failed award must not
        // lose the review that was just written
        let (points_earned, new_achievements) = match Self::award_review_action(pool, user).await {
            Ok((points, achievements)) => (points, achievements),
            Err(e) => {
                log::error!("Gamification award failed for review {}: {}", review.id, e);
                (0, Vec::new())
            }
        };

        Ok(CreatedReview {
            review: review.to_response(),
            points_earned,
            new_achievements,
        })
    }

    /// Update a review (author only); content changes re-run the analysis
    pub async fn update(
        pool: &PgPool,
        ai: &OpenAiClient,
        user: &User,
        id: Uuid,
        req: UpdateReviewRequest,
    ) -> Result<ReviewResponse, ApiError> {
        let existing = ReviewRepository::get_by_id(pool, id).await?;
        if existing.user_id != user.id {
            return Err(ApiError::Forbidden);
        }

        let analysis = match &req.content {
            Some(content) => {
                let business = BusinessRepository::get_by_id(pool, existing.business_id).await?;
                let rating = req.rating.unwrap_or(existing.rating);
                Some(Self::analyze(ai, content, rating, &business.category).await)
            }
            None => None,
        };

        let updated = ReviewRepository::update(pool, id, &req, analysis.as_ref()).await?;

        if req.rating.is_some() {
            BusinessRepository::recompute_stats(pool, existing.business_id).await?;
        }

        Ok(updated.to_response())
    }

    /// Delete a review (author or admin) and roll back the aggregates
    pub async fn delete(
        pool: &PgPool,
        actor: Option<&User>,
        id: Uuid,
        is_admin: bool,
    ) -> Result<(), ApiError> {
        let existing = ReviewRepository::get_by_id(pool, id).await?;
        let is_author = actor.map(|u| u.id == existing.user_id).unwrap_or(false);
        if !is_author && !is_admin {
            return Err(ApiError::Forbidden);
        }

        ReviewRepository::delete(pool, id).await?;
        BusinessRepository::recompute_stats(pool, existing.business_id).await?;
        UserRepository::remove_review(pool, existing.user_id).await?;

        Ok(())
    }

    /// Mark a review helpful: bump the counter, credit the author,
    /// award the voter
    pub async fn mark_helpful(
        pool: &PgPool,
        voter: &User,
        id: Uuid,
    ) -> Result<ReviewResponse, ApiError> {
        let review = ReviewRepository::get_by_id(pool, id).await?;
        if review.user_id == voter.id {
            return Err(ApiError::InvalidInput(
                "You cannot vote for your own review".to_string(),
            ));
        }

        let updated = ReviewRepository::increment_helpful(pool, id).await?;
        UserRepository::add_helpful_vote(pool, review.user_id).await?;

        let action = GamificationActionRequest {
            action: "helpful_vote".to_string(),
            business_id: None,
            review_id: Some(id),
            points: None,
        };
        if let Err(e) = GamificationService::award_action(pool, voter, &action).await {
            log::error!("Helpful vote award failed: {}", e);
        }

        Ok(updated.to_response())
    }

    /// Run the AI analysis with the deterministic fallback
    pub async fn analyze(
        ai: &OpenAiClient,
        content: &str,
        rating: i32,
        business_category: &str,
    ) -> ReviewAnalysis {
        if ai.is_configured() {
            match ai.analyze_review(content, business_category).await {
                Ok(analysis) => return analysis,
                Err(e) => {
                    log::warn!("AI review analysis failed, using fallback: {}", e);
                }
            }
        }
        ReviewAnalysis::fallback(content, rating)
    }

    async fn award_review_action(
        pool: &PgPool,
        user: &User,
    ) -> Result<(i32, Vec<AchievementDef>), ApiError> {
        // Reload: record_review just changed the counters the checks read
        let fresh = UserRepository::get_by_id(pool, user.id).await?;
        let action = GamificationActionRequest {
            action: "review".to_string(),
            business_id: None,
            review_id: None,
            points: None,
        };
        let result = GamificationService::award_action(pool, &fresh, &action).await?;
        Ok((result.points_earned, result.new_achievements))
    }
}
