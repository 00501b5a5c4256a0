// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for statistics and moderation
// PURPOSE: Expose platform statistics and verification via REST endpoints

use crate::config::Config;
use crate::db::{BusinessRepository, ReviewRepository};
use crate::errors::ApiError;
use crate::handlers::auth::verify_admin_token;
use crate::services::OpenAiClient;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use governor::DefaultDirectRateLimiter;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// GET /admin/stats
/// Get detailed database statistics
///
/// DOCUMENTATION: Returns comprehensive statistics about the platform
pub async fn platform_stats(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, ApiError> {
    // Authenticate admin request
    verify_admin_token(&req, &config)?;

    let total_businesses: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM businesses")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let active_businesses: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM businesses WHERE is_active = true")
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let verified_businesses: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM businesses WHERE is_active = true AND verified = true",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let recent_additions: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM businesses WHERE created_at > NOW() - INTERVAL '24 hours'",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let total_reviews: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let total_users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    // Statistics by category
    #[derive(Debug, Serialize, sqlx::FromRow)]
    struct CategoryCount {
        category: Option<String>,
        count: Option<i64>,
    }

    let category_counts: Vec<CategoryCount> = sqlx::query_as(
        "SELECT category, COUNT(*) as count FROM businesses WHERE is_active = true GROUP BY category ORDER BY count DESC"
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    // Statistics by city
    #[derive(Debug, Serialize, sqlx::FromRow)]
    struct CityCount {
        city: Option<String>,
        count: Option<i64>,
    }

    let city_counts: Vec<CityCount> = sqlx::query_as(
        "SELECT city, COUNT(*) as count FROM businesses WHERE is_active = true GROUP BY city ORDER BY count DESC LIMIT 10"
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    // Average rating across active listings
    let avg_rating: (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(avg_rating) FROM businesses WHERE is_active = true AND total_reviews > 0",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totals": {
            "businesses": total_businesses.0,
            "active_businesses": active_businesses.0,
            "verified_businesses": verified_businesses.0,
            "recent_additions": recent_additions.0,
            "reviews": total_reviews.0,
            "users": total_users.0,
        },
        "businesses_by_category": category_counts,
        "businesses_by_city": city_counts,
        "average_rating": avg_rating.0,
    })))
}

/// POST /admin/businesses/{id}/verify
/// Mark a business listing as verified
pub async fn verify_business(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    // Authenticate admin request
    verify_admin_token(&req, &config)?;

    let id = path.into_inner();
    let business = BusinessRepository::set_verified(pool.get_ref(), id).await?;

    log::info!("Business verified by admin: {}", id);
    Ok(HttpResponse::Ok().json(business.to_response()))
}

/// POST /admin/businesses/{id}/refresh-summary
/// Regenerate the AI review digest for a listing
pub async fn refresh_summary(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    ai: web::Data<OpenAiClient>,
    limiter: web::Data<DefaultDirectRateLimiter>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    // Authenticate admin request
    verify_admin_token(&req, &config)?;

    if !ai.is_configured() {
        return Err(ApiError::ExternalApiError(
            "OpenAI API key not configured".to_string(),
        ));
    }
    if limiter.check().is_err() {
        return Err(ApiError::RateLimitExceeded);
    }

    let id = path.into_inner();
    let business = BusinessRepository::get_by_id(pool.get_ref(), id).await?;

    let reviews = ReviewRepository::recent_for_business(pool.get_ref(), id, 50).await?;
    if reviews.is_empty() {
        return Err(ApiError::InvalidInput(
            "Business has no reviews to summarize".to_string(),
        ));
    }
    let texts: Vec<String> = reviews.iter().map(|r| r.content.clone()).collect();

    let summary = ai.summarize_reviews(&business.name, &texts).await?;
    BusinessRepository::set_ai_summary(pool.get_ref(), id, &summary).await?;

    log::info!("Refreshed AI summary for business {}", id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": { "id": id, "ai_summary": summary }
    })))
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(platform_stats))
            .route("/businesses/{id}/verify", web::post().to(verify_business))
            .route(
                "/businesses/{id}/refresh-summary",
                web::post().to(refresh_summary),
            ),
    );
}
