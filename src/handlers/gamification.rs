// src/handlers/gamification.rs
// DOCUMENTATION: HTTP handlers for the gamification layer
// PURPOSE: Point awards and achievement listings

use crate::errors::ApiError;
use crate::handlers::auth;
use crate::models::*;
use crate::services::GamificationService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// POST /gamification
/// Record an action and award points
pub async fn record_action(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    body: web::Json<GamificationActionRequest>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let result = GamificationService::award_action(pool.get_ref(), &user, &body).await?;

    let message = if result.new_achievements.is_empty() {
        format!("You earned {} points!", result.points_earned)
    } else {
        format!(
            "Congratulations! You earned {} new achievements!",
            result.new_achievements.len()
        )
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": result,
        "message": message
    })))
}

/// Query parameters for GET /gamification/achievements
#[derive(Debug, Deserialize)]
pub struct AchievementsQuery {
    /// Listing mode: earned | available | all
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /gamification/achievements
/// Earned and available achievements with progress
pub async fn list_achievements(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    query: web::Query<AchievementsQuery>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    let kind = query.kind.as_deref().unwrap_or("all");
    let earned = GamificationService::earned_list(pool.get_ref(), &user).await?;
    let available = GamificationService::available_list(pool.get_ref(), &user).await?;

    let completion_rate =
        (earned.len() as f64 / ACHIEVEMENTS.len() as f64 * 100.0).round() as i64;
    let meta = json!({
        "total_earned": earned.len(),
        "total_available": available.len(),
        "completion_rate": completion_rate,
    });

    let data = match kind {
        "earned" => json!(earned),
        "available" => json!(available),
        _ => json!({ "earned": earned, "available": available }),
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
        "meta": meta
    })))
}

/// Configuration for gamification routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gamification")
            .route("", web::post().to(record_action))
            .route("/achievements", web::get().to(list_achievements)),
    );
}
