// src/handlers/recommendations.rs
// DOCUMENTATION: HTTP handler for personalized recommendations

use crate::errors::ApiError;
use crate::handlers::auth;
use crate::services::{OpenAiClient, RecommendationQuery, RecommendationService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

/// GET /recommendations
/// Personalized business recommendations for the authenticated user
pub async fn recommendations(
    pool: web::Data<PgPool>,
    ai: web::Data<OpenAiClient>,
    req: HttpRequest,
    query: web::Query<RecommendationQuery>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;
    let query = query.into_inner();

    if let Some(kind) = query.kind.as_deref() {
        if !["general", "nearby", "trending", "similar"].contains(&kind) {
            return Err(ApiError::InvalidInput(format!(
                "unknown recommendation type: {}",
                kind
            )));
        }
    }

    let batch =
        RecommendationService::recommend(pool.get_ref(), ai.get_ref(), &user, &query).await?;
    let total = batch.recommendations.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": batch.recommendations,
        "meta": {
            "user_id": user.id,
            "type": query.kind.as_deref().unwrap_or("general"),
            "total": total,
            "personalized_note": batch.personalized_note,
        }
    })))
}

/// Configuration for recommendation routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/recommendations", web::get().to(recommendations));
}
