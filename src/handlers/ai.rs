// src/handlers/ai.rs
// DOCUMENTATION: Direct AI analysis endpoint
// PURPOSE: Expose review analysis without going through review creation

use crate::errors::ApiError;
use crate::models::{AnalyzeReviewRequest, ReviewAnalysis};
use crate::services::OpenAiClient;
use actix_web::{web, HttpResponse, Responder};
use governor::DefaultDirectRateLimiter;
use serde_json::json;
use validator::Validate;

/// POST /ai/analyze-review
/// Analyze review text into sentiment, category scores and tags
/// DOCUMENTATION: Always answers - when the model call fails the
/// deterministic keyword heuristic takes over
pub async fn analyze_review(
    ai: web::Data<OpenAiClient>,
    limiter: web::Data<DefaultDirectRateLimiter>,
    body: web::Json<AnalyzeReviewRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    if limiter.check().is_err() {
        return Err(ApiError::RateLimitExceeded);
    }

    let business_type = body.business_type.as_deref().unwrap_or("");

    let (analysis, from_model) = if ai.is_configured() {
        match ai.analyze_review(&body.review_text, business_type).await {
            Ok(analysis) => (analysis, true),
            Err(e) => {
                log::warn!("AI analysis failed, falling back: {}", e);
                // Heuristic has no star rating to lean on here; neutral prior
                (ReviewAnalysis::fallback(&body.review_text, 3), false)
            }
        }
    } else {
        (ReviewAnalysis::fallback(&body.review_text, 3), false)
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": analysis,
        "meta": { "from_model": from_model }
    })))
}

/// Configuration for AI routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/ai").route("/analyze-review", web::post().to(analyze_review)));
}
