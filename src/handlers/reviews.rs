// src/handlers/reviews.rs
// DOCUMENTATION: HTTP handlers for review operations
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::db::ReviewRepository;
use crate::errors::ApiError;
use crate::handlers::auth;
use crate::models::*;
use crate::services::{OpenAiClient, ReviewService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /reviews
/// List reviews filtered by business or user
pub async fn list_reviews(
    pool: web::Data<PgPool>,
    query: web::Query<ReviewQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let offset = query.offset.unwrap_or(0).max(0);

    let (reviews, total) = ReviewRepository::list(pool.get_ref(), &query).await?;
    let meta = ListMeta {
        total,
        limit,
        offset,
        has_more: offset + limit < total,
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": reviews.iter().map(|r| r.to_response()).collect::<Vec<_>>(),
        "meta": meta
    })))
}

/// POST /reviews
/// Create a review with AI enrichment and gamification
pub async fn create_review(
    pool: web::Data<PgPool>,
    ai: web::Data<OpenAiClient>,
    req: HttpRequest,
    body: web::Json<CreateReviewRequest>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let created =
        ReviewService::create(pool.get_ref(), ai.get_ref(), &user, body.into_inner()).await?;

    let message = if created.new_achievements.is_empty() {
        format!("You earned {} points!", created.points_earned)
    } else {
        format!(
            "Congratulations! You earned {} new achievements!",
            created.new_achievements.len()
        )
    };

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": created,
        "message": message
    })))
}

/// PUT /reviews/{id}
/// Update own review
pub async fn update_review(
    pool: web::Data<PgPool>,
    ai: web::Data<OpenAiClient>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateReviewRequest>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let review = ReviewService::update(
        pool.get_ref(),
        ai.get_ref(),
        &user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(review))
}

/// DELETE /reviews/{id}
/// Delete own review (admins may delete any)
pub async fn delete_review(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let admin = auth::is_admin(&req, config.get_ref());
    let actor = if admin {
        None
    } else {
        Some(auth::require_user(&req, pool.get_ref()).await?)
    };

    ReviewService::delete(pool.get_ref(), actor.as_ref(), path.into_inner(), admin).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /reviews/{id}/helpful
/// Mark a review as helpful
pub async fn mark_helpful(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let voter = auth::require_user(&req, pool.get_ref()).await?;
    let review = ReviewService::mark_helpful(pool.get_ref(), &voter, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// Configuration for review routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reviews")
            .route("", web::get().to(list_reviews))
            .route("", web::post().to(create_review))
            .route("/{id}", web::put().to(update_review))
            .route("/{id}", web::delete().to(delete_review))
            .route("/{id}/helpful", web::post().to(mark_helpful)),
    );
}
