// src/handlers/businesses.rs
// DOCUMENTATION: HTTP handlers for business operations
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::db::BusinessRepository;
use crate::errors::ApiError;
use crate::handlers::auth;
use crate::models::*;
use crate::services::{BusinessService, SearchService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /businesses
/// List businesses with filters, sorting and pagination
pub async fn list_businesses(
    pool: web::Data<PgPool>,
    query: web::Query<BusinessQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    let price_ranges = match &query.price_range {
        Some(raw) => parse_price_ranges(raw).map_err(ApiError::InvalidInput)?,
        None => Vec::new(),
    };

    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let offset = query.offset.unwrap_or(0).max(0);

    let (businesses, total) = BusinessRepository::list(pool.get_ref(), &query, &price_ranges).await?;

    Ok(HttpResponse::Ok().json(BusinessListResponse {
        success: true,
        data: businesses.iter().map(|b| b.to_response()).collect(),
        meta: ListMeta {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        },
    }))
}

/// POST /businesses
/// Create a new business (authenticated; verification pending)
pub async fn create_business(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    body: web::Json<CreateBusinessRequest>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let business = BusinessService::create(pool.get_ref(), body.into_inner(), user.id).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": business,
        "message": "Business created. It will be reviewed for verification."
    })))
}

/// GET /businesses/nearby
/// Geolocation search around a point
pub async fn nearby_businesses(
    pool: web::Data<PgPool>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();

    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(ApiError::ValidationError(
            "lat must be within [-90, 90] and lng within [-180, 180]".to_string(),
        ));
    }

    let radius = query.radius.unwrap_or(5.0).clamp(0.1, 50.0);
    let results = SearchService::nearby(pool.get_ref(), &query, Utc::now()).await?;
    let total = results.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": results,
        "meta": {
            "total": total,
            "center": { "lat": query.lat, "lng": query.lng },
            "radius": radius,
            "sort_by": query.sort_by.as_deref().unwrap_or("distance"),
        }
    })))
}

/// GET /businesses/{id}
/// Retrieve a business by ID (UUID or slug) with related records
pub async fn get_business(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let identifier = path.into_inner();
    let detail = BusinessService::get_detail(pool.get_ref(), &identifier).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PUT /businesses/{id}
/// Update a business (owner or admin)
pub async fn update_business(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBusinessRequest>,
) -> Result<impl Responder, ApiError> {
    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let admin = auth::is_admin(&req, config.get_ref());
    let actor = if admin {
        None
    } else {
        Some(auth::require_user(&req, pool.get_ref()).await?)
    };

    let business = BusinessService::update(
        pool.get_ref(),
        path.into_inner(),
        body.into_inner(),
        actor.as_ref(),
        admin,
    )
    .await?;
    Ok(HttpResponse::Ok().json(business))
}

/// DELETE /businesses/{id}
/// Soft delete a business (owner or admin)
pub async fn delete_business(
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

    BusinessService::delete(pool.get_ref(), path.into_inner(), actor.as_ref(), admin).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for business routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/businesses")
            .route("", web::get().to(list_businesses))
            .route("", web::post().to(create_business))
            .route("/nearby", web::get().to(nearby_businesses))
            .route("/{id}", web::get().to(get_business))
            .route("/{id}", web::put().to(update_business))
            .route("/{id}", web::delete().to(delete_business)),
    );
}
