// src/handlers/users.rs
// DOCUMENTATION: HTTP handlers for user profiles

use crate::db::UserRepository;
use crate::errors::ApiError;
use crate::handlers::auth;
use crate::models::{IdentityProfile, UpdateProfileRequest};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// GET /users/profile
/// Current user's profile
/// DOCUMENTATION: Provisions a local row lazily when the identity webhook
/// has not arrived yet; the forwarded subject is all we know at that point
pub async fn get_profile(
    pool: web::Data<PgPool>,
    req: HttpRequest,
) -> Result<impl Responder, ApiError> {
    let subject = auth::forwarded_subject(&req).ok_or(ApiError::Unauthorized)?;

    let user = match UserRepository::get_by_external_id(pool.get_ref(), &subject).await? {
        Some(user) => user,
        None => {
            log::info!("Lazily provisioning user for subject {}", subject);
            UserRepository::upsert_identity(
                pool.get_ref(),
                &IdentityProfile {
                    external_id: subject,
                    email: String::new(),
                    name: String::new(),
                    avatar_url: None,
                },
            )
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": user.to_response()
    })))
}

/// PUT /users/profile
/// Update profile fields
pub async fn update_profile(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    body: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&req, pool.get_ref()).await?;

    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let updated = UserRepository::update_profile(pool.get_ref(), user.id, &body).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": updated.to_response(),
        "message": "Profile updated"
    })))
}

/// Configuration for user routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile)),
    );
}
