// src/handlers/auth.rs
// DOCUMENTATION: Request identity helpers
// PURPOSE: Resolve forwarded identities and admin tokens to callers

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::ApiError;
use crate::models::User;
use actix_web::HttpRequest;
use sqlx::PgPool;

/// Header carrying the verified identity-provider subject
/// Sessions terminate at the gateway; this service trusts the forwarded id
pub const USER_HEADER: &str = "X-User-Id";

/// Resolve the authenticated user for a request
/// DOCUMENTATION: Missing header or unknown subject both map to 401; user
/// rows are created by the identity webhook (or lazily by GET /users/profile)
pub async fn require_user(req: &HttpRequest, pool: &PgPool) -> Result<User, ApiError> {
    let external_id = req
        .headers()
        .get(USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            log::warn!("Request without {} header", USER_HEADER);
            ApiError::Unauthorized
        })?;

    UserRepository::get_by_external_id(pool, external_id)
        .await?
        .ok_or_else(|| {
            log::warn!("Unknown identity subject: {}", external_id);
            ApiError::Unauthorized
        })
}

/// The forwarded identity subject, if any
pub fn forwarded_subject(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
pub fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), ApiError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            ApiError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(ApiError::Forbidden);
    }

    Ok(())
}

/// Whether the request carries a valid admin token
pub fn is_admin(req: &HttpRequest, config: &Config) -> bool {
    verify_admin_token(req, config).is_ok()
}
