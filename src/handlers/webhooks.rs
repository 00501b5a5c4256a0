// src/handlers/webhooks.rs
// DOCUMENTATION: Identity-provider webhook ingestion
// PURPOSE: Verify svix-compatible signatures and sync the local user table

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::ApiError;
use crate::models::IdentityProfile;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use sqlx::PgPool;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed skew between the webhook timestamp and now
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Identity event envelope
#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: Value,
}

/// POST /webhooks/identity
/// DOCUMENTATION: The identity provider signs each delivery with
/// HMAC-SHA256 over "{id}.{timestamp}.{body}". Signature verification
/// happens on the raw bytes before any JSON parsing.
pub async fn identity_webhook(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    payload: web::Bytes,
) -> Result<impl Responder, ApiError> {
    if config.webhook_secret.is_empty() {
        log::error!("Identity webhook received but no secret is configured");
        return Err(ApiError::ServiceUnavailable);
    }

    let msg_id = header(&req, "svix-id")?;
    let timestamp = header(&req, "svix-timestamp")?;
    let signature = header(&req, "svix-signature")?;

    verify_signature(
        &config.webhook_secret,
        &msg_id,
        &timestamp,
        &payload,
        &signature,
        Utc::now(),
    )?;

    let event: IdentityEvent = serde_json::from_slice(&payload)
        .map_err(|e| ApiError::InvalidInput(format!("malformed webhook payload: {}", e)))?;

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let profile = profile_from_event(&event.data)?;
            let user = UserRepository::upsert_identity(pool.get_ref(), &profile).await?;
            log::info!("Synced user {} from {}", user.external_id, event.event_type);
        }
        "user.deleted" => {
            let external_id = event
                .data
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError::InvalidInput("missing user id".to_string()))?;
            UserRepository::delete_by_external_id(pool.get_ref(), external_id).await?;
            log::info!("Deleted user {}", external_id);
        }
        other => {
            // Acknowledge unknown events so the provider stops retrying
            log::info!("Ignoring webhook event type: {}", other);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

fn header(req: &HttpRequest, name: &str) -> Result<String, ApiError> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|v| v.to_string())
        .ok_or_else(|| ApiError::InvalidInput(format!("missing {} header", name)))
}

/// Verify a svix-style webhook signature
/// DOCUMENTATION: secret is "whsec_<base64 key>"; the signature header holds
/// space-separated "v1,<base64 mac>" candidates and any match accepts.
/// Deliveries outside the timestamp tolerance are rejected outright.
pub fn verify_signature(
    secret: &str,
    msg_id: &str,
    timestamp: &str,
    payload: &[u8],
    signature_header: &str,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| ApiError::InvalidInput("invalid webhook timestamp".to_string()))?;
    if (now.timestamp() - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        log::warn!("Webhook timestamp outside tolerance: {}", ts);
        return Err(ApiError::Unauthorized);
    }

    let key = STANDARD
        .decode(secret.trim_start_matches("whsec_"))
        .map_err(|_| {
            log::error!("Webhook secret is not valid base64");
            ApiError::InternalError
        })?;

    let mut mac = HmacSha256::new_from_slice(&key).map_err(|e| {
        log::error!("Webhook HMAC init failed: {}", e);
        ApiError::InternalError
    })?;
    mac.update(msg_id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();
    let expected_b64 = STANDARD.encode(expected);

    let matched = signature_header
        .split_whitespace()
        .filter_map(|candidate| candidate.strip_prefix("v1,"))
        .any(|candidate| candidate == expected_b64);

    if matched {
        Ok(())
    } else {
        log::warn!("Webhook signature mismatch for message {}", msg_id);
        Err(ApiError::Unauthorized)
    }
}

/// Map the provider's user payload into our identity profile
fn profile_from_event(data: &Value) -> Result<IdentityProfile, ApiError> {
    let external_id = data
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidInput("missing user id".to_string()))?
        .to_string();

    let email = data
        .get("email_addresses")
        .and_then(Value::as_array)
        .and_then(|addresses| addresses.first())
        .and_then(|entry| entry.get("email_address"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let first = data.get("first_name").and_then(Value::as_str).unwrap_or("");
    let last = data.get("last_name").and_then(Value::as_str).unwrap_or("");
    let name = format!("{} {}", first, last).trim().to_string();

    let avatar_url = data
        .get("image_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(String::from);

    Ok(IdentityProfile {
        external_id,
        email,
        name,
        avatar_url,
    })
}

/// Configuration for webhook routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhooks/identity", web::post().to(identity_webhook));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_secret(key: &[u8]) -> String {
        format!("whsec_{}", STANDARD.encode(key))
    }

    fn sign(key: &[u8], msg_id: &str, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(format!("{}.{}.", msg_id, timestamp).as_bytes());
        mac.update(payload);
        format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_signature_round_trip() {
        let key = b"super-secret-key";
        let now = Utc::now();
        let timestamp = now.timestamp().to_string();
        let payload = br#"{"type":"user.created","data":{"id":"user_1"}}"#;
        let signature = sign(key, "msg_1", &timestamp, payload);

        assert!(verify_signature(
            &make_secret(key),
            "msg_1",
            &timestamp,
            payload,
            &signature,
            now
        )
        .is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = b"super-secret-key";
        let now = Utc::now();
        let timestamp = now.timestamp().to_string();
        let signature = sign(key, "msg_1", &timestamp, b"original");

        assert!(verify_signature(
            &make_secret(key),
            "msg_1",
            &timestamp,
            b"tampered",
            &signature,
            now
        )
        .is_err());
    }

    #[test]
    fn test_multiple_signature_candidates() {
        let key = b"rotated-key";
        let now = Utc::now();
        let timestamp = now.timestamp().to_string();
        let payload = b"payload";
        let valid = sign(key, "msg_1", &timestamp, payload);
        let header = format!("v1,bm90LXZhbGlk {}", valid);

        assert!(verify_signature(
            &make_secret(key),
            "msg_1",
            &timestamp,
            payload,
            &header,
            now
        )
        .is_ok());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let key = b"super-secret-key";
        let now = Utc::now();
        let stale = (now.timestamp() - 3600).to_string();
        let payload = b"payload";
        let signature = sign(key, "msg_1", &stale, payload);

        assert!(verify_signature(
            &make_secret(key),
            "msg_1",
            &stale,
            payload,
            &signature,
            now
        )
        .is_err());
    }

    #[test]
    fn test_profile_from_event() {
        let data = json!({
            "id": "user_abc",
            "email_addresses": [{"email_address": "ayse@example.com"}],
            "first_name": "Ayşe",
            "last_name": "Yılmaz",
            "image_url": "https://img.example.com/a.png"
        });

        let profile = profile_from_event(&data).unwrap();
        assert_eq!(profile.external_id, "user_abc");
        assert_eq!(profile.email, "ayse@example.com");
        assert_eq!(profile.name, "Ayşe Yılmaz");
        assert!(profile.avatar_url.is_some());
    }

    #[test]
    fn test_profile_requires_id() {
        let data = json!({ "first_name": "Ayşe" });
        assert!(profile_from_event(&data).is_err());
    }
}
