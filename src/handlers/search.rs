// src/handlers/search.rs
// DOCUMENTATION: HTTP handlers for search operations
// PURPOSE: Keyword search, autocomplete and natural-language search

use crate::errors::ApiError;
use crate::models::*;
use crate::services::{OpenAiClient, SearchQuery, SearchService};
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use validator::Validate;

/// GET /search
/// Keyword search with relevance ranking and optional AI query expansion
pub async fn search(
    pool: web::Data<PgPool>,
    ai: web::Data<OpenAiClient>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    if let Err(e) = query.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let offset = query.offset.unwrap_or(0).max(0);

    let result = SearchService::search(pool.get_ref(), ai.get_ref(), &query, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": result.results,
        "meta": {
            "total": result.total,
            "limit": limit,
            "offset": offset,
            "has_more": offset + limit < result.total,
            "search_time_ms": result.search_time_ms,
            "ai_enhanced": result.ai_enhanced,
            "suggestions": result.suggestions,
        }
    })))
}

/// Query parameters for GET /search/autocomplete
#[derive(Debug, Deserialize, Validate)]
pub struct AutocompleteQuery {
    #[validate(length(min = 1, max = 50))]
    pub q: String,

    pub city: Option<String>,

    /// Suggestion kinds: businesses | categories | all
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub limit: Option<i64>,
}

/// GET /search/autocomplete
/// Prefix suggestions over names, categories and keywords
pub async fn autocomplete(
    pool: web::Data<PgPool>,
    query: web::Query<AutocompleteQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    if let Err(e) = query.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    let kind = query.kind.as_deref().unwrap_or("all");
    if !["businesses", "categories", "all"].contains(&kind) {
        return Err(ApiError::InvalidInput(format!(
            "unknown suggestion type: {}",
            kind
        )));
    }
    let limit = query.limit.unwrap_or(10).clamp(1, 20);

    let suggestions =
        SearchService::autocomplete(pool.get_ref(), &query.q, query.city.as_deref(), kind, limit)
            .await?;
    let count = suggestions.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": suggestions,
        "meta": {
            "query": query.q,
            "count": count,
            "type": kind,
        }
    })))
}

/// Request body for POST /search/intelligent
#[derive(Debug, Deserialize, Validate)]
pub struct IntelligentSearchRequest {
    /// Natural-language query
    #[validate(length(min = 1, max = 200))]
    pub query: String,

    /// Optional request context (location, preferences, time of day)
    #[serde(default)]
    pub context: Option<Value>,
}

/// POST /search/intelligent
/// Natural-language search: the model extracts intent and filters,
/// then the regular search pipeline runs with the derived parameters
pub async fn intelligent_search(
    pool: web::Data<PgPool>,
    ai: web::Data<OpenAiClient>,
    limiter: web::Data<DefaultDirectRateLimiter>,
    body: web::Json<IntelligentSearchRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    if let Err(e) = body.validate() {
        return Err(ApiError::ValidationError(e.to_string()));
    }

    // Every call is a paid LLM request
    if limiter.check().is_err() {
        return Err(ApiError::RateLimitExceeded);
    }

    let context = body.context.clone().unwrap_or_else(|| json!({}));
    let intent = ai.extract_search_intent(&body.query, &context).await?;

    // Location context feeds the distance sort when present
    let (lat, lng) = context
        .get("user_location")
        .map(|loc| {
            (
                loc.get("lat").and_then(Value::as_f64),
                loc.get("lng").and_then(Value::as_f64),
            )
        })
        .unwrap_or((None, None));

    let derived = SearchQuery {
        q: if intent.search_terms.is_empty() {
            body.query.clone()
        } else {
            intent.search_terms.join(" ")
        },
        city: context
            .get("user_location")
            .and_then(|loc| loc.get("city"))
            .and_then(Value::as_str)
            .map(String::from),
        category: intent.filters.category.clone(),
        district: None,
        lat,
        lng,
        radius: intent.filters.radius_km,
        min_rating: intent.filters.min_rating,
        // Keep only codes the model got right; junk would 400 the search
        price_range: intent.filters.price_range.as_ref().and_then(|ranges| {
            let valid: Vec<String> = ranges
                .iter()
                .map(|r| r.to_uppercase())
                .filter(|r| PRICE_RANGES.contains(&r.as_str()))
                .collect();
            (!valid.is_empty()).then(|| valid.join(","))
        }),
        sort_by: None,
        limit: Some(20),
        offset: None,
        open_now: intent.filters.open_now,
        // The query was already expanded into search terms
        ai_enhanced: Some(false),
    };

    let result = SearchService::search(pool.get_ref(), ai.get_ref(), &derived, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "original_query": body.query,
            "interpretation": intent.interpretation,
            "intent": intent.intent,
            "results": result.results,
            "suggestions": intent.suggestions,
        },
        "meta": {
            "total": result.total,
            "confidence": intent.confidence,
            "search_time_ms": result.search_time_ms,
        }
    })))
}

/// Configuration for search routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/search")
            .route("", web::get().to(search))
            .route("/autocomplete", web::get().to(autocomplete))
            .route("/intelligent", web::post().to(intelligent_search)),
    );
}
