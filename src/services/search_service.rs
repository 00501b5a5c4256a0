// src/services/search_service.rs
// DOCUMENTATION: Search and nearby pipelines
// PURPOSE: Relevance scoring, geo filtering and autocomplete suggestions

use crate::db::BusinessRepository;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::geo;
use crate::services::OpenAiClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for GET /search
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    /// Full-text search query
    #[validate(length(min = 1, max = 100))]
    pub q: String,

    pub city: Option<String>,
    pub category: Option<String>,
    pub district: Option<String>,

    /// Optional search center for distance sort
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    /// Radius in km when a center is given (default 10)
    pub radius: Option<f64>,

    pub min_rating: Option<f64>,

    /// Comma-separated price range codes
    pub price_range: Option<String>,

    /// Sort order: relevance | rating | distance | trending | reviews
    pub sort_by: Option<String>,

    pub limit: Option<i64>,
    pub offset: Option<i64>,

    /// Only businesses open right now
    pub open_now: Option<bool>,

    /// Expand the query through the AI provider (default true)
    pub ai_enhanced: Option<bool>,
}

/// Search results plus metadata
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub results: Vec<BusinessResponse>,
    pub total: i64,
    pub search_time_ms: u64,
    pub ai_enhanced: bool,
    pub suggestions: Vec<String>,
}

/// One autocomplete suggestion
#[derive(Debug, Serialize)]
pub struct Suggestion {
    /// Suggestion kind: business | category | keyword
    #[serde(rename = "type")]
    pub kind: &'static str,

    pub text: String,

    /// Text with the matched span wrapped in <b></b>
    pub highlight: String,
}

pub struct SearchService;

impl SearchService {
    /// Lowercased search terms from a raw query
    pub fn tokenize(query: &str) -> Vec<String> {
        query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.len() >= 2)
            .map(|t| t.to_string())
            .collect()
    }

    /// Relevance score of a business for a set of search terms
    /// DOCUMENTATION: Weighted substring matches - name 3x, category and
    /// keywords 2x, description and district 1x - with a small rating
    /// tiebreak so equally relevant businesses rank by quality
    pub fn relevance_score(business: &Business, terms: &[String]) -> f64 {
        if terms.is_empty() {
            return business.avg_rating;
        }

        let name = business.name.to_lowercase();
        let category = format!(
            "{} {}",
            business.category.to_lowercase(),
            business.subcategory.as_deref().unwrap_or("").to_lowercase()
        );
        let description = business
            .description
            .as_deref()
            .unwrap_or("")
            .to_lowercase();
        let district = business.district.as_deref().unwrap_or("").to_lowercase();
        let keywords: Vec<String> = business
            .keywords
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        let mut score = 0.0;
        for term in terms {
            if name.contains(term.as_str()) {
                score += 3.0;
            }
            if category.contains(term.as_str()) {
                score += 2.0;
            }
            if keywords.iter().any(|k| k.contains(term.as_str())) {
                score += 2.0;
            }
            if description.contains(term.as_str()) {
                score += 1.0;
            }
            if district.contains(term.as_str()) {
                score += 1.0;
            }
        }

        score + business.avg_rating * 0.1
    }

    /// Wrap the first case-insensitive occurrence of term in <b></b>
    pub fn highlight(text: &str, term: &str) -> String {
        if term.is_empty() {
            return text.to_string();
        }
        let lower_text = text.to_lowercase();
        let lower_term = term.to_lowercase();
        match lower_text.find(&lower_term) {
            Some(start) if text.is_char_boundary(start) && text.is_char_boundary(start + lower_term.len()) => {
                let end = start + lower_term.len();
                format!("{}<b>{}</b>{}", &text[..start], &text[start..end], &text[end..])
            }
            _ => text.to_string(),
        }
    }

    /// GET /search pipeline
    /// DOCUMENTATION: SQL prefilter -> optional AI query expansion ->
    /// in-memory relevance scoring -> sort -> paginate
    pub async fn search(
        pool: &PgPool,
        ai: &OpenAiClient,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Result<SearchResult, ApiError> {
        let started = Instant::now();
        let limit = query.limit.unwrap_or(20).clamp(1, 50);
        let offset = query.offset.unwrap_or(0).max(0);

        let price_ranges = match &query.price_range {
            Some(raw) => parse_price_ranges(raw).map_err(ApiError::InvalidInput)?,
            None => Vec::new(),
        };

        // AI query expansion is best effort; failures degrade to the raw query
        let ai_enhanced = query.ai_enhanced.unwrap_or(true) && ai.is_configured();
        let mut effective_query = query.q.clone();
        let mut suggestions = Vec::new();
        if ai_enhanced && query.q.len() > 3 {
            match ai.expand_query(&query.q).await {
                Ok(expansion) => {
                    if !expansion.enhanced_query.is_empty() {
                        effective_query = expansion.enhanced_query;
                    }
                    suggestions = expansion.related_searches;
                }
                Err(e) => {
                    log::warn!("AI query expansion failed: {}", e);
                }
            }
        }

        let candidates = BusinessRepository::search_candidates(
            pool,
            query.city.as_deref(),
            query.category.as_deref(),
            query.district.as_deref(),
            query.min_rating,
            &price_ranges,
        )
        .await?;

        // Expanded terms match more, original terms are required to match at all
        let original_terms = Self::tokenize(&query.q);
        let terms = Self::tokenize(&effective_query);

        let mut scored: Vec<(f64, Business)> = candidates
            .into_iter()
            .filter(|b| {
                original_terms.is_empty()
                    || Self::relevance_score(b, &original_terms) >= 1.0
                    || Self::relevance_score(b, &terms) >= 2.0
            })
            .map(|b| (Self::relevance_score(&b, &terms), b))
            .collect();

        // Open-now filter needs working hours for the surviving candidates
        if query.open_now == Some(true) {
            let hours = Self::hours_by_business(
                pool,
                &scored.iter().map(|(_, b)| b.id).collect::<Vec<_>>(),
            )
            .await?;
            scored.retain(|(_, b)| {
                hours
                    .get(&b.id)
                    .map(|entries| is_open_at(entries, now))
                    .unwrap_or(false)
            });
        }

        // Distance needs a center; fall back to relevance without one
        let center = match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };
        if let (Some((lat, lng)), Some(radius)) = (center, query.radius) {
            scored.retain(|(_, b)| geo::distance_km(lat, lng, b.lat, b.lng) <= radius);
        }

        match query.sort_by.as_deref() {
            Some("rating") => {
                scored.sort_by(|a, b| b.1.avg_rating.total_cmp(&a.1.avg_rating));
            }
            Some("reviews") => scored.sort_by(|a, b| b.1.total_reviews.cmp(&a.1.total_reviews)),
            Some("trending") => {
                scored.sort_by(|a, b| b.1.trend_score.total_cmp(&a.1.trend_score));
            }
            Some("distance") if center.is_some() => {
                let (lat, lng) = center.unwrap();
                scored.sort_by(|a, b| {
                    geo::distance_km(lat, lng, a.1.lat, a.1.lng)
                        .total_cmp(&geo::distance_km(lat, lng, b.1.lat, b.1.lng))
                });
            }
            _ => scored.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }

        let total = scored.len() as i64;
        let results: Vec<BusinessResponse> = scored
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, b)| match center {
                Some((lat, lng)) => {
                    let d = geo::distance_km(lat, lng, b.lat, b.lng);
                    b.to_response_with_distance(d)
                }
                None => b.to_response(),
            })
            .collect();

        Ok(SearchResult {
            results,
            total,
            search_time_ms: started.elapsed().as_millis() as u64,
            ai_enhanced,
            suggestions,
        })
    }

    /// GET /businesses/nearby pipeline
    /// DOCUMENTATION: bounding-box SQL prefilter, exact haversine cut,
    /// optional open-now filter, then sort and cap
    pub async fn nearby(
        pool: &PgPool,
        query: &NearbyQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<BusinessResponse>, ApiError> {
        let radius = query.radius.unwrap_or(5.0).clamp(0.1, 50.0);
        let limit = query.limit.unwrap_or(20).clamp(1, 50);

        let price_ranges = match &query.price_range {
            Some(raw) => parse_price_ranges(raw).map_err(ApiError::InvalidInput)?,
            None => Vec::new(),
        };

        let bbox = geo::bounding_box(query.lat, query.lng, radius);
        let candidates = BusinessRepository::candidates_in_bbox(
            pool,
            &bbox,
            query.category.as_deref(),
            query.min_rating,
            &price_ranges,
            query.verified == Some(true),
        )
        .await?;

        let mut hits: Vec<(f64, Business)> = candidates
            .into_iter()
            .filter_map(|b| {
                let d = geo::distance_km(query.lat, query.lng, b.lat, b.lng);
                (d <= radius).then_some((d, b))
            })
            .collect();

        if query.open_now == Some(true) {
            let hours = Self::hours_by_business(
                pool,
                &hits.iter().map(|(_, b)| b.id).collect::<Vec<_>>(),
            )
            .await?;
            hits.retain(|(_, b)| {
                hours
                    .get(&b.id)
                    .map(|entries| is_open_at(entries, now))
                    .unwrap_or(false)
            });
        }

        match query.sort_by.as_deref() {
            Some("rating") => hits.sort_by(|a, b| b.1.avg_rating.total_cmp(&a.1.avg_rating)),
            Some("reviews") => hits.sort_by(|a, b| b.1.total_reviews.cmp(&a.1.total_reviews)),
            Some("name") => hits.sort_by(|a, b| a.1.name.cmp(&b.1.name)),
            _ => hits.sort_by(|a, b| a.0.total_cmp(&b.0)),
        }

        Ok(hits
            .into_iter()
            .take(limit as usize)
            .map(|(d, b)| b.to_response_with_distance(d))
            .collect())
    }

    /// Autocomplete suggestions over names, categories and keywords
    pub async fn autocomplete(
        pool: &PgPool,
        term: &str,
        city: Option<&str>,
        kind: &str,
        limit: i64,
    ) -> Result<Vec<Suggestion>, ApiError> {
        let mut suggestions = Vec::new();

        if kind == "businesses" || kind == "all" {
            for name in BusinessRepository::name_suggestions(pool, term, city, limit).await? {
                suggestions.push(Suggestion {
                    kind: "business",
                    highlight: Self::highlight(&name, term),
                    text: name,
                });
            }
        }

        if kind == "categories" || kind == "all" {
            for category in BusinessRepository::category_suggestions(pool, term, limit).await? {
                suggestions.push(Suggestion {
                    kind: "category",
                    highlight: Self::highlight(&category, term),
                    text: category,
                });
            }
        }

        if kind == "all" {
            for keyword in BusinessRepository::keyword_suggestions(pool, term, limit).await? {
                suggestions.push(Suggestion {
                    kind: "keyword",
                    highlight: Self::highlight(&keyword, term),
                    text: keyword,
                });
            }
        }

        suggestions.truncate(limit as usize);
        Ok(suggestions)
    }

    /// Working hours for a set of businesses keyed by business id
    async fn hours_by_business(
        pool: &PgPool,
        business_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<WorkingHoursEntry>>, ApiError> {
        if business_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = BusinessRepository::get_working_hours_bulk(pool, business_ids).await?;
        let mut map: HashMap<Uuid, Vec<WorkingHoursEntry>> = HashMap::new();
        for row in rows {
            map.entry(row.business_id).or_default().push(row.to_entry());
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn business(name: &str, category: &str, keywords: &[&str], rating: f64) -> Business {
        Business {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: Some("Uzun yıllardır hizmet veren bir mekan".to_string()),
            category: category.to_string(),
            subcategory: None,
            city: "Istanbul".to_string(),
            district: Some("Beşiktaş".to_string()),
            neighborhood: None,
            address: None,
            lat: 41.0431,
            lng: 29.0099,
            phone: None,
            website: None,
            email: None,
            price_range: Some("MODERATE".to_string()),
            verified: true,
            is_premium: false,
            avg_rating: rating,
            total_reviews: 10,
            total_check_ins: 0,
            trend_score: 5.0,
            ai_summary: None,
            keywords: Some(keywords.iter().map(|k| k.to_string()).collect()),
            owner_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            SearchService::tokenize("En iyi Pizza"),
            vec!["en", "iyi", "pizza"]
        );
        // Single characters are noise
        assert_eq!(SearchService::tokenize("a b pizza"), vec!["pizza"]);
    }

    #[test]
    fn test_relevance_name_beats_description() {
        let terms = SearchService::tokenize("pizza");
        let named = business("Köşe Pizza", "restaurant", &[], 4.0);
        let keyword_only = business("Lezzet Durağı", "restaurant", &["pizza"], 4.0);

        let name_score = SearchService::relevance_score(&named, &terms);
        let keyword_score = SearchService::relevance_score(&keyword_only, &terms);
        assert!(name_score > keyword_score);
        assert!(keyword_score > 0.5);
    }

    #[test]
    fn test_relevance_rating_tiebreak() {
        let terms = SearchService::tokenize("kahve");
        let better = business("Kahve Dünyası", "cafe", &[], 4.8);
        let worse = business("Kahve Durağı", "cafe", &[], 3.2);

        assert!(
            SearchService::relevance_score(&better, &terms)
                > SearchService::relevance_score(&worse, &terms)
        );
    }

    #[test]
    fn test_relevance_no_match() {
        let terms = SearchService::tokenize("sushi");
        let b = business("Berber Ali", "barber", &["tıraş"], 4.7);
        assert!(SearchService::relevance_score(&b, &terms) < 1.0);
    }

    #[test]
    fn test_highlight() {
        assert_eq!(
            SearchService::highlight("Köşe Pizza", "pizza"),
            "Köşe <b>Pizza</b>"
        );
        assert_eq!(SearchService::highlight("Berber Ali", "xyz"), "Berber Ali");
        assert_eq!(SearchService::highlight("Cafe", ""), "Cafe");
    }
}
