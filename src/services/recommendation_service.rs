// src/services/recommendation_service.rs
// DOCUMENTATION: Personalized business recommendations
// PURPOSE: Taste profile from review history plus arithmetic candidate scoring

use crate::db::{BusinessRepository, ReviewRepository, ReviewedBusinessFact};
use crate::errors::ApiError;
use crate::models::*;
use crate::services::{geo, OpenAiClient};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Query parameters for GET /recommendations
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Recommendation mode: general | nearby | trending | similar
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub city: Option<String>,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    /// Results cap (max 20)
    pub limit: Option<i64>,

    /// Skip businesses the user already reviewed (default true)
    pub exclude_visited: Option<bool>,
}

/// One scored recommendation
#[derive(Debug, Serialize)]
pub struct Recommendation {
    pub business: BusinessResponse,

    /// Personalization score 0-100
    pub score: f64,

    /// Human-readable reasons for the match
    pub reasons: Vec<String>,

    /// Recommendation mode that produced this entry
    #[serde(rename = "type")]
    pub kind: String,

    /// Score normalized to 0-1
    pub confidence: f64,
}

/// Recommendation batch plus the optional AI note
#[derive(Debug, Serialize)]
pub struct RecommendationBatch {
    pub recommendations: Vec<Recommendation>,
    pub personalized_note: Option<String>,
}

/// Taste profile distilled from the user's review history
#[derive(Debug, Clone, Serialize)]
pub struct TasteProfile {
    /// Categories ranked by how often the user reviews them
    pub favorite_categories: Vec<String>,

    /// Average rating the user hands out
    pub avg_rating_given: f64,

    /// Price ranges the user frequents
    pub preferred_price_ranges: Vec<String>,

    /// Tags that keep appearing in the user's reviews
    pub frequent_tags: Vec<String>,

    /// Businesses the user already reviewed
    pub visited: HashSet<Uuid>,
}

pub struct RecommendationService;

impl RecommendationService {
    /// Build the taste profile from the user's review history
    pub async fn build_profile(pool: &PgPool, user_id: Uuid) -> Result<TasteProfile, ApiError> {
        let facts = ReviewRepository::reviewed_business_facts(pool, user_id).await?;
        Ok(Self::profile_from_facts(&facts))
    }

    /// Pure profile derivation, separated for testing
    pub fn profile_from_facts(facts: &[ReviewedBusinessFact]) -> TasteProfile {
        let mut category_counts: HashMap<&str, usize> = HashMap::new();
        let mut price_counts: HashMap<&str, usize> = HashMap::new();
        let mut tag_counts: HashMap<&str, usize> = HashMap::new();
        let mut rating_sum = 0i64;
        let mut visited = HashSet::new();

        for fact in facts {
            *category_counts.entry(fact.category.as_str()).or_default() += 1;
            if let Some(price) = &fact.price_range {
                *price_counts.entry(price.as_str()).or_default() += 1;
            }
            for tag in fact.ai_tags.as_deref().unwrap_or(&[]) {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
            rating_sum += fact.rating as i64;
            visited.insert(fact.business_id);
        }

        let top = |counts: HashMap<&str, usize>, take: usize| -> Vec<String> {
            let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            entries
                .into_iter()
                .take(take)
                .map(|(value, _)| value.to_string())
                .collect()
        };

        TasteProfile {
            favorite_categories: top(category_counts, 3),
            avg_rating_given: if facts.is_empty() {
                0.0
            } else {
                rating_sum as f64 / facts.len() as f64
            },
            preferred_price_ranges: top(price_counts, 2),
            frequent_tags: top(tag_counts, 5),
            visited,
        }
    }

    /// Personalization score for a candidate (0-100)
    /// DOCUMENTATION: category affinity 30, price match 15, quality up to 25,
    /// popularity up to 10, trend up to 10, proximity up to 20 with a 2pt/km
    /// decay, plus a 10pt discovery bonus for new categories
    pub fn score_candidate(
        business: &Business,
        profile: &TasteProfile,
        kind: &str,
        center: Option<(f64, f64)>,
    ) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        let favorite = profile
            .favorite_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&business.category));
        if favorite {
            score += 30.0;
            reasons.push(format!("You often visit {} places", business.category));
        } else if kind == "general" || kind == "discovery" {
            score += 10.0;
            reasons.push("Something new to discover".to_string());
        }

        if let Some(price) = &business.price_range {
            if profile.preferred_price_ranges.iter().any(|p| p == price) {
                score += 15.0;
                reasons.push("Matches your usual budget".to_string());
            }
        }

        // Quality: 5 stars -> 25 points
        score += business.avg_rating * 5.0;
        if business.avg_rating >= 4.5 {
            reasons.push(format!("Highly rated ({:.1})", business.avg_rating));
        }

        // Popularity saturates at 100 reviews
        score += (business.total_reviews.min(100) as f64) * 0.1;

        score += business.trend_score;
        if business.trend_score >= 7.0 {
            reasons.push("Trending right now".to_string());
        }

        if let Some((lat, lng)) = center {
            let distance = geo::distance_km(lat, lng, business.lat, business.lng);
            let proximity = (20.0 - distance * 2.0).max(0.0);
            score += proximity;
            if distance <= 2.0 {
                reasons.push(format!("Close to you ({:.1} km)", distance));
            }
        }

        (score.min(100.0), reasons)
    }

    /// GET /recommendations pipeline
    pub async fn recommend(
        pool: &PgPool,
        ai: &OpenAiClient,
        user: &User,
        query: &RecommendationQuery,
    ) -> Result<RecommendationBatch, ApiError> {
        let kind = query.kind.as_deref().unwrap_or("general").to_string();
        let limit = query.limit.unwrap_or(10).clamp(1, 20);
        let exclude_visited = query.exclude_visited.unwrap_or(true);
        let city = query.city.as_deref().or(user.city.as_deref());

        let profile = Self::build_profile(pool, user.id).await?;

        let center = match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };

        // Candidate pool depends on the recommendation mode
        let candidates = match kind.as_str() {
            "nearby" => {
                let (lat, lng) = center.ok_or_else(|| {
                    ApiError::InvalidInput("lat and lng are required for nearby recommendations".to_string())
                })?;
                let bbox = geo::bounding_box(lat, lng, 10.0);
                BusinessRepository::candidates_in_bbox(pool, &bbox, query.category.as_deref(), None, &[], false)
                    .await?
            }
            "trending" => BusinessRepository::trending(pool, city, 100).await?,
            "similar" => {
                // Similar mode narrows to the user's favorite categories
                let category = query
                    .category
                    .clone()
                    .or_else(|| profile.favorite_categories.first().cloned());
                BusinessRepository::search_candidates(pool, city, category.as_deref(), None, None, &[])
                    .await?
            }
            _ => {
                BusinessRepository::search_candidates(pool, city, query.category.as_deref(), None, None, &[])
                    .await?
            }
        };

        let mut scored: Vec<Recommendation> = candidates
            .into_iter()
            .filter(|b| !(exclude_visited && profile.visited.contains(&b.id)))
            .map(|b| {
                let (score, reasons) = Self::score_candidate(&b, &profile, &kind, center);
                let business = match center {
                    Some((lat, lng)) => {
                        let d = geo::distance_km(lat, lng, b.lat, b.lng);
                        b.to_response_with_distance(d)
                    }
                    None => b.to_response(),
                };
                Recommendation {
                    business,
                    score,
                    reasons,
                    kind: kind.clone(),
                    confidence: (score / 100.0).clamp(0.0, 1.0),
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit as usize);

        // The strategy note is flavor text; failures never block the response
        let personalized_note = if ai.is_configured() && !scored.is_empty() {
            let profile_json = json!({
                "favorite_categories": profile.favorite_categories,
                "avg_rating_given": profile.avg_rating_given,
                "preferred_price_ranges": profile.preferred_price_ranges,
                "frequent_tags": profile.frequent_tags,
                "level": user.level,
            });
            match ai.recommendation_note(&profile_json, &kind).await {
                Ok(note) => Some(note),
                Err(e) => {
                    log::warn!("Recommendation note failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(RecommendationBatch {
            recommendations: scored,
            personalized_note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fact(business_id: Uuid, category: &str, price: &str, rating: i32, tags: &[&str]) -> ReviewedBusinessFact {
        ReviewedBusinessFact {
            business_id,
            category: category.to_string(),
            price_range: Some(price.to_string()),
            rating,
            ai_tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    fn candidate(category: &str, price: &str, rating: f64, trend: f64) -> Business {
        Business {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            slug: "test".to_string(),
            description: None,
            category: category.to_string(),
            subcategory: None,
            city: "Istanbul".to_string(),
            district: None,
            neighborhood: None,
            address: None,
            lat: 41.0431,
            lng: 29.0099,
            phone: None,
            website: None,
            email: None,
            price_range: Some(price.to_string()),
            verified: true,
            is_premium: false,
            avg_rating: rating,
            total_reviews: 50,
            total_check_ins: 0,
            trend_score: trend,
            ai_summary: None,
            keywords: None,
            owner_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_from_facts() {
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();
        let b3 = Uuid::new_v4();
        let facts = vec![
            fact(b1, "restaurant", "MODERATE", 5, &["taste"]),
            fact(b2, "restaurant", "MODERATE", 4, &["taste", "service"]),
            fact(b3, "cafe", "BUDGET", 3, &["atmosphere"]),
        ];

        let profile = RecommendationService::profile_from_facts(&facts);
        assert_eq!(profile.favorite_categories[0], "restaurant");
        assert_eq!(profile.preferred_price_ranges[0], "MODERATE");
        assert_eq!(profile.frequent_tags[0], "taste");
        assert!((profile.avg_rating_given - 4.0).abs() < 1e-9);
        assert_eq!(profile.visited.len(), 3);
    }

    #[test]
    fn test_empty_profile() {
        let profile = RecommendationService::profile_from_facts(&[]);
        assert!(profile.favorite_categories.is_empty());
        assert_eq!(profile.avg_rating_given, 0.0);
        assert!(profile.visited.is_empty());
    }

    #[test]
    fn test_category_affinity_outranks_discovery() {
        let facts = vec![fact(Uuid::new_v4(), "restaurant", "MODERATE", 5, &[])];
        let profile = RecommendationService::profile_from_facts(&facts);

        let matching = candidate("restaurant", "MODERATE", 4.0, 5.0);
        let other = candidate("barber", "MODERATE", 4.0, 5.0);

        let (match_score, match_reasons) =
            RecommendationService::score_candidate(&matching, &profile, "general", None);
        let (other_score, _) =
            RecommendationService::score_candidate(&other, &profile, "general", None);

        assert!(match_score > other_score);
        assert!(match_reasons.iter().any(|r| r.contains("restaurant")));
    }

    #[test]
    fn test_proximity_bonus() {
        let profile = RecommendationService::profile_from_facts(&[]);
        let near = candidate("cafe", "BUDGET", 4.0, 5.0);

        let (with_center, reasons) = RecommendationService::score_candidate(
            &near,
            &profile,
            "nearby",
            Some((41.0431, 29.0099)),
        );
        let (without_center, _) =
            RecommendationService::score_candidate(&near, &profile, "nearby", None);

        assert!(with_center > without_center);
        assert!(reasons.iter().any(|r| r.contains("Close to you")));
    }

    #[test]
    fn test_score_capped_at_100() {
        let facts = vec![fact(Uuid::new_v4(), "restaurant", "LUXURY", 5, &[])];
        let profile = RecommendationService::profile_from_facts(&facts);
        let perfect = candidate("restaurant", "LUXURY", 5.0, 10.0);

        let (score, _) = RecommendationService::score_candidate(
            &perfect,
            &profile,
            "general",
            Some((41.0431, 29.0099)),
        );
        assert!(score <= 100.0);
    }
}
