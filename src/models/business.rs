// src/models/business.rs
// DOCUMENTATION: Core data structures for businesses
// PURPOSE: Defines all serialization/deserialization models for API and database

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{ReviewResponse, WorkingHoursEntry};

/// Allowed price range codes, from cheapest to most expensive
pub const PRICE_RANGES: [&str; 4] = ["BUDGET", "MODERATE", "EXPENSIVE", "LUXURY"];

/// Represents a complete business record from the database
/// DOCUMENTATION: This struct maps directly to the businesses table in PostgreSQL
/// Used for internal operations and database queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Business {
    /// Unique identifier (UUID v4)
    pub id: Uuid,

    /// Business name - required field
    pub name: String,

    /// URL-safe unique slug, generated from name + city
    pub slug: String,

    /// Optional detailed description
    pub description: Option<String>,

    /// Primary category: restaurant, cafe, barber, market, etc.
    pub category: String,

    /// Finer-grained category (pizza, specialty coffee, ...)
    pub subcategory: Option<String>,

    /// City name (required for filtering)
    pub city: String,

    /// Neighborhood or district
    pub district: Option<String>,

    /// Smaller locality within the district
    pub neighborhood: Option<String>,

    /// Physical street address
    pub address: Option<String>,

    /// Geographic coordinates
    pub lat: f64,
    pub lng: f64,

    /// Phone number
    pub phone: Option<String>,

    /// Website URL
    pub website: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Price range code (BUDGET | MODERATE | EXPENSIVE | LUXURY)
    pub price_range: Option<String>,

    /// Whether the listing has been verified by an admin
    pub verified: bool,

    /// Paid placement flag
    pub is_premium: bool,

    /// Aggregate rating derived from reviews (0-5)
    pub avg_rating: f64,

    /// Number of reviews for this business
    pub total_reviews: i32,

    /// Number of check-ins recorded for this business
    pub total_check_ins: i32,

    /// Popularity trend score (0-10), maintained by review activity
    pub trend_score: f64,

    /// AI-generated one-paragraph summary of recent reviews
    pub ai_summary: Option<String>,

    /// Search keywords attached to the listing
    pub keywords: Option<Vec<String>>,

    /// ID of the owning user, when claimed
    pub owner_id: Option<Uuid>,

    /// Soft delete flag (true = active, false = deleted)
    pub is_active: bool,

    /// When record was created
    pub created_at: DateTime<Utc>,

    /// When record was last modified
    pub updated_at: DateTime<Utc>,
}

/// Business image row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessImage {
    pub id: Uuid,
    pub business_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub display_order: i32,
    pub ai_tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Business amenity row (one row per amenity code)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessAmenity {
    pub id: Uuid,
    pub business_id: Uuid,
    pub amenity: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a new business
/// DOCUMENTATION: Data transfer object for POST /businesses endpoint
/// Used for API input validation and database inserts
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateBusinessRequest {
    /// Business name (required)
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Description (required, 10-1000 chars)
    #[validate(length(min = 10, max = 1000))]
    pub description: String,

    /// Primary category (required)
    #[validate(length(min = 1, max = 50))]
    pub category: String,

    /// Subcategory
    #[serde(default)]
    pub subcategory: Option<String>,

    /// City name (required)
    #[validate(length(min = 1, max = 50))]
    pub city: String,

    /// District (required)
    #[validate(length(min = 1, max = 50))]
    pub district: String,

    /// Neighborhood (optional)
    #[serde(default)]
    pub neighborhood: Option<String>,

    /// Physical address
    #[validate(length(min = 1, max = 255))]
    pub address: String,

    /// Geographic latitude
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    /// Geographic longitude
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// Website URL
    #[serde(default)]
    #[validate(url)]
    pub website: Option<String>,

    /// Contact email
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,

    /// Price range code
    pub price_range: String,

    /// Amenity codes (WIFI, PARKING, DELIVERY, ...)
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Weekly opening hours
    #[serde(default)]
    pub working_hours: Vec<WorkingHoursEntry>,

    /// Image URLs to attach at creation time
    #[serde(default)]
    pub images: Vec<String>,

    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Request DTO for updating an existing business
/// DOCUMENTATION: Data transfer object for PUT /businesses/{id} endpoint
/// All fields are optional - only provided fields are updated
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    /// Updated name
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    /// Updated description
    #[validate(length(min = 10, max = 1000))]
    pub description: Option<String>,

    /// Updated category
    pub category: Option<String>,

    /// Updated subcategory
    pub subcategory: Option<String>,

    /// Updated address
    pub address: Option<String>,

    /// Updated phone
    pub phone: Option<String>,

    /// Updated website
    #[validate(url)]
    pub website: Option<String>,

    /// Updated email
    #[validate(email)]
    pub email: Option<String>,

    /// Updated price range code
    pub price_range: Option<String>,

    /// Replacement keyword list
    pub keywords: Option<Vec<String>>,
}

/// Response DTO for API responses
/// DOCUMENTATION: Data transfer object for GET endpoints
/// Contains only relevant information for API consumers
#[derive(Debug, Clone, Serialize)]
pub struct BusinessResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,

    /// Classification
    pub category: String,
    pub subcategory: Option<String>,

    /// Location
    pub city: String,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,

    /// Contact information
    pub phone: Option<String>,
    pub website: Option<String>,

    /// Price level
    pub price_range: Option<String>,

    /// Listing state
    pub verified: bool,
    pub is_premium: bool,

    /// Aggregates
    pub avg_rating: f64,
    pub total_reviews: i32,
    pub total_check_ins: i32,
    pub trend_score: f64,

    /// AI-generated review digest
    pub ai_summary: Option<String>,

    /// Distance from the search center in kilometers (nearby/search only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    /// Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detailed response DTO
/// DOCUMENTATION: Extended response with related records
/// Used for GET /businesses/{id} endpoint
#[derive(Debug, Serialize)]
pub struct BusinessDetailResponse {
    #[serde(flatten)]
    pub business: BusinessResponse,
    pub images: Vec<BusinessImageResponse>,
    pub amenities: Vec<String>,
    pub working_hours: Vec<WorkingHoursEntry>,
    pub reviews: Vec<ReviewResponse>,
}

/// Business image DTO for API responses
#[derive(Debug, Clone, Serialize)]
pub struct BusinessImageResponse {
    pub id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub display_order: i32,
    pub ai_tags: Option<Vec<String>>,
}

/// Listing query parameters
/// DOCUMENTATION: DTO for parsing query string in GET /businesses
/// All parameters are optional for flexible filtering
#[derive(Debug, Default, Deserialize)]
pub struct BusinessQuery {
    /// Filter by city
    pub city: Option<String>,

    /// Filter by primary category
    pub category: Option<String>,

    /// Filter by district
    pub district: Option<String>,

    /// Substring search over name/description/category
    pub search: Option<String>,

    /// Only verified listings
    pub verified: Option<bool>,

    /// Only premium listings
    pub premium: Option<bool>,

    /// Minimum average rating filter
    pub min_rating: Option<f64>,

    /// Comma-separated price range codes
    pub price_range: Option<String>,

    /// Sort order: name | rating | reviews | trending
    pub sort_by: Option<String>,

    /// Results per page (max 50)
    pub limit: Option<i64>,

    /// Result offset
    pub offset: Option<i64>,
}

/// Nearby query parameters
/// DOCUMENTATION: DTO for GET /businesses/nearby
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    /// Search center latitude
    pub lat: f64,

    /// Search center longitude
    pub lng: f64,

    /// Search radius in kilometers (default 5, max 50)
    pub radius: Option<f64>,

    /// Filter by category
    pub category: Option<String>,

    /// Minimum average rating
    pub min_rating: Option<f64>,

    /// Comma-separated price range codes
    pub price_range: Option<String>,

    /// Only verified listings
    pub verified: Option<bool>,

    /// Only businesses open at request time
    pub open_now: Option<bool>,

    /// Sort order: distance | rating | reviews | name
    pub sort_by: Option<String>,

    /// Results cap (max 50)
    pub limit: Option<i64>,
}

/// Paginated listing response
/// DOCUMENTATION: DTO for returning filtered results with pagination metadata
#[derive(Debug, Serialize)]
pub struct BusinessListResponse {
    pub success: bool,
    pub data: Vec<BusinessResponse>,
    pub meta: ListMeta,
}

/// Pagination metadata shared by list endpoints
#[derive(Debug, Serialize)]
pub struct ListMeta {
    /// Total number of matches (regardless of pagination)
    pub total: i64,

    /// Results per page
    pub limit: i64,

    /// Current offset
    pub offset: i64,

    /// Whether more results exist past this page
    pub has_more: bool,
}

impl Business {
    /// Convert Business to BusinessResponse for API
    /// DOCUMENTATION: Maps database model to API response DTO
    pub fn to_response(&self) -> BusinessResponse {
        BusinessResponse {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            neighborhood: self.neighborhood.clone(),
            address: self.address.clone(),
            lat: self.lat,
            lng: self.lng,
            phone: self.phone.clone(),
            website: self.website.clone(),
            price_range: self.price_range.clone(),
            verified: self.verified,
            is_premium: self.is_premium,
            avg_rating: self.avg_rating,
            total_reviews: self.total_reviews,
            total_check_ins: self.total_check_ins,
            trend_score: self.trend_score,
            ai_summary: self.ai_summary.clone(),
            distance_km: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Same as to_response, with the computed distance attached
    pub fn to_response_with_distance(&self, distance_km: f64) -> BusinessResponse {
        let mut response = self.to_response();
        // Round to 10m precision; raw haversine output is noisy
        response.distance_km = Some((distance_km * 100.0).round() / 100.0);
        response
    }
}

impl BusinessImage {
    /// Convert database image into API response DTO
    pub fn to_response(&self) -> BusinessImageResponse {
        BusinessImageResponse {
            id: self.id,
            url: self.url.clone(),
            caption: self.caption.clone(),
            display_order: self.display_order,
            ai_tags: self.ai_tags.clone(),
        }
    }
}

/// Parse a comma-separated price range filter, rejecting unknown codes
pub fn parse_price_ranges(raw: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let code = part.to_uppercase();
        if !PRICE_RANGES.contains(&code.as_str()) {
            return Err(format!("unknown price range: {}", part));
        }
        if !out.contains(&code) {
            out.push(code);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_ranges() {
        let parsed = parse_price_ranges("BUDGET,moderate").unwrap();
        assert_eq!(parsed, vec!["BUDGET".to_string(), "MODERATE".to_string()]);

        let deduped = parse_price_ranges("LUXURY,LUXURY").unwrap();
        assert_eq!(deduped.len(), 1);

        assert!(parse_price_ranges("CHEAP").is_err());
    }

    #[test]
    fn test_distance_rounding() {
        let business = sample_business();
        let response = business.to_response_with_distance(1.23456);
        assert_eq!(response.distance_km, Some(1.23));
    }

    fn sample_business() -> Business {
        Business {
            id: Uuid::new_v4(),
            name: "Köşe Pizza".to_string(),
            slug: "kose-pizza-istanbul".to_string(),
            description: Some("Neighborhood pizza spot".to_string()),
            category: "restaurant".to_string(),
            subcategory: Some("pizza".to_string()),
            city: "Istanbul".to_string(),
            district: Some("Beşiktaş".to_string()),
            neighborhood: None,
            address: Some("Barbaros Bulvarı No:45".to_string()),
            lat: 41.0431,
            lng: 29.0099,
            phone: None,
            website: None,
            email: None,
            price_range: Some("MODERATE".to_string()),
            verified: true,
            is_premium: false,
            avg_rating: 4.2,
            total_reviews: 128,
            total_check_ins: 45,
            trend_score: 8.8,
            ai_summary: None,
            keywords: Some(vec!["pizza".to_string()]),
            owner_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
