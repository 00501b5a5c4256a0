// src/services/business_service.rs
// DOCUMENTATION: Business logic for listings
// PURPOSE: Intermediary between handlers and repository, handles extra logic

use crate::db::{BusinessRepository, ReviewRepository};
use crate::errors::ApiError;
use crate::models::*;
use sqlx::PgPool;
use uuid::Uuid;

pub struct BusinessService;

impl BusinessService {
    /// Create a new business with its related records
    pub async fn create(
        pool: &PgPool,
        req: CreateBusinessRequest,
        owner_id: Uuid,
    ) -> Result<BusinessResponse, ApiError> {
        if !PRICE_RANGES.contains(&req.price_range.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "unknown price range: {}",
                req.price_range
            )));
        }
        for entry in &req.working_hours {
            entry.validate().map_err(ApiError::InvalidInput)?;
        }

        let slug = Self::unique_slug(pool, &req.name, &req.city).await?;
        let business = BusinessRepository::create(pool, &req, &slug, owner_id).await?;

        if !req.working_hours.is_empty() {
            BusinessRepository::insert_working_hours(pool, business.id, &req.working_hours).await?;
        }
        if !req.amenities.is_empty() {
            BusinessRepository::insert_amenities(pool, business.id, &req.amenities).await?;
        }
        if !req.images.is_empty() {
            BusinessRepository::insert_images(pool, business.id, &req.images).await?;
        }

        Ok(business.to_response())
    }

    /// Get a business by ID (UUID or slug) with related records
    pub async fn get_detail(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<BusinessDetailResponse, ApiError> {
        // Try to parse as UUID first, otherwise treat as slug
        let business = if let Ok(uuid) = Uuid::parse_str(identifier) {
            BusinessRepository::get_by_id(pool, uuid).await?
        } else {
            BusinessRepository::get_by_slug(pool, identifier).await?
        };

        let images = BusinessRepository::get_images(pool, business.id).await?;
        let amenities = BusinessRepository::get_amenities(pool, business.id).await?;
        let hours = BusinessRepository::get_working_hours(pool, business.id).await?;
        let reviews = ReviewRepository::recent_for_business(pool, business.id, 10).await?;

        Ok(BusinessDetailResponse {
            business: business.to_response(),
            images: images.iter().map(|i| i.to_response()).collect(),
            amenities,
            working_hours: hours.iter().map(|h| h.to_entry()).collect(),
            reviews: reviews.iter().map(|r| r.to_response()).collect(),
        })
    }

    /// Update a business; only the owner or an admin may do this
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: UpdateBusinessRequest,
        actor: Option<&User>,
        is_admin: bool,
    ) -> Result<BusinessResponse, ApiError> {
        let business = BusinessRepository::get_by_id(pool, id).await?;
        Self::check_owner(&business, actor, is_admin)?;

        if let Some(price_range) = &req.price_range {
            if !PRICE_RANGES.contains(&price_range.as_str()) {
                return Err(ApiError::InvalidInput(format!(
                    "unknown price range: {}",
                    price_range
                )));
            }
        }

        let updated = BusinessRepository::update(pool, id, &req).await?;
        Ok(updated.to_response())
    }

    /// Soft delete a business; only the owner or an admin may do this
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        actor: Option<&User>,
        is_admin: bool,
    ) -> Result<(), ApiError> {
        let business = BusinessRepository::get_by_id(pool, id).await?;
        Self::check_owner(&business, actor, is_admin)?;
        BusinessRepository::soft_delete(pool, id).await
    }

    fn check_owner(business: &Business, actor: Option<&User>, is_admin: bool) -> Result<(), ApiError> {
        if is_admin {
            return Ok(());
        }
        match (business.owner_id, actor) {
            (Some(owner_id), Some(user)) if owner_id == user.id => Ok(()),
            _ => Err(ApiError::Forbidden),
        }
    }

    /// Generate a slug that is unique across all businesses
    /// Collisions get a numeric suffix: kose-pizza-istanbul-2
    pub async fn unique_slug(pool: &PgPool, name: &str, city: &str) -> Result<String, ApiError> {
        let base = slugify(name, city);
        if !BusinessRepository::slug_exists(pool, &base).await? {
            return Ok(base);
        }
        for n in 2..100 {
            let candidate = format!("{}-{}", base, n);
            if !BusinessRepository::slug_exists(pool, &candidate).await? {
                return Ok(candidate);
            }
        }
        Err(ApiError::InvalidInput(format!(
            "could not allocate slug for '{}'",
            name
        )))
    }
}

/// URL-safe slug from a business name and city
/// DOCUMENTATION: Transliterates Turkish characters before stripping the
/// rest, so "Köşe Pizza" in İstanbul becomes "kose-pizza-istanbul"
pub fn slugify(name: &str, city: &str) -> String {
    let combined = format!("{} {}", name, city).to_lowercase();

    let transliterated: String = combined
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'ğ' => 'g',
            'ı' | 'i' => 'i',
            'ö' => 'o',
            'ş' => 's',
            'ü' => 'u',
            other => other,
        })
        .collect();

    let mut slug = String::with_capacity(transliterated.len());
    let mut last_dash = true;
    for c in transliterated.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_turkish_characters() {
        assert_eq!(slugify("Köşe Pizza", "İstanbul"), "kose-pizza-istanbul");
        assert_eq!(slugify("Çağdaş Büfe", "Şişli"), "cagdas-bufe-sisli");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("Ali's Café & Bar!", "Ankara"), "ali-s-caf-bar-ankara");
        assert_eq!(slugify("  spaced   out  ", "city"), "spaced-out-city");
    }

    #[test]
    fn test_slugify_collapses_dashes() {
        let slug = slugify("A --- B", "C");
        assert!(!slug.contains("--"));
        assert_eq!(slug, "a-b-c");
    }
}
