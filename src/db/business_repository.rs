// src/db/business_repository.rs
// DOCUMENTATION: Database access layer for businesses - all SQL queries
// PURPOSE: Abstract database operations from business logic

use crate::errors::ApiError;
use crate::models::*;
use crate::services::geo::BoundingBox;
use sqlx::PgPool;
use uuid::Uuid;

const BUSINESS_COLUMNS: &str = r#"
    id, name, slug, description, category, subcategory,
    city, district, neighborhood, address, lat, lng,
    phone, website, email, price_range,
    verified, is_premium,
    avg_rating, total_reviews, total_check_ins, trend_score,
    ai_summary, keywords, owner_id, is_active,
    created_at, updated_at
"#;

/// BusinessRepository: All database operations for businesses
/// DOCUMENTATION: Uses query_as for type-safe SQL queries
pub struct BusinessRepository;

impl BusinessRepository {
    /// Create new business in database
    /// DOCUMENTATION: Inserts business and returns created record
    /// Used by POST /businesses endpoint
    pub async fn create(
        pool: &PgPool,
        req: &CreateBusinessRequest,
        slug: &str,
        owner_id: Uuid,
    ) -> Result<Business, ApiError> {
        let business = sqlx::query_as::<_, Business>(&format!(
            r#"
            INSERT INTO businesses (
                name, slug, description, category, subcategory,
                city, district, neighborhood, address, lat, lng,
                phone, website, email, price_range, keywords, owner_id,
                verified, is_premium, avg_rating, total_reviews, total_check_ins,
                trend_score, is_active, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17,
                false, false, 0, 0, 0,
                0, true, NOW(), NOW()
            )
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        ))
        .bind(&req.name)
        .bind(slug)
        .bind(&req.description)
        .bind(&req.category)
        .bind(&req.subcategory)
        .bind(&req.city)
        .bind(&req.district)
        .bind(&req.neighborhood)
        .bind(&req.address)
        .bind(req.lat)
        .bind(req.lng)
        .bind(&req.phone)
        .bind(&req.website)
        .bind(&req.email)
        .bind(&req.price_range)
        .bind(&req.keywords)
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create business: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        log::info!("Created business with id: {}", business.id);
        Ok(business)
    }

    /// Retrieve business by ID
    /// DOCUMENTATION: Used for GET /businesses/{id} endpoint
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Business, ApiError> {
        sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE id = $1 AND is_active = true",
            BUSINESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database error fetching business: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| {
            log::warn!("Business not found: {}", id);
            ApiError::NotFound(id.to_string())
        })
    }

    /// Retrieve business by slug
    /// DOCUMENTATION: Used for GET /businesses/{id} when id is a slug
    pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Business, ApiError> {
        sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE slug = $1 AND is_active = true",
            BUSINESS_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database error fetching business by slug {}: {}", slug, e);
            ApiError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("Business '{}' not found", slug)))
    }

    /// Whether a slug is already taken (including soft-deleted rows)
    pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, ApiError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM businesses WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(row.0)
    }

    /// List businesses with filters and pagination
    /// DOCUMENTATION: Used for GET /businesses endpoint
    /// Returns tuple: (results, total_count) for pagination
    pub async fn list(
        pool: &PgPool,
        query: &BusinessQuery,
        price_ranges: &[String],
    ) -> Result<(Vec<Business>, i64), ApiError> {
        let limit = query.limit.unwrap_or(20).clamp(1, 50);
        let offset = query.offset.unwrap_or(0).max(0);

        // Build dynamic query based on provided filters
        let mut where_clauses = vec!["is_active = true".to_string()];

        if let Some(city) = &query.city {
            where_clauses.push(format!("city ILIKE '{}'", city.replace('\'', "''")));
        }

        if let Some(category) = &query.category {
            where_clauses.push(format!("category ILIKE '{}'", category.replace('\'', "''")));
        }

        if let Some(district) = &query.district {
            where_clauses.push(format!("district ILIKE '{}'", district.replace('\'', "''")));
        }

        if let Some(search) = &query.search {
            let escaped = search.replace('\'', "''").replace('%', "");
            where_clauses.push(format!(
                "(name ILIKE '%{0}%' OR description ILIKE '%{0}%' OR category ILIKE '%{0}%')",
                escaped
            ));
        }

        if query.verified == Some(true) {
            where_clauses.push("verified = true".to_string());
        }

        if query.premium == Some(true) {
            where_clauses.push("is_premium = true".to_string());
        }

        if let Some(min_rating) = query.min_rating {
            where_clauses.push(format!("avg_rating >= {}", min_rating));
        }

        if !price_ranges.is_empty() {
            let quoted: Vec<String> = price_ranges.iter().map(|p| format!("'{}'", p)).collect();
            where_clauses.push(format!("price_range IN ({})", quoted.join(", ")));
        }

        let where_clause = format!("WHERE {}", where_clauses.join(" AND "));

        let order_clause = match query.sort_by.as_deref() {
            Some("name") => "ORDER BY name ASC",
            Some("reviews") => "ORDER BY total_reviews DESC",
            Some("trending") => "ORDER BY trend_score DESC, avg_rating DESC",
            _ => "ORDER BY avg_rating DESC, total_reviews DESC",
        };

        // Get total count
        let count_sql = format!("SELECT COUNT(*) FROM businesses {}", where_clause);
        let count_result: (i64,) = sqlx::query_as(&count_sql)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Count query error: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;
        let total = count_result.0;

        let sql = format!(
            "SELECT {} FROM businesses {} {} LIMIT {} OFFSET {}",
            BUSINESS_COLUMNS, where_clause, order_clause, limit, offset
        );

        log::debug!("Executing listing query: {}", sql);

        let businesses = sqlx::query_as::<_, Business>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Listing query error: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        Ok((businesses, total))
    }

    /// Candidate businesses inside a lat/lng bounding box
    /// DOCUMENTATION: Coarse prefilter for nearby search; exact haversine
    /// filtering happens in the service layer
    pub async fn candidates_in_bbox(
        pool: &PgPool,
        bbox: &BoundingBox,
        category: Option<&str>,
        min_rating: Option<f64>,
        price_ranges: &[String],
        verified_only: bool,
    ) -> Result<Vec<Business>, ApiError> {
        let mut where_clauses = vec![
            "is_active = true".to_string(),
            format!("lat BETWEEN {} AND {}", bbox.min_lat, bbox.max_lat),
            format!("lng BETWEEN {} AND {}", bbox.min_lng, bbox.max_lng),
        ];

        if let Some(category) = category {
            where_clauses.push(format!("category ILIKE '{}'", category.replace('\'', "''")));
        }
        if let Some(min_rating) = min_rating {
            where_clauses.push(format!("avg_rating >= {}", min_rating));
        }
        if !price_ranges.is_empty() {
            let quoted: Vec<String> = price_ranges.iter().map(|p| format!("'{}'", p)).collect();
            where_clauses.push(format!("price_range IN ({})", quoted.join(", ")));
        }
        if verified_only {
            where_clauses.push("verified = true".to_string());
        }

        let sql = format!(
            "SELECT {} FROM businesses WHERE {} LIMIT 500",
            BUSINESS_COLUMNS,
            where_clauses.join(" AND ")
        );

        sqlx::query_as::<_, Business>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Bounding box query error: {}", e);
                ApiError::DatabaseError(e.to_string())
            })
    }

    /// Candidate businesses for text search scoring
    /// DOCUMENTATION: Applies the cheap structured filters in SQL and leaves
    /// relevance ranking to the search service
    pub async fn search_candidates(
        pool: &PgPool,
        city: Option<&str>,
        category: Option<&str>,
        district: Option<&str>,
        min_rating: Option<f64>,
        price_ranges: &[String],
    ) -> Result<Vec<Business>, ApiError> {
        let mut where_clauses = vec!["is_active = true".to_string()];

        if let Some(city) = city {
            where_clauses.push(format!("city ILIKE '{}'", city.replace('\'', "''")));
        }
        if let Some(category) = category {
            where_clauses.push(format!("category ILIKE '{}'", category.replace('\'', "''")));
        }
        if let Some(district) = district {
            where_clauses.push(format!("district ILIKE '{}'", district.replace('\'', "''")));
        }
        if let Some(min_rating) = min_rating {
            where_clauses.push(format!("avg_rating >= {}", min_rating));
        }
        if !price_ranges.is_empty() {
            let quoted: Vec<String> = price_ranges.iter().map(|p| format!("'{}'", p)).collect();
            where_clauses.push(format!("price_range IN ({})", quoted.join(", ")));
        }

        let sql = format!(
            "SELECT {} FROM businesses WHERE {} LIMIT 500",
            BUSINESS_COLUMNS,
            where_clauses.join(" AND ")
        );

        sqlx::query_as::<_, Business>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Search candidate query error: {}", e);
                ApiError::DatabaseError(e.to_string())
            })
    }

    /// Update existing business
    /// DOCUMENTATION: Partial update - only provided fields are modified
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateBusinessRequest,
    ) -> Result<Business, ApiError> {
        let business = sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                category = COALESCE($3, category),
                subcategory = COALESCE($4, subcategory),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                website = COALESCE($7, website),
                email = COALESCE($8, email),
                price_range = COALESCE($9, price_range),
                keywords = COALESCE($10, keywords),
                updated_at = NOW()
            WHERE id = $11 AND is_active = true
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.category)
        .bind(&req.subcategory)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.website)
        .bind(&req.email)
        .bind(&req.price_range)
        .bind(&req.keywords)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Update failed for business {}: {}", id, e);
            ApiError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        log::info!("Updated business: {}", id);
        Ok(business)
    }

    /// Soft delete business
    /// DOCUMENTATION: Sets is_active=false instead of physical deletion
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query(
            "UPDATE businesses SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Delete failed for business {}: {}", id, e);
            ApiError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound(id.to_string()));
        }

        log::info!("Deleted business: {}", id);
        Ok(())
    }

    /// Mark a business as verified (admin only)
    pub async fn set_verified(pool: &PgPool, id: Uuid) -> Result<Business, ApiError> {
        sqlx::query_as::<_, Business>(&format!(
            "UPDATE businesses SET verified = true, updated_at = NOW() WHERE id = $1 RETURNING {}",
            BUSINESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    /// Recompute aggregates after review changes
    /// DOCUMENTATION: avg_rating/total_reviews from all reviews, trend_score
    /// from the last 30 days of review activity (capped at 10)
    pub async fn recompute_stats(pool: &PgPool, business_id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE businesses b
            SET avg_rating = COALESCE((SELECT AVG(rating)::float8 FROM reviews WHERE business_id = $1), 0),
                total_reviews = (SELECT COUNT(*) FROM reviews WHERE business_id = $1),
                trend_score = LEAST(10, (
                    SELECT COUNT(*) FROM reviews
                    WHERE business_id = $1 AND created_at > NOW() - INTERVAL '30 days'
                )),
                updated_at = NOW()
            WHERE b.id = $1
            "#,
        )
        .bind(business_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Stats recompute failed for business {}: {}", business_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    /// Store an AI-generated review digest on the business
    pub async fn set_ai_summary(
        pool: &PgPool,
        business_id: Uuid,
        summary: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE businesses SET ai_summary = $1, updated_at = NOW() WHERE id = $2")
            .bind(summary)
            .bind(business_id)
            .execute(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    // ---- Related records ----

    /// Insert weekly working hours rows for a business
    pub async fn insert_working_hours(
        pool: &PgPool,
        business_id: Uuid,
        entries: &[WorkingHoursEntry],
    ) -> Result<(), ApiError> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO working_hours (business_id, day, open_time, close_time, is_closed)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (business_id, day) DO UPDATE
                SET open_time = EXCLUDED.open_time,
                    close_time = EXCLUDED.close_time,
                    is_closed = EXCLUDED.is_closed
                "#,
            )
            .bind(business_id)
            .bind(&entry.day)
            .bind(&entry.open_time)
            .bind(&entry.close_time)
            .bind(entry.is_closed)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to insert working hours for {}: {}", business_id, e);
                ApiError::DatabaseError(e.to_string())
            })?;
        }
        Ok(())
    }

    /// Insert amenity rows for a business
    pub async fn insert_amenities(
        pool: &PgPool,
        business_id: Uuid,
        amenities: &[String],
    ) -> Result<(), ApiError> {
        for amenity in amenities {
            sqlx::query(
                r#"
                INSERT INTO business_amenities (business_id, amenity)
                VALUES ($1, $2)
                ON CONFLICT (business_id, amenity) DO NOTHING
                "#,
            )
            .bind(business_id)
            .bind(amenity)
            .execute(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Insert image rows for a business
    pub async fn insert_images(
        pool: &PgPool,
        business_id: Uuid,
        urls: &[String],
    ) -> Result<(), ApiError> {
        for (order, url) in urls.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO business_images (business_id, url, display_order)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(business_id)
            .bind(url)
            .bind(order as i32)
            .execute(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Fetch images for a business, primary first
    pub async fn get_images(
        pool: &PgPool,
        business_id: Uuid,
    ) -> Result<Vec<BusinessImage>, ApiError> {
        sqlx::query_as::<_, BusinessImage>(
            r#"
            SELECT id, business_id, url, caption, display_order, ai_tags, created_at
            FROM business_images
            WHERE business_id = $1
            ORDER BY display_order ASC, created_at ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// Fetch amenity codes for a business
    pub async fn get_amenities(pool: &PgPool, business_id: Uuid) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT amenity FROM business_amenities WHERE business_id = $1 ORDER BY amenity",
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Fetch working hours for a business, Monday first
    pub async fn get_working_hours(
        pool: &PgPool,
        business_id: Uuid,
    ) -> Result<Vec<WorkingHours>, ApiError> {
        sqlx::query_as::<_, WorkingHours>(
            r#"
            SELECT id, business_id, day, open_time, close_time, is_closed
            FROM working_hours
            WHERE business_id = $1
            ORDER BY array_position(ARRAY['MONDAY','TUESDAY','WEDNESDAY','THURSDAY','FRIDAY','SATURDAY','SUNDAY'], day)
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// Working hours for a set of businesses, grouped by business id
    pub async fn get_working_hours_bulk(
        pool: &PgPool,
        business_ids: &[Uuid],
    ) -> Result<Vec<WorkingHours>, ApiError> {
        sqlx::query_as::<_, WorkingHours>(
            r#"
            SELECT id, business_id, day, open_time, close_time, is_closed
            FROM working_hours
            WHERE business_id = ANY($1)
            "#,
        )
        .bind(business_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    // ---- Autocomplete and admin aggregates ----

    /// Business name suggestions matching a prefix/substring
    pub async fn name_suggestions(
        pool: &PgPool,
        term: &str,
        city: Option<&str>,
        limit: i64,
    ) -> Result<Vec<String>, ApiError> {
        let escaped = term.replace('\'', "''").replace('%', "");
        let mut sql = format!(
            "SELECT DISTINCT name FROM businesses WHERE is_active = true AND name ILIKE '%{}%'",
            escaped
        );
        if let Some(city) = city {
            sql.push_str(&format!(" AND city ILIKE '{}'", city.replace('\'', "''")));
        }
        sql.push_str(&format!(" ORDER BY name LIMIT {}", limit));

        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Category suggestions matching a substring
    pub async fn category_suggestions(
        pool: &PgPool,
        term: &str,
        limit: i64,
    ) -> Result<Vec<String>, ApiError> {
        let escaped = term.replace('\'', "''").replace('%', "");
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            r#"
            SELECT DISTINCT category FROM businesses
            WHERE is_active = true AND category ILIKE '%{}%'
            ORDER BY category LIMIT {}
            "#,
            escaped, limit
        ))
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Keyword suggestions matching a substring
    pub async fn keyword_suggestions(
        pool: &PgPool,
        term: &str,
        limit: i64,
    ) -> Result<Vec<String>, ApiError> {
        let escaped = term.replace('\'', "''").replace('%', "");
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            r#"
            SELECT DISTINCT kw FROM businesses, unnest(keywords) AS kw
            WHERE is_active = true AND kw ILIKE '%{}%'
            ORDER BY kw LIMIT {}
            "#,
            escaped, limit
        ))
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Trending candidates for recommendations
    pub async fn trending(
        pool: &PgPool,
        city: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Business>, ApiError> {
        let mut sql = format!(
            "SELECT {} FROM businesses WHERE is_active = true",
            BUSINESS_COLUMNS
        );
        if let Some(city) = city {
            sql.push_str(&format!(" AND city ILIKE '{}'", city.replace('\'', "''")));
        }
        sql.push_str(&format!(
            " ORDER BY trend_score DESC, avg_rating DESC LIMIT {}",
            limit
        ));

        sqlx::query_as::<_, Business>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}
