// src/services/geo.rs
// DOCUMENTATION: Geographic distance helpers
// PURPOSE: Haversine distance and bounding-box prefilters for nearby search

use geo_types::Point;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers
/// DOCUMENTATION: Standard haversine formula; accurate to ~0.5% which is
/// plenty for a city-scale radius filter
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Convenience wrapper over raw lat/lng pairs
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    haversine_km(Point::new(lng1, lat1), Point::new(lng2, lat2))
}

/// Latitude/longitude bounding box around a center point
/// Used to prefilter candidates in SQL before exact distance checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Bounding box containing every point within radius_km of the center
/// DOCUMENTATION: One degree of latitude is ~111.32 km; longitude degrees
/// shrink with cos(latitude). Near the poles the longitude span degenerates,
/// so it is clamped to the full range.
pub fn bounding_box(lat: f64, lng: f64, radius_km: f64) -> BoundingBox {
    // Slightly under the true km-per-degree so the box always contains
    // the full haversine radius
    const KM_PER_DEGREE: f64 = 111.0;

    let lat_delta = radius_km / KM_PER_DEGREE;
    let lng_scale = lat.to_radians().cos().abs();
    let lng_delta = if lng_scale < 1e-6 {
        180.0
    } else {
        radius_km / (KM_PER_DEGREE * lng_scale)
    };

    BoundingBox {
        min_lat: (lat - lat_delta).max(-90.0),
        max_lat: (lat + lat_delta).min(90.0),
        min_lng: (lng - lng_delta).max(-180.0),
        max_lng: (lng + lng_delta).min(180.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        assert!(distance_km(41.0431, 29.0099, 41.0431, 29.0099) < 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Istanbul (Beşiktaş) to Ankara (Kızılay): roughly 350 km
        let d = distance_km(41.0431, 29.0099, 39.9208, 32.8541);
        assert!(d > 330.0 && d < 370.0, "got {}", d);
    }

    #[test]
    fn test_haversine_short_distance() {
        // Two points ~1.1 km apart in the same district
        let d = distance_km(41.0431, 29.0099, 41.0431, 29.0230);
        assert!(d > 0.9 && d < 1.3, "got {}", d);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center_lat = 41.0431;
        let center_lng = 29.0099;
        let bbox = bounding_box(center_lat, center_lng, 5.0);

        assert!(bbox.min_lat < center_lat && center_lat < bbox.max_lat);
        assert!(bbox.min_lng < center_lng && center_lng < bbox.max_lng);

        // Every box edge must be at least 5 km from the center
        assert!(distance_km(center_lat, center_lng, bbox.max_lat, center_lng) >= 5.0);
        assert!(distance_km(center_lat, center_lng, center_lat, bbox.max_lng) >= 5.0);
    }

    #[test]
    fn test_bounding_box_clamps_at_poles() {
        let bbox = bounding_box(89.9, 0.0, 50.0);
        assert!(bbox.max_lat <= 90.0);
        assert!(bbox.min_lng >= -180.0 && bbox.max_lng <= 180.0);
    }
}
