// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// User levels in ascending order, with their XP entry thresholds
pub const LEVEL_THRESHOLDS: [(&str, i32); 6] = [
    ("BEGINNER", 0),
    ("CONTRIBUTOR", 100),
    ("REVIEWER", 500),
    ("EXPERT", 2000),
    ("GURU", 5000),
    ("LOCAL_HERO", 10000),
];

/// Platform user, synced from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,

    /// Subject identifier assigned by the identity provider
    pub external_id: String,

    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub bio: Option<String>,

    /// Level code: BEGINNER..LOCAL_HERO
    pub level: String,

    pub experience_points: i32,
    pub total_reviews: i32,
    pub helpful_votes: i32,
    pub streak_days: i32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub is_local_hero: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile update request (PUT /users/profile)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(max = 50))]
    pub city: Option<String>,

    #[validate(length(max = 50))]
    pub district: Option<String>,
}

/// Public user DTO
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub bio: Option<String>,
    pub level: String,
    pub experience_points: i32,
    pub total_reviews: i32,
    pub helpful_votes: i32,
    pub streak_days: i32,
    pub is_local_hero: bool,
    pub created_at: DateTime<Utc>,
}

/// Identity fields carried by webhook payloads and lazy provisioning
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            bio: self.bio.clone(),
            level: self.level.clone(),
            experience_points: self.experience_points,
            total_reviews: self.total_reviews,
            helpful_votes: self.helpful_votes,
            streak_days: self.streak_days,
            is_local_hero: self.is_local_hero,
            created_at: self.created_at,
        }
    }
}

/// Level code for an XP total
pub fn level_for_points(points: i32) -> &'static str {
    let mut level = LEVEL_THRESHOLDS[0].0;
    for (code, threshold) in LEVEL_THRESHOLDS {
        if points >= threshold {
            level = code;
        }
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_points() {
        assert_eq!(level_for_points(0), "BEGINNER");
        assert_eq!(level_for_points(99), "BEGINNER");
        assert_eq!(level_for_points(100), "CONTRIBUTOR");
        assert_eq!(level_for_points(1999), "REVIEWER");
        assert_eq!(level_for_points(5000), "GURU");
        assert_eq!(level_for_points(250000), "LOCAL_HERO");
    }
}
