// src/models/gamification.rs
// DOCUMENTATION: Gamification data structures
// PURPOSE: Achievement catalog, action requests and progress DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Actions that earn experience points
pub const ACTIONS: [(&str, i32); 7] = [
    ("review", 10),
    ("photo", 5),
    ("checkin", 3),
    ("helpful_vote", 2),
    ("follow", 1),
    ("share", 2),
    ("first_visit", 5),
];

/// Requirement thresholds for one achievement
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AchievementRequirement {
    pub reviews: Option<i32>,
    pub photos: Option<i32>,
    pub businesses: Option<i32>,
    pub following: Option<i32>,
    pub helpful_votes: Option<i32>,
    pub streak_days: Option<i32>,
    pub experience_points: Option<i32>,
}

/// Static achievement definition
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i32,
    pub category: &'static str,
    #[serde(skip)]
    pub requirement: AchievementRequirement,
}

/// The full achievement catalog
/// Thresholds mirror the product's original badge ladder
pub const ACHIEVEMENTS: [AchievementDef; 10] = [
    AchievementDef {
        id: "FIRST_REVIEW",
        name: "First Review",
        description: "You wrote your first review",
        icon: "🎉",
        points: 50,
        category: "REVIEWER",
        requirement: AchievementRequirement {
            reviews: Some(1),
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "REVIEW_VETERAN",
        name: "Review Veteran",
        description: "You wrote 10 reviews",
        icon: "📝",
        points: 100,
        category: "REVIEWER",
        requirement: AchievementRequirement {
            reviews: Some(10),
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "REVIEW_MASTER",
        name: "Review Master",
        description: "You wrote 50 reviews",
        icon: "🏆",
        points: 250,
        category: "REVIEWER",
        requirement: AchievementRequirement {
            reviews: Some(50),
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "REVIEW_LEGEND",
        name: "Review Legend",
        description: "You wrote 100 reviews",
        icon: "👑",
        points: 500,
        category: "REVIEWER",
        requirement: AchievementRequirement {
            reviews: Some(100),
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "PHOTO_ENTHUSIAST",
        name: "Photo Enthusiast",
        description: "You shared 10 photos",
        icon: "📸",
        points: 75,
        category: "EXPLORER",
        requirement: AchievementRequirement {
            reviews: None,
            photos: Some(10),
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "EXPLORER",
        name: "Explorer",
        description: "You discovered 25 different businesses",
        icon: "🗺️",
        points: 150,
        category: "EXPLORER",
        requirement: AchievementRequirement {
            reviews: None,
            photos: None,
            businesses: Some(25),
            following: None,
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "SOCIAL_BUTTERFLY",
        name: "Social Butterfly",
        description: "You followed 50 people",
        icon: "🦋",
        points: 100,
        category: "SOCIAL",
        requirement: AchievementRequirement {
            reviews: None,
            photos: None,
            businesses: None,
            following: Some(50),
            helpful_votes: None,
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "HELPFUL_HERO",
        name: "Helpful Hero",
        description: "Your reviews collected 100 helpful votes",
        icon: "🦸",
        points: 200,
        category: "SOCIAL",
        requirement: AchievementRequirement {
            reviews: None,
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: Some(100),
            streak_days: None,
            experience_points: None,
        },
    },
    AchievementDef {
        id: "STREAK_WARRIOR",
        name: "Streak Warrior",
        description: "You stayed active 30 days in a row",
        icon: "🔥",
        points: 300,
        category: "EXPERT",
        requirement: AchievementRequirement {
            reviews: None,
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: None,
            streak_days: Some(30),
            experience_points: None,
        },
    },
    AchievementDef {
        id: "LOCAL_HERO",
        name: "Local Hero",
        description: "You became the expert of your city",
        icon: "🏅",
        points: 1000,
        category: "PIONEER",
        requirement: AchievementRequirement {
            reviews: Some(200),
            photos: None,
            businesses: None,
            following: None,
            helpful_votes: Some(500),
            streak_days: None,
            experience_points: Some(5000),
        },
    },
];

/// Look up an achievement definition by its id
pub fn achievement_by_id(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Base points for an action code, if known
pub fn base_points(action: &str) -> Option<i32> {
    ACTIONS
        .iter()
        .find(|(code, _)| *code == action)
        .map(|(_, points)| *points)
}

/// Earned achievement row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: String,
    pub earned_at: DateTime<Utc>,
}

/// Request body for POST /gamification
#[derive(Debug, Deserialize, Validate)]
pub struct GamificationActionRequest {
    /// Action code: review | photo | checkin | helpful_vote | follow | share | first_visit
    pub action: String,

    #[serde(default)]
    pub business_id: Option<Uuid>,

    #[serde(default)]
    pub review_id: Option<Uuid>,

    /// Explicit point override (1-100)
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub points: Option<i32>,
}

/// Progress within the current level
#[derive(Debug, Clone, Serialize)]
pub struct LevelProgress {
    /// Percentage through the current level (0-100)
    pub progress: f64,

    /// XP threshold of the next level, absent at the top level
    pub next_level_points: Option<i32>,
}

/// Result of awarding an action
#[derive(Debug, Serialize)]
pub struct AwardResult {
    pub points_earned: i32,
    pub total_points: i32,
    pub level: String,
    pub level_progress: LevelProgress,
    pub new_achievements: Vec<AchievementDef>,
}

/// Achievement with per-user progress, for the available list
#[derive(Debug, Serialize)]
pub struct AchievementProgress {
    #[serde(flatten)]
    pub achievement: AchievementDef,

    /// Completion percentage against the requirement (0-100)
    pub progress: f64,

    /// Requirement already met but not yet awarded
    pub is_unlocked: bool,
}

/// Achievement with the time it was earned
#[derive(Debug, Serialize)]
pub struct EarnedAchievement {
    #[serde(flatten)]
    pub achievement: AchievementDef,
    pub earned_at: DateTime<Utc>,
}

/// Activity counters used when evaluating requirements
/// Counts not tracked by the platform default to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityCounts {
    pub reviews: i32,
    pub photos: i32,
    pub businesses: i32,
    pub following: i32,
    pub helpful_votes: i32,
    pub streak_days: i32,
    pub experience_points: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        for (i, a) in ACHIEVEMENTS.iter().enumerate() {
            for b in ACHIEVEMENTS.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_base_points() {
        assert_eq!(base_points("review"), Some(10));
        assert_eq!(base_points("helpful_vote"), Some(2));
        assert_eq!(base_points("downvote"), None);
    }

    #[test]
    fn test_achievement_lookup() {
        assert!(achievement_by_id("FIRST_REVIEW").is_some());
        assert!(achievement_by_id("nope").is_none());
    }
}
