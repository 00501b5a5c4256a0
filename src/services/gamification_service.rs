// src/services/gamification_service.rs
// DOCUMENTATION: Points, levels and achievements
// PURPOSE: All gamification arithmetic plus the award orchestration

use crate::db::{GamificationRepository, UserRepository};
use crate::errors::ApiError;
use crate::models::*;
use sqlx::PgPool;

pub struct GamificationService;

impl GamificationService {
    /// Point multiplier for a user level
    pub fn level_multiplier(level: &str) -> f64 {
        match level {
            "CONTRIBUTOR" => 1.2,
            "REVIEWER" => 1.5,
            "EXPERT" => 1.8,
            "GURU" => 2.0,
            "LOCAL_HERO" => 2.5,
            _ => 1.0,
        }
    }

    /// Progress within the current level for an XP total
    pub fn level_progress(points: i32) -> LevelProgress {
        let mut current = LEVEL_THRESHOLDS[0];
        let mut next: Option<(&str, i32)> = None;

        for (i, threshold) in LEVEL_THRESHOLDS.iter().enumerate() {
            if points >= threshold.1 {
                current = *threshold;
                next = LEVEL_THRESHOLDS.get(i + 1).copied();
            }
        }

        match next {
            Some((_, next_points)) => {
                let span = (next_points - current.1) as f64;
                let into = (points - current.1) as f64;
                LevelProgress {
                    progress: (into / span * 100.0).clamp(0.0, 100.0),
                    next_level_points: Some(next_points),
                }
            }
            // Top level has no ceiling
            None => LevelProgress {
                progress: 100.0,
                next_level_points: None,
            },
        }
    }

    /// Whether the activity counts satisfy an achievement requirement
    pub fn meets_requirement(req: &AchievementRequirement, counts: &ActivityCounts) -> bool {
        let checks = [
            (req.reviews, counts.reviews),
            (req.photos, counts.photos),
            (req.businesses, counts.businesses),
            (req.following, counts.following),
            (req.helpful_votes, counts.helpful_votes),
            (req.streak_days, counts.streak_days),
            (req.experience_points, counts.experience_points),
        ];
        checks
            .iter()
            .all(|(needed, have)| needed.map_or(true, |n| *have >= n))
    }

    /// Completion percentage toward an achievement requirement (0-100)
    pub fn requirement_progress(req: &AchievementRequirement, counts: &ActivityCounts) -> f64 {
        let mut progress = 0i64;
        let mut total = 0i64;

        let parts = [
            (req.reviews, counts.reviews),
            (req.photos, counts.photos),
            (req.businesses, counts.businesses),
            (req.following, counts.following),
            (req.helpful_votes, counts.helpful_votes),
            (req.streak_days, counts.streak_days),
            (req.experience_points, counts.experience_points),
        ];
        for (needed, have) in parts {
            if let Some(n) = needed {
                progress += have.min(n) as i64;
                total += n as i64;
            }
        }

        if total == 0 {
            0.0
        } else {
            (progress as f64 / total as f64 * 100.0).round()
        }
    }

    /// Streak value for a new review at `now`, given the previous review time
    /// Same-day reviews keep the streak, next-day reviews extend it, gaps reset it
    pub fn next_streak(
        streak_days: i32,
        last_review_at: Option<chrono::DateTime<chrono::Utc>>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> i32 {
        match last_review_at {
            None => 1,
            Some(last) => {
                let days_apart = now.date_naive().signed_duration_since(last.date_naive()).num_days();
                match days_apart {
                    0 => streak_days.max(1),
                    1 => streak_days + 1,
                    _ => 1,
                }
            }
        }
    }

    /// Gather the counters used by requirement checks
    /// Photo and follow counts are not tracked yet and stay zero
    pub async fn activity_counts(pool: &PgPool, user: &User) -> Result<ActivityCounts, ApiError> {
        let businesses =
            GamificationRepository::distinct_businesses_reviewed(pool, user.id).await? as i32;

        Ok(ActivityCounts {
            reviews: user.total_reviews,
            photos: 0,
            businesses,
            following: 0,
            helpful_votes: user.helpful_votes,
            streak_days: user.streak_days,
            experience_points: user.experience_points,
        })
    }

    /// Award points for an action and surface any newly earned achievements
    /// DOCUMENTATION: Flow mirrors the product's original engine:
    /// base points x level multiplier -> XP update -> level recompute ->
    /// achievement check. Achievement bonus points feed back into XP.
    pub async fn award_action(
        pool: &PgPool,
        user: &User,
        req: &GamificationActionRequest,
    ) -> Result<AwardResult, ApiError> {
        let base = match req.points {
            Some(explicit) => explicit,
            None => base_points(&req.action).ok_or_else(|| {
                ApiError::InvalidInput(format!("unknown action: {}", req.action))
            })?,
        };

        let multiplier = Self::level_multiplier(&user.level);
        let earned = ((base as f64) * multiplier).round() as i32;

        let updated = UserRepository::add_experience(pool, user.id, earned).await?;

        // Check achievements against the post-action counters
        let counts = Self::activity_counts(pool, &updated).await?;
        let new_achievements = Self::check_achievements(pool, &updated, &counts).await?;

        // Achievement bonuses also count toward XP
        let bonus: i32 = new_achievements.iter().map(|a| a.points).sum();
        let updated = if bonus > 0 {
            UserRepository::add_experience(pool, updated.id, bonus).await?
        } else {
            updated
        };

        // Persist a level change if the new total crossed a threshold
        let new_level = level_for_points(updated.experience_points);
        if new_level != updated.level {
            log::info!(
                "User {} leveled up: {} -> {}",
                updated.id,
                updated.level,
                new_level
            );
            UserRepository::set_level(pool, updated.id, new_level, new_level == "LOCAL_HERO")
                .await?;
        }

        Ok(AwardResult {
            points_earned: earned,
            total_points: updated.experience_points,
            level: new_level.to_string(),
            level_progress: Self::level_progress(updated.experience_points),
            new_achievements,
        })
    }

    /// Award every achievement whose requirement is now met
    pub async fn check_achievements(
        pool: &PgPool,
        user: &User,
        counts: &ActivityCounts,
    ) -> Result<Vec<AchievementDef>, ApiError> {
        let mut newly_earned = Vec::new();

        for def in ACHIEVEMENTS.iter() {
            if !Self::meets_requirement(&def.requirement, counts) {
                continue;
            }
            // award() is idempotent; true means this is the first time
            if GamificationRepository::award(pool, user.id, def.id).await? {
                log::info!("User {} earned achievement {}", user.id, def.id);
                newly_earned.push(*def);
            }
        }

        Ok(newly_earned)
    }

    /// Earned achievements joined with their catalog definitions
    pub async fn earned_list(
        pool: &PgPool,
        user: &User,
    ) -> Result<Vec<EarnedAchievement>, ApiError> {
        let earned = GamificationRepository::earned_for_user(pool, user.id).await?;
        Ok(earned
            .into_iter()
            .filter_map(|row| {
                achievement_by_id(&row.achievement_id).map(|def| EarnedAchievement {
                    achievement: *def,
                    earned_at: row.earned_at,
                })
            })
            .collect())
    }

    /// Not-yet-earned achievements with progress percentages
    pub async fn available_list(
        pool: &PgPool,
        user: &User,
    ) -> Result<Vec<AchievementProgress>, ApiError> {
        let earned = GamificationRepository::earned_for_user(pool, user.id).await?;
        let counts = Self::activity_counts(pool, user).await?;

        Ok(ACHIEVEMENTS
            .iter()
            .filter(|def| !earned.iter().any(|e| e.achievement_id == def.id))
            .map(|def| AchievementProgress {
                achievement: *def,
                progress: Self::requirement_progress(&def.requirement, &counts),
                is_unlocked: Self::meets_requirement(&def.requirement, &counts),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_level_multiplier() {
        assert_eq!(GamificationService::level_multiplier("BEGINNER"), 1.0);
        assert_eq!(GamificationService::level_multiplier("GURU"), 2.0);
        assert_eq!(GamificationService::level_multiplier("LOCAL_HERO"), 2.5);
        // Unknown levels fall back to the base multiplier
        assert_eq!(GamificationService::level_multiplier("WIZARD"), 1.0);
    }

    #[test]
    fn test_level_progress_midway() {
        // CONTRIBUTOR spans 100..500; 300 XP is halfway
        let progress = GamificationService::level_progress(300);
        assert_eq!(progress.next_level_points, Some(500));
        assert!((progress.progress - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_progress_top_level() {
        let progress = GamificationService::level_progress(25000);
        assert_eq!(progress.next_level_points, None);
        assert_eq!(progress.progress, 100.0);
    }

    #[test]
    fn test_level_progress_at_threshold() {
        let progress = GamificationService::level_progress(100);
        assert_eq!(progress.next_level_points, Some(500));
        assert_eq!(progress.progress, 0.0);
    }

    #[test]
    fn test_meets_requirement() {
        let first_review = &achievement_by_id("FIRST_REVIEW").unwrap().requirement;
        let counts = ActivityCounts {
            reviews: 1,
            ..Default::default()
        };
        assert!(GamificationService::meets_requirement(first_review, &counts));

        let empty = ActivityCounts::default();
        assert!(!GamificationService::meets_requirement(first_review, &empty));
    }

    #[test]
    fn test_meets_compound_requirement() {
        let local_hero = &achievement_by_id("LOCAL_HERO").unwrap().requirement;

        let partial = ActivityCounts {
            reviews: 200,
            helpful_votes: 499,
            experience_points: 5000,
            ..Default::default()
        };
        assert!(!GamificationService::meets_requirement(local_hero, &partial));

        let full = ActivityCounts {
            reviews: 200,
            helpful_votes: 500,
            experience_points: 5000,
            ..Default::default()
        };
        assert!(GamificationService::meets_requirement(local_hero, &full));
    }

    #[test]
    fn test_requirement_progress() {
        let veteran = &achievement_by_id("REVIEW_VETERAN").unwrap().requirement;
        let counts = ActivityCounts {
            reviews: 5,
            ..Default::default()
        };
        assert_eq!(
            GamificationService::requirement_progress(veteran, &counts),
            50.0
        );

        let over = ActivityCounts {
            reviews: 25,
            ..Default::default()
        };
        assert_eq!(GamificationService::requirement_progress(veteran, &over), 100.0);
    }

    #[test]
    fn test_next_streak() {
        let day1 = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let day2 = chrono::Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let day5 = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();

        // First review ever
        assert_eq!(GamificationService::next_streak(0, None, day1), 1);
        // Second review the same day keeps the streak
        assert_eq!(GamificationService::next_streak(3, Some(day1), day1), 3);
        // Next-day review extends it
        assert_eq!(GamificationService::next_streak(3, Some(day1), day2), 4);
        // A gap resets it
        assert_eq!(GamificationService::next_streak(3, Some(day2), day5), 1);
    }
}
