// src/models/hours.rs
// DOCUMENTATION: Weekly opening hours for businesses
// PURPOSE: Database row, API DTO and open-now evaluation

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Day codes stored in the working_hours table, Monday first
pub const DAYS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// Working hours row, one per business per day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkingHours {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day: String,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_closed: bool,
}

/// Working hours entry as accepted and returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursEntry {
    /// Day code: MONDAY..SUNDAY
    pub day: String,

    /// Opening time "HH:MM" (24h), absent when closed
    #[serde(default)]
    pub open_time: Option<String>,

    /// Closing time "HH:MM" (24h), absent when closed
    #[serde(default)]
    pub close_time: Option<String>,

    /// Closed all day
    #[serde(default)]
    pub is_closed: bool,
}

impl WorkingHours {
    pub fn to_entry(&self) -> WorkingHoursEntry {
        WorkingHoursEntry {
            day: self.day.clone(),
            open_time: self.open_time.clone(),
            close_time: self.close_time.clone(),
            is_closed: self.is_closed,
        }
    }
}

impl WorkingHoursEntry {
    /// Basic shape check for API input: known day, HH:MM times when open
    pub fn validate(&self) -> Result<(), String> {
        if !DAYS.contains(&self.day.as_str()) {
            return Err(format!("unknown day: {}", self.day));
        }
        if !self.is_closed {
            for time in [&self.open_time, &self.close_time] {
                match time {
                    Some(t) if parse_hhmm(t).is_some() => {}
                    _ => return Err(format!("invalid time for {}", self.day)),
                }
            }
        }
        Ok(())
    }
}

/// Day code for a chrono weekday
pub fn day_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Parse "HH:MM" into minutes since midnight
/// "24:00" is accepted as end-of-day closing time
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 24 || minutes > 59 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Whether a schedule is open at the given instant
/// DOCUMENTATION: Looks up the entry for the instant's weekday and compares
/// minutes since midnight against the open/close window. Overnight windows
/// (close <= open, e.g. 18:00-02:00) spill into the next morning.
pub fn is_open_at(entries: &[WorkingHoursEntry], instant: DateTime<Utc>) -> bool {
    let today = day_code(instant.weekday());
    let minute_of_day = instant.format("%H:%M").to_string();
    let now = match parse_hhmm(&minute_of_day) {
        Some(m) => m,
        None => return false,
    };

    for entry in entries {
        if entry.day != today || entry.is_closed {
            continue;
        }
        let (open, close) = match (
            entry.open_time.as_deref().and_then(parse_hhmm),
            entry.close_time.as_deref().and_then(parse_hhmm),
        ) {
            (Some(o), Some(c)) => (o, c),
            _ => continue,
        };
        if close > open {
            if now >= open && now <= close {
                return true;
            }
        } else if now >= open || now <= close {
            // Overnight window
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(day: &str, open: &str, close: &str) -> WorkingHoursEntry {
        WorkingHoursEntry {
            day: day.to_string(),
            open_time: Some(open.to_string()),
            close_time: Some(close.to_string()),
            is_closed: false,
        }
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:30"), Some(570));
        assert_eq!(parse_hhmm("24:00"), Some(1440));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("12:61"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn test_open_within_window() {
        // 2024-01-03 is a Wednesday
        let noon = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let hours = vec![entry("WEDNESDAY", "09:00", "19:00")];
        assert!(is_open_at(&hours, noon));

        let early = Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap();
        assert!(!is_open_at(&hours, early));
    }

    #[test]
    fn test_closed_day() {
        let noon = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let hours = vec![WorkingHoursEntry {
            day: "WEDNESDAY".to_string(),
            open_time: None,
            close_time: None,
            is_closed: true,
        }];
        assert!(!is_open_at(&hours, noon));
    }

    #[test]
    fn test_overnight_window() {
        // Bar open Wednesday 18:00 through 02:00
        let hours = vec![entry("WEDNESDAY", "18:00", "02:00")];
        let late = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
        assert!(is_open_at(&hours, late));

        let afternoon = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
        assert!(!is_open_at(&hours, afternoon));
    }

    #[test]
    fn test_entry_validation() {
        assert!(entry("MONDAY", "09:00", "18:00").validate().is_ok());
        assert!(entry("FUNDAY", "09:00", "18:00").validate().is_err());
        assert!(entry("MONDAY", "9am", "18:00").validate().is_err());

        let closed = WorkingHoursEntry {
            day: "SUNDAY".to_string(),
            open_time: None,
            close_time: None,
            is_closed: true,
        };
        assert!(closed.validate().is_ok());
    }
}
