//! Core data models for the game service
//!
//! This module contains the payload types returned by the game backend and the
//! backends that produce them.

pub mod backend;
pub mod http;
pub mod mock;

pub use backend::{BackendError, GameBackend};
pub use http::HttpBackend;
pub use mock::MockBackend;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game metadata as shown on a details page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub category: GameCategory,
    /// Average user rating out of 5
    pub rating: f32,
    pub downloads: u64,
    /// Human-readable install size, e.g. "4.2GB"
    pub size: String,
    pub version: String,
    pub developer: String,
    pub tags: Vec<String>,
    pub screenshots: Vec<String>,
    pub is_new: bool,
    pub is_featured: bool,
    pub price: f64,
    pub currency: String,
    pub release_date: NaiveDate,
}

/// Store category of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameCategory {
    Action,
    Puzzle,
    Racing,
    Shooter,
    Strategy,
    Casual,
    #[serde(other)]
    Other,
}

/// A user's progress through a single game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGameProgress {
    pub game_id: String,
    /// Completion percentage (0-100)
    pub progress: u8,
    pub level: u32,
    pub score: u64,
    /// Ids of unlocked achievements
    pub achievements: Vec<String>,
    /// Total play time in minutes
    pub play_time: u64,
    pub last_played: DateTime<Utc>,
}

/// Partial progress update; only the fields that are set are changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_time: Option<u64>,
}

impl ProgressUpdate {
    /// Overlays the set fields onto `progress`
    pub fn apply_to(&self, progress: &mut UserGameProgress) {
        if let Some(value) = self.progress {
            progress.progress = value;
        }
        if let Some(value) = self.level {
            progress.level = value;
        }
        if let Some(value) = self.score {
            progress.score = value;
        }
        if let Some(ref value) = self.achievements {
            progress.achievements = value.clone();
        }
        if let Some(value) = self.play_time {
            progress.play_time = value;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ranking window for a leaderboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardPeriod {
    Daily,
    #[default]
    Weekly,
    Monthly,
    AllTime,
}

impl LeaderboardPeriod {
    /// Wire name, also used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardPeriod::Daily => "daily",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::Monthly => "monthly",
            LeaderboardPeriod::AllTime => "allTime",
        }
    }
}

impl fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized leaderboard period name
#[derive(Debug, Error)]
#[error("Invalid period: '{0}'. Valid periods: daily, weekly, monthly, allTime")]
pub struct ParsePeriodError(String);

impl FromStr for LeaderboardPeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "daily" => Ok(LeaderboardPeriod::Daily),
            "weekly" => Ok(LeaderboardPeriod::Weekly),
            "monthly" => Ok(LeaderboardPeriod::Monthly),
            "alltime" => Ok(LeaderboardPeriod::AllTime),
            _ => Err(ParsePeriodError(s.to_string())),
        }
    }
}

/// Ranked scores for one game over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub game_id: String,
    /// Entries ordered by rank, best first
    pub entries: Vec<LeaderboardEntry>,
    pub period: LeaderboardPeriod,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub score: u64,
    pub level: u32,
}

/// An unlockable achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub rarity: Rarity,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// A started game session and the server the client should connect to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub session_id: String,
    pub server_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_progress() -> UserGameProgress {
        UserGameProgress {
            game_id: "g1".to_string(),
            progress: 40,
            level: 12,
            score: 5000,
            achievements: vec!["first_blood".to_string()],
            play_time: 300,
            last_played: Utc::now(),
        }
    }

    #[test]
    fn test_period_parse_accepts_aliases() {
        assert_eq!("daily".parse::<LeaderboardPeriod>().unwrap(), LeaderboardPeriod::Daily);
        assert_eq!("Weekly".parse::<LeaderboardPeriod>().unwrap(), LeaderboardPeriod::Weekly);
        assert_eq!("allTime".parse::<LeaderboardPeriod>().unwrap(), LeaderboardPeriod::AllTime);
        assert_eq!("all-time".parse::<LeaderboardPeriod>().unwrap(), LeaderboardPeriod::AllTime);
        assert_eq!("all_time".parse::<LeaderboardPeriod>().unwrap(), LeaderboardPeriod::AllTime);
    }

    #[test]
    fn test_period_parse_invalid() {
        let err = "yearly".parse::<LeaderboardPeriod>().unwrap_err();
        assert!(err.to_string().contains("yearly"));
    }

    #[test]
    fn test_period_default_is_weekly() {
        assert_eq!(LeaderboardPeriod::default(), LeaderboardPeriod::Weekly);
    }

    #[test]
    fn test_period_serializes_as_wire_name() {
        let json = serde_json::to_string(&LeaderboardPeriod::AllTime).unwrap();
        assert_eq!(json, "\"allTime\"");
        assert_eq!(LeaderboardPeriod::AllTime.to_string(), "allTime");
    }

    #[test]
    fn test_game_deserializes_camel_case() {
        let json = r#"{
            "id": "g1",
            "title": "Hero Clash",
            "description": "Arena fights",
            "thumbnail": "/images/g1-thumbnail.jpg",
            "category": "action",
            "rating": 4.9,
            "downloads": 5420000,
            "size": "4.2GB",
            "version": "2.5.1",
            "developer": "Hero Studios",
            "tags": ["action"],
            "screenshots": [],
            "isNew": false,
            "isFeatured": true,
            "price": 0,
            "currency": "CNY",
            "releaseDate": "2023-06-15"
        }"#;

        let game: Game = serde_json::from_str(json).expect("Failed to deserialize Game");

        assert_eq!(game.id, "g1");
        assert_eq!(game.category, GameCategory::Action);
        assert!(game.is_featured);
        assert_eq!(game.release_date, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let category: GameCategory = serde_json::from_str("\"rhythm\"").unwrap();
        assert_eq!(category, GameCategory::Other);
    }

    #[test]
    fn test_progress_update_applies_only_set_fields() {
        let mut progress = sample_progress();
        let update = ProgressUpdate {
            level: Some(13),
            score: Some(6200),
            ..Default::default()
        };

        update.apply_to(&mut progress);

        assert_eq!(progress.level, 13);
        assert_eq!(progress.score, 6200);
        assert_eq!(progress.progress, 40);
        assert_eq!(progress.achievements, vec!["first_blood".to_string()]);
    }

    #[test]
    fn test_progress_update_skips_unset_fields_when_serialized() {
        let update = ProgressUpdate {
            progress: Some(55),
            ..Default::default()
        };

        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"progress":55}"#);
        assert!(!update.is_empty());
        assert!(ProgressUpdate::default().is_empty());
    }
}
