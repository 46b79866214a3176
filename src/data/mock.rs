//! In-process game backend with generated data
//!
//! Produces plausible game, leaderboard, and achievement payloads without a
//! network. Values are derived from a hash of the request ids, so the same
//! request yields the same data within a process. The backend can be switched
//! into a failing mode to exercise stale-cache fallback.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use super::{
    Achievement, BackendError, Game, GameBackend, GameCategory, GameSession, Leaderboard,
    LeaderboardEntry, LeaderboardPeriod, ProgressUpdate, Rarity, UserGameProgress,
};

/// Number of rows in a generated leaderboard
const LEADERBOARD_SIZE: u32 = 10;

/// Number of game servers sessions are spread across
const GAME_SERVER_COUNT: u64 = 5;

/// Backend that fabricates responses locally
#[derive(Debug, Default)]
pub struct MockBackend {
    latency: Duration,
    failing: AtomicBool,
    calls: AtomicUsize,
    sessions: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`, like a real round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every subsequent call fail with [`BackendError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }

    /// Number of calls made so far, including failed ones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Counts the call, waits out the latency, and fails if switched off
    async fn begin(&self, operation: &str) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.is_failing() {
            return Err(BackendError::Unavailable(format!("mock backend: {operation}")));
        }
        Ok(())
    }
}

/// Stable-per-process pseudo-random value for a set of ids
fn seed(parts: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

fn mock_game(game_id: &str) -> Game {
    Game {
        id: game_id.to_string(),
        title: "Superhero Showdown".to_string(),
        description: "Team up with players worldwide for the most thrilling superhero battles. \
            Pick your hero, master unique skills, and prove yourself in the multiplayer arena."
            .to_string(),
        thumbnail: format!("/images/{game_id}-thumbnail.jpg"),
        category: GameCategory::Action,
        rating: 4.9,
        downloads: 5_420_000,
        size: "4.2GB".to_string(),
        version: "2.5.1".to_string(),
        developer: "Hero Studios".to_string(),
        tags: ["action", "multiplayer", "competitive", "heroes"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        screenshots: (1..=4)
            .map(|n| format!("/images/{game_id}-screen{n}.jpg"))
            .collect(),
        is_new: false,
        is_featured: true,
        price: 0.0,
        currency: "CNY".to_string(),
        release_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap_or(NaiveDate::MIN),
    }
}

fn mock_progress(game_id: &str, user_id: &str) -> UserGameProgress {
    let s = seed(&[game_id, user_id]);
    UserGameProgress {
        game_id: game_id.to_string(),
        progress: (s % 100) as u8,
        level: ((s >> 8) % 50) as u32 + 1,
        score: (s >> 16) % 100_000,
        achievements: ["first_blood", "combo_master", "survivor"]
            .iter()
            .map(|a| a.to_string())
            .collect(),
        play_time: (s >> 24) % 10_000 + 1_000,
        last_played: Utc::now() - chrono::Duration::seconds(((s >> 32) % (7 * 24 * 3600)) as i64),
    }
}

fn mock_leaderboard(game_id: &str, period: LeaderboardPeriod) -> Leaderboard {
    let mut entries: Vec<LeaderboardEntry> = (0..LEADERBOARD_SIZE)
        .map(|i| {
            let n = i + 1;
            let s = seed(&[game_id, period.as_str(), &n.to_string()]);
            LeaderboardEntry {
                rank: 0,
                user_id: format!("user-{n:03}"),
                username: format!("Player {n}"),
                avatar: format!("/avatars/avatar-{}.png", i % 12 + 1),
                score: s % 100_000 + 100_000 - u64::from(i) * 5_000,
                level: ((s >> 20) % 30) as u32 + 20 - i,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    for (rank, entry) in (1..).zip(entries.iter_mut()) {
        entry.rank = rank;
    }

    Leaderboard {
        game_id: game_id.to_string(),
        entries,
        period,
        updated_at: Utc::now(),
    }
}

fn mock_achievements() -> Vec<Achievement> {
    let achievement = |id: &str, title: &str, description: &str, icon: &str, rarity, points| {
        Achievement {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: format!("/icons/achievement-{icon}.png"),
            rarity,
            points,
        }
    };

    vec![
        achievement("first_blood", "First Blood", "Get your first kill", "first-kill", Rarity::Common, 10),
        achievement("combo_master", "Combo Master", "Land a 50-hit combo", "combo", Rarity::Rare, 50),
        achievement("survivor", "Survivor", "Stay alive for 10 minutes straight", "survivor", Rarity::Epic, 100),
        achievement("legendary_hero", "Legendary Hero", "Reach the maximum level", "legendary", Rarity::Legendary, 500),
    ]
}

impl GameBackend for MockBackend {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, BackendError> {
        self.begin("fetch_game").await?;
        Ok(mock_game(game_id))
    }

    async fn fetch_progress(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<UserGameProgress, BackendError> {
        self.begin("fetch_progress").await?;
        Ok(mock_progress(game_id, user_id))
    }

    async fn update_progress(
        &self,
        _game_id: &str,
        _user_id: &str,
        _update: &ProgressUpdate,
    ) -> Result<(), BackendError> {
        self.begin("update_progress").await
    }

    async fn fetch_leaderboard(
        &self,
        game_id: &str,
        period: LeaderboardPeriod,
    ) -> Result<Leaderboard, BackendError> {
        self.begin("fetch_leaderboard").await?;
        Ok(mock_leaderboard(game_id, period))
    }

    async fn fetch_achievements(&self, _game_id: &str) -> Result<Vec<Achievement>, BackendError> {
        self.begin("fetch_achievements").await?;
        Ok(mock_achievements())
    }

    async fn start_session(&self, game_id: &str, user_id: &str) -> Result<GameSession, BackendError> {
        self.begin("start_session").await?;
        let n = self.sessions.fetch_add(1, Ordering::SeqCst);
        let s = seed(&[game_id, user_id, &n.to_string()]);
        Ok(GameSession {
            session_id: format!("session-{}-{:09x}", Utc::now().timestamp_millis(), s & 0xf_ffff_ffff),
            server_url: format!(
                "wss://game-server-{}.gaming-platform.com",
                s % GAME_SERVER_COUNT + 1
            ),
        })
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        self.begin("health_check").await?;
        Ok(true)
    }
}
