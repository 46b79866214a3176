//! Cached game service API
//!
//! `GameApi` wraps a [`GameBackend`] with a [`TtlCache`]. Read-mostly lookups
//! (game details, leaderboards, achievements) go through the cache and keep
//! answering from stale entries while the backend is failing. Writes and
//! per-session calls go straight to the backend.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::data::{
    Achievement, BackendError, Game, GameBackend, GameSession, Leaderboard, LeaderboardPeriod,
    ProgressUpdate, UserGameProgress,
};

/// Default freshness window for cached responses (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const SERVICE_NAME: &str = "Game Service";
const SERVICE_VERSION: &str = "1.0.0";
const SERVICE_FEATURES: &[&str] = &[
    "Game Details & Metadata",
    "User Progress Tracking",
    "Leaderboards & Rankings",
    "Achievement System",
    "Game Session Management",
    "Batch Operations",
    "Smart Caching",
];

/// Errors returned by [`GameApi`]
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend call failed and no cached value could stand in
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A cache slot held a different payload type than its key implies
    #[error("Cached payload under '{0}' has an unexpected type")]
    PayloadMismatch(String),
}

/// Any value the API keeps in its cache
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Game(Game),
    Leaderboard(Leaderboard),
    Achievements(Vec<Achievement>),
}

/// Conversion between a concrete response type and its [`Payload`] variant
trait Cacheable: Sized {
    fn into_payload(self) -> Payload;
    fn from_payload(payload: Payload) -> Option<Self>;
}

impl Cacheable for Game {
    fn into_payload(self) -> Payload {
        Payload::Game(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Game(game) => Some(game),
            _ => None,
        }
    }
}

impl Cacheable for Leaderboard {
    fn into_payload(self) -> Payload {
        Payload::Leaderboard(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Leaderboard(board) => Some(board),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Achievement> {
    fn into_payload(self) -> Payload {
        Payload::Achievements(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Achievements(achievements) => Some(achievements),
            _ => None,
        }
    }
}

/// Cache key for a game's details
pub fn game_details_key(game_id: &str) -> String {
    format!("game-details-{game_id}")
}

/// Cache key for a game's leaderboard over one period
pub fn leaderboard_key(game_id: &str, period: LeaderboardPeriod) -> String {
    format!("leaderboard-{game_id}-{period}")
}

/// Cache key for a game's achievement list
pub fn achievements_key(game_id: &str) -> String {
    format!("achievements-{game_id}")
}

/// Cache key for a user's progress in a game
pub fn user_progress_key(game_id: &str, user_id: &str) -> String {
    format!("user-progress-{game_id}-{user_id}")
}

/// Static description of the service plus live cache stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub service_name: String,
    pub version: String,
    pub features: Vec<String>,
    pub cache: CacheStats,
}

/// Game service client with a stale-tolerant response cache
///
/// Construct one per backend and pass it to whatever needs game data; the
/// cache lives and dies with this value.
pub struct GameApi<B> {
    backend: B,
    cache: TtlCache<Payload>,
}

impl<B: GameBackend> GameApi<B> {
    /// Creates an API over `backend` whose cached responses stay fresh for `ttl`
    pub fn new(backend: B, ttl: Duration) -> Self {
        Self {
            backend,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cache(&self) -> &TtlCache<Payload> {
        &self.cache
    }

    /// Reads `key` through the cache, running `fetch` on a miss or expiry
    async fn cached<T, Fut>(&self, key: String, fetch: Fut) -> Result<T, ApiError>
    where
        T: Cacheable,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let payload = self
            .cache
            .get_or_fetch(&key, || async move { fetch.await.map(T::into_payload) })
            .await?;
        T::from_payload(payload).ok_or(ApiError::PayloadMismatch(key))
    }

    /// Returns details for one game
    pub async fn get_game_details(&self, game_id: &str) -> Result<Game, ApiError> {
        self.cached(game_details_key(game_id), async {
            info!(game_id, "fetching game details");
            self.backend.fetch_game(game_id).await
        })
        .await
    }

    /// Returns a user's progress in a game; always asks the backend
    pub async fn get_user_progress(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<UserGameProgress, ApiError> {
        info!(game_id, user_id, "fetching user progress");
        self.backend
            .fetch_progress(game_id, user_id)
            .await
            .inspect_err(|e| error!(game_id, user_id, error = %e, "failed to fetch user progress"))
            .map_err(ApiError::from)
    }

    /// Sends a partial progress update and returns the merged result
    ///
    /// After the backend accepts the update, the user's cached progress is
    /// dropped, progress is read again, and the update's fields are laid over
    /// what the backend returned.
    pub async fn update_user_progress(
        &self,
        game_id: &str,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<UserGameProgress, ApiError> {
        info!(game_id, user_id, ?update, "updating user progress");
        self.backend
            .update_progress(game_id, user_id, update)
            .await
            .inspect_err(|e| error!(game_id, user_id, error = %e, "failed to update user progress"))?;

        self.cache.remove(&user_progress_key(game_id, user_id));

        let mut progress = self.get_user_progress(game_id, user_id).await?;
        update.apply_to(&mut progress);
        Ok(progress)
    }

    /// Returns a game's leaderboard for `period`
    pub async fn get_leaderboard(
        &self,
        game_id: &str,
        period: LeaderboardPeriod,
    ) -> Result<Leaderboard, ApiError> {
        self.cached(leaderboard_key(game_id, period), async {
            info!(game_id, %period, "fetching leaderboard");
            self.backend.fetch_leaderboard(game_id, period).await
        })
        .await
    }

    /// Returns the achievements defined for a game
    pub async fn get_game_achievements(&self, game_id: &str) -> Result<Vec<Achievement>, ApiError> {
        self.cached(achievements_key(game_id), async {
            info!(game_id, "fetching achievements");
            self.backend.fetch_achievements(game_id).await
        })
        .await
    }

    /// Starts a play session; never cached
    pub async fn start_game_session(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<GameSession, ApiError> {
        info!(game_id, user_id, "starting game session");
        self.backend
            .start_session(game_id, user_id)
            .await
            .inspect_err(|e| error!(game_id, user_id, error = %e, "failed to start game session"))
            .map_err(ApiError::from)
    }

    /// Fetches details for many games concurrently
    ///
    /// Returns the games that loaded, in the order requested. Failures are
    /// logged and left out.
    pub async fn get_multiple_games_info(&self, game_ids: &[String]) -> Vec<Game> {
        info!(count = game_ids.len(), "fetching info for multiple games");

        let results = join_all(game_ids.iter().map(|id| self.get_game_details(id))).await;

        let mut games = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (id, result) in game_ids.iter().zip(results) {
            match result {
                Ok(game) => games.push(game),
                Err(e) => failures.push(format!("Game {id}: {e}")),
            }
        }

        if !failures.is_empty() {
            warn!(?failures, "some games failed to load");
        }
        games
    }

    /// Drops cached entries whose key contains `pattern`, or all of them
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        self.cache.invalidate(pattern)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Reports whether the backend is healthy; errors count as unhealthy
    pub async fn check_health(&self) -> bool {
        match self.backend.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                error!(error = %e, "game service health check failed");
                false
            }
        }
    }

    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            service_name: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            features: SERVICE_FEATURES.iter().map(|f| f.to_string()).collect(),
            cache: self.cache_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockBackend;

    fn api() -> GameApi<MockBackend> {
        GameApi::new(MockBackend::new(), DEFAULT_CACHE_TTL)
    }

    #[test]
    fn test_cache_keys_follow_operation_id_variant_layout() {
        assert_eq!(game_details_key("g1"), "game-details-g1");
        assert_eq!(
            leaderboard_key("g1", LeaderboardPeriod::AllTime),
            "leaderboard-g1-allTime"
        );
        assert_eq!(achievements_key("g1"), "achievements-g1");
        assert_eq!(user_progress_key("g1", "u1"), "user-progress-g1-u1");
    }

    #[tokio::test]
    async fn test_repeated_details_served_from_cache() {
        let api = api();

        let first = api.get_game_details("g1").await.unwrap();
        let second = api.get_game_details("g1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.backend().call_count(), 1);
        assert_eq!(api.cache_stats().keys, vec!["game-details-g1".to_string()]);
    }

    #[tokio::test]
    async fn test_leaderboard_cached_per_period() {
        let api = api();

        api.get_leaderboard("g1", LeaderboardPeriod::Weekly).await.unwrap();
        api.get_leaderboard("g1", LeaderboardPeriod::Daily).await.unwrap();
        api.get_leaderboard("g1", LeaderboardPeriod::Weekly).await.unwrap();

        assert_eq!(api.backend().call_count(), 2);
        assert_eq!(api.cache_stats().size, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_details_served_while_backend_down() {
        let api = api();
        let fresh = api.get_game_details("g1").await.unwrap();

        tokio::time::advance(DEFAULT_CACHE_TTL + Duration::from_secs(1)).await;
        api.backend().set_failing(true);

        let stale = api.get_game_details("g1").await.expect("stale fallback");
        assert_eq!(stale, fresh);
        assert_eq!(api.backend().call_count(), 2);
    }

    #[tokio::test]
    async fn test_backend_error_propagates_without_cached_value() {
        let api = api();
        api.backend().set_failing(true);

        let result = api.get_game_achievements("g1").await;

        assert!(matches!(
            result,
            Err(ApiError::Backend(BackendError::Unavailable(_)))
        ));
        assert_eq!(api.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_progress_is_never_cached() {
        let api = api();

        api.get_user_progress("g1", "u1").await.unwrap();
        api.get_user_progress("g1", "u1").await.unwrap();

        assert_eq!(api.backend().call_count(), 2);
        assert!(api.cache().is_empty());
    }

    #[tokio::test]
    async fn test_update_progress_overlays_update() {
        let api = api();
        let update = ProgressUpdate {
            level: Some(49),
            score: Some(123_456),
            ..Default::default()
        };

        let progress = api.update_user_progress("g1", "u1", &update).await.unwrap();

        assert_eq!(progress.level, 49);
        assert_eq!(progress.score, 123_456);
        assert_eq!(progress.game_id, "g1");
        assert_eq!(api.backend().call_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_by_game_id() {
        let api = api();
        api.get_game_details("g1").await.unwrap();
        api.get_leaderboard("g1", LeaderboardPeriod::Weekly).await.unwrap();
        api.get_leaderboard("g2", LeaderboardPeriod::Weekly).await.unwrap();

        assert_eq!(api.clear_cache(Some("leaderboard-g1")), 1);
        assert_eq!(
            api.cache_stats().keys,
            vec!["game-details-g1".to_string(), "leaderboard-g2-weekly".to_string()]
        );

        assert_eq!(api.clear_cache(None), 2);
        assert_eq!(api.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_multiple_games_keeps_request_order() {
        let api = api();
        let ids = vec!["g3".to_string(), "g1".to_string(), "g2".to_string()];

        let games = api.get_multiple_games_info(&ids).await;

        let returned: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(returned, vec!["g3", "g1", "g2"]);
    }

    #[tokio::test]
    async fn test_health_false_when_backend_errors() {
        let api = api();
        assert!(api.check_health().await);

        api.backend().set_failing(true);
        assert!(!api.check_health().await);
    }

    #[tokio::test]
    async fn test_service_info_includes_cache_stats() {
        let api = api();
        api.get_game_achievements("g1").await.unwrap();

        let info = api.service_info();

        assert_eq!(info.service_name, "Game Service");
        assert_eq!(info.version, "1.0.0");
        assert!(info.features.contains(&"Smart Caching".to_string()));
        assert_eq!(info.cache.keys, vec!["achievements-g1".to_string()]);
        assert!(info.cache.approx_bytes > 0);
    }
}
