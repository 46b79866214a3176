//! The upstream game service as seen by the API layer
//!
//! `GameBackend` is the seam between the cached API layer and whatever
//! actually produces game data: the HTTP service in production, or the
//! in-process mock for demos and tests.

use std::future::Future;

use thiserror::Error;

use super::{
    Achievement, Game, GameSession, Leaderboard, LeaderboardPeriod, ProgressUpdate,
    UserGameProgress,
};

/// Errors that can occur when talking to the game backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The configured base URL cannot be used to build request URLs
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// The service is unreachable or refused to serve the request
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Source of game data
///
/// Each method is one upstream call. Implementations do no caching of their
/// own; that is the job of [`GameApi`](crate::api::GameApi).
pub trait GameBackend {
    fn fetch_game(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Game, BackendError>> + Send;

    fn fetch_progress(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<UserGameProgress, BackendError>> + Send;

    fn update_progress(
        &self,
        game_id: &str,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn fetch_leaderboard(
        &self,
        game_id: &str,
        period: LeaderboardPeriod,
    ) -> impl Future<Output = Result<Leaderboard, BackendError>> + Send;

    fn fetch_achievements(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Vec<Achievement>, BackendError>> + Send;

    fn start_session(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<GameSession, BackendError>> + Send;

    /// Returns whether the service reports itself healthy
    fn health_check(&self) -> impl Future<Output = Result<bool, BackendError>> + Send;
}
