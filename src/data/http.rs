//! HTTP client for the game service REST API
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  /games/{id}`
//! - `GET  /games/{id}/progress/{user}`
//! - `PUT  /games/{id}/progress/{user}`
//! - `GET  /games/{id}/leaderboard?period={period}`
//! - `GET  /games/{id}/achievements`
//! - `POST /sessions/start`
//! - `GET  /health`

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    Achievement, BackendError, Game, GameBackend, GameSession, Leaderboard, LeaderboardPeriod,
    ProgressUpdate, UserGameProgress,
};

/// Request body for starting a session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest<'a> {
    game_id: &'a str,
    user_id: &'a str,
}

/// Client for the game service over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend for `base_url` with a default HTTP client
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a backend whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Creates a backend with a custom HTTP client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, BackendError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL by appending percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = check_status(request.send().await?)?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Maps non-success statuses to errors, passing successful responses through
fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    match status {
        StatusCode::NOT_FOUND => Err(BackendError::NotFound(url)),
        StatusCode::SERVICE_UNAVAILABLE => Err(BackendError::Unavailable(url)),
        _ => Err(BackendError::Status {
            status: status.as_u16(),
            url,
        }),
    }
}

impl GameBackend for HttpBackend {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, BackendError> {
        let url = self.endpoint(&["games", game_id])?;
        self.get_json(self.client.get(url)).await
    }

    async fn fetch_progress(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<UserGameProgress, BackendError> {
        let url = self.endpoint(&["games", game_id, "progress", user_id])?;
        self.get_json(self.client.get(url)).await
    }

    async fn update_progress(
        &self,
        game_id: &str,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["games", game_id, "progress", user_id])?;
        check_status(self.client.put(url).json(update).send().await?)?;
        Ok(())
    }

    async fn fetch_leaderboard(
        &self,
        game_id: &str,
        period: LeaderboardPeriod,
    ) -> Result<Leaderboard, BackendError> {
        let url = self.endpoint(&["games", game_id, "leaderboard"])?;
        self.get_json(self.client.get(url).query(&[("period", period.as_str())]))
            .await
    }

    async fn fetch_achievements(&self, game_id: &str) -> Result<Vec<Achievement>, BackendError> {
        let url = self.endpoint(&["games", game_id, "achievements"])?;
        self.get_json(self.client.get(url)).await
    }

    async fn start_session(&self, game_id: &str, user_id: &str) -> Result<GameSession, BackendError> {
        let url = self.endpoint(&["sessions", "start"])?;
        let body = StartSessionRequest { game_id, user_id };
        self.get_json(self.client.post(url).json(&body)).await
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn game_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Hero Clash",
            "description": "Arena fights",
            "thumbnail": format!("/images/{id}-thumbnail.jpg"),
            "category": "action",
            "rating": 4.9,
            "downloads": 5420000,
            "size": "4.2GB",
            "version": "2.5.1",
            "developer": "Hero Studios",
            "tags": ["action", "multiplayer"],
            "screenshots": [],
            "isNew": false,
            "isFeatured": true,
            "price": 0.0,
            "currency": "CNY",
            "releaseDate": "2023-06-15"
        })
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let result = HttpBackend::new("not a url");
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_encodes_segments_and_keeps_base_path() {
        let backend = HttpBackend::new("http://localhost:8080/api/").unwrap();
        let url = backend.endpoint(&["games", "g 1/2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/games/g%201%2F2");
    }

    #[tokio::test]
    async fn test_fetch_game_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games/g1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(game_json("g1")))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let game = backend.fetch_game("g1").await.expect("fetch should succeed");

        assert_eq!(game.id, "g1");
        assert_eq!(game.developer, "Hero Studios");
    }

    #[tokio::test]
    async fn test_fetch_game_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let result = backend.fetch_game("missing").await;

        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games/g1/achievements"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let result = backend.fetch_achievements("g1").await;

        assert!(matches!(result, Err(BackendError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games/g1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let result = backend.fetch_game("g1").await;

        assert!(matches!(result, Err(BackendError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_leaderboard_sends_period_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games/g1/leaderboard"))
            .and(query_param("period", "allTime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "gameId": "g1",
                "entries": [{
                    "rank": 1,
                    "userId": "user-001",
                    "username": "Player 1",
                    "avatar": "/avatars/avatar-1.png",
                    "score": 99000,
                    "level": 40
                }],
                "period": "allTime",
                "updatedAt": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let board = backend
            .fetch_leaderboard("g1", LeaderboardPeriod::AllTime)
            .await
            .expect("fetch should succeed");

        assert_eq!(board.period, LeaderboardPeriod::AllTime);
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].user_id, "user-001");
    }

    #[tokio::test]
    async fn test_update_progress_puts_partial_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/games/g1/progress/u1"))
            .and(body_json(json!({ "level": 7 })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let update = ProgressUpdate {
            level: Some(7),
            ..Default::default()
        };

        backend
            .update_progress("g1", "u1", &update)
            .await
            .expect("update should succeed");
    }

    #[tokio::test]
    async fn test_start_session_posts_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions/start"))
            .and(body_json(json!({ "gameId": "g1", "userId": "u1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sessionId": "session-1",
                "serverUrl": "wss://game-server-1.gaming-platform.com"
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        let session = backend.start_session("g1", "u1").await.unwrap();

        assert_eq!(session.session_id, "session-1");
    }

    #[tokio::test]
    async fn test_health_check_reflects_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri()).unwrap();
        assert!(!backend.health_check().await.unwrap());
    }
}
