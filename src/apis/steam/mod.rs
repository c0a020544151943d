/// Steam Web API client
///
/// API Documentation: https://developer.valvesoftware.com/wiki/Steam_Web_API
///
/// Endpoints implemented:
/// 1. IPlayerService/GetOwnedGames - Owned games with playtime
/// 2. ISteamUserStats/GetUserStatsForGame - Per-user achievement flags
/// 3. ISteamUserStats/GetGlobalAchievementPercentagesForApp - Achievement list with unlock rates
/// 4. ISteamUser/GetPlayerSummaries - Persona names
pub mod types;

pub use self::types::{GlobalAchievement, OwnedGame, OwnedGames, PlayerSummary, UserAchievement};

use self::types::{
    GlobalAchievementEnvelope, OwnedGamesEnvelope, PlayerStatsEnvelope, PlayerSummariesEnvelope,
};
use crate::apis::client::{classify_status, looks_like_html, HttpClient, RateLimiter};
use crate::config::SteamConfig;
use crate::errors::ApiError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Instant;

// ============================================================================
// API CONFIGURATION
// ============================================================================

pub const STEAM_API_ORIGIN: &str = "https://api.steampowered.com";
pub const SERVICE: &str = "steam";

const OWNED_GAMES_ENDPOINT: &str = "/IPlayerService/GetOwnedGames/v0001/";
const USER_STATS_ENDPOINT: &str = "/ISteamUserStats/GetUserStatsForGame/v0002/";
const GLOBAL_ACHIEVEMENTS_ENDPOINT: &str =
    "/ISteamUserStats/GetGlobalAchievementPercentagesForApp/v0002/";
const PLAYER_SUMMARIES_ENDPOINT: &str = "/ISteamUser/GetPlayerSummaries/v0002/";

/// GetPlayerSummaries accepts at most this many ids per call
pub const MAX_SUMMARY_IDS: usize = 100;

/// Operations the Steam collector needs from the upstream
#[async_trait]
pub trait SteamApi: Send + Sync {
    async fn get_owned_games(&self, steam_id: &str) -> Result<OwnedGames, ApiError>;

    async fn get_user_achievements(
        &self,
        steam_id: &str,
        app_id: u32,
    ) -> Result<Vec<UserAchievement>, ApiError>;

    async fn get_global_achievements(&self, app_id: u32)
        -> Result<Vec<GlobalAchievement>, ApiError>;

    async fn get_player_summaries(
        &self,
        steam_ids: &[String],
    ) -> Result<Vec<PlayerSummary>, ApiError>;
}

/// Steam IDs are 64-bit integers in decimal form
pub fn validate_steam_id(steam_id: &str) -> Result<(), ApiError> {
    if steam_id.is_empty() {
        return Err(ApiError::InvalidInput("Steam ID cannot be empty".to_string()));
    }
    steam_id.parse::<u64>().map(|_| ()).map_err(|_| {
        ApiError::InvalidInput(format!(
            "invalid Steam ID format: '{}' - Steam IDs must be numeric (e.g., 76561197987123908)",
            steam_id
        ))
    })
}

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct SteamClient {
    http_client: HttpClient,
    /// Spaces out GetUserStatsForGame calls
    achievement_pacer: RateLimiter,
    api_key: String,
    base_url: String,
}

impl SteamClient {
    pub fn new(config: &SteamConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: HttpClient::new(config.request_timeout())?,
            achievement_pacer: RateLimiter::with_min_interval(config.achievement_request_delay()),
            api_key: config.api_key.clone(),
            base_url: STEAM_API_ORIGIN.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn get_json<T>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        if !self.has_api_key() {
            return Err(ApiError::Config(
                "Steam API key is not configured - set STEAM_KEY or steam.api_key".to_string(),
            ));
        }

        let url = format!("{}{}", self.base_url, endpoint);
        logger::debug(
            LogTag::Steam,
            &format!(
                "GET {} params={} key=[HIDDEN]",
                url,
                params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("&")
            ),
        );

        let start = Instant::now();
        let response = self
            .http_client
            .client()
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        logger::debug(
            LogTag::Steam,
            &format!(
                "Response endpoint={} status={} bytes={} elapsed_ms={}",
                endpoint,
                status.as_u16(),
                body.len(),
                start.elapsed().as_millis()
            ),
        );

        classify_status(SERVICE, endpoint, status, &body)?;

        if looks_like_html(&body) {
            return Err(ApiError::HtmlResponse {
                service: SERVICE.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse {
            service: SERVICE.to_string(),
            message: format!("{}: {}", endpoint, e),
        })
    }
}

#[async_trait]
impl SteamApi for SteamClient {
    async fn get_owned_games(&self, steam_id: &str) -> Result<OwnedGames, ApiError> {
        validate_steam_id(steam_id)?;

        let params = [
            ("steamid", steam_id.to_string()),
            ("include_appinfo", "true".to_string()),
            ("include_played_free_games", "true".to_string()),
        ];
        let envelope: OwnedGamesEnvelope = self.get_json(OWNED_GAMES_ENDPOINT, &params).await?;

        logger::info(
            LogTag::Steam,
            &format!(
                "Fetched owned games steam_id={} game_count={}",
                steam_id, envelope.response.game_count
            ),
        );
        Ok(envelope.response)
    }

    async fn get_user_achievements(
        &self,
        steam_id: &str,
        app_id: u32,
    ) -> Result<Vec<UserAchievement>, ApiError> {
        let _guard = self
            .achievement_pacer
            .acquire()
            .await
            .map_err(ApiError::Config)?;

        let params = [
            ("steamid", steam_id.to_string()),
            ("appid", app_id.to_string()),
        ];
        let envelope: PlayerStatsEnvelope = self.get_json(USER_STATS_ENDPOINT, &params).await?;
        Ok(envelope.playerstats.achievements)
    }

    async fn get_global_achievements(
        &self,
        app_id: u32,
    ) -> Result<Vec<GlobalAchievement>, ApiError> {
        let params = [("gameid", app_id.to_string())];
        let envelope: GlobalAchievementEnvelope =
            self.get_json(GLOBAL_ACHIEVEMENTS_ENDPOINT, &params).await?;
        Ok(envelope.achievementpercentages.achievements)
    }

    async fn get_player_summaries(
        &self,
        steam_ids: &[String],
    ) -> Result<Vec<PlayerSummary>, ApiError> {
        if steam_ids.is_empty() {
            return Err(ApiError::InvalidInput(
                "steam ids cannot be empty".to_string(),
            ));
        }
        if steam_ids.len() > MAX_SUMMARY_IDS {
            return Err(ApiError::InvalidInput(format!(
                "at most {} steam ids per summary request, got {}",
                MAX_SUMMARY_IDS,
                steam_ids.len()
            )));
        }

        let params = [("steamids", steam_ids.join(","))];
        let envelope: PlayerSummariesEnvelope =
            self.get_json(PLAYER_SUMMARIES_ENDPOINT, &params).await?;
        Ok(envelope.response.players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steam_ids_must_be_numeric() {
        assert!(validate_steam_id("76561197960287930").is_ok());
        assert!(matches!(
            validate_steam_id(""),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_steam_id("gabelogannewell"),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_is_a_config_error() {
        let client = SteamClient::new(&SteamConfig::default()).unwrap();
        assert!(!client.has_api_key());
        let err = client.get_owned_games("76561197960287930").await.unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[tokio::test]
    async fn invalid_id_is_rejected_before_any_request() {
        let config = SteamConfig {
            api_key: "secret".to_string(),
            ..SteamConfig::default()
        };
        let client = SteamClient::new(&config)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client.get_owned_games("not-a-number").await.unwrap_err();
        assert!(err.is_client_error());
    }
}
