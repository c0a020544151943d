/// Old School RuneScape clients
///
/// Endpoints implemented:
/// 1. m=hiscore_oldschool/index_lite.ws - Player hiscores (CSV)
/// 2. m=hiscore_oldschool_tournament/index_lite.ws - Gridmaster tournament hiscores (CSV)
/// 3. g=oldscape/slr.ws - World list (binary, see `worlds::WorldFeedDecoder`)
pub mod types;

pub use self::types::{
    parse_hiscores_csv, ActivityScore, HiscoreMode, PlayerStats, SkillInfo, UNKNOWN_MODE_MESSAGE,
};

use crate::apis::client::{classify_status, looks_like_html, HttpClient};
use crate::config::OsrsConfig;
use crate::errors::ApiError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Instant;

// ============================================================================
// API CONFIGURATION
// ============================================================================

pub const SERVICE: &str = "osrs";

pub const HISCORE_URL: &str =
    "https://oldschool.runescape.wiki/cors/m=hiscore_oldschool/index_lite.ws";
pub const TOURNAMENT_HISCORE_URL: &str =
    "https://oldschool.runescape.wiki/cors/m=hiscore_oldschool_tournament/index_lite.ws";
pub const WORLD_LIST_URL: &str = "https://www.runescape.com/g=oldscape/slr.ws?order=LPWM";

/// Display names are at most 12 characters
pub const MAX_PLAYER_NAME_LEN: usize = 12;

/// Operations the OSRS collector needs from the upstream
#[async_trait]
pub trait OsrsApi: Send + Sync {
    async fn get_player_stats(&self, rsn: &str, mode: HiscoreMode)
        -> Result<PlayerStats, ApiError>;

    /// Raw world-list payload, possibly truncated
    async fn fetch_world_feed(&self) -> Result<Vec<u8>, ApiError>;
}

pub fn validate_player_name(rsn: &str) -> Result<(), ApiError> {
    let trimmed = rsn.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("player name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(ApiError::InvalidInput(format!(
            "player name '{}' is longer than {} characters",
            trimmed, MAX_PLAYER_NAME_LEN
        )));
    }
    Ok(())
}

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct OsrsClient {
    http_client: HttpClient,
    hiscore_url: String,
    tournament_url: String,
    world_list_url: String,
}

impl OsrsClient {
    pub fn new(config: &OsrsConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: HttpClient::new(config.request_timeout())?,
            hiscore_url: HISCORE_URL.to_string(),
            tournament_url: TOURNAMENT_HISCORE_URL.to_string(),
            world_list_url: WORLD_LIST_URL.to_string(),
        })
    }

    fn hiscore_url_for(&self, mode: HiscoreMode) -> &str {
        match mode {
            HiscoreMode::Vanilla => &self.hiscore_url,
            HiscoreMode::Gridmaster => &self.tournament_url,
        }
    }
}

#[async_trait]
impl OsrsApi for OsrsClient {
    async fn get_player_stats(
        &self,
        rsn: &str,
        mode: HiscoreMode,
    ) -> Result<PlayerStats, ApiError> {
        validate_player_name(rsn)?;

        let url = self.hiscore_url_for(mode);
        let start = Instant::now();
        let response = self
            .http_client
            .client()
            .get(url)
            .query(&[("player", rsn)])
            .send()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        logger::debug(
            LogTag::Osrs,
            &format!(
                "Hiscores response player={} mode={} status={} bytes={} elapsed_ms={}",
                rsn,
                mode,
                status.as_u16(),
                body.len(),
                start.elapsed().as_millis()
            ),
        );

        classify_status(SERVICE, rsn, status, &body)?;
        if looks_like_html(&body) {
            return Err(ApiError::HtmlResponse {
                service: SERVICE.to_string(),
            });
        }

        let stats = parse_hiscores_csv(rsn, mode, &body)?;
        logger::debug(
            LogTag::Osrs,
            &format!(
                "Parsed hiscores player={} skills={} activities={}",
                rsn,
                stats.skills.len(),
                stats.activities.len()
            ),
        );
        Ok(stats)
    }

    async fn fetch_world_feed(&self) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http_client
            .client()
            .get(&self.world_list_url)
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        let status = response.status();
        let declared_len = response.content_length();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.http_client.transport_error(SERVICE, e))?;

        classify_status(
            SERVICE,
            "world list",
            status,
            &String::from_utf8_lossy(&body),
        )?;

        if body.is_empty() {
            return Err(ApiError::EmptyBody {
                service: SERVICE.to_string(),
            });
        }

        if let Some(expected) = declared_len {
            if (body.len() as u64) < expected {
                logger::warning(
                    LogTag::Osrs,
                    &format!(
                        "World list body shorter than Content-Length received={} expected={}",
                        body.len(),
                        expected
                    ),
                );
            }
        }

        let preview_len = body.len().min(20);
        logger::debug(
            LogTag::Osrs,
            &format!(
                "World list received bytes={} first_bytes={:02x?}",
                body.len(),
                &body[..preview_len]
            ),
        );

        Ok(body.to_vec())
    }
}
