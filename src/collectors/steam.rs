/// Steam collector
///
/// Flow per request: username → owned games → per-game global and user
/// achievements. Every upstream call goes through the rate-limit coordinator;
/// a 403 opens a backoff window and the collection continues from cache.
use crate::apis::steam::{
    validate_steam_id, GlobalAchievement, OwnedGame, OwnedGames, SteamApi, UserAchievement,
    SERVICE,
};
use crate::cache::{self, keys, SharedCache};
use crate::errors::{AcquisitionError, ApiError};
use crate::freshness::{Activity, DataClass, FreshnessPolicy};
use crate::logger::{self, LogTag};
use crate::metrics::exporter::{
    ExporterMetrics, OUTCOME_CACHED, OUTCOME_ERROR, OUTCOME_FALLBACK, OUTCOME_FRESH,
};
use crate::ratelimit::RateLimitCoordinator;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Cached per-user achievements with the playtime they were fetched at
///
/// `playtime` doubles as the activity baseline for the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievementsEntry {
    pub user_achievements: Vec<UserAchievement>,
    pub playtime: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameAchievements {
    pub global: Vec<GlobalAchievement>,
    pub user: Vec<UserAchievement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub game: OwnedGame,
    /// `None` for games without achievements, skipped games and failures
    pub achievements: Option<GameAchievements>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteamSnapshot {
    pub steam_id: String,
    /// Empty when the persona name could not be resolved
    pub username: String,
    pub games: Vec<GameReport>,
    /// Some data was served from cache because the upstream was rate limited
    pub served_stale: bool,
}

pub struct SteamCollector {
    api: Arc<dyn SteamApi>,
    cache: SharedCache,
    coordinator: Arc<RateLimitCoordinator>,
    policy: FreshnessPolicy,
    metrics: Arc<ExporterMetrics>,
}

impl SteamCollector {
    pub fn new(
        api: Arc<dyn SteamApi>,
        cache: SharedCache,
        coordinator: Arc<RateLimitCoordinator>,
        policy: FreshnessPolicy,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            api,
            cache,
            coordinator,
            policy,
            metrics,
        }
    }

    pub fn coordinator(&self) -> &Arc<RateLimitCoordinator> {
        &self.coordinator
    }

    pub async fn collect(&self, steam_id: &str) -> Result<SteamSnapshot, AcquisitionError> {
        validate_steam_id(steam_id)?;
        logger::info(
            LogTag::Steam,
            &format!("Starting collection steam_id={}", steam_id),
        );

        let username = self.username(steam_id).await;

        let (owned, owned_outcome) = match self.owned_games(steam_id).await {
            Ok(found) => found,
            Err(e) => {
                self.metrics.record_collection(SERVICE, OUTCOME_ERROR);
                logger::error(
                    LogTag::Steam,
                    &format!("Owned games unavailable steam_id={} error={}", steam_id, e),
                );
                return Err(e);
            }
        };

        // Cache-only pass while blocked: zero-playtime games may still have cached data
        let blocked = self.check_blocked().await;
        let mut served_stale = blocked;
        let mut games = Vec::with_capacity(owned.games.len());

        for game in owned.games {
            if !blocked && game.playtime_forever == 0 {
                games.push(GameReport {
                    game,
                    achievements: None,
                });
                continue;
            }

            let achievements = match self.achievements(steam_id, &game).await {
                Ok(Some((achievements, stale))) => {
                    served_stale |= stale;
                    Some(achievements)
                }
                Ok(None) => None,
                Err(e) if e.is_rate_limited() => {
                    served_stale = true;
                    logger::debug(
                        LogTag::Steam,
                        &format!(
                            "No cached achievements while rate limited steam_id={} app_id={}",
                            steam_id, game.appid
                        ),
                    );
                    None
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Steam,
                        &format!(
                            "Achievements failed, continuing steam_id={} app_id={} game={} error={}",
                            steam_id, game.appid, game.name, e
                        ),
                    );
                    None
                }
            };
            games.push(GameReport { game, achievements });
        }

        let outcome = if served_stale {
            OUTCOME_FALLBACK
        } else {
            owned_outcome
        };
        self.metrics.record_collection(SERVICE, outcome);

        logger::info(
            LogTag::Steam,
            &format!(
                "Completed collection steam_id={} games={} outcome={}",
                steam_id,
                games.len(),
                outcome
            ),
        );

        Ok(SteamSnapshot {
            steam_id: steam_id.to_string(),
            username,
            games,
            served_stale,
        })
    }

    /// Whether any game's playtime grew past the playtime its cached
    /// achievements were fetched at
    ///
    /// Reads fresh owned games but never touches the stored entries. Games
    /// without an entry are undetermined and do not count as active.
    pub async fn is_active(&self, steam_id: &str) -> Result<bool, AcquisitionError> {
        validate_steam_id(steam_id)?;
        if self.check_blocked().await {
            return Ok(false);
        }

        let owned = self.guarded(self.api.get_owned_games(steam_id)).await?;
        for game in owned.games.iter().filter(|g| g.playtime_forever > 0) {
            let key = keys::steam_user_achievements(steam_id, game.appid);
            let entry: Option<UserAchievementsEntry> =
                cache::read_or_miss(self.cache.as_ref(), &key, LogTag::Steam).await;
            let activity =
                Activity::from_counters(entry.map(|e| e.playtime), game.playtime_forever);
            if activity.is_active() {
                logger::debug(
                    LogTag::Steam,
                    &format!(
                        "Playtime increased steam_id={} app_id={} playtime={}",
                        steam_id, game.appid, game.playtime_forever
                    ),
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn check_blocked(&self) -> bool {
        let blocked = self.coordinator.check_and_block().await;
        self.metrics.set_rate_limit_blocked(SERVICE, blocked);
        blocked
    }

    /// Run an upstream call unless blocked, feeding its result to the coordinator
    async fn guarded<T, F>(&self, call: F) -> Result<T, AcquisitionError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.check_blocked().await {
            let until = self
                .coordinator
                .blocked_until()
                .await
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(AcquisitionError::RateLimited {
                service: SERVICE.to_string(),
                until,
            });
        }

        match call.await {
            Ok(value) => {
                self.coordinator.record_success().await;
                Ok(value)
            }
            Err(e) if e.is_forbidden() => {
                let state = self.coordinator.record_403().await;
                self.metrics.set_rate_limit_blocked(SERVICE, true);
                Err(AcquisitionError::RateLimited {
                    service: SERVICE.to_string(),
                    until: state.blocked_until.to_rfc3339(),
                })
            }
            Err(e) => Err(AcquisitionError::Upstream(e)),
        }
    }

    async fn username(&self, steam_id: &str) -> String {
        let key = keys::steam_username(steam_id);
        if let Some(name) =
            cache::read_or_miss::<String>(self.cache.as_ref(), &key, LogTag::Steam).await
        {
            if !name.is_empty() {
                return name;
            }
        }

        let ids = vec![steam_id.to_string()];
        let resolved = match self.guarded(self.api.get_player_summaries(&ids)).await {
            Ok(players) => players
                .into_iter()
                .find(|p| p.steamid == steam_id)
                .map(|p| p.personaname)
                .filter(|name| !name.is_empty()),
            Err(e) => {
                logger::warning(
                    LogTag::Steam,
                    &format!(
                        "Username lookup failed, continuing without it steam_id={} error={}",
                        steam_id, e
                    ),
                );
                return String::new();
            }
        };

        match resolved {
            Some(name) => {
                let ttl = self.policy.ttl_for(DataClass::Username);
                cache::write_logged(self.cache.as_ref(), &key, &name, ttl, LogTag::Steam).await;
                name
            }
            None => {
                logger::warning(
                    LogTag::Steam,
                    &format!("No persona name for steam_id={}", steam_id),
                );
                String::new()
            }
        }
    }

    async fn owned_games(
        &self,
        steam_id: &str,
    ) -> Result<(OwnedGames, &'static str), AcquisitionError> {
        let key = keys::steam_owned_games(steam_id);
        if let Some(owned) =
            cache::read_or_miss::<OwnedGames>(self.cache.as_ref(), &key, LogTag::Steam).await
        {
            logger::debug(
                LogTag::Steam,
                &format!(
                    "Owned games cache hit steam_id={} games={}",
                    steam_id,
                    owned.games.len()
                ),
            );
            return Ok((owned, OUTCOME_CACHED));
        }

        let owned = self.guarded(self.api.get_owned_games(steam_id)).await?;
        let ttl = self.policy.ttl_for(DataClass::OwnedGames);
        cache::write_logged(self.cache.as_ref(), &key, &owned, ttl, LogTag::Steam).await;
        Ok((owned, OUTCOME_FRESH))
    }

    /// `Ok(None)` when the game defines no achievements
    async fn achievements(
        &self,
        steam_id: &str,
        game: &OwnedGame,
    ) -> Result<Option<(GameAchievements, bool)>, AcquisitionError> {
        let global = self.global_achievements(game.appid).await?;
        if global.is_empty() {
            return Ok(None);
        }
        let (user, stale) = self.user_achievements(steam_id, game).await?;
        Ok(Some((GameAchievements { global, user }, stale)))
    }

    async fn global_achievements(
        &self,
        app_id: u32,
    ) -> Result<Vec<GlobalAchievement>, AcquisitionError> {
        let key = keys::steam_global_achievements(app_id);
        if let Some(global) = cache::read_or_miss::<Vec<GlobalAchievement>>(
            self.cache.as_ref(),
            &key,
            LogTag::Steam,
        )
        .await
        {
            if !global.is_empty() {
                return Ok(global);
            }
        }

        let global = self
            .guarded(self.api.get_global_achievements(app_id))
            .await?;
        let ttl = self.policy.ttl_for(DataClass::GlobalAchievements);
        cache::write_logged(self.cache.as_ref(), &key, &global, ttl, LogTag::Steam).await;
        Ok(global)
    }

    /// Returns the achievements and whether they are a rate-limit fallback
    async fn user_achievements(
        &self,
        steam_id: &str,
        game: &OwnedGame,
    ) -> Result<(Vec<UserAchievement>, bool), AcquisitionError> {
        let key = keys::steam_user_achievements(steam_id, game.appid);
        let cached: Option<UserAchievementsEntry> =
            cache::read_or_miss(self.cache.as_ref(), &key, LogTag::Steam).await;
        let activity = Activity::from_counters(
            cached.as_ref().map(|e| e.playtime),
            game.playtime_forever,
        );

        if !activity.is_active() {
            if let Some(entry) = &cached {
                return Ok((entry.user_achievements.clone(), false));
            }
        }

        match self
            .guarded(self.api.get_user_achievements(steam_id, game.appid))
            .await
        {
            Ok(list) => {
                let ttl = self.policy.ttl(DataClass::UserAchievements, activity);
                let entry = UserAchievementsEntry {
                    user_achievements: list.clone(),
                    playtime: game.playtime_forever,
                };
                cache::write_logged(self.cache.as_ref(), &key, &entry, ttl, LogTag::Steam).await;
                logger::debug(
                    LogTag::Freshness,
                    &format!(
                        "User achievements cached steam_id={} app_id={} activity={} ttl={}s",
                        steam_id,
                        game.appid,
                        activity.as_str(),
                        ttl.as_secs()
                    ),
                );
                Ok((list, false))
            }
            Err(e) if e.is_rate_limited() => match cached {
                Some(entry) if !entry.user_achievements.is_empty() => {
                    logger::warning(
                        LogTag::Steam,
                        &format!(
                            "Rate limited, serving cached achievements steam_id={} app_id={}",
                            steam_id, game.appid
                        ),
                    );
                    Ok((entry.user_achievements, true))
                }
                _ => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::steam::PlayerSummary;
    use crate::cache::{KeyValueCache, MemoryCache};
    use crate::clock::ManualClock;
    use crate::ratelimit::BackoffPolicy;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const STEAM_ID: &str = "76561197960287930";

    #[derive(Default)]
    struct FakeSteam {
        games: Mutex<Vec<OwnedGame>>,
        forbid_owned: AtomicBool,
        forbid_user: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSteam {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn set_playtime(&self, app_id: u32, minutes: i64) {
            for game in self.games.lock().iter_mut() {
                if game.appid == app_id {
                    game.playtime_forever = minutes;
                }
            }
        }
    }

    fn forbidden() -> ApiError {
        ApiError::Forbidden {
            service: SERVICE.to_string(),
        }
    }

    #[async_trait]
    impl SteamApi for FakeSteam {
        async fn get_owned_games(&self, _steam_id: &str) -> Result<OwnedGames, ApiError> {
            self.calls.lock().push("owned".to_string());
            if self.forbid_owned.load(Ordering::SeqCst) {
                return Err(forbidden());
            }
            let games = self.games.lock().clone();
            Ok(OwnedGames {
                game_count: games.len() as u32,
                games,
            })
        }

        async fn get_user_achievements(
            &self,
            _steam_id: &str,
            app_id: u32,
        ) -> Result<Vec<UserAchievement>, ApiError> {
            self.calls.lock().push(format!("user:{}", app_id));
            if self.forbid_user.load(Ordering::SeqCst) {
                return Err(forbidden());
            }
            Ok(vec![UserAchievement {
                name: "WIN".to_string(),
                achieved: 1,
            }])
        }

        async fn get_global_achievements(
            &self,
            app_id: u32,
        ) -> Result<Vec<GlobalAchievement>, ApiError> {
            self.calls.lock().push(format!("global:{}", app_id));
            Ok(vec![
                GlobalAchievement {
                    name: "WIN".to_string(),
                    percent: 12.5,
                },
                GlobalAchievement {
                    name: "LOSE".to_string(),
                    percent: 80.0,
                },
            ])
        }

        async fn get_player_summaries(
            &self,
            steam_ids: &[String],
        ) -> Result<Vec<PlayerSummary>, ApiError> {
            self.calls.lock().push("summary".to_string());
            Ok(vec![PlayerSummary {
                steamid: steam_ids[0].clone(),
                personaname: "gaben".to_string(),
                profileurl: String::new(),
                avatarfull: String::new(),
            }])
        }
    }

    struct Harness {
        collector: SteamCollector,
        api: Arc<FakeSteam>,
        cache: Arc<MemoryCache>,
        clock: ManualClock,
        metrics: Arc<ExporterMetrics>,
    }

    fn game(appid: u32, name: &str, playtime: i64) -> OwnedGame {
        OwnedGame {
            appid,
            name: name.to_string(),
            playtime_forever: playtime,
        }
    }

    async fn harness(games: Vec<OwnedGame>) -> Harness {
        let clock = ManualClock::default();
        let cache = Arc::new(MemoryCache::new(Arc::new(clock.clone())));
        let api = Arc::new(FakeSteam::default());
        *api.games.lock() = games;
        let coordinator = Arc::new(
            RateLimitCoordinator::load(
                SERVICE,
                keys::STEAM_RATE_LIMIT_STATE,
                cache.clone(),
                Arc::new(clock.clone()),
                BackoffPolicy::default(),
            )
            .await,
        );
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let collector = SteamCollector::new(
            api.clone(),
            cache.clone(),
            coordinator,
            FreshnessPolicy::new(),
            metrics.clone(),
        );
        Harness {
            collector,
            api,
            cache,
            clock,
            metrics,
        }
    }

    #[tokio::test]
    async fn fresh_collection_populates_cache_and_skips_unplayed_games() {
        let h = harness(vec![game(440, "Team Fortress 2", 120), game(570, "Dota 2", 0)]).await;

        let snapshot = h.collector.collect(STEAM_ID).await.unwrap();
        assert_eq!(snapshot.username, "gaben");
        assert_eq!(snapshot.games.len(), 2);
        assert!(!snapshot.served_stale);

        let tf2 = snapshot.games[0].achievements.as_ref().unwrap();
        assert_eq!(tf2.global.len(), 2);
        assert_eq!(tf2.user[0].name, "WIN");
        assert!(snapshot.games[1].achievements.is_none());

        let calls = h.api.calls();
        assert_eq!(calls, vec!["summary", "owned", "global:440", "user:440"]);
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_FRESH), 1);
    }

    #[tokio::test]
    async fn second_collection_is_served_from_cache() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.collector.collect(STEAM_ID).await.unwrap();
        let first_calls = h.api.calls().len();

        let snapshot = h.collector.collect(STEAM_ID).await.unwrap();
        assert_eq!(h.api.calls().len(), first_calls);
        assert!(snapshot.games[0].achievements.is_some());
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_CACHED), 1);
    }

    #[tokio::test]
    async fn idle_player_gets_long_ttl() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.collector.collect(STEAM_ID).await.unwrap();

        let ttl = h
            .cache
            .ttl_of(&keys::steam_user_achievements(STEAM_ID, 440))
            .unwrap();
        assert!(ttl >= Duration::from_secs(4 * 3600));
        assert!(ttl <= Duration::from_secs(6 * 3600));
    }

    #[tokio::test]
    async fn playtime_increase_refetches_with_short_ttl() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.collector.collect(STEAM_ID).await.unwrap();

        h.api.set_playtime(440, 150);
        h.cache
            .delete(&keys::steam_owned_games(STEAM_ID))
            .await
            .unwrap();
        h.collector.collect(STEAM_ID).await.unwrap();

        let user_calls = h.api.calls().iter().filter(|c| *c == "user:440").count();
        assert_eq!(user_calls, 2);
        let ttl = h
            .cache
            .ttl_of(&keys::steam_user_achievements(STEAM_ID, 440))
            .unwrap();
        assert!(ttl >= Duration::from_secs(120));
        assert!(ttl <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn forbidden_opens_backoff_and_falls_back_to_cache() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.collector.collect(STEAM_ID).await.unwrap();

        h.api.set_playtime(440, 150);
        h.api.forbid_user.store(true, Ordering::SeqCst);
        h.cache
            .delete(&keys::steam_owned_games(STEAM_ID))
            .await
            .unwrap();

        let snapshot = h.collector.collect(STEAM_ID).await.unwrap();
        assert!(snapshot.served_stale);
        let achievements = snapshot.games[0].achievements.as_ref().unwrap();
        assert_eq!(achievements.user[0].name, "WIN");
        assert!(h.collector.coordinator().check_and_block().await);
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_FALLBACK), 1);
    }

    #[tokio::test]
    async fn blocked_collection_makes_no_upstream_calls() {
        let h = harness(vec![game(440, "Team Fortress 2", 120), game(570, "Dota 2", 0)]).await;
        h.collector.collect(STEAM_ID).await.unwrap();
        h.collector.coordinator().record_403().await;
        let before = h.api.calls().len();

        let snapshot = h.collector.collect(STEAM_ID).await.unwrap();
        assert_eq!(h.api.calls().len(), before);
        assert!(snapshot.served_stale);
        assert!(snapshot.games[0].achievements.is_some());
        assert!(snapshot.games[1].achievements.is_none());
    }

    #[tokio::test]
    async fn rate_limited_without_cache_is_an_error() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.api.forbid_owned.store(true, Ordering::SeqCst);

        let err = h.collector.collect(STEAM_ID).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_ERROR), 1);

        h.clock.advance(Duration::from_secs(3601));
        assert!(!h.collector.coordinator().check_and_block().await);
    }

    #[tokio::test]
    async fn invalid_id_never_reaches_upstream() {
        let h = harness(Vec::new()).await;
        let err = h.collector.collect("not-a-number").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn activity_compares_against_cached_playtime_without_mutating() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        assert!(!h.collector.is_active(STEAM_ID).await.unwrap());

        h.collector.collect(STEAM_ID).await.unwrap();
        assert!(!h.collector.is_active(STEAM_ID).await.unwrap());

        h.api.set_playtime(440, 121);
        assert!(h.collector.is_active(STEAM_ID).await.unwrap());
        assert!(h.collector.is_active(STEAM_ID).await.unwrap());
    }

    #[tokio::test]
    async fn blocked_coordinator_reports_inactive() {
        let h = harness(vec![game(440, "Team Fortress 2", 120)]).await;
        h.collector.coordinator().record_403().await;
        assert!(!h.collector.is_active(STEAM_ID).await.unwrap());
        assert!(h.api.calls().is_empty());
    }
}
