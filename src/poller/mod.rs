//! Background refresh of registered entities
//!
//! Each Steam user or OSRS player gets its own task the first time it is
//! requested. A task sleeps for the normal interval, refreshes the entity and
//! switches to the active interval while the collector reports activity. The
//! world list has a single fixed-interval task.
//!
//! All tasks watch one shutdown channel and exit at their next await point.
//! Every collector operation they call is cache-backed, so an aborted refresh
//! leaves at worst a stale entry behind.

use crate::apis::osrs::HiscoreMode;
use crate::collectors::{OsrsCollector, SteamCollector};
use crate::config::PollingConfig;
use crate::errors::AcquisitionError;
use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    Steam(String),
    Osrs { rsn: String, mode: HiscoreMode },
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Steam(steam_id) => write!(f, "steam:{}", steam_id),
            Entity::Osrs { rsn, mode } => write!(f, "osrs:{}:{}", mode, rsn),
        }
    }
}

pub struct Poller {
    steam: Option<Arc<SteamCollector>>,
    osrs: Arc<OsrsCollector>,
    config: PollingConfig,
    shutdown: watch::Receiver<bool>,
    tracked: Mutex<HashSet<Entity>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(
        steam: Option<Arc<SteamCollector>>,
        osrs: Arc<OsrsCollector>,
        config: PollingConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Arc<Self> {
        Arc::new(Self {
            steam,
            osrs,
            config,
            shutdown,
            tracked: Mutex::new(HashSet::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Start polling an entity; returns false when it was already tracked
    /// or cannot be polled
    pub fn register(self: &Arc<Self>, entity: Entity) -> bool {
        if self.is_shutting_down() {
            return false;
        }
        if matches!(entity, Entity::Steam(_)) && self.steam.is_none() {
            return false;
        }
        if !self.tracked.lock().insert(entity.clone()) {
            return false;
        }

        logger::info(
            LogTag::Poller,
            &format!(
                "Registered entity={} interval={}s",
                entity,
                self.config.interval_normal().as_secs()
            ),
        );

        let handle = tokio::spawn(Arc::clone(self).run_entity(entity));
        self.tasks.lock().push(handle);
        true
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.lock().len()
    }

    pub fn start_world_polling(self: &Arc<Self>) {
        let handle = tokio::spawn(Arc::clone(self).run_worlds());
        self.tasks.lock().push(handle);
    }

    /// Wait for every task to exit after the shutdown signal was sent
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        let count = handles.len();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                logger::warning(LogTag::Poller, &format!("Poll task ended abnormally: {}", e));
            }
        }
        logger::info(LogTag::Poller, &format!("Stopped tasks={}", count));
    }

    /// Sleep for `duration`; false when shutdown arrived first
    async fn wait(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => true,
            changed = shutdown.changed() => changed.is_ok() && !*shutdown.borrow(),
        }
    }

    async fn run_entity(self: Arc<Self>, entity: Entity) {
        let mut shutdown = self.shutdown.clone();
        let mut interval = self.config.interval_normal();

        while Self::wait(&mut shutdown, interval).await {
            let active = match self.poll_entity(&entity).await {
                Ok(active) => active,
                Err(e) => {
                    logger::warning(
                        LogTag::Poller,
                        &format!("Poll failed entity={} error={}", entity, e),
                    );
                    false
                }
            };

            let next = if active {
                self.config.interval_active()
            } else {
                self.config.interval_normal()
            };
            if next != interval {
                logger::info(
                    LogTag::Poller,
                    &format!(
                        "Interval changed entity={} active={} interval={}s",
                        entity,
                        active,
                        next.as_secs()
                    ),
                );
            }
            interval = next;
        }

        logger::debug(LogTag::Poller, &format!("Task exiting entity={}", entity));
    }

    async fn poll_entity(&self, entity: &Entity) -> Result<bool, AcquisitionError> {
        match entity {
            Entity::Steam(steam_id) => {
                let Some(steam) = &self.steam else {
                    return Ok(false);
                };
                if let Err(e) = steam.collect(steam_id).await {
                    logger::warning(
                        LogTag::Poller,
                        &format!("Steam refresh failed steam_id={} error={}", steam_id, e),
                    );
                }
                steam.is_active(steam_id).await
            }
            // One hiscores call both refreshes the snapshot and detects activity
            Entity::Osrs { rsn, mode } => self.osrs.is_active(rsn, *mode).await,
        }
    }

    async fn run_worlds(self: Arc<Self>) {
        let mut shutdown = self.shutdown.clone();
        let interval = self.config.world_interval();
        logger::info(
            LogTag::Poller,
            &format!("World list polling every {}s", interval.as_secs()),
        );

        while Self::wait(&mut shutdown, interval).await {
            if let Err(e) = self.osrs.refresh_worlds().await {
                logger::warning(LogTag::Poller, &format!("World refresh failed error={}", e));
            }
        }

        logger::debug(LogTag::Poller, "World task exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::osrs::{parse_hiscores_csv, OsrsApi, PlayerStats};
    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::errors::ApiError;
    use crate::freshness::FreshnessPolicy;
    use crate::metrics::ExporterMetrics;
    use crate::worlds::testing::{payload, sample_world};
    use crate::worlds::{WorldFeedDecoder, WorldFlags};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingOsrs {
        hiscore_calls: AtomicUsize,
        feed_calls: AtomicUsize,
        xp: AtomicI64,
    }

    #[async_trait]
    impl OsrsApi for CountingOsrs {
        async fn get_player_stats(
            &self,
            rsn: &str,
            mode: HiscoreMode,
        ) -> Result<PlayerStats, ApiError> {
            self.hiscore_calls.fetch_add(1, Ordering::SeqCst);
            let xp = self.xp.load(Ordering::SeqCst);
            parse_hiscores_csv(rsn, mode, &format!("1,99,{}\n", xp))
        }

        async fn fetch_world_feed(&self) -> Result<Vec<u8>, ApiError> {
            self.feed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(payload(
                1,
                &[sample_world(301, WorldFlags(0), "Trade", 0, 900)],
            ))
        }
    }

    fn config() -> PollingConfig {
        PollingConfig {
            enabled: true,
            interval_normal_secs: 60,
            interval_active_secs: 10,
            world_interval_secs: 30,
        }
    }

    fn setup() -> (Arc<Poller>, Arc<CountingOsrs>, watch::Sender<bool>) {
        let clock = ManualClock::default();
        let cache = Arc::new(MemoryCache::new(Arc::new(clock)));
        let api = Arc::new(CountingOsrs::default());
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let osrs = Arc::new(OsrsCollector::new(
            api.clone(),
            cache,
            WorldFeedDecoder::default(),
            FreshnessPolicy::new(),
            metrics,
        ));
        let (tx, rx) = watch::channel(false);
        (Poller::new(None, osrs, config(), rx), api, tx)
    }

    fn zezima() -> Entity {
        Entity::Osrs {
            rsn: "Zezima".to_string(),
            mode: HiscoreMode::Vanilla,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn registration_is_idempotent() {
        let (poller, _api, _tx) = setup();
        assert!(poller.register(zezima()));
        assert!(!poller.register(zezima()));
        assert_eq!(poller.tracked_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn steam_is_not_polled_without_a_collector() {
        let (poller, _api, _tx) = setup();
        assert!(!poller.register(Entity::Steam("76561197960287930".to_string())));
        assert_eq!(poller.tracked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn switches_to_active_interval_while_xp_grows() {
        let (poller, api, _tx) = setup();
        poller.register(zezima());

        // Nothing before the first normal interval
        sleep(Duration::from_secs(59)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 0);

        // First observation is undetermined, so the normal interval stays
        sleep(Duration::from_secs(2)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 1);

        api.xp.fetch_add(500, Ordering::SeqCst);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 2);

        // Active now: the next poll comes after the short interval
        sleep(Duration::from_secs(10)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 3);

        // Idle again: back to the normal interval
        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn world_task_refreshes_on_its_own_interval() {
        let (poller, api, _tx) = setup();
        poller.start_world_polling();

        sleep(Duration::from_secs(31)).await;
        assert_eq!(api.feed_calls.load(Ordering::SeqCst), 1);
        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.feed_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_task() {
        let (poller, api, tx) = setup();
        poller.register(zezima());
        poller.start_world_polling();

        tx.send(true).unwrap();
        poller.join().await;

        sleep(Duration::from_secs(600)).await;
        assert_eq!(api.hiscore_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.feed_calls.load(Ordering::SeqCst), 0);
        assert!(!poller.register(Entity::Osrs {
            rsn: "Lynx Titan".to_string(),
            mode: HiscoreMode::Vanilla,
        }));
    }
}
