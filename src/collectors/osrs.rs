/// OSRS collector
///
/// Player snapshots are cached for a fixed window. Activity is tracked
/// separately from the snapshot: each fresh hiscores fetch compares per-skill
/// XP with the stored baseline and replaces it, so cache hits never move it.
use crate::apis::osrs::{validate_player_name, HiscoreMode, OsrsApi, PlayerStats, SERVICE};
use crate::cache::{self, keys, SharedCache};
use crate::errors::AcquisitionError;
use crate::freshness::{Activity, ActivityDetector, DataClass, FreshnessPolicy};
use crate::logger::{self, LogTag};
use crate::metrics::exporter::{ExporterMetrics, OUTCOME_CACHED, OUTCOME_ERROR, OUTCOME_FRESH};
use crate::worlds::{DecodeOutcome, WorldFeedDecoder};
use std::sync::Arc;

/// `exporter_collections_total` source label for the world list
pub const WORLDS_SOURCE: &str = "osrs_worlds";

pub struct OsrsCollector {
    api: Arc<dyn OsrsApi>,
    cache: SharedCache,
    decoder: WorldFeedDecoder,
    policy: FreshnessPolicy,
    detector: ActivityDetector,
    metrics: Arc<ExporterMetrics>,
}

impl OsrsCollector {
    pub fn new(
        api: Arc<dyn OsrsApi>,
        cache: SharedCache,
        decoder: WorldFeedDecoder,
        policy: FreshnessPolicy,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        let detector = ActivityDetector::new(cache.clone(), policy);
        Self {
            api,
            cache,
            decoder,
            policy,
            detector,
            metrics,
        }
    }

    /// Cached snapshot when present, otherwise a fresh fetch
    pub async fn collect_player(
        &self,
        rsn: &str,
        mode: HiscoreMode,
    ) -> Result<PlayerStats, AcquisitionError> {
        validate_player_name(rsn)?;
        let key = keys::osrs_player_stats(rsn, mode.as_str());

        if let Some(stats) =
            cache::read_or_miss::<PlayerStats>(self.cache.as_ref(), &key, LogTag::Osrs).await
        {
            self.metrics.record_collection(SERVICE, OUTCOME_CACHED);
            return Ok(stats);
        }

        let (stats, _) = self.fetch_player(rsn, mode).await?;
        Ok(stats)
    }

    /// Fresh fetch that bypasses and rewrites the snapshot cache
    pub async fn refresh(
        &self,
        rsn: &str,
        mode: HiscoreMode,
    ) -> Result<Activity, AcquisitionError> {
        validate_player_name(rsn)?;
        let (_, activity) = self.fetch_player(rsn, mode).await?;
        Ok(activity)
    }

    /// A first observation is undetermined and reported as inactive
    pub async fn is_active(&self, rsn: &str, mode: HiscoreMode) -> Result<bool, AcquisitionError> {
        Ok(self.refresh(rsn, mode).await?.is_active())
    }

    async fn fetch_player(
        &self,
        rsn: &str,
        mode: HiscoreMode,
    ) -> Result<(PlayerStats, Activity), AcquisitionError> {
        let stats = match self.api.get_player_stats(rsn, mode).await {
            Ok(stats) => stats,
            Err(e) => {
                self.metrics.record_collection(SERVICE, OUTCOME_ERROR);
                logger::warning(
                    LogTag::Osrs,
                    &format!("Hiscores fetch failed player={} mode={} error={}", rsn, mode, e),
                );
                return Err(e.into());
            }
        };

        let key = keys::osrs_player_stats(rsn, mode.as_str());
        let ttl = self.policy.ttl_for(DataClass::PlayerStats);
        cache::write_logged(self.cache.as_ref(), &key, &stats, ttl, LogTag::Osrs).await;

        let baseline_key = keys::osrs_last_xp(rsn, mode.as_str());
        let activity = self
            .detector
            .observe(&baseline_key, &stats.xp_by_skill())
            .await;

        self.metrics.record_collection(SERVICE, OUTCOME_FRESH);
        logger::info(
            LogTag::Osrs,
            &format!(
                "Fetched hiscores player={} mode={} skills={} activities={} activity={}",
                rsn,
                mode,
                stats.skills.len(),
                stats.activities.len(),
                activity.as_str()
            ),
        );

        Ok((stats, activity))
    }

    /// Cached world list when present, otherwise a fresh fetch
    pub async fn collect_worlds(&self) -> Result<DecodeOutcome, AcquisitionError> {
        if let Some(outcome) = cache::read_or_miss::<DecodeOutcome>(
            self.cache.as_ref(),
            keys::OSRS_WORLD_DATA,
            LogTag::Osrs,
        )
        .await
        {
            self.metrics.record_collection(WORLDS_SOURCE, OUTCOME_CACHED);
            return Ok(outcome);
        }
        self.refresh_worlds().await
    }

    /// Fetch and decode the feed, replacing the cached world list
    pub async fn refresh_worlds(&self) -> Result<DecodeOutcome, AcquisitionError> {
        let outcome = match self.fetch_worlds().await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_collection(WORLDS_SOURCE, OUTCOME_ERROR);
                logger::warning(LogTag::Osrs, &format!("World list failed error={}", e));
                return Err(e);
            }
        };

        let ttl = self.policy.ttl_for(DataClass::WorldList);
        cache::write_logged(
            self.cache.as_ref(),
            keys::OSRS_WORLD_DATA,
            &outcome,
            ttl,
            LogTag::Osrs,
        )
        .await;

        self.metrics
            .record_world_feed(outcome.records.len(), outcome.truncated);
        self.metrics.record_collection(WORLDS_SOURCE, OUTCOME_FRESH);

        if outcome.truncated {
            logger::warning(
                LogTag::Osrs,
                &format!(
                    "World list truncated upstream, serving partial list worlds={}",
                    outcome.records.len()
                ),
            );
        } else {
            logger::info(
                LogTag::Osrs,
                &format!("Fetched world list worlds={}", outcome.records.len()),
            );
        }

        Ok(outcome)
    }

    async fn fetch_worlds(&self) -> Result<DecodeOutcome, AcquisitionError> {
        let raw = self.api.fetch_world_feed().await?;
        Ok(self.decoder.decode(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::osrs::parse_hiscores_csv;
    use crate::cache::{KeyValueCache, MemoryCache};
    use crate::clock::ManualClock;
    use crate::errors::ApiError;
    use crate::worlds::testing::{payload, sample_world, truncated_capture};
    use crate::worlds::WorldFlags;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeOsrs {
        xp: Mutex<i64>,
        feed: Mutex<Vec<u8>>,
        hiscore_calls: AtomicUsize,
        feed_calls: AtomicUsize,
    }

    impl FakeOsrs {
        fn new(xp: i64, feed: Vec<u8>) -> Self {
            Self {
                xp: Mutex::new(xp),
                feed: Mutex::new(feed),
                hiscore_calls: AtomicUsize::new(0),
                feed_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OsrsApi for FakeOsrs {
        async fn get_player_stats(
            &self,
            rsn: &str,
            mode: HiscoreMode,
        ) -> Result<PlayerStats, ApiError> {
            self.hiscore_calls.fetch_add(1, Ordering::SeqCst);
            if rsn == "nobody" {
                return Err(ApiError::NotFound {
                    service: SERVICE.to_string(),
                    resource: rsn.to_string(),
                });
            }
            let xp = *self.xp.lock();
            let body = format!("1,1500,{}\n10,99,{}\n", xp, xp);
            parse_hiscores_csv(rsn, mode, &body)
        }

        async fn fetch_world_feed(&self) -> Result<Vec<u8>, ApiError> {
            self.feed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.feed.lock().clone())
        }
    }

    struct Harness {
        collector: OsrsCollector,
        api: Arc<FakeOsrs>,
        cache: Arc<MemoryCache>,
        clock: ManualClock,
        metrics: Arc<ExporterMetrics>,
    }

    fn harness(feed: Vec<u8>) -> Harness {
        let clock = ManualClock::default();
        let cache = Arc::new(MemoryCache::new(Arc::new(clock.clone())));
        let api = Arc::new(FakeOsrs::new(13_034_431, feed));
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let collector = OsrsCollector::new(
            api.clone(),
            cache.clone(),
            WorldFeedDecoder::default(),
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
    async fn player_snapshot_is_cached_for_fifteen_minutes() {
        let h = harness(Vec::new());

        let first = h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        let second = h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_CACHED), 1);

        h.clock.advance(Duration::from_secs(15 * 60 + 1));
        h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn modes_are_cached_separately() {
        let h = harness(Vec::new());
        h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        let grid = h
            .collector
            .collect_player("Zezima", HiscoreMode::Gridmaster)
            .await
            .unwrap();
        assert_eq!(grid.mode, HiscoreMode::Gridmaster);
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let h = harness(Vec::new());
        let err = h
            .collector
            .collect_player("nobody", HiscoreMode::Vanilla)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(h.metrics.collections(SERVICE, OUTCOME_ERROR), 1);
    }

    #[tokio::test]
    async fn overlong_name_never_reaches_upstream() {
        let h = harness(Vec::new());
        let err = h
            .collector
            .collect_player("a_name_far_too_long", HiscoreMode::Vanilla)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn activity_follows_xp_gains_between_fresh_fetches() {
        let h = harness(Vec::new());

        assert_eq!(
            h.collector.refresh("Zezima", HiscoreMode::Vanilla).await.unwrap(),
            Activity::Undetermined
        );
        assert!(!h.collector.is_active("Zezima", HiscoreMode::Vanilla).await.unwrap());

        *h.api.xp.lock() += 250;
        assert!(h.collector.is_active("Zezima", HiscoreMode::Vanilla).await.unwrap());
        assert!(!h.collector.is_active("Zezima", HiscoreMode::Vanilla).await.unwrap());
    }

    #[tokio::test]
    async fn cache_hits_leave_the_baseline_alone() {
        let h = harness(Vec::new());
        h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();

        *h.api.xp.lock() += 250;
        h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 1);

        assert!(h.collector.is_active("Zezima", HiscoreMode::Vanilla).await.unwrap());
    }

    #[tokio::test]
    async fn refresh_rewrites_the_snapshot() {
        let h = harness(Vec::new());
        h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();

        *h.api.xp.lock() = 20_000_000;
        h.collector.refresh("Zezima", HiscoreMode::Vanilla).await.unwrap();

        let stats = h.collector.collect_player("Zezima", HiscoreMode::Vanilla).await.unwrap();
        assert_eq!(stats.skill("Overall").map(|s| s.xp), Some(20_000_000));
        assert_eq!(h.api.hiscore_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn worlds_are_decoded_and_cached() {
        let records = vec![
            sample_world(301, WorldFlags(0), "Trade - Free", 0, 812),
            sample_world(302, WorldFlags::MEMBERS, "Trade - Members", 1, 1503),
        ];
        let h = harness(payload(2, &records));

        let outcome = h.collector.collect_worlds().await.unwrap();
        assert_eq!(outcome.records, records);
        assert!(!outcome.truncated);

        h.collector.collect_worlds().await.unwrap();
        assert_eq!(h.api.feed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.metrics.collections(WORLDS_SOURCE, OUTCOME_CACHED), 1);

        h.clock.advance(Duration::from_secs(5 * 60 + 1));
        h.collector.collect_worlds().await.unwrap();
        assert_eq!(h.api.feed_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn truncated_feed_is_served_and_flagged() {
        let h = harness(truncated_capture());

        let outcome = h.collector.collect_worlds().await.unwrap();
        assert!(outcome.truncated);
        assert!(!outcome.records.is_empty());

        let cached = h.collector.collect_worlds().await.unwrap();
        assert!(cached.truncated);
        assert_eq!(cached.records.len(), outcome.records.len());

        let text = h.metrics.render().unwrap();
        assert!(text.contains("exporter_world_feed_truncated 1"));
    }

    #[tokio::test]
    async fn malformed_feed_is_a_decode_error_and_not_cached() {
        let h = harness(vec![0x01, 0x02]);

        let err = h.collector.collect_worlds().await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Decode(_)));
        assert!(h.cache.get(keys::OSRS_WORLD_DATA).await.unwrap().is_none());
        assert_eq!(h.metrics.collections(WORLDS_SOURCE, OUTCOME_ERROR), 1);
    }
}
