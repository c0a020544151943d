/// Shared application state for the webserver
///
/// Holds the collectors, the exporter's own metrics and the optional poller
/// that route handlers register entities with.
use crate::collectors::{OsrsCollector, SteamCollector};
use crate::metrics::ExporterMetrics;
use crate::poller::{Entity, Poller};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no Steam API key is configured
    pub steam: Option<Arc<SteamCollector>>,
    pub osrs: Arc<OsrsCollector>,
    pub metrics: Arc<ExporterMetrics>,
    /// `None` when background polling is disabled
    pub poller: Option<Arc<Poller>>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        steam: Option<Arc<SteamCollector>>,
        osrs: Arc<OsrsCollector>,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            steam,
            osrs,
            metrics,
            poller: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_poller(mut self, poller: Arc<Poller>) -> Self {
        self.poller = Some(poller);
        self
    }

    /// Hand an entity to the background poller, if one is running
    pub fn register(&self, entity: Entity) {
        if let Some(poller) = &self.poller {
            poller.register(entity);
        }
    }

    pub fn tracked_entities(&self) -> usize {
        self.poller.as_ref().map_or(0, |p| p.tracked_count())
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
