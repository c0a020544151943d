/// The exporter's own metrics, served on `/metrics`
use super::encode;
use prometheus::{IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

/// Outcome label values for `exporter_collections_total`
pub const OUTCOME_FRESH: &str = "fresh";
pub const OUTCOME_CACHED: &str = "cached";
pub const OUTCOME_FALLBACK: &str = "fallback";
pub const OUTCOME_ERROR: &str = "error";

pub struct ExporterMetrics {
    registry: Registry,
    collections: IntCounterVec,
    rate_limit_blocked: IntGaugeVec,
    world_feed_records: IntGauge,
    world_feed_truncated: IntGauge,
}

impl ExporterMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let collections = IntCounterVec::new(
            Opts::new(
                "exporter_collections_total",
                "Collections by data source and how they were satisfied",
            ),
            &["source", "outcome"],
        )?;
        let rate_limit_blocked = IntGaugeVec::new(
            Opts::new(
                "exporter_rate_limit_blocked",
                "1 while the upstream's backoff window is active",
            ),
            &["service"],
        )?;
        let world_feed_records = IntGauge::new(
            "exporter_world_feed_records",
            "Worlds decoded from the last fresh world list payload",
        )?;
        let world_feed_truncated = IntGauge::new(
            "exporter_world_feed_truncated",
            "1 when the last fresh world list payload was truncated",
        )?;

        registry.register(Box::new(collections.clone()))?;
        registry.register(Box::new(rate_limit_blocked.clone()))?;
        registry.register(Box::new(world_feed_records.clone()))?;
        registry.register(Box::new(world_feed_truncated.clone()))?;

        Ok(Self {
            registry,
            collections,
            rate_limit_blocked,
            world_feed_records,
            world_feed_truncated,
        })
    }

    pub fn record_collection(&self, source: &str, outcome: &str) {
        self.collections.with_label_values(&[source, outcome]).inc();
    }

    pub fn collections(&self, source: &str, outcome: &str) -> u64 {
        self.collections.with_label_values(&[source, outcome]).get()
    }

    pub fn set_rate_limit_blocked(&self, service: &str, blocked: bool) {
        self.rate_limit_blocked
            .with_label_values(&[service])
            .set(i64::from(blocked));
    }

    pub fn record_world_feed(&self, records: usize, truncated: bool) {
        self.world_feed_records
            .set(i64::try_from(records).unwrap_or(i64::MAX));
        self.world_feed_truncated.set(i64::from(truncated));
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        encode(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_recorded_values() {
        let metrics = ExporterMetrics::new().unwrap();
        metrics.record_collection("steam", OUTCOME_FRESH);
        metrics.record_collection("steam", OUTCOME_FRESH);
        metrics.set_rate_limit_blocked("steam", true);
        metrics.record_world_feed(187, true);

        assert_eq!(metrics.collections("steam", OUTCOME_FRESH), 2);
        let text = metrics.render().unwrap();
        assert!(text.contains("exporter_collections_total{outcome=\"fresh\",source=\"steam\"} 2"));
        assert!(text.contains("exporter_rate_limit_blocked{service=\"steam\"} 1"));
        assert!(text.contains("exporter_world_feed_records 187"));
        assert!(text.contains("exporter_world_feed_truncated 1"));
    }
}
