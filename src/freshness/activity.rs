/// Activity detection from monotonic counters
use super::policy::{DataClass, FreshnessPolicy};
use crate::cache::{self, SharedCache};
use crate::logger::{self, LogTag};
use std::collections::BTreeMap;

/// Last observed counter per entity key (skill name, app id)
pub type Baseline = BTreeMap<String, i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// A counter increased since the previous fresh fetch
    Active,
    /// Counters are unchanged (or went down)
    Idle,
    /// No previous observation to compare against
    Undetermined,
}

impl Activity {
    /// Only an increase counts; a decrease is never activity
    pub fn from_counters(previous: Option<i64>, current: i64) -> Self {
        match previous {
            Some(previous) if current > previous => Activity::Active,
            Some(_) => Activity::Idle,
            None => Activity::Undetermined,
        }
    }

    /// Active when any key present in both maps increased
    pub fn from_baselines(previous: &Baseline, current: &Baseline) -> Self {
        if previous.is_empty() {
            return Activity::Undetermined;
        }

        let increased = current.iter().any(|(key, value)| {
            Self::from_counters(previous.get(key).copied(), *value) == Activity::Active
        });

        if increased {
            Activity::Active
        } else {
            Activity::Idle
        }
    }

    pub fn is_active(self) -> bool {
        self == Activity::Active
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Active => "active",
            Activity::Idle => "idle",
            Activity::Undetermined => "undetermined",
        }
    }
}

/// Baseline comparisons backed by the shared cache
///
/// `observe` must only be called with freshly fetched counters; cache hits
/// use `peek` so the baseline keeps pointing at the last real observation.
/// The read-compare-write in `observe` is not atomic across concurrent
/// refreshes of the same key.
#[derive(Clone)]
pub struct ActivityDetector {
    cache: SharedCache,
    policy: FreshnessPolicy,
}

impl ActivityDetector {
    pub fn new(cache: SharedCache, policy: FreshnessPolicy) -> Self {
        Self { cache, policy }
    }

    pub async fn load_baseline(&self, key: &str) -> Baseline {
        cache::read_or_miss::<Baseline>(self.cache.as_ref(), key, LogTag::Freshness)
            .await
            .unwrap_or_default()
    }

    /// Compare against the stored baseline without updating it
    pub async fn peek(&self, key: &str, current: &Baseline) -> Activity {
        let previous = self.load_baseline(key).await;
        Activity::from_baselines(&previous, current)
    }

    /// Compare against the stored baseline, then replace it with `current`
    pub async fn observe(&self, key: &str, current: &Baseline) -> Activity {
        let previous = self.load_baseline(key).await;
        let activity = Activity::from_baselines(&previous, current);

        if !current.is_empty() {
            let ttl = self.policy.ttl_for(DataClass::XpBaseline);
            cache::write_logged(self.cache.as_ref(), key, current, ttl, LogTag::Freshness).await;
        }

        logger::debug(
            LogTag::Freshness,
            &format!(
                "Observed counters key={} entries={} activity={}",
                key,
                current.len(),
                activity.as_str()
            ),
        );

        activity
    }
}
