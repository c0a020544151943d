/// Cache TTL table with jitter
use super::activity::Activity;
use rand::Rng;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Kinds of cached data, each with its own lifetime rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataClass {
    /// Per-user achievement/stat data, adapts to activity
    UserAchievements,
    /// Global achievement percentages, rarely change
    GlobalAchievements,
    /// Owned games list
    OwnedGames,
    /// Display name lookup
    Username,
    /// Hiscores snapshot
    PlayerStats,
    /// World list snapshot
    WorldList,
    /// Per-skill experience baseline
    XpBaseline,
}

/// `base + uniform[0, jitter)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlRule {
    pub base: Duration,
    pub jitter: Duration,
}

impl TtlRule {
    const fn fixed(secs: u64) -> Self {
        Self {
            base: Duration::from_secs(secs),
            jitter: Duration::ZERO,
        }
    }

    const fn jittered(base_secs: u64, jitter_secs: u64) -> Self {
        Self {
            base: Duration::from_secs(base_secs),
            jitter: Duration::from_secs(jitter_secs),
        }
    }

    /// Smallest and largest TTL this rule can produce
    pub fn bounds(&self) -> (Duration, Duration) {
        (self.base, self.base + self.jitter)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter_secs = self.jitter.as_secs();
        if jitter_secs == 0 {
            return self.base;
        }
        self.base + Duration::from_secs(rng.gen_range(0..jitter_secs))
    }
}

impl DataClass {
    /// Rule applied to confirmed-active entities, when the class adapts
    pub fn active_rule(&self) -> Option<TtlRule> {
        match self {
            DataClass::UserAchievements => Some(TtlRule::jittered(2 * MINUTE, 3 * MINUTE)),
            _ => None,
        }
    }

    /// Rule for idle entities, undetermined activity, and non-adaptive classes
    pub fn default_rule(&self) -> TtlRule {
        match self {
            DataClass::UserAchievements => TtlRule::jittered(4 * HOUR, 2 * HOUR),
            DataClass::GlobalAchievements => TtlRule::jittered(7 * DAY, 12 * HOUR),
            DataClass::OwnedGames => TtlRule::fixed(30 * MINUTE),
            DataClass::Username => TtlRule::jittered(DAY, 2 * HOUR),
            DataClass::PlayerStats => TtlRule::fixed(15 * MINUTE),
            DataClass::WorldList => TtlRule::fixed(5 * MINUTE),
            DataClass::XpBaseline => TtlRule::fixed(DAY),
        }
    }

    pub fn rule(&self, activity: Activity) -> TtlRule {
        match (activity, self.active_rule()) {
            (Activity::Active, Some(rule)) => rule,
            _ => self.default_rule(),
        }
    }
}

/// Chooses a fresh TTL for every cache write
///
/// Jitter is drawn anew on each call so keys refreshed together drift apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessPolicy;

impl FreshnessPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn ttl(&self, class: DataClass, activity: Activity) -> Duration {
        self.ttl_with_rng(class, activity, &mut rand::thread_rng())
    }

    /// TTL for classes that do not adapt to activity
    pub fn ttl_for(&self, class: DataClass) -> Duration {
        self.ttl(class, Activity::Idle)
    }

    pub fn ttl_with_rng<R: Rng>(
        &self,
        class: DataClass,
        activity: Activity,
        rng: &mut R,
    ) -> Duration {
        class.rule(activity).sample(rng)
    }
}
