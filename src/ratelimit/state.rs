/// Persisted rate-limit record and backoff arithmetic
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

/// Backoff schedule: `min(initial * 2^(n-1), max)` for the n-th rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Added to the remaining window when choosing the persisted TTL
    pub safety_margin: Duration,
    /// Persisted TTL while not blocked
    pub idle_ttl: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: HOUR,
            max: 24 * HOUR,
            safety_margin: HOUR,
            idle_ttl: 24 * HOUR,
        }
    }
}

impl BackoffPolicy {
    pub fn backoff_for(&self, consecutive_rejections: u32) -> Duration {
        let exponent = consecutive_rejections.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    #[serde(rename = "is_rate_limited")]
    pub is_blocked: bool,
    pub blocked_until: DateTime<Utc>,
    #[serde(rename = "consecutive_403")]
    pub consecutive_rejections: u32,
    pub backoff_hours: u32,
}

impl RateLimitState {
    pub fn clear(now: DateTime<Utc>) -> Self {
        Self {
            is_blocked: false,
            blocked_until: now,
            consecutive_rejections: 0,
            backoff_hours: 1,
        }
    }

    /// Blocked and the window has not yet elapsed
    pub fn is_active_block(&self, now: DateTime<Utc>) -> bool {
        self.is_blocked && now < self.blocked_until
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.is_active_block(now) {
            (self.blocked_until - now).to_std().unwrap_or_default()
        } else {
            Duration::ZERO
        }
    }

    /// Lifetime of the persisted record: the window plus a margin while
    /// blocked, otherwise the idle TTL
    pub fn persist_ttl(&self, now: DateTime<Utc>, policy: &BackoffPolicy) -> Duration {
        if self.is_active_block(now) {
            self.remaining(now) + policy.safety_margin
        } else {
            policy.idle_ttl
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_saturates() {
        let policy = BackoffPolicy::default();
        let hours: Vec<u64> = (1..=7)
            .map(|n| policy.backoff_for(n).as_secs() / 3600)
            .collect();
        assert_eq!(hours, vec![1, 2, 4, 8, 16, 24, 24]);
        assert_eq!(policy.backoff_for(1000), policy.max);
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let now = Utc::now();
        let json = serde_json::to_value(RateLimitState::clear(now)).unwrap();
        assert_eq!(json["is_rate_limited"], false);
        assert_eq!(json["consecutive_403"], 0);
        assert_eq!(json["backoff_hours"], 1);
        assert!(json.get("blocked_until").is_some());
    }

    #[test]
    fn persist_ttl_covers_window_plus_margin() {
        let policy = BackoffPolicy::default();
        let now = Utc::now();
        let state = RateLimitState {
            is_blocked: true,
            blocked_until: now + chrono::Duration::hours(2),
            consecutive_rejections: 2,
            backoff_hours: 2,
        };
        assert_eq!(state.persist_ttl(now, &policy), Duration::from_secs(3 * 3600));
        assert_eq!(
            RateLimitState::clear(now).persist_ttl(now, &policy),
            policy.idle_ttl
        );
    }
}
