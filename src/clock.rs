/// Wall-clock abstraction so expiry and backoff logic can be tested deterministically
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
///
/// Clones share the same instant, so a clock handed to a cache and a
/// coordinator advances for both.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = add_duration(*now, by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Longest span added to an instant; larger durations saturate here
const MAX_SPAN_DAYS: i64 = 36_500;

/// `at + by`, saturating instead of overflowing
pub fn add_duration(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    let cap = ChronoDuration::days(MAX_SPAN_DAYS);
    let step = ChronoDuration::from_std(by).unwrap_or(cap).min(cap);
    at.checked_add_signed(step).unwrap_or(at)
}

pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_all_clones() {
        let clock = ManualClock::default();
        let other = clock.clone();
        let start = clock.now();

        other.advance(Duration::from_secs(90));

        assert_eq!(clock.now() - start, ChronoDuration::seconds(90));
    }

    #[test]
    fn huge_durations_saturate() {
        let start = Utc::now();
        let later = add_duration(start, Duration::from_secs(u64::MAX));
        assert_eq!(later - start, ChronoDuration::days(MAX_SPAN_DAYS));
    }
}
