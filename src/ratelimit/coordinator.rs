/// Rate-limit coordinator
///
/// Every operation runs load, then mutate, then persist under a single async
/// mutex. Reloading first lets a coordinator observe blocks recorded by
/// another instance sharing the cache; visibility across instances is
/// eventually consistent.
use super::state::{BackoffPolicy, RateLimitState};
use crate::cache::{self, SharedCache};
use crate::clock::{add_duration, SharedClock};
use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

pub struct RateLimitCoordinator {
    service: String,
    cache_key: String,
    cache: SharedCache,
    clock: SharedClock,
    policy: BackoffPolicy,
    state: Mutex<RateLimitState>,
}

impl RateLimitCoordinator {
    /// Construct against the shared cache, adopting any persisted state
    pub async fn load(
        service: &str,
        cache_key: &str,
        cache: SharedCache,
        clock: SharedClock,
        policy: BackoffPolicy,
    ) -> Self {
        let initial = RateLimitState::clear(clock.now());
        let coordinator = Self {
            service: service.to_string(),
            cache_key: cache_key.to_string(),
            cache,
            clock,
            policy,
            state: Mutex::new(initial),
        };

        {
            let mut state = coordinator.state.lock().await;
            coordinator.sync_from_cache(&mut state).await;
            if state.is_blocked {
                logger::info(
                    LogTag::RateLimit,
                    &format!(
                        "Loaded persisted rate limit service={} blocked_until={} consecutive_403={}",
                        coordinator.service, state.blocked_until, state.consecutive_rejections
                    ),
                );
            }
        }

        coordinator
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// `true` while a backoff window is active; callers must not hit the upstream
    ///
    /// An elapsed window is cleared and persisted before returning `false`.
    pub async fn check_and_block(&self) -> bool {
        let mut state = self.state.lock().await;
        self.sync_from_cache(&mut state).await;
        let now = self.clock.now();

        if !state.is_blocked {
            return false;
        }

        if state.is_active_block(now) {
            logger::warning(
                LogTag::RateLimit,
                &format!(
                    "{} rate limited, skipping upstream call blocked_until={} remaining_secs={} backoff_hours={}",
                    self.service,
                    state.blocked_until,
                    state.remaining(now).as_secs(),
                    state.backoff_hours
                ),
            );
            return true;
        }

        *state = RateLimitState::clear(now);
        self.persist(&state).await;
        logger::info(
            LogTag::RateLimit,
            &format!("{} backoff window expired, resuming calls", self.service),
        );
        false
    }

    /// Record an upstream 403 and open (or extend) the backoff window
    pub async fn record_403(&self) -> RateLimitState {
        let mut state = self.state.lock().await;
        self.sync_from_cache(&mut state).await;
        let now = self.clock.now();

        state.consecutive_rejections = state.consecutive_rejections.saturating_add(1);
        let backoff = self.policy.backoff_for(state.consecutive_rejections);
        state.is_blocked = true;
        state.blocked_until = add_duration(now, backoff);
        state.backoff_hours = (backoff.as_secs() / 3600) as u32;

        logger::error(
            LogTag::RateLimit,
            &format!(
                "{} returned 403, backing off consecutive_403={} backoff_hours={} blocked_until={}",
                self.service, state.consecutive_rejections, state.backoff_hours, state.blocked_until
            ),
        );

        self.persist(&state).await;
        state.clone()
    }

    /// Reset the rejection counter unless a backoff window is still active
    pub async fn record_success(&self) {
        let mut state = self.state.lock().await;
        self.sync_from_cache(&mut state).await;
        let now = self.clock.now();

        if state.is_active_block(now) {
            logger::debug(
                LogTag::RateLimit,
                &format!(
                    "{} success inside active window, keeping backoff until {}",
                    self.service, state.blocked_until
                ),
            );
            return;
        }

        *state = RateLimitState::clear(now);
        self.persist(&state).await;
    }

    pub async fn snapshot(&self) -> RateLimitState {
        self.state.lock().await.clone()
    }

    /// End of the active window, if any
    pub async fn blocked_until(&self) -> Option<DateTime<Utc>> {
        let state = self.state.lock().await;
        state
            .is_active_block(self.clock.now())
            .then_some(state.blocked_until)
    }

    /// Adopt the persisted record when one exists
    ///
    /// A missing record or a failed read keeps the in-memory state, so a
    /// backoff is never dropped because the store was briefly unavailable.
    async fn sync_from_cache(&self, state: &mut RateLimitState) {
        match cache::get_json::<RateLimitState>(self.cache.as_ref(), &self.cache_key).await {
            Ok(Some(persisted)) => {
                if persisted != *state {
                    logger::debug(
                        LogTag::RateLimit,
                        &format!(
                            "Synced {} state from cache blocked={} consecutive_403={}",
                            self.service, persisted.is_blocked, persisted.consecutive_rejections
                        ),
                    );
                }
                *state = persisted;
            }
            Ok(None) => {}
            Err(e) => logger::warning(
                LogTag::RateLimit,
                &format!("Failed to load {} rate limit state: {}", self.service, e),
            ),
        }
    }

    async fn persist(&self, state: &RateLimitState) {
        let ttl = state.persist_ttl(self.clock.now(), &self.policy);
        cache::write_logged(
            self.cache.as_ref(),
            &self.cache_key,
            state,
            ttl,
            LogTag::RateLimit,
        )
        .await;
    }
}
