//! Exponential-backoff coordinator for a quota-limited upstream
//!
//! Two states, `Clear` and `Blocked`. A 403 from the upstream opens a backoff
//! window that doubles with each consecutive rejection up to a ceiling. The
//! state is persisted in the shared cache after every mutation so it survives
//! restarts and is visible to other instances sharing the cache.

pub mod coordinator;
pub mod state;

pub use coordinator::RateLimitCoordinator;
pub use state::{BackoffPolicy, RateLimitState};
