//! Activity-adaptive cache freshness
//!
//! Activity is inferred by comparing monotonic counters (playtime minutes,
//! experience points) against the values observed at the previous fresh
//! fetch. The TTL table then picks short lifetimes for active entities and
//! long ones for idle or reference data, with per-write random jitter.

pub mod activity;
pub mod policy;

pub use activity::{Activity, ActivityDetector, Baseline};
pub use policy::{DataClass, FreshnessPolicy, TtlRule};
