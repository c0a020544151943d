//! Collectors tie the pieces together for one data source:
//! cache lookup, rate-limit gate, upstream call, decode, TTL choice, store.
//!
//! Both collectors are cheap to share behind an `Arc` and hold no per-request
//! state; everything durable lives in the cache.

pub mod osrs;
pub mod steam;

pub use osrs::OsrsCollector;
pub use steam::{GameAchievements, GameReport, SteamCollector, SteamSnapshot};
