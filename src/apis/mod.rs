/// Upstream API clients
///
/// Each client owns its `HttpClient` and exposes its operations through a
/// trait (`SteamApi`, `OsrsApi`) so collectors can be driven by fakes.
pub mod client;
pub mod osrs;
pub mod steam;

pub use client::{HttpClient, RateLimiter};
pub use osrs::{HiscoreMode, OsrsApi, OsrsClient, PlayerStats};
pub use steam::{SteamApi, SteamClient};
