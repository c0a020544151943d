/// Configuration schemas - every section defined once with its defaults
///
/// Each struct is declared through `config_struct!`, so a TOML file only needs
/// to mention the values it overrides.
use crate::config_struct;
use std::time::Duration;

// ============================================================================
// HTTP SERVER
// ============================================================================

config_struct! {
    /// Metrics HTTP server
    pub struct ServerConfig {
        host: String = "0.0.0.0".to_string(),
        port: u16 = 8000,
    }
}

// ============================================================================
// CACHE
// ============================================================================

config_struct! {
    /// Shared key-value cache backing store
    pub struct CacheConfig {
        /// SQLite file holding cached payloads and rate-limit state
        database_path: String = "data/cache.db".to_string(),
        /// Use a process-local store instead (state does not survive restarts)
        in_memory: bool = false,
        /// Interval between purges of expired rows
        purge_interval_secs: u64 = 3600,
    }
}

// ============================================================================
// STEAM
// ============================================================================

config_struct! {
    /// Steam Web API access
    pub struct SteamConfig {
        /// Web API key; Steam collection is disabled when empty
        api_key: String = String::new(),
        request_timeout_secs: u64 = 10,
        /// Pause before each per-game achievement request
        achievement_request_delay_ms: u64 = 5000,
    }
}

impl SteamConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn achievement_request_delay(&self) -> Duration {
        Duration::from_millis(self.achievement_request_delay_ms)
    }
}

// ============================================================================
// OSRS
// ============================================================================

config_struct! {
    /// Old School RuneScape hiscores and world list access
    ///
    /// The world-id window and the decoder bounds are observed from the live
    /// service, not taken from any protocol document. Recheck them against the
    /// upstream before tightening.
    pub struct OsrsConfig {
        /// World list payloads are large, so this is longer than Steam's
        request_timeout_secs: u64 = 30,
        world_id_min: u16 = 300,
        world_id_max: u16 = 700,
        /// Declared counts above this are treated as corrupted
        max_declared_worlds: i32 = 200,
        /// Upper bound on records attempted in iterative mode
        max_iterative_attempts: usize = 300,
        /// Bytes scanned forward when the first iterative record is misaligned
        realign_window: usize = 20,
    }
}

impl OsrsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// POLLING
// ============================================================================

config_struct! {
    /// Background refresh cadence
    pub struct PollingConfig {
        enabled: bool = true,
        interval_normal_secs: u64 = 900,
        interval_active_secs: u64 = 300,
        world_interval_secs: u64 = 300,
    }
}

impl PollingConfig {
    pub fn interval_normal(&self) -> Duration {
        Duration::from_secs(self.interval_normal_secs.max(1))
    }

    pub fn interval_active(&self) -> Duration {
        Duration::from_secs(self.interval_active_secs.max(1))
    }

    pub fn world_interval(&self) -> Duration {
        Duration::from_secs(self.world_interval_secs.max(1))
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration
    pub struct Config {
        server: ServerConfig = ServerConfig::default(),
        cache: CacheConfig = CacheConfig::default(),
        steam: SteamConfig = SteamConfig::default(),
        osrs: OsrsConfig = OsrsConfig::default(),
        polling: PollingConfig = PollingConfig::default(),
    }
}
