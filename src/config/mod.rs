/// Configuration system
///
/// - `macros`: the `config_struct!` declaration macro
/// - `schemas`: every configuration section with defaults
/// - `utils`: loading, environment overrides, global access
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{CacheConfig, Config, OsrsConfig, PollingConfig, ServerConfig, SteamConfig};
pub use utils::{
    apply_env_overrides, get_config_clone, load_config_from_path, parse_duration, with_config,
    CONFIG_FILE_PATH,
};
