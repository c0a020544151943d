use super::schemas::Config;
/// Configuration utilities - loading, environment overrides, and access helpers
///
/// Resolution order for every value:
/// 1. Built-in defaults from the schema definitions
/// 2. The TOML file (`data/config.toml` or `--config <path>`)
/// 3. Environment variables (`STEAM_KEY`, `PORT`, `CACHE_PATH`,
///    `POLL_INTERVAL_NORMAL`, `POLL_INTERVAL_ACTIVE`)
use once_cell::sync::OnceCell;
use std::sync::RwLock;
use std::time::Duration;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from a specific file path, apply environment overrides,
/// and initialize the global CONFIG
///
/// A missing file is not an error; defaults are used instead.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = read_config_file(path)?;
    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Parse a TOML file into a Config, falling back to defaults when absent
pub fn read_config_file(path: &str) -> Result<Config, String> {
    if !std::path::Path::new(path).exists() {
        eprintln!("Config file '{}' not found, using default values", path);
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))
}

/// Apply environment overrides on top of a parsed configuration
///
/// `lookup` returns the raw value of a variable; empty values are ignored.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config, String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("STEAM_KEY") {
        config.steam.api_key = key.trim().to_string();
    }

    if let Some(port) = get("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| format!("Invalid PORT '{}': {}", port, e))?;
    }

    if let Some(path) = get("CACHE_PATH") {
        config.cache.database_path = path.trim().to_string();
    }

    if let Some(raw) = get("POLL_INTERVAL_NORMAL") {
        config.polling.interval_normal_secs = parse_duration(&raw)
            .map_err(|e| format!("Invalid POLL_INTERVAL_NORMAL: {}", e))?
            .as_secs();
    }

    if let Some(raw) = get("POLL_INTERVAL_ACTIVE") {
        config.polling.interval_active_secs = parse_duration(&raw)
            .map_err(|e| format!("Invalid POLL_INTERVAL_ACTIVE: {}", e))?
            .as_secs();
    }

    Ok(config)
}

/// Parse a duration such as `15m`, `30s`, `1h` or `1h30m`
///
/// A bare number is read as seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let multiplier = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            _ => return Err(format!("unknown unit '{}' in '{}'", ch, input)),
        };

        if digits.is_empty() {
            return Err(format!("missing number before '{}' in '{}'", ch, input));
        }

        let value: u64 = digits
            .parse()
            .map_err(|e| format!("invalid number in '{}': {}", input, e))?;
        total = total.saturating_add(value.saturating_mul(multiplier));
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after '{}' in '{}'", digits, input));
    }

    Ok(Duration::from_secs(total))
}

/// Execute a function with read access to the configuration
///
/// Before `load_config_from_path` runs, the closure sees the built-in defaults.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => match lock.read() {
            Ok(config) => f(&config),
            Err(poisoned) => f(&poisoned.into_inner()),
        },
        None => f(&Config::default()),
    }
}

/// Get a cloned snapshot of the full configuration
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}
