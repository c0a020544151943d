/// Logger configuration derived from command-line arguments
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments::get_cmd_args;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that may be printed
    pub min_level: LogLevel,
    /// Tags with --debug-<key> enabled
    pub debug_tags: HashSet<String>,
    /// When non-empty, only these tags print below ERROR
    pub enabled_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn set_logger_config(config: LoggerConfig) {
    match LOGGER_CONFIG.write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Build the logger configuration from the global argument store
pub fn init_from_args() {
    set_logger_config(config_from_args(&get_cmd_args()));
}

pub(crate) fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    for arg in args {
        if let Some(key) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(key.to_lowercase());
        } else if let Some(keys) = arg.strip_prefix("--only=") {
            config
                .enabled_tags
                .extend(keys.split(',').map(|k| k.trim().to_lowercase()));
        }
    }

    if !config.debug_tags.is_empty() {
        config.min_level = LogLevel::Debug;
    }
    if args.iter().any(|a| a == "--verbose") {
        config.min_level = LogLevel::Verbose;
    }
    if args.iter().any(|a| a == "--quiet") {
        config.min_level = LogLevel::Error;
    }

    config
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.debug_tags.contains("all") || config.debug_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn debug_flags_raise_level_and_collect_tags() {
        let config = config_from_args(&args(&["bin", "--debug-decoder", "--debug-ratelimit"]));
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.debug_tags.contains("decoder"));
        assert!(config.debug_tags.contains("ratelimit"));
    }

    #[test]
    fn quiet_wins_over_verbose() {
        let config = config_from_args(&args(&["bin", "--verbose", "--quiet"]));
        assert_eq!(config.min_level, LogLevel::Error);
    }

    #[test]
    fn only_filter_is_parsed() {
        let config = config_from_args(&args(&["bin", "--only=steam,osrs"]));
        assert!(config.enabled_tags.contains("steam"));
        assert!(config.enabled_tags.contains("osrs"));
        assert_eq!(config.min_level, LogLevel::Info);
    }
}
