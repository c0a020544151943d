//! Structured logging for the exporter
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Colored, time-prefixed console output with wrapping
//!
//! ## Usage
//!
//! ```rust
//! use game_stats_exporter::logger::{self, LogTag};
//!
//! logger::error(LogTag::Steam, "GetOwnedGames failed");
//! logger::warning(LogTag::RateLimit, "Backoff window active");
//! logger::info(LogTag::Osrs, "Fetched world list");
//! logger::debug(LogTag::Decoder, "Realigned at offset 3"); // Only if --debug-decoder
//! logger::verbose(LogTag::Cache, "Raw entry bytes: ..."); // Only if --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, before any logging occurs:
//! ```rust
//! game_stats_exporter::logger::init();
//! ```

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Scans command-line arguments for `--debug-<module>`, `--verbose` and `--quiet`
/// and installs the resulting configuration.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
///
/// Warnings are shown by default (unless --quiet is used).
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Debug logs are ONLY shown when the --debug-<module> flag for the tag is provided.
///
/// # Example
/// ```rust
/// use game_stats_exporter::logger::{self, LogTag};
///
/// // Only shown with --debug-ratelimit
/// logger::debug(LogTag::RateLimit, "state reloaded from cache");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
///
/// Verbose logs are ONLY shown when --verbose flag is provided.
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
