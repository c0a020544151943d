/// Centralized argument handling for the exporter
///
/// Stores the process arguments once and offers flag/value lookups used by the
/// logger (`--debug-<module>`, `--verbose`, `--quiet`) and by startup
/// (`--config <path>`, `--port <port>`, `--help`).
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Accepts both `--flag value` and `--flag=value`
pub fn get_arg_value(flag: &str) -> Option<String> {
    value_from(&get_cmd_args(), flag)
}

fn value_from(args: &[String], flag: &str) -> Option<String> {
    let inline_prefix = format!("{}=", flag);
    for (i, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&inline_prefix) {
            return Some(value.to_string());
        }
        if arg == flag {
            return args.get(i + 1).cloned();
        }
    }
    None
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Config file path override (`--config <path>`)
pub fn config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Listen port override (`--port <port>`)
pub fn port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|p| p.parse().ok())
}

/// Disable the background poller (`--no-poll`)
pub fn is_polling_disabled() -> bool {
    has_arg("--no-poll")
}

pub fn print_help() {
    println!("game-stats-exporter - Prometheus exporter for Steam and OSRS statistics");
    println!();
    println!("USAGE:");
    println!("    game-stats-exporter [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>        TOML configuration file (default: data/config.toml)");
    println!("    --port <port>          Override the listen port");
    println!("    --no-poll              Do not start background polling");
    println!("    --debug-<module>       Enable debug logs for a module");
    println!("                           (system, config, cache, decoder, ratelimit,");
    println!("                            freshness, steam, osrs, metrics, webserver, poller, all)");
    println!("    --only=<a,b>           Only print logs for the listed modules");
    println!("    --verbose              Enable verbose logs");
    println!("    --quiet                Only print errors");
    println!("    -h, --help             Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    STEAM_KEY, PORT, CACHE_PATH, POLL_INTERVAL_NORMAL, POLL_INTERVAL_ACTIVE");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_separate_and_inline_values() {
        let list = args(&["bin", "--config", "custom.toml", "--port=9100"]);
        assert_eq!(value_from(&list, "--config").as_deref(), Some("custom.toml"));
        assert_eq!(value_from(&list, "--port").as_deref(), Some("9100"));
        assert_eq!(value_from(&list, "--missing"), None);
    }

    #[test]
    fn trailing_flag_has_no_value() {
        let list = args(&["bin", "--config"]);
        assert_eq!(value_from(&list, "--config"), None);
    }
}
