/// Log tags identify the subsystem a message originates from
///
/// Each tag maps to a `--debug-<key>` command-line flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Cache,
    Decoder,
    RateLimit,
    Freshness,
    Steam,
    Osrs,
    Metrics,
    Webserver,
    Poller,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used in `--debug-<key>` flags and in the enabled-tags filter
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Decoder => "decoder".to_string(),
            LogTag::RateLimit => "ratelimit".to_string(),
            LogTag::Freshness => "freshness".to_string(),
            LogTag::Steam => "steam".to_string(),
            LogTag::Osrs => "osrs".to_string(),
            LogTag::Metrics => "metrics".to_string(),
            LogTag::Webserver => "webserver".to_string(),
            LogTag::Poller => "poller".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uncolored label used in plain-text output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::Other(s) => s.to_uppercase(),
            other => other.to_debug_key().to_uppercase(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
