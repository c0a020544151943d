/// Exporter lifecycle: configuration, wiring, serving, graceful shutdown
use crate::{
    apis::{OsrsClient, SteamClient},
    arguments,
    cache::{keys, MemoryCache, SharedCache, SqliteCache},
    clock::{system_clock, SharedClock},
    collectors::{OsrsCollector, SteamCollector},
    config::{self, Config},
    freshness::FreshnessPolicy,
    logger::{self, LogTag},
    metrics::ExporterMetrics,
    poller::Poller,
    ratelimit::{BackoffPolicy, RateLimitCoordinator},
    webserver::{self, AppState},
    worlds::{DecoderLimits, WorldFeedDecoder},
};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Load configuration, start every component and block until shutdown
pub async fn run_exporter() -> Result<()> {
    let config = load_configuration()?;
    let clock = system_clock();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 1. Cache
    let cache = open_cache(&config, clock.clone(), shutdown_rx.clone())?;

    // 2. Exporter metrics and collectors
    let metrics = Arc::new(ExporterMetrics::new().context("Failed to register exporter metrics")?);
    let policy = FreshnessPolicy::new();

    let osrs_client = OsrsClient::new(&config.osrs).context("Failed to build OSRS client")?;
    let osrs = Arc::new(OsrsCollector::new(
        Arc::new(osrs_client),
        cache.clone(),
        WorldFeedDecoder::new(DecoderLimits::from(&config.osrs)),
        policy,
        metrics.clone(),
    ));

    let steam = if config.steam.is_enabled() {
        let client = SteamClient::new(&config.steam).context("Failed to build Steam client")?;
        let coordinator = RateLimitCoordinator::load(
            "steam",
            keys::STEAM_RATE_LIMIT_STATE,
            cache.clone(),
            clock.clone(),
            BackoffPolicy::default(),
        )
        .await;
        Some(Arc::new(SteamCollector::new(
            Arc::new(client),
            cache.clone(),
            Arc::new(coordinator),
            policy,
            metrics.clone(),
        )))
    } else {
        logger::warning(
            LogTag::System,
            "STEAM_KEY not set, Steam collection is disabled",
        );
        None
    };

    // 3. Background polling
    let mut state = AppState::new(steam.clone(), osrs.clone(), metrics);
    let poller = if config.polling.enabled && !arguments::is_polling_disabled() {
        let poller = Poller::new(steam, osrs, config.polling.clone(), shutdown_rx.clone());
        poller.start_world_polling();
        state = state.with_poller(poller.clone());
        Some(poller)
    } else {
        logger::info(LogTag::System, "Background polling disabled");
        None
    };

    // 4. Webserver
    let server_config = config.server.clone();
    let server_shutdown = shutdown_rx.clone();
    let mut server = tokio::spawn(async move {
        webserver::start_server(Arc::new(state), &server_config, server_shutdown).await
    });

    logger::info(
        LogTag::System,
        &format!(
            "Exporter running on http://{}:{}",
            config.server.host, config.server.port
        ),
    );

    // 5. Wait for a signal, or for the server to stop on its own
    let early_exit = tokio::select! {
        signal = wait_for_shutdown_signal() => {
            signal?;
            None
        }
        result = &mut server => Some(result),
    };

    broadcast_shutdown(&shutdown_tx);

    let server_result = match early_exit {
        Some(result) => result,
        None => server.await,
    };

    if let Some(poller) = poller {
        poller.join().await;
    }

    server_result
        .context("Webserver task panicked")?
        .map_err(|e| anyhow!(e))?;

    logger::info(LogTag::System, "Exporter stopped");
    Ok(())
}

fn load_configuration() -> Result<Config> {
    let path = arguments::config_path_override()
        .unwrap_or_else(|| config::CONFIG_FILE_PATH.to_string());
    config::load_config_from_path(&path).map_err(|e| anyhow!(e))?;

    let mut config = config::get_config_clone();
    if let Some(port) = arguments::port_override() {
        config.server.port = port;
    }

    logger::info(
        LogTag::Config,
        &format!(
            "Configuration loaded path={} port={} cache={} steam_enabled={} poll_normal={}s poll_active={}s",
            path,
            config.server.port,
            if config.cache.in_memory {
                "memory"
            } else {
                config.cache.database_path.as_str()
            },
            config.steam.is_enabled(),
            config.polling.interval_normal().as_secs(),
            config.polling.interval_active().as_secs()
        ),
    );

    Ok(config)
}

fn open_cache(
    config: &Config,
    clock: SharedClock,
    shutdown: watch::Receiver<bool>,
) -> Result<SharedCache> {
    let cache = if config.cache.in_memory {
        logger::warning(
            LogTag::Cache,
            "Using in-memory cache, rate-limit state will not survive restarts",
        );
        Arc::new(MemoryCache::new(clock)) as SharedCache
    } else {
        Arc::new(
            SqliteCache::open(&config.cache.database_path, clock).with_context(|| {
                format!("Failed to open cache at {}", config.cache.database_path)
            })?,
        ) as SharedCache
    };

    let interval = Duration::from_secs(config.cache.purge_interval_secs.max(60));
    tokio::spawn(purge_expired_entries(cache.clone(), interval, shutdown));
    Ok(cache)
}

async fn purge_expired_entries(
    cache: SharedCache,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = sleep(interval) => {
                match cache.purge_expired().await {
                    Ok(removed) if removed > 0 => logger::debug(
                        LogTag::Cache,
                        &format!("Purged expired entries count={}", removed),
                    ),
                    Ok(_) => {}
                    Err(e) => logger::warning(
                        LogTag::Cache,
                        &format!("Purge failed error={}", e),
                    ),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Tell every background loop to stop; `false` when none were listening
fn broadcast_shutdown(shutdown_tx: &watch::Sender<bool>) -> bool {
    match shutdown_tx.send(true) {
        Ok(()) => true,
        Err(e) => {
            logger::warning(
                LogTag::System,
                &format!("Shutdown broadcast had no listeners error={}", e),
            );
            false
        }
    }
}

/// Wait for Ctrl+C, or SIGTERM on Unix
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    let signal_name = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).context("Failed to bind SIGINT")?;
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to bind SIGTERM")?;

        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    #[cfg(not(unix))]
    let signal_name = {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        "CTRL_C"
    };

    logger::warning(
        LogTag::System,
        &format!("Shutdown signal received ({}), stopping", signal_name),
    );
    Ok(())
}
