use game_stats_exporter::{
    arguments::{is_help_requested, print_help},
    logger::{self, LogTag},
    run::run_exporter,
};

#[tokio::main]
async fn main() {
    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(
        LogTag::System,
        &format!("game-stats-exporter v{} starting", env!("CARGO_PKG_VERSION")),
    );

    if let Err(e) = run_exporter().await {
        logger::error(LogTag::System, &format!("Exporter failed: {:#}", e));
        std::process::exit(1);
    }
}
