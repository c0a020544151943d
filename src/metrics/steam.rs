/// Steam gauges
use super::encode;
use crate::collectors::steam::SteamSnapshot;
use prometheus::{GaugeVec, Opts, Registry};
use std::collections::HashMap;

pub fn render_steam(snapshot: &SteamSnapshot) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    let playtime = GaugeVec::new(
        Opts::new("playtime_seconds", "Amount of time an owned game has been played (in seconds)")
            .namespace("steam")
            .subsystem("owned_games"),
        &["app_id", "game_name", "steam_id", "username"],
    )?;
    let achieved = GaugeVec::new(
        Opts::new("achieved", "Whether an achievement has been achieved (1) or not (0)")
            .namespace("steam")
            .subsystem("achievements"),
        &[
            "app_id",
            "game_name",
            "achievement_name",
            "steam_id",
            "username",
            "achieved",
        ],
    )?;
    let global_percent = GaugeVec::new(
        Opts::new("global_percent", "Share of all players who unlocked the achievement")
            .namespace("steam")
            .subsystem("achievements"),
        &["app_id", "game_name", "achievement_name"],
    )?;

    registry.register(Box::new(playtime.clone()))?;
    registry.register(Box::new(achieved.clone()))?;
    registry.register(Box::new(global_percent.clone()))?;

    let steam_id = snapshot.steam_id.as_str();
    let username = snapshot.username.as_str();

    for report in &snapshot.games {
        let game = &report.game;
        let app_id = game.appid.to_string();

        playtime
            .with_label_values(&[&app_id, &game.name, steam_id, username])
            .set(game.playtime_seconds() as f64);

        let Some(achievements) = &report.achievements else {
            continue;
        };

        let unlocked: HashMap<&str, bool> = achievements
            .user
            .iter()
            .map(|a| (a.name.as_str(), a.is_achieved()))
            .collect();

        // One series per achievement the game defines, unearned ones at 0
        for global in &achievements.global {
            let is_unlocked = unlocked.get(global.name.as_str()).copied().unwrap_or(false);
            let label = if is_unlocked { "true" } else { "false" };
            achieved
                .with_label_values(&[
                    &app_id,
                    &game.name,
                    &global.name,
                    steam_id,
                    username,
                    label,
                ])
                .set(if is_unlocked { 1.0 } else { 0.0 });

            global_percent
                .with_label_values(&[&app_id, &game.name, &global.name])
                .set(global.percent);
        }
    }

    encode(&registry)
}
