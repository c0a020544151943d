/// OSRS gauges
use super::encode;
use crate::apis::osrs::PlayerStats;
use crate::worlds::WorldRecord;
use prometheus::{GaugeVec, Opts, Registry};

fn gauge(
    subsystem: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
    GaugeVec::new(
        Opts::new(name, help).namespace("osrs").subsystem(subsystem),
        labels,
    )
}

/// Skill and activity gauges for one player
pub fn render_player(stats: &PlayerStats) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let skill_labels = &["skill", "player", "mode"];
    let activity_labels = &["minigame", "player", "mode"];

    let level = gauge("player", "level", "Player skill level", skill_labels)?;
    let xp = gauge("player", "xp", "Player experience points", skill_labels)?;
    let rank = gauge("player", "rank", "Player highscores rank", skill_labels)?;
    let activity_rank = gauge(
        "minigame",
        "rank",
        "Player minigame highscores rank",
        activity_labels,
    )?;
    let activity_score = gauge("minigame", "score", "Player minigame score", activity_labels)?;

    for collector in [&level, &xp, &rank, &activity_rank, &activity_score] {
        registry.register(Box::new(collector.clone()))?;
    }

    let player = stats.player.as_str();
    let mode = stats.mode.as_str();

    for skill in &stats.skills {
        let labels = [skill.name.as_str(), player, mode];
        level.with_label_values(&labels).set(skill.level as f64);
        xp.with_label_values(&labels).set(skill.xp as f64);
        if skill.is_ranked() {
            rank.with_label_values(&labels).set(skill.rank as f64);
        }
    }

    for activity in &stats.activities {
        let labels = [activity.name.as_str(), player, mode];
        if activity.rank >= 0 {
            activity_rank
                .with_label_values(&labels)
                .set(activity.rank as f64);
        }
        if activity.score >= 0 {
            activity_score
                .with_label_values(&labels)
                .set(activity.score as f64);
        }
    }

    encode(&registry)
}

/// Player count per world
pub fn render_worlds(records: &[WorldRecord]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let players = gauge(
        "world",
        "players",
        "Number of players in a world",
        &["id", "location", "isMembers", "type"],
    )?;
    registry.register(Box::new(players.clone()))?;

    for record in records {
        let id = record.id.to_string();
        let members = if record.is_members() { "true" } else { "false" };
        players
            .with_label_values(&[
                &id,
                record.location.as_str(),
                members,
                record.world_type().as_str(),
            ])
            .set(f64::from(record.player_count));
    }

    encode(&registry)
}
