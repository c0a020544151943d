/// Steam Web API response types
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// CUSTOM DESERIALIZERS - Handle API inconsistencies
// ============================================================================

/// Global achievement percentages arrive as a JSON number on some apps and as
/// a decimal string on others.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::custom(format!("percent out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::custom(format!("invalid percent '{}': {}", s, e))),
        Value::Null => Ok(0.0),
        other => Err(Error::custom(format!(
            "Expected number or string for percent, got: {}",
            other
        ))),
    }
}

// ============================================================================
// OWNED GAMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedGame {
    pub appid: u32,
    #[serde(default)]
    pub name: String,
    /// Minutes
    #[serde(default)]
    pub playtime_forever: i64,
}

impl OwnedGame {
    pub fn playtime_seconds(&self) -> i64 {
        self.playtime_forever.saturating_mul(60)
    }
}

/// Private profiles answer with an empty `response` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedGames {
    #[serde(default)]
    pub game_count: u32,
    #[serde(default)]
    pub games: Vec<OwnedGame>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGamesEnvelope {
    #[serde(default)]
    pub response: OwnedGames,
}

// ============================================================================
// ACHIEVEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub name: String,
    #[serde(default)]
    pub achieved: u8,
}

impl UserAchievement {
    pub fn is_achieved(&self) -> bool {
        self.achieved != 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PlayerStats {
    #[serde(default)]
    pub achievements: Vec<UserAchievement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerStatsEnvelope {
    #[serde(default)]
    pub playerstats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAchievement {
    pub name: String,
    #[serde(deserialize_with = "deserialize_percent")]
    pub percent: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GlobalAchievementList {
    #[serde(default)]
    pub achievements: Vec<GlobalAchievement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalAchievementEnvelope {
    #[serde(default)]
    pub achievementpercentages: GlobalAchievementList,
}

// ============================================================================
// PLAYER SUMMARIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    #[serde(default)]
    pub personaname: String,
    #[serde(default)]
    pub profileurl: String,
    #[serde(default)]
    pub avatarfull: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlayerList {
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerSummariesEnvelope {
    #[serde(default)]
    pub response: PlayerList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owned_games_envelope() {
        let body = r#"{"response":{"game_count":2,"games":[
            {"appid":440,"name":"Team Fortress 2","playtime_forever":125,"img_icon_url":"x"},
            {"appid":570,"playtime_forever":0}
        ]}}"#;
        let parsed: OwnedGamesEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response.game_count, 2);
        assert_eq!(parsed.response.games[0].name, "Team Fortress 2");
        assert_eq!(parsed.response.games[0].playtime_seconds(), 7500);
        assert_eq!(parsed.response.games[1].name, "");
    }

    #[test]
    fn private_profile_yields_no_games() {
        let parsed: OwnedGamesEnvelope = serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(parsed.response.games.is_empty());
    }

    #[test]
    fn percent_accepts_strings_and_numbers() {
        let body = r#"{"achievementpercentages":{"achievements":[
            {"name":"A","percent":"12.5"},
            {"name":"B","percent":3.25}
        ]}}"#;
        let parsed: GlobalAchievementEnvelope = serde_json::from_str(body).unwrap();
        let list = parsed.achievementpercentages.achievements;
        assert_eq!(list[0].percent, 12.5);
        assert_eq!(list[1].percent, 3.25);
    }

    #[test]
    fn percent_rejects_garbage() {
        let body = r#"{"name":"A","percent":"lots"}"#;
        assert!(serde_json::from_str::<GlobalAchievement>(body).is_err());
    }

    #[test]
    fn achieved_flag_is_integer() {
        let body = r#"{"playerstats":{"steamID":"1","gameName":"g","achievements":[
            {"name":"A","achieved":1},{"name":"B","achieved":0}
        ]}}"#;
        let parsed: PlayerStatsEnvelope = serde_json::from_str(body).unwrap();
        assert!(parsed.playerstats.achievements[0].is_achieved());
        assert!(!parsed.playerstats.achievements[1].is_achieved());
    }
}
