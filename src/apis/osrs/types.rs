/// OSRS hiscores types and the `index_lite` CSV parser
use crate::errors::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Skill lines in hiscores order; later 3-column lines fall back to `Skill N`
pub const SKILLS: &[&str] = &[
    "Overall",
    "Attack",
    "Defence",
    "Strength",
    "Hitpoints",
    "Ranged",
    "Prayer",
    "Magic",
    "Cooking",
    "Woodcutting",
    "Fletching",
    "Fishing",
    "Firemaking",
    "Crafting",
    "Smithing",
    "Mining",
    "Herblore",
    "Agility",
    "Thieving",
    "Slayer",
    "Farming",
    "Runecrafting",
    "Hunter",
    "Construction",
    "Sailing",
];

/// Activity lines in `index_lite` order, counted from the first 2-column line.
/// Activities added upstream after this table shift every label behind them;
/// positions past the end are labelled `Activity N`.
pub const ACTIVITIES: &[&str] = &[
    "League Points",
    "Deadman Points",
    "Bounty Hunter - Hunter",
    "Bounty Hunter - Rogue",
    "Bounty Hunter (Legacy) - Hunter",
    "Bounty Hunter (Legacy) - Rogue",
    "Clue Scrolls (all)",
    "Clue Scrolls (beginner)",
    "Clue Scrolls (easy)",
    "Clue Scrolls (medium)",
    "Clue Scrolls (hard)",
    "Clue Scrolls (elite)",
    "Clue Scrolls (master)",
    "LMS - Rank",
    "PvP Arena - Rank",
    "Soul Wars Zeal",
    "Rifts closed",
    "Colosseum Glory",
    "Collections Logged",
    // Bosses, alphabetical as the hiscores list them
    "Abyssal Sire",
    "Alchemical Hydra",
    "Amoxliatl",
    "Araxxor",
    "Artio",
    "Barrows Chests",
    "Bryophyta",
    "Callisto",
    "Cal'varion",
    "Cerberus",
    "Chambers of Xeric",
    "Chambers of Xeric: Challenge Mode",
    "Chaos Elemental",
    "Chaos Fanatic",
    "Commander Zilyana",
    "Corporeal Beast",
    "Crazy Archaeologist",
    "Dagannoth Prime",
    "Dagannoth Rex",
    "Dagannoth Supreme",
    "Deranged Archaeologist",
    "Doom of Mokhaiotl",
    "Duke Sucellus",
    "General Graardor",
    "Giant Mole",
    "Grotesque Guardians",
    "Hespori",
    "Kalphite Queen",
    "King Black Dragon",
    "Kraken",
    "Kree'Arra",
    "K'ril Tsutsaroth",
    "Lunar Chests",
    "Mimic",
    "Nex",
    "Nightmare",
    "Phosani's Nightmare",
    "Obor",
    "Phantom Muspah",
    "Sarachnis",
    "Scorpia",
    "Scurrius",
    "Skotizo",
    "Sol Heredit",
    "Spindel",
    "Tempoross",
    "The Gauntlet",
    "The Corrupted Gauntlet",
    "The Hueycoatl",
    "The Leviathan",
    "The Royal Titans",
    "The Whisperer",
    "Theatre of Blood",
    "Theatre of Blood: Hard Mode",
    "Thermonuclear Smoke Devil",
    "Tombs of Amascut",
    "Tombs of Amascut: Expert Mode",
    "TzKal-Zuk",
    "TzTok-Jad",
    "Vardorvis",
    "Venenatis",
    "Vet'ion",
    "Vorkath",
    "Wintertodt",
    "Yama",
    "Zalcano",
    "Zulrah",
];

/// Hiscore table a player is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiscoreMode {
    Vanilla,
    Gridmaster,
}

pub const UNKNOWN_MODE_MESSAGE: &str =
    "Unknown mode. Supported modes: 'vanilla', 'gridmaster' (use /metrics/osrs/worlds for world data)";

impl HiscoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HiscoreMode::Vanilla => "vanilla",
            HiscoreMode::Gridmaster => "gridmaster",
        }
    }
}

impl fmt::Display for HiscoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HiscoreMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vanilla" => Ok(HiscoreMode::Vanilla),
            "gridmaster" => Ok(HiscoreMode::Gridmaster),
            _ => Err(ApiError::InvalidInput(UNKNOWN_MODE_MESSAGE.to_string())),
        }
    }
}

/// Unranked skills report `-1` for rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInfo {
    pub name: String,
    pub rank: i64,
    pub level: i64,
    pub xp: i64,
}

impl SkillInfo {
    pub fn is_ranked(&self) -> bool {
        self.rank >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub name: String,
    pub rank: i64,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player: String,
    pub mode: HiscoreMode,
    pub skills: Vec<SkillInfo>,
    /// Only activities with a rank or score; `-1,-1` lines are dropped
    pub activities: Vec<ActivityScore>,
}

impl PlayerStats {
    /// Per-skill XP, the counters used for activity detection
    pub fn xp_by_skill(&self) -> BTreeMap<String, i64> {
        self.skills
            .iter()
            .map(|s| (s.name.clone(), s.xp))
            .collect()
    }

    pub fn skill(&self, name: &str) -> Option<&SkillInfo> {
        self.skills.iter().find(|s| s.name == name)
    }
}

fn skill_name(index: usize) -> String {
    SKILLS
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Skill {}", index + 1))
}

fn activity_name(index: usize) -> String {
    ACTIVITIES
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Activity {}", index + 1))
}

fn parse_field(value: &str, line_no: usize) -> Result<i64, ApiError> {
    value.trim().parse::<i64>().map_err(|_| ApiError::Parse {
        service: super::SERVICE.to_string(),
        message: format!("line {}: '{}' is not an integer", line_no + 1, value),
    })
}

/// Parse an `index_lite.ws` body
///
/// 3-column lines are skills (`rank,level,xp`), 2-column lines are activities
/// (`rank,score`). Activity lines seen before any skill line are ignored.
pub fn parse_hiscores_csv(
    player: &str,
    mode: HiscoreMode,
    body: &str,
) -> Result<PlayerStats, ApiError> {
    let mut skills = Vec::new();
    let mut activities = Vec::new();
    let mut activity_index = 0usize;

    for (line_no, raw) in body.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        match parts.as_slice() {
            [rank, level, xp] => {
                skills.push(SkillInfo {
                    name: skill_name(skills.len()),
                    rank: parse_field(rank, line_no)?,
                    level: parse_field(level, line_no)?,
                    xp: parse_field(xp, line_no)?,
                });
            }
            [rank, score] if !skills.is_empty() => {
                let index = activity_index;
                activity_index += 1;
                let rank = parse_field(rank, line_no)?;
                let score = parse_field(score, line_no)?;
                if rank < 0 && score < 0 {
                    continue;
                }
                activities.push(ActivityScore {
                    name: activity_name(index),
                    rank,
                    score,
                });
            }
            _ => {}
        }
    }

    if skills.is_empty() {
        return Err(ApiError::Parse {
            service: super::SERVICE.to_string(),
            message: format!("no skill lines in hiscores response for {}", player),
        });
    }

    Ok(PlayerStats {
        player: player.to_string(),
        mode,
        skills,
        activities,
    })
}
