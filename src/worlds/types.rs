/// World records and type resolution
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player counts are clamped to this ceiling before external use
pub const MAX_PLAYER_COUNT: i16 = 2000;

/// 32-bit world type bitset as sent by the world list feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldFlags(pub u32);

impl WorldFlags {
    pub const MEMBERS: WorldFlags = WorldFlags(1 << 0);
    pub const PVP: WorldFlags = WorldFlags(1 << 2);
    pub const BOUNTY: WorldFlags = WorldFlags(1 << 5);
    pub const PVP_ARENA: WorldFlags = WorldFlags(1 << 6);
    pub const SKILL_TOTAL: WorldFlags = WorldFlags(1 << 7);
    pub const QUEST_SPEEDRUNNING: WorldFlags = WorldFlags(1 << 8);
    pub const HIGH_RISK: WorldFlags = WorldFlags(1 << 10);
    pub const LAST_MAN_STANDING: WorldFlags = WorldFlags(1 << 14);
    pub const SOUL_WARS: WorldFlags = WorldFlags(1 << 22);
    pub const BETA: WorldFlags = WorldFlags(1 << 23);
    pub const NO_SAVE_MODE: WorldFlags = WorldFlags(1 << 25);
    pub const TOURNAMENT: WorldFlags = WorldFlags(1 << 26);
    pub const FRESH_START: WorldFlags = WorldFlags(1 << 27);
    pub const MINIGAME: WorldFlags = WorldFlags(1 << 28);
    pub const DEADMAN: WorldFlags = WorldFlags(1 << 29);
    pub const SEASONAL: WorldFlags = WorldFlags(1 << 30);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: WorldFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Every named type whose bit is set; free-to-play when none are
    pub fn types(self) -> Vec<WorldType> {
        let types: Vec<WorldType> = NAMED_FLAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, world_type)| *world_type)
            .collect();

        if types.is_empty() {
            vec![WorldType::FreeToPlay]
        } else {
            types
        }
    }

    /// The single reported type, first match in `WORLD_TYPE_PRIORITY`
    pub fn resolve_type(self) -> WorldType {
        WORLD_TYPE_PRIORITY
            .iter()
            .find(|(flag, _)| self.contains(*flag))
            .map(|(_, world_type)| *world_type)
            .unwrap_or(WorldType::FreeToPlay)
    }
}

impl std::ops::BitOr for WorldFlags {
    type Output = WorldFlags;

    fn bitor(self, rhs: WorldFlags) -> WorldFlags {
        WorldFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldType {
    FreeToPlay,
    Members,
    Pvp,
    Bounty,
    PvpArena,
    SkillTotal,
    QuestSpeedrunning,
    HighRisk,
    LastManStanding,
    NoSaveMode,
    Tournament,
    FreshStartWorld,
    Deadman,
    Beta,
    SoulWars,
    Minigame,
    Seasonal,
}

impl WorldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldType::FreeToPlay => "FreeToPlay",
            WorldType::Members => "Members",
            WorldType::Pvp => "PVP",
            WorldType::Bounty => "Bounty",
            WorldType::PvpArena => "PVPArena",
            WorldType::SkillTotal => "SkillTotal",
            WorldType::QuestSpeedrunning => "QuestSpeedrunning",
            WorldType::HighRisk => "HighRisk",
            WorldType::LastManStanding => "LastManStanding",
            WorldType::NoSaveMode => "NoSaveMode",
            WorldType::Tournament => "Tournament",
            WorldType::FreshStartWorld => "FreshStartWorld",
            WorldType::Deadman => "Deadman",
            WorldType::Beta => "Beta",
            WorldType::SoulWars => "SoulWars",
            WorldType::Minigame => "Minigame",
            WorldType::Seasonal => "Seasonal",
        }
    }
}

impl fmt::Display for WorldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bit position order, used when listing all types of a world
const NAMED_FLAGS: &[(WorldFlags, WorldType)] = &[
    (WorldFlags::MEMBERS, WorldType::Members),
    (WorldFlags::PVP, WorldType::Pvp),
    (WorldFlags::BOUNTY, WorldType::Bounty),
    (WorldFlags::PVP_ARENA, WorldType::PvpArena),
    (WorldFlags::SKILL_TOTAL, WorldType::SkillTotal),
    (WorldFlags::QUEST_SPEEDRUNNING, WorldType::QuestSpeedrunning),
    (WorldFlags::HIGH_RISK, WorldType::HighRisk),
    (WorldFlags::LAST_MAN_STANDING, WorldType::LastManStanding),
    (WorldFlags::SOUL_WARS, WorldType::SoulWars),
    (WorldFlags::BETA, WorldType::Beta),
    (WorldFlags::NO_SAVE_MODE, WorldType::NoSaveMode),
    (WorldFlags::TOURNAMENT, WorldType::Tournament),
    (WorldFlags::FRESH_START, WorldType::FreshStartWorld),
    (WorldFlags::MINIGAME, WorldType::Minigame),
    (WorldFlags::DEADMAN, WorldType::Deadman),
    (WorldFlags::SEASONAL, WorldType::Seasonal),
];

/// Reported world type priority, highest first
///
/// Beta has no entry and resolves through members/free-to-play.
pub const WORLD_TYPE_PRIORITY: &[(WorldFlags, WorldType)] = &[
    (WorldFlags::QUEST_SPEEDRUNNING, WorldType::QuestSpeedrunning),
    (WorldFlags::HIGH_RISK, WorldType::HighRisk),
    (WorldFlags::LAST_MAN_STANDING, WorldType::LastManStanding),
    (WorldFlags::BOUNTY, WorldType::Bounty),
    (WorldFlags::PVP, WorldType::Pvp),
    (WorldFlags::PVP_ARENA, WorldType::PvpArena),
    (WorldFlags::NO_SAVE_MODE, WorldType::NoSaveMode),
    (WorldFlags::DEADMAN, WorldType::Deadman),
    (WorldFlags::TOURNAMENT, WorldType::Tournament),
    (WorldFlags::SKILL_TOTAL, WorldType::SkillTotal),
    (WorldFlags::FRESH_START, WorldType::FreshStartWorld),
    (WorldFlags::MINIGAME, WorldType::Minigame),
    (WorldFlags::SOUL_WARS, WorldType::SoulWars),
    (WorldFlags::SEASONAL, WorldType::Seasonal),
    (WorldFlags::MEMBERS, WorldType::Members),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Usa,
    Uk,
    Australia,
    Germany,
    Unknown,
}

impl Location {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Location::Usa,
            1 => Location::Uk,
            3 => Location::Australia,
            7 => Location::Germany,
            _ => Location::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Usa => "USA",
            Location::Uk => "UK",
            Location::Australia => "Australia",
            Location::Germany => "Germany",
            Location::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded world, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldRecord {
    pub id: u16,
    pub flags: WorldFlags,
    pub address: String,
    pub activity: String,
    pub location: Location,
    /// Always within `[0, MAX_PLAYER_COUNT]`
    pub player_count: i16,
}

impl WorldRecord {
    pub fn new(
        id: u16,
        flags: WorldFlags,
        address: String,
        activity: String,
        location: Location,
        raw_player_count: i16,
    ) -> Self {
        Self {
            id,
            flags,
            address,
            activity,
            location,
            player_count: raw_player_count.clamp(0, MAX_PLAYER_COUNT),
        }
    }

    pub fn world_type(&self) -> WorldType {
        self.flags.resolve_type()
    }

    pub fn is_members(&self) -> bool {
        self.flags.contains(WorldFlags::MEMBERS)
    }
}

/// Result of one decode call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOutcome {
    pub records: Vec<WorldRecord>,
    /// Set when the feed ended before the declared count, or the count was
    /// unusable and records were read until the data ran out or went invalid
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pvp_outranks_minigame() {
        let flags = WorldFlags::MINIGAME | WorldFlags::PVP;
        assert_eq!(flags.resolve_type(), WorldType::Pvp);
    }

    #[test]
    fn priority_ignores_bit_order() {
        let flags = WorldFlags::SEASONAL | WorldFlags::QUEST_SPEEDRUNNING | WorldFlags::MEMBERS;
        assert_eq!(flags.resolve_type(), WorldType::QuestSpeedrunning);
        assert_eq!(
            (WorldFlags::MEMBERS | WorldFlags::SKILL_TOTAL).resolve_type(),
            WorldType::SkillTotal
        );
    }

    #[test]
    fn no_flags_means_free_to_play() {
        assert_eq!(WorldFlags(0).resolve_type(), WorldType::FreeToPlay);
        assert_eq!(WorldFlags(0).types(), vec![WorldType::FreeToPlay]);
        assert_eq!(WorldFlags::MEMBERS.resolve_type(), WorldType::Members);
    }

    #[test]
    fn beta_falls_back_to_membership() {
        assert_eq!(
            (WorldFlags::BETA | WorldFlags::MEMBERS).resolve_type(),
            WorldType::Members
        );
        assert_eq!(WorldFlags::BETA.resolve_type(), WorldType::FreeToPlay);
        assert_eq!(WorldFlags::BETA.types(), vec![WorldType::Beta]);
    }

    #[test]
    fn location_codes() {
        assert_eq!(Location::from_code(0), Location::Usa);
        assert_eq!(Location::from_code(1), Location::Uk);
        assert_eq!(Location::from_code(3), Location::Australia);
        assert_eq!(Location::from_code(7), Location::Germany);
        assert_eq!(Location::from_code(2), Location::Unknown);
    }

    #[test]
    fn player_count_is_clamped() {
        let low = WorldRecord::new(301, WorldFlags(0), String::new(), String::new(), Location::Uk, -5);
        let high = WorldRecord::new(302, WorldFlags(0), String::new(), String::new(), Location::Uk, 4000);
        assert_eq!(low.player_count, 0);
        assert_eq!(high.player_count, MAX_PLAYER_COUNT);
    }
}
