//! Synthetic world feed payloads for tests

use super::types::{Location, WorldFlags, WorldRecord};

/// Byte ceiling at which the origin cuts the world feed
pub const CAPTURE_CEILING: usize = 30_000;

pub fn sample_world(
    id: u16,
    flags: WorldFlags,
    activity: &str,
    location_code: u8,
    players: i16,
) -> WorldRecord {
    WorldRecord::new(
        id,
        flags,
        format!("oldschool{}.runescape.com", id.saturating_sub(300)),
        activity.to_string(),
        Location::from_code(location_code),
        players,
    )
}

fn location_code(location: Location) -> u8 {
    match location {
        Location::Usa => 0,
        Location::Uk => 1,
        Location::Australia => 3,
        Location::Germany => 7,
        Location::Unknown => 2,
    }
}

pub fn encode_record(record: &WorldRecord) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&record.id.to_le_bytes());
    out.extend_from_slice(&record.flags.bits().to_le_bytes());
    out.extend_from_slice(record.address.as_bytes());
    out.push(0);
    out.extend_from_slice(record.activity.as_bytes());
    out.push(0);
    out.push(location_code(record.location));
    out.extend_from_slice(&record.player_count.to_le_bytes());
    out
}

/// Header with the given declared count followed by the encoded records
pub fn payload(declared: i16, records: &[WorldRecord]) -> Vec<u8> {
    let body: Vec<u8> = records.iter().flat_map(encode_record).collect();
    let mut out = Vec::with_capacity(body.len() + 6);
    out.extend_from_slice(&((body.len() + 2) as i32).to_le_bytes());
    out.extend_from_slice(&declared.to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// A feed larger than the ceiling, cut at it, with a corrupted count header
pub fn truncated_capture() -> Vec<u8> {
    let flag_cycle = [
        WorldFlags(0),
        WorldFlags::MEMBERS,
        WorldFlags::MEMBERS | WorldFlags::PVP,
        WorldFlags::MEMBERS | WorldFlags::SKILL_TOTAL,
        WorldFlags::MEMBERS | WorldFlags::MINIGAME | WorldFlags::LAST_MAN_STANDING,
        WorldFlags::SEASONAL | WorldFlags::MEMBERS,
    ];
    let locations = [0u8, 1, 3, 7];

    let records: Vec<WorldRecord> = (0..250u16)
        .map(|i| {
            let activity = format!(
                "World {} - {}",
                301 + i,
                "Group activity hub with a long descriptive label ".repeat(2)
            );
            sample_world(
                301 + i,
                flag_cycle[i as usize % flag_cycle.len()],
                &activity,
                locations[i as usize % locations.len()],
                ((i as i32 * 37) % 2100) as i16,
            )
        })
        .collect();

    let mut raw = payload(-26_214, &records);
    assert!(raw.len() > CAPTURE_CEILING);
    raw.truncate(CAPTURE_CEILING);
    raw
}
