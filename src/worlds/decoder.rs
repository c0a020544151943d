/// World list feed decoder
///
/// Layout (little-endian):
/// `i32 buffer size | i16 record count | record*`
/// where each record is
/// `u16 id | u32 flags | cstr address | cstr activity | u8 location | i16 players`.
///
/// The origin truncates the payload at a fixed byte ceiling without any
/// trailer, which also corrupts the count header. The decoder therefore never
/// fails on truncation; it returns the complete records it could read and
/// flags the outcome as truncated.
use super::reader::{
    read_cstring_at_offset, read_i16_at_offset, read_i32_at_offset, read_u16_at_offset,
    read_u32_at_offset, read_u8_at_offset,
};
use super::types::{DecodeOutcome, Location, WorldFlags, WorldRecord};
use crate::config::OsrsConfig;
use crate::errors::DecodeError;
use crate::logger::{self, LogTag};

/// Buffer size field plus record count
pub const MIN_HEADER_LEN: usize = 6;

/// id + flags + two empty strings + location + players
pub const MIN_RECORD_LEN: usize = 11;

/// Empirical bounds observed on the live service
///
/// None of these come from a protocol definition; they are configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    pub world_id_min: u16,
    pub world_id_max: u16,
    /// Declared counts above this (or `<= 0`) switch to iterative mode
    pub max_declared_worlds: i32,
    pub max_iterative_attempts: usize,
    /// Realignment scans shifts `1..realign_window` from the first record
    pub realign_window: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self::from(&OsrsConfig::default())
    }
}

impl From<&OsrsConfig> for DecoderLimits {
    fn from(config: &OsrsConfig) -> Self {
        Self {
            world_id_min: config.world_id_min,
            world_id_max: config.world_id_max,
            max_declared_worlds: config.max_declared_worlds,
            max_iterative_attempts: config.max_iterative_attempts,
            realign_window: config.realign_window,
        }
    }
}

impl DecoderLimits {
    pub fn is_valid_id(&self, id: u16) -> bool {
        (self.world_id_min..=self.world_id_max).contains(&id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorldFeedDecoder {
    limits: DecoderLimits,
}

impl WorldFeedDecoder {
    pub fn new(limits: DecoderLimits) -> Self {
        Self { limits }
    }

    /// Decode a raw payload into world records
    ///
    /// Fails only when `raw` is shorter than the fixed header.
    pub fn decode(&self, raw: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        let malformed = DecodeError::MalformedInput {
            len: raw.len(),
            min: MIN_HEADER_LEN,
        };
        let mut offset = 0usize;
        let buffer_size = read_i32_at_offset(raw, &mut offset).map_err(|_| malformed.clone())?;
        let declared = read_i16_at_offset(raw, &mut offset).map_err(|_| malformed)? as i32;

        logger::debug(
            LogTag::Decoder,
            &format!(
                "Decoding world feed len={} buffer_size={} declared={}",
                raw.len(),
                buffer_size,
                declared
            ),
        );

        let iterative = declared <= 0 || declared > self.limits.max_declared_worlds;
        let max_attempts = if iterative {
            logger::warning(
                LogTag::Decoder,
                &format!(
                    "Unusable world count={} (max {}), reading records until data runs out",
                    declared, self.limits.max_declared_worlds
                ),
            );
            self.limits.max_iterative_attempts
        } else {
            declared as usize
        };

        let mut records = Vec::new();
        let mut truncated = iterative;

        for attempt in 0..max_attempts {
            let remaining = raw.len() - offset;
            if remaining < MIN_RECORD_LEN {
                logger::debug(
                    LogTag::Decoder,
                    &format!(
                        "Stopping at record {}: {} bytes remaining",
                        attempt + 1,
                        remaining
                    ),
                );
                truncated = true;
                break;
            }

            let record_start = offset;
            let mut id = match read_u16_at_offset(raw, &mut offset) {
                Ok(id) => id,
                Err(_) => {
                    truncated = true;
                    break;
                }
            };

            if !self.limits.is_valid_id(id) {
                if attempt == 0 && iterative {
                    match self.realign(raw, record_start) {
                        Some((aligned_id, next_offset)) => {
                            logger::info(
                                LogTag::Decoder,
                                &format!(
                                    "Realigned first record shift={} id={}",
                                    next_offset - 2 - record_start,
                                    aligned_id
                                ),
                            );
                            id = aligned_id;
                            offset = next_offset;
                        }
                        None => {
                            logger::warning(
                                LogTag::Decoder,
                                "No valid world id within realignment window, returning no records",
                            );
                            return Ok(DecodeOutcome {
                                records: Vec::new(),
                                truncated: true,
                            });
                        }
                    }
                } else {
                    logger::debug(
                        LogTag::Decoder,
                        &format!(
                            "Invalid world id={} at record {}, stopping",
                            id,
                            attempt + 1
                        ),
                    );
                    truncated = true;
                    break;
                }
            }

            match Self::decode_record_body(raw, &mut offset, id) {
                Ok(record) => records.push(record),
                Err(e) => {
                    logger::debug(
                        LogTag::Decoder,
                        &format!("Record {} incomplete: {}", attempt + 1, e),
                    );
                    truncated = true;
                    break;
                }
            }
        }

        if truncated {
            logger::info(
                LogTag::Decoder,
                &format!("World feed truncated, recovered {} worlds", records.len()),
            );
        }

        Ok(DecodeOutcome { records, truncated })
    }

    /// Scan forward from `record_start` for a shift whose u16 is a valid id
    ///
    /// Returns the id and the offset just past it.
    fn realign(&self, raw: &[u8], record_start: usize) -> Option<(u16, usize)> {
        (1..self.limits.realign_window).find_map(|shift| {
            let mut offset = record_start + shift;
            let id = read_u16_at_offset(raw, &mut offset).ok()?;
            self.limits.is_valid_id(id).then_some((id, offset))
        })
    }

    /// Decode everything after the id; `offset` is only advanced on success
    fn decode_record_body(raw: &[u8], offset: &mut usize, id: u16) -> Result<WorldRecord, String> {
        let mut cursor = *offset;
        let flags = read_u32_at_offset(raw, &mut cursor)?;
        let address = read_cstring_at_offset(raw, &mut cursor)?;
        let activity = read_cstring_at_offset(raw, &mut cursor)?;
        let location = read_u8_at_offset(raw, &mut cursor)?;
        let players = read_i16_at_offset(raw, &mut cursor)?;
        *offset = cursor;

        Ok(WorldRecord::new(
            id,
            WorldFlags(flags),
            address,
            activity,
            Location::from_code(location),
            players,
        ))
    }
}
