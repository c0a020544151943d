//! OSRS world list feed
//!
//! The world list is served as a little-endian binary payload that the origin
//! cuts off at a fixed byte ceiling, corrupting its own record count. The
//! decoder recovers a best-effort list of worlds from such payloads.
//!
//! - `types`: world records, flag bitset, type priority table
//! - `reader`: offset-advancing primitive readers
//! - `decoder`: `WorldFeedDecoder` with its recovery heuristics

pub mod decoder;
pub mod reader;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use decoder::{DecoderLimits, WorldFeedDecoder, MIN_HEADER_LEN, MIN_RECORD_LEN};
pub use types::{DecodeOutcome, Location, WorldFlags, WorldRecord, WorldType, MAX_PLAYER_COUNT};
