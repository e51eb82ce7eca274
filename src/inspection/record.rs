//! Cached inspection record

use crate::discovery::DiscoveryResult;
use crate::voxel::Coord;

/// Stable identifier of a record, valid after the cache list shifts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record#{}", self.0)
    }
}

/// A discovered tree plus its lifecycle flags
#[derive(Clone, Debug)]
pub struct InspectionRecord {
    pub id: RecordId,
    pub result: DiscoveryResult,
    /// Claimed by a felling job
    pub is_being_felled: bool,
    /// Felled, expired or superseded
    pub is_done: bool,
    /// Node count when the record was created
    pub initial_size: usize,
    /// Tick the record was created on
    pub created_tick: u64,
    /// Tick after which the record may be evicted
    pub expires_at: u64,
}

impl InspectionRecord {
    pub fn new(id: RecordId, result: DiscoveryResult, created_tick: u64) -> Self {
        let initial_size = result.size();
        Self {
            id,
            result,
            is_being_felled: false,
            is_done: false,
            initial_size,
            created_tick,
            expires_at: created_tick,
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.result.contains(coord)
    }

    pub fn size(&self) -> usize {
        self.result.size()
    }
}
