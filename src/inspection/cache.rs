//! Ordered cache of inspection records
//!
//! Records are kept in append order. Several records may cover the same
//! coordinate (an older tree and a re-discovered part of it); the most recent
//! one is authoritative. The cache also arbitrates felling: a coordinate can
//! only be claimed when no record covering it is already being felled.

use crate::discovery::DiscoveryResult;
use crate::voxel::Coord;

use super::record::{InspectionRecord, RecordId};

/// Why a claim failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimError {
    /// A record covering the coordinate is being felled
    AlreadyFelling(RecordId),
    /// No record covers the coordinate
    NotFound,
}

/// Inspection records in append order
#[derive(Debug, Default)]
pub struct InspectionCache {
    records: Vec<InspectionRecord>,
    next_id: u64,
}

impl InspectionCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `result`, optionally claimed for felling
    pub fn push(&mut self, result: DiscoveryResult, claimed: bool, now: u64) -> RecordId {
        let id = self.alloc_id();
        let mut record = InspectionRecord::new(id, result, now);
        record.is_being_felled = claimed;
        log::debug!("Cached {} with {} nodes at {}", id, record.initial_size, record.result.origin);
        self.records.push(record);
        id
    }

    fn alloc_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- Lookup ---

    /// Every record covering `coord`, oldest first
    pub fn find(&self, coord: Coord) -> impl Iterator<Item = &InspectionRecord> + '_ {
        self.records.iter().filter(move |r| r.contains(coord))
    }

    /// Most recent record covering `coord`
    pub fn latest(&self, coord: Coord) -> Option<&InspectionRecord> {
        self.records.iter().rev().find(|r| r.contains(coord))
    }

    pub fn get(&self, id: RecordId) -> Option<&InspectionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut InspectionRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InspectionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // --- Felling claims ---

    /// True when any record covering `coord` is being felled
    pub fn is_being_felled_at(&self, coord: Coord) -> bool {
        self.find(coord).any(|r| r.is_being_felled)
    }

    /// A record being felled that shares any node with `result`
    pub fn felling_overlap(&self, result: &DiscoveryResult) -> Option<RecordId> {
        self.records
            .iter()
            .filter(|r| r.is_being_felled)
            .find(|r| result.graph.nodes().any(|n| r.contains(n.coord)))
            .map(|r| r.id)
    }

    /// Claim the latest record covering `coord` for felling
    pub fn claim(&mut self, coord: Coord) -> Result<RecordId, ClaimError> {
        if let Some(busy) = self.find(coord).find(|r| r.is_being_felled) {
            return Err(ClaimError::AlreadyFelling(busy.id));
        }
        let record = self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.contains(coord))
            .ok_or(ClaimError::NotFound)?;
        record.is_being_felled = true;
        Ok(record.id)
    }

    /// Drop a felling claim
    pub fn release(&mut self, id: RecordId) {
        if let Some(record) = self.get_mut(id) {
            record.is_being_felled = false;
        }
    }

    pub fn mark_done(&mut self, id: RecordId) {
        if let Some(record) = self.get_mut(id) {
            record.is_done = true;
            record.is_being_felled = false;
        }
    }

    // --- Mutation ---

    /// Put a fresh record for `result` in the slot of `old`.
    /// Returns the new id, or `None` if `old` is gone.
    pub fn replace(&mut self, old: RecordId, result: DiscoveryResult, claimed: bool, now: u64) -> Option<RecordId> {
        let pos = self.position(old)?;
        let id = self.alloc_id();
        let mut record = InspectionRecord::new(id, result, now);
        record.is_being_felled = claimed;
        log::debug!("Replaced {} with {} ({} nodes)", old, id, record.initial_size);
        self.records[pos] = record;
        Some(id)
    }

    /// Remove a record. Its markers are the caller's to despawn.
    pub fn remove(&mut self, id: RecordId) -> Option<InspectionRecord> {
        let pos = self.position(id)?;
        Some(self.records.remove(pos))
    }

    /// Remove every record
    pub fn drain(&mut self) -> Vec<InspectionRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::BlockId;

    fn column(x: i32, height: i32) -> DiscoveryResult {
        let mut r = DiscoveryResult::new(Coord::new(x, 0, 0), BlockId::new("minecraft:oak_log"), None);
        for y in 0..height {
            r.insert(Coord::new(x, y, 0), None);
        }
        r
    }

    #[test]
    fn test_find_in_append_order() {
        let mut cache = InspectionCache::new();
        let a = cache.push(column(0, 5), false, 0);
        let b = cache.push(column(0, 3), false, 1);
        cache.push(column(9, 3), false, 2);

        let ids: Vec<_> = cache.find(Coord::new(0, 1, 0)).map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(cache.latest(Coord::new(0, 1, 0)).unwrap().id, b);
        assert_eq!(cache.latest(Coord::new(0, 4, 0)).unwrap().id, a);
        assert!(cache.latest(Coord::new(5, 5, 5)).is_none());
    }

    #[test]
    fn test_claim_is_exclusive() {
        let mut cache = InspectionCache::new();
        let a = cache.push(column(0, 5), false, 0);
        let b = cache.push(column(0, 2), false, 0);

        assert_eq!(cache.claim(Coord::new(0, 4, 0)), Ok(a));
        // Overlapping record is blocked even though it is not the claimed one
        assert_eq!(cache.claim(Coord::new(0, 1, 0)), Err(ClaimError::AlreadyFelling(a)));
        assert!(cache.is_being_felled_at(Coord::new(0, 0, 0)));

        cache.release(a);
        assert_eq!(cache.claim(Coord::new(0, 1, 0)), Ok(b));
        assert_eq!(cache.claim(Coord::new(7, 0, 0)), Err(ClaimError::NotFound));
    }

    #[test]
    fn test_overlap_with_felled_record() {
        let mut cache = InspectionCache::new();
        let a = cache.push(column(0, 6), true, 0);

        // Branch graph sharing one node with the claimed column
        let mut branch = DiscoveryResult::new(Coord::new(1, 5, 0), BlockId::new("minecraft:oak_log"), None);
        branch.insert(Coord::new(1, 5, 0), None);
        branch.insert(Coord::new(0, 5, 0), None);
        assert!(!cache.is_being_felled_at(Coord::new(1, 5, 0)));
        assert_eq!(cache.felling_overlap(&branch), Some(a));

        assert_eq!(cache.felling_overlap(&column(4, 3)), None);
        cache.release(a);
        assert_eq!(cache.felling_overlap(&branch), None);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut cache = InspectionCache::new();
        let a = cache.push(column(0, 5), false, 0);
        let b = cache.push(column(3, 2), false, 0);

        let c = cache.replace(a, column(0, 4), false, 10).unwrap();
        let order: Vec<_> = cache.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![c, b]);
        assert_eq!(cache.get(c).unwrap().initial_size, 4);
        assert_eq!(cache.get(c).unwrap().created_tick, 10);
        assert!(cache.replace(a, column(0, 1), false, 0).is_none());
    }

    #[test]
    fn test_remove_and_done() {
        let mut cache = InspectionCache::new();
        let a = cache.push(column(0, 5), true, 0);
        cache.mark_done(a);
        let record = cache.get(a).unwrap();
        assert!(record.is_done && !record.is_being_felled);

        assert!(cache.remove(a).is_some());
        assert!(cache.remove(a).is_none());
        assert!(cache.is_empty());
    }
}
