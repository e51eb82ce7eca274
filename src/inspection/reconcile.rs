//! Reconciling a cached record with the current grid
//!
//! Validation is spread over many steps, one node each. The cache itself is
//! only touched in [`ReconcileJob::apply`], which runs as a single step.

use crate::host::MarkerProvider;
use crate::scheduler::StepResult;
use crate::voxel::{BlockId, Coord, InclusionRules, VoxelGrid};

use super::cache::InspectionCache;
use super::record::RecordId;

/// What reconciliation did to the cache
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing changed, the record is reused as is
    Unchanged(RecordId),
    /// The pruned tree took over the old record's slot
    Replaced { old: RecordId, new: RecordId },
    /// The pruned sub-tree was appended as a new record
    Appended { old: RecordId, new: RecordId },
    /// The record disappeared or got claimed while validating
    Vanished,
}

impl Reconciled {
    /// Record to use from now on
    pub fn record(&self) -> Option<RecordId> {
        match *self {
            Reconciled::Unchanged(id) => Some(id),
            Reconciled::Replaced { new, .. } | Reconciled::Appended { new, .. } => Some(new),
            Reconciled::Vanished => None,
        }
    }
}

/// Stepped re-validation of one cached record
#[derive(Debug)]
pub struct ReconcileJob {
    record: RecordId,
    /// Coordinate the action happened at; exempt from validation
    start: Coord,
    block: BlockId,
    pending: Vec<Coord>,
    next: usize,
    invalid: Vec<Coord>,
}

impl ReconcileJob {
    /// Snapshot the record's nodes. `None` if the record is gone.
    pub fn new(cache: &InspectionCache, record: RecordId, start: Coord) -> Option<Self> {
        let r = cache.get(record)?;
        Some(Self {
            record,
            start,
            block: r.result.block.clone(),
            pending: r.result.graph.coords_in_order(),
            next: 0,
            invalid: Vec::new(),
        })
    }

    pub fn record(&self) -> RecordId {
        self.record
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn is_validated(&self) -> bool {
        self.next >= self.pending.len()
    }

    /// Nodes found invalid so far
    pub fn invalid(&self) -> &[Coord] {
        &self.invalid
    }

    /// Validate one node. `Done` once every node has been checked.
    pub fn step<G: VoxelGrid + ?Sized>(&mut self, grid: &G, rules: &InclusionRules) -> StepResult {
        let Some(&coord) = self.pending.get(self.next) else {
            return StepResult::Done;
        };
        self.next += 1;
        if coord != self.start {
            let voxel = grid.resolve(coord);
            if !voxel.is_valid() || voxel.block != self.block || !rules.is_included(&voxel.block) {
                self.invalid.push(coord);
            }
        }
        if self.is_validated() {
            StepResult::Done
        } else {
            StepResult::Yield
        }
    }

    /// Apply the validation to the cache.
    ///
    /// With `claim` set the resulting record is claimed for felling.
    pub fn apply<M: MarkerProvider + ?Sized>(
        self,
        cache: &mut InspectionCache,
        markers: &mut M,
        claim: bool,
        now: u64,
    ) -> Reconciled {
        let Some(record) = cache.get_mut(self.record) else {
            return Reconciled::Vanished;
        };
        if record.is_being_felled || !record.contains(self.start) {
            return Reconciled::Vanished;
        }

        if self.invalid.is_empty() {
            let reachable = record
                .result
                .graph
                .traverse(self.start, crate::graph::TraversalOrder::Bfs)
                .count();
            if reachable == record.initial_size {
                record.is_being_felled = claim;
                log::debug!("{} still valid ({} nodes)", record.id, reachable);
                return Reconciled::Unchanged(record.id);
            }
        }

        for &coord in &self.invalid {
            if let Some(marker) = record.result.remove(coord) {
                markers.despawn_marker(marker);
            }
        }
        record.result.finalize();

        let sub = record.result.extract_component(self.start);
        let whole = record.result.graph.structurally_equal(&sub.graph);
        let reusable = whole && !record.is_done;
        let old = record.id;

        if reusable {
            match cache.replace(old, sub, claim, now) {
                Some(new) => Reconciled::Replaced { old, new },
                None => Reconciled::Vanished,
            }
        } else {
            let new = cache.push(sub, claim, now);
            Reconciled::Appended { old, new }
        }
    }

    /// Validate every node then apply, for callers outside the scheduler
    pub fn run_to_completion<H>(
        mut self,
        cache: &mut InspectionCache,
        host: &mut H,
        rules: &InclusionRules,
        claim: bool,
        now: u64,
    ) -> Reconciled
    where
        H: VoxelGrid + MarkerProvider + ?Sized,
    {
        while self.step(&*host, rules) != StepResult::Done {}
        self.apply(cache, host, claim, now)
    }
}
