//! Step-wise tree discovery
//!
//! Breadth-first flood from the origin over voxels of the origin's type. Each
//! call to [`DiscoveryJob::step`] performs one unit of work: seeding, one
//! dequeue, one neighbor candidate, or one sibling edge.

use std::collections::{HashSet, VecDeque};
use std::mem;

use crate::host::MarkerProvider;
use crate::scheduler::{ticket, Resolver, StepResult, Ticket};
use crate::voxel::{BlockId, Coord, InclusionRules, NeighborCursor, Voxel, VoxelGrid};

use super::result::DiscoveryResult;

/// Lifecycle of a discovery job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Final value of a discovery job
#[derive(Debug)]
pub enum DiscoveryOutcome {
    Completed(DiscoveryResult),
    /// Cancelled before finishing, with whatever had been found
    Aborted(DiscoveryResult),
}

impl DiscoveryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DiscoveryOutcome::Completed(_))
    }

    pub fn result(&self) -> &DiscoveryResult {
        match self {
            DiscoveryOutcome::Completed(r) | DiscoveryOutcome::Aborted(r) => r,
        }
    }

    pub fn into_result(self) -> DiscoveryResult {
        match self {
            DiscoveryOutcome::Completed(r) | DiscoveryOutcome::Aborted(r) => r,
        }
    }
}

pub type DiscoveryTicket = Ticket<DiscoveryOutcome>;

/// Limits and options for one discovery run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub chop_limit: usize,
    /// Nodes the actor's budget pays for
    pub max_reachable: usize,
    pub spawn_markers: bool,
}

impl DiscoveryOptions {
    /// Largest graph the job may build, never below one (the origin)
    pub fn node_limit(&self) -> usize {
        self.chop_limit.min(self.max_reachable).max(1)
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            chop_limit: 1500,
            max_reachable: usize::MAX,
            spawn_markers: false,
        }
    }
}

enum Phase {
    Dequeue,
    Expand {
        current: Coord,
        cursor: NeighborCursor,
        children: Vec<Coord>,
    },
    Link {
        children: Vec<Coord>,
        i: usize,
        j: usize,
    },
}

/// Cooperative BFS that builds a [`DiscoveryResult`]
pub struct DiscoveryJob {
    origin: Coord,
    limit: usize,
    spawn_markers: bool,
    state: DiscoveryState,
    phase: Phase,
    queue: VecDeque<Coord>,
    visited: HashSet<Coord>,
    result: DiscoveryResult,
    resolver: Option<Resolver<DiscoveryOutcome>>,
    outcome: Option<DiscoveryOutcome>,
    steps: u64,
}

impl DiscoveryJob {
    /// Create a new job rooted at `origin`.
    ///
    /// `origin_voxel` is the voxel as it was when the action happened; on a
    /// break the grid no longer holds it.
    pub fn new(origin: Coord, origin_voxel: &Voxel, options: DiscoveryOptions) -> Self {
        let variant = origin_voxel.variant().map(str::to_owned);
        Self {
            origin,
            limit: options.node_limit(),
            spawn_markers: options.spawn_markers,
            state: DiscoveryState::Idle,
            phase: Phase::Dequeue,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            result: DiscoveryResult::new(origin, origin_voxel.block.clone(), variant),
            resolver: None,
            outcome: None,
            steps: 0,
        }
    }

    /// Deliver the outcome through a ticket instead of [`take_outcome`](Self::take_outcome)
    pub fn ticket(&mut self) -> DiscoveryTicket {
        let (resolver, ticket) = ticket();
        self.resolver = Some(resolver);
        ticket
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn block(&self) -> &BlockId {
        &self.result.block
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, DiscoveryState::Completed | DiscoveryState::Aborted)
    }

    /// Nodes found so far
    pub fn len(&self) -> usize {
        self.result.size()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Outcome of a finished job that had no ticket attached
    pub fn take_outcome(&mut self) -> Option<DiscoveryOutcome> {
        self.outcome.take()
    }

    fn accepts(&self, voxel: &Voxel, rules: &InclusionRules) -> bool {
        voxel.is_valid() && voxel.block == self.result.block && rules.is_included(&voxel.block)
    }

    fn insert<H: MarkerProvider + ?Sized>(&mut self, host: &mut H, at: Coord) {
        let marker = if self.spawn_markers {
            host.spawn_marker(at)
        } else {
            None
        };
        self.result.insert(at, marker);
        self.queue.push_back(at);
    }

    /// Advance by one unit of work
    pub fn step<H>(&mut self, host: &mut H, rules: &InclusionRules) -> StepResult
    where
        H: VoxelGrid + MarkerProvider + ?Sized,
    {
        match self.state {
            DiscoveryState::Completed | DiscoveryState::Aborted => return StepResult::Done,
            DiscoveryState::Idle => {
                self.visited.insert(self.origin);
                self.insert(host, self.origin);
                self.state = DiscoveryState::Running;
                self.steps += 1;
                log::trace!("Discovery started at {}", self.origin);
                return StepResult::Yield;
            }
            DiscoveryState::Running => {}
        }
        self.steps += 1;

        match mem::replace(&mut self.phase, Phase::Dequeue) {
            Phase::Dequeue => {
                if self.result.size() >= self.limit {
                    self.finish();
                    return StepResult::Done;
                }
                let Some(current) = self.queue.pop_front() else {
                    self.finish();
                    return StepResult::Done;
                };
                if current != self.origin && !self.accepts(&host.resolve(current), rules) {
                    log::trace!("Dropping changed node {}", current);
                    if let Some(marker) = self.result.remove(current) {
                        host.despawn_marker(marker);
                    }
                    return StepResult::Yield;
                }
                self.phase = Phase::Expand {
                    current,
                    cursor: NeighborCursor::new(current),
                    children: Vec::new(),
                };
            }
            Phase::Expand {
                current,
                mut cursor,
                mut children,
            } => match cursor.next_candidate(&self.visited, &*host) {
                None => {
                    self.phase = Phase::Link { children, i: 0, j: 1 };
                }
                Some((candidate, voxel)) => {
                    self.visited.insert(candidate);
                    if self.accepts(&voxel, rules) {
                        if self.result.size() >= self.limit {
                            self.phase = Phase::Link { children, i: 0, j: 1 };
                            return StepResult::Yield;
                        }
                        self.insert(host, candidate);
                        self.result.graph.add_edge(current, candidate);
                        children.push(candidate);
                    }
                    self.phase = Phase::Expand {
                        current,
                        cursor,
                        children,
                    };
                }
            },
            Phase::Link {
                children,
                mut i,
                mut j,
            } => {
                while i < children.len() {
                    if j >= children.len() {
                        i += 1;
                        j = i + 1;
                        continue;
                    }
                    let (a, b) = (children[i], children[j]);
                    j += 1;
                    if a.is_adjacent(b) && self.result.graph.add_edge(a, b) {
                        self.phase = Phase::Link { children, i, j };
                        return StepResult::Yield;
                    }
                }
            }
        }
        StepResult::Yield
    }

    fn finish(&mut self) {
        self.result.finalize();
        self.state = DiscoveryState::Completed;
        log::debug!(
            "Discovery at {} found {} nodes in {} steps",
            self.origin,
            self.result.size(),
            self.steps
        );
        let empty = self.empty_result();
        let result = mem::replace(&mut self.result, empty);
        self.deliver(DiscoveryOutcome::Completed(result));
    }

    /// Stop early and deliver the partial graph
    pub fn abort(&mut self) {
        if self.is_finished() {
            return;
        }
        self.result.finalize();
        self.state = DiscoveryState::Aborted;
        log::warn!(
            "Discovery at {} aborted with {} nodes",
            self.origin,
            self.result.size()
        );
        let empty = self.empty_result();
        let result = mem::replace(&mut self.result, empty);
        self.deliver(DiscoveryOutcome::Aborted(result));
    }

    fn empty_result(&self) -> DiscoveryResult {
        DiscoveryResult::new(self.origin, self.result.block.clone(), None)
    }

    fn deliver(&mut self, outcome: DiscoveryOutcome) {
        match self.resolver.as_mut() {
            Some(resolver) => {
                if !resolver.resolve(outcome) {
                    log::debug!("Discovery ticket for {} was dropped", self.origin);
                }
            }
            None => self.outcome = Some(outcome),
        }
    }

    /// Step until finished, ignoring tick budgets
    pub fn run_to_completion<H>(&mut self, host: &mut H, rules: &InclusionRules) -> Option<DiscoveryOutcome>
    where
        H: VoxelGrid + MarkerProvider + ?Sized,
    {
        while self.step(host, rules) != StepResult::Done {}
        self.take_outcome()
    }
}

impl Drop for DiscoveryJob {
    fn drop(&mut self) {
        if !self.is_finished() && self.resolver.is_some() {
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    const OAK: &str = "minecraft:oak_log";

    fn options(chop_limit: usize, max_reachable: usize) -> DiscoveryOptions {
        DiscoveryOptions {
            chop_limit,
            max_reachable,
            spawn_markers: false,
        }
    }

    fn discover(host: &mut MemoryHost, origin: Coord, opts: DiscoveryOptions) -> DiscoveryResult {
        let voxel = host.resolve(origin);
        let mut job = DiscoveryJob::new(origin, &voxel, opts);
        job.run_to_completion(host, &InclusionRules::default())
            .expect("finished job has an outcome")
            .into_result()
    }

    #[test]
    fn test_stacked_logs() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 6, OAK);

        let r = discover(&mut host, Coord::new(0, 0, 0), options(300, usize::MAX));
        assert_eq!(r.size(), 6);
        assert_eq!(r.profile.len(), 6);
        assert!(r.graph.is_connected_from(Coord::new(0, 0, 0)));
    }

    #[test]
    fn test_budget_bounds_size() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 6, OAK);

        let r = discover(&mut host, Coord::new(0, 0, 0), options(300, 2));
        assert_eq!(r.size(), 2);

        let r = discover(&mut host, Coord::new(0, 0, 0), options(3, usize::MAX));
        assert_eq!(r.size(), 3);

        let r = discover(&mut host, Coord::new(0, 0, 0), options(300, 0));
        assert_eq!(r.size(), 1);
    }

    #[test]
    fn test_other_types_and_gaps_excluded() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 3, OAK);
        host.place_block(Coord::new(1, 1, 0), "minecraft:birch_log");
        host.place_block(Coord::new(0, 3, 0), "minecraft:oak_leaves");
        host.place_block(Coord::new(0, 5, 0), OAK);
        host.place_block(Coord::new(1, 2, 1), "minecraft:stripped_oak_log");

        let r = discover(&mut host, Coord::new(0, 0, 0), DiscoveryOptions::default());
        assert_eq!(r.size(), 3);
        assert!(!r.contains(Coord::new(1, 1, 0)));
        assert!(!r.contains(Coord::new(0, 5, 0)));
    }

    #[test]
    fn test_diagonal_branches_and_sibling_edges() {
        let mut host = MemoryHost::new();
        let origin = Coord::new(0, 0, 0);
        host.place_block(origin, OAK);
        host.place_block(Coord::new(1, 1, 0), OAK);
        host.place_block(Coord::new(1, 1, 1), OAK);

        let r = discover(&mut host, origin, DiscoveryOptions::default());
        assert_eq!(r.size(), 3);
        // Both are children of the origin and neighbors of each other
        assert!(r.graph.has_edge(Coord::new(1, 1, 0), Coord::new(1, 1, 1)));
        assert!(r.graph.has_edge(origin, Coord::new(1, 1, 1)));
    }

    #[test]
    fn test_edges_symmetric_and_adjacent() {
        let mut host = MemoryHost::new();
        for x in 0..3 {
            for z in 0..3 {
                host.place_column(Coord::new(x, 0, z), 4, OAK);
            }
        }
        let r = discover(&mut host, Coord::new(1, 0, 1), DiscoveryOptions::default());
        assert_eq!(r.size(), 36);
        for node in r.graph.nodes() {
            for &n in &node.neighbors {
                assert!(node.coord.is_adjacent(n));
                assert!(r.graph.has_edge(n, node.coord));
            }
        }
        assert_eq!(r.trunk.columns.len(), 9);
    }

    #[test]
    fn test_unloaded_voxels_skipped() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 4, OAK);
        host.set_unloaded(Coord::new(0, 2, 0), true);

        let r = discover(&mut host, Coord::new(0, 0, 0), DiscoveryOptions::default());
        assert_eq!(r.size(), 2);
    }

    #[test]
    fn test_idempotent_rediscovery() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 5, OAK);
        host.place_column(Coord::new(1, 3, 0), 2, OAK);

        let a = discover(&mut host, Coord::new(0, 0, 0), DiscoveryOptions::default());
        let b = discover(&mut host, Coord::new(0, 0, 0), DiscoveryOptions::default());
        assert!(a.graph.structurally_equal(&b.graph));
        assert_eq!(a.graph.edge_count(), b.graph.edge_count());
    }

    #[test]
    fn test_markers_follow_nodes() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 4, OAK);
        let voxel = host.resolve(Coord::new(0, 0, 0));
        let opts = DiscoveryOptions {
            spawn_markers: true,
            ..Default::default()
        };
        let mut job = DiscoveryJob::new(Coord::new(0, 0, 0), &voxel, opts);
        let r = job
            .run_to_completion(&mut host, &InclusionRules::default())
            .unwrap()
            .into_result();

        assert_eq!(host.marker_count(), 4);
        for y in 0..4 {
            assert!(r.marker_for(Coord::new(0, y, 0)).is_some());
        }
    }

    #[test]
    fn test_ticket_resolved_on_completion() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 3, OAK);
        let voxel = host.resolve(Coord::new(0, 0, 0));

        let mut job = DiscoveryJob::new(Coord::new(0, 0, 0), &voxel, DiscoveryOptions::default());
        let mut ticket = job.ticket();
        let rules = InclusionRules::default();

        let mut steps = 0;
        while job.step(&mut host, &rules) != StepResult::Done {
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(job.state(), DiscoveryState::Completed);
        let outcome = ticket.try_take().unwrap();
        assert!(outcome.is_completed());
        assert_eq!(outcome.result().size(), 3);
    }

    #[test]
    fn test_drop_resolves_as_aborted() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 10, OAK);
        let voxel = host.resolve(Coord::new(0, 0, 0));
        let rules = InclusionRules::default();

        let mut job = DiscoveryJob::new(Coord::new(0, 0, 0), &voxel, DiscoveryOptions::default());
        let mut ticket = job.ticket();
        for _ in 0..5 {
            job.step(&mut host, &rules);
        }
        assert_eq!(job.state(), DiscoveryState::Running);
        drop(job);

        match ticket.try_take() {
            Some(DiscoveryOutcome::Aborted(partial)) => {
                assert!(partial.size() >= 1 && partial.size() < 10)
            }
            other => panic!("expected aborted outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_changed_node_dropped_on_dequeue() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 4, OAK);
        let voxel = host.resolve(Coord::new(0, 0, 0));
        let rules = InclusionRules::default();

        let mut job = DiscoveryJob::new(Coord::new(0, 0, 0), &voxel, DiscoveryOptions::default());
        // Seed, dequeue origin, then scan until (0,1,0) is inserted
        while job.len() < 2 {
            job.step(&mut host, &rules);
        }
        host.place(Coord::new(0, 1, 0), Voxel::air());

        let r = job.run_to_completion(&mut host, &rules).unwrap().into_result();
        assert!(!r.contains(Coord::new(0, 1, 0)));
        assert_eq!(r.size(), 1);
    }
}
