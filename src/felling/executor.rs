//! Step-wise felling
//!
//! Removes a claimed tree one batch per step, then drops its yield one stack
//! per step at the origin, then debits the tool and retires the record.

use std::collections::{BTreeMap, VecDeque};

use crate::config::FellingConfig;
use crate::core::types::ActorId;
use crate::host::{ActorHost, BlockSink, MarkerProvider};
use crate::inspection::{InspectionCache, InspectionRecord, RecordId};
use crate::scheduler::{ticket, Resolver, StepResult, Ticket};
use crate::voxel::{BlockId, Coord, VoxelGrid};

use super::batch::{group_adjacent, RemovalBatch};
use super::plan::{FellingPlan, Infeasible};
use super::stacks::{yield_stacks, ItemStack};
use super::tool::{Budget, Lumberjack, ToolWear};

/// Completed felling
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FellingSummary {
    pub origin: Coord,
    /// Logs removed, origin excluded
    pub removed: usize,
    /// Durability debited
    pub cost: u32,
    pub wear: ToolWear,
    /// Items dropped
    pub items: u64,
}

/// Final answer to a break
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FellingReport {
    Felled(FellingSummary),
    Rejected(Infeasible),
    /// Another felling job owns this tree
    Conflict,
    /// Cancelled part way; only `removed` logs were paid for
    Aborted { removed: usize, cost: u32 },
}

pub type BreakTicket = Ticket<FellingReport>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Removing,
    Dropping,
    Finishing,
    Done,
}

/// Felling of one claimed record
pub struct FellingJob {
    actor: ActorId,
    record: RecordId,
    origin: Coord,
    /// Type id every removed node must still have
    block: BlockId,
    plan: FellingPlan,
    base_cost: u32,
    stack_size: u32,
    immersive_delay: Option<u64>,
    phase: Phase,
    batches: VecDeque<RemovalBatch>,
    stacks: VecDeque<ItemStack>,
    removed: usize,
    removed_counts: BTreeMap<BlockId, usize>,
    items: u64,
    resolver: Option<Resolver<FellingReport>>,
}

impl FellingJob {
    /// Create a new job for an already claimed record.
    ///
    /// `origin` is the log broken by the actor. It is left to the host and
    /// the yield is dropped there.
    pub fn new(
        actor: ActorId,
        origin: Coord,
        record: &InspectionRecord,
        plan: FellingPlan,
        config: &FellingConfig,
    ) -> Self {
        let coords = record.result.graph.nodes().map(|n| n.coord).filter(|&c| c != origin);
        let batches: VecDeque<RemovalBatch> = group_adjacent(coords, config.max_vertical_gap).into();
        log::debug!(
            "Felling {} for {}: {} nodes in {} batches, cost {}",
            record.id,
            actor,
            plan.nodes,
            batches.len(),
            plan.total_cost
        );
        Self {
            actor,
            record: record.id,
            origin,
            block: record.result.block.clone(),
            plan,
            base_cost: config.durability_damage_per_block,
            stack_size: config.stack_size,
            immersive_delay: config.immersive_mode.then_some(config.immersive_delay_ticks),
            phase: Phase::Removing,
            batches,
            stacks: VecDeque::new(),
            removed: 0,
            removed_counts: BTreeMap::new(),
            items: 0,
            resolver: None,
        }
    }

    /// Deliver the report through a ticket
    pub fn ticket(&mut self) -> BreakTicket {
        let (resolver, ticket) = ticket();
        self.resolver = Some(resolver);
        ticket
    }

    /// Deliver the report through an existing resolver
    pub fn with_resolver(mut self, resolver: Resolver<FellingReport>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn record(&self) -> RecordId {
        self.record
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Advance by one batch, one stack, or the final commit
    pub fn step<H>(&mut self, host: &mut H, cache: &mut InspectionCache) -> StepResult
    where
        H: VoxelGrid + BlockSink + ActorHost + MarkerProvider + ?Sized,
    {
        match self.phase {
            Phase::Removing => {
                let Some(batch) = self.batches.pop_front() else {
                    self.start_dropping();
                    return StepResult::Yield;
                };
                self.remove_batch(host, cache, &batch);
                if self.batches.is_empty() {
                    self.start_dropping();
                    StepResult::Yield
                } else if let Some(delay) = self.immersive_delay {
                    StepResult::Sleep(delay)
                } else {
                    StepResult::Yield
                }
            }
            Phase::Dropping => {
                match self.stacks.pop_front() {
                    Some(stack) => {
                        host.spawn_stack(&stack.block, stack.count, self.origin);
                        self.items += stack.count as u64;
                    }
                    None => self.phase = Phase::Finishing,
                }
                StepResult::Yield
            }
            Phase::Finishing => {
                self.complete(host, cache);
                StepResult::Done
            }
            Phase::Done => StepResult::Done,
        }
    }

    /// Remove the batch's nodes that are still logs of the felled type.
    /// Anything already gone is neither counted nor yielded.
    fn remove_batch<H>(&mut self, host: &mut H, cache: &mut InspectionCache, batch: &RemovalBatch)
    where
        H: VoxelGrid + BlockSink + ?Sized,
    {
        let live: Vec<Coord> = batch
            .nodes
            .iter()
            .copied()
            .filter(|&c| {
                let voxel = host.resolve(c);
                voxel.is_valid() && voxel.block == self.block
            })
            .collect();

        if live.len() == batch.len() && !batch.is_single() {
            host.remove_range(batch.from, batch.to);
        } else {
            for &c in &live {
                host.remove_block(c);
            }
        }
        if live.len() < batch.len() {
            log::debug!(
                "{} of {} logs in {}..{} were already gone",
                batch.len() - live.len(),
                batch.len(),
                batch.from,
                batch.to
            );
        }
        self.removed += live.len();
        if !live.is_empty() {
            *self.removed_counts.entry(self.block.clone()).or_insert(0) += live.len();
        }

        if let Some(record) = cache.get_mut(self.record) {
            for c in &live {
                record.result.profile.mark_felled(c.y);
            }
        }
        log::trace!("Removed {}..{} ({} logs)", batch.from, batch.to, live.len());
    }

    fn start_dropping(&mut self) {
        self.stacks = yield_stacks(&self.removed_counts, self.stack_size).into();
        self.phase = Phase::Dropping;
    }

    /// Durability owed for the logs actually removed
    fn cost_for(&self, jack: &Lumberjack) -> u32 {
        if self.removed == self.plan.nodes {
            return self.plan.total_cost;
        }
        jack.tool
            .map_or(0, |tool| Budget::new(&tool, self.base_cost).cost_of(self.removed))
    }

    fn complete<H>(&mut self, host: &mut H, cache: &mut InspectionCache)
    where
        H: ActorHost + MarkerProvider + ?Sized,
    {
        let (cost, wear) = match host.lumberjack(self.actor) {
            Some(mut jack) => {
                let cost = self.cost_for(&jack);
                let wear = jack.damage(cost);
                host.commit(&jack);
                (cost, wear)
            }
            None => {
                log::warn!("{} left before felling finished, no durability debited", self.actor);
                (0, ToolWear::NoTool)
            }
        };

        self.retire(host, cache);
        self.phase = Phase::Done;

        let summary = FellingSummary {
            origin: self.origin,
            removed: self.removed,
            cost,
            wear,
            items: self.items,
        };
        log::info!(
            "{} felled {} logs at {} for {} durability",
            self.actor,
            summary.removed,
            summary.origin,
            summary.cost
        );
        self.resolve(FellingReport::Felled(summary));
    }

    /// Mark the record done, evict it and despawn its markers
    fn retire<M: MarkerProvider + ?Sized>(&mut self, markers: &mut M, cache: &mut InspectionCache) {
        cache.mark_done(self.record);
        if let Some(mut record) = cache.remove(self.record) {
            record.result.despawn_markers(markers);
        }
    }

    /// Stop early: pay for what was removed, drop its yield, release the claim
    pub fn abort<H>(&mut self, host: &mut H, cache: &mut InspectionCache)
    where
        H: VoxelGrid + BlockSink + ActorHost + MarkerProvider + ?Sized,
    {
        match self.phase {
            Phase::Done => return,
            Phase::Finishing => {
                self.complete(host, cache);
                return;
            }
            Phase::Removing => self.start_dropping(),
            Phase::Dropping => {}
        }
        for stack in self.stacks.drain(..) {
            host.spawn_stack(&stack.block, stack.count, self.origin);
            self.items += stack.count as u64;
        }

        let mut cost = 0;
        if let Some(mut jack) = host.lumberjack(self.actor) {
            cost = self.cost_for(&jack);
            jack.damage(cost);
            host.commit(&jack);
        }

        cache.release(self.record);
        self.phase = Phase::Done;
        log::warn!(
            "Felling for {} aborted after {} of {} logs",
            self.actor,
            self.removed,
            self.plan.nodes
        );
        self.resolve(FellingReport::Aborted {
            removed: self.removed,
            cost,
        });
    }

    fn resolve(&mut self, report: FellingReport) {
        if let Some(resolver) = self.resolver.as_mut() {
            resolver.resolve(report);
        }
    }
}
