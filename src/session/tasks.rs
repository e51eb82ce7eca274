//! Jobs run by a session and the context they step in

use std::collections::VecDeque;
use std::mem;

use crate::config::FellingConfig;
use crate::core::types::ActorId;
use crate::discovery::{DiscoveryJob, DiscoveryOptions, DiscoveryResult};
use crate::felling::{plan_felling, BreakTicket, FellingJob, FellingReport, Infeasible};
use crate::host::{Host, MarkerHandle, MarkerProvider};
use crate::inspection::{InspectionCache, InspectionReport, ReconcileJob, Reconciled, RecordId};
use crate::scheduler::{ticket, DeferredQueue, Job, Resolver, StepResult};
use crate::voxel::{Coord, InclusionRules, Voxel};

use super::outcome::{ProbeResult, ProbeTicket};

/// Timer events owned by a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    /// Evict a record unless it was claimed or refreshed since
    ExpireRecord(RecordId),
}

/// Everything a job may touch during a step
pub struct SessionContext<'a, H: ?Sized> {
    pub host: &'a mut H,
    pub cache: &'a mut InspectionCache,
    pub config: &'a FellingConfig,
    pub rules: &'a InclusionRules,
    pub deferred: &'a mut DeferredQueue<Deferred>,
    pub now: u64,
    /// Jobs to queue once the tick is over
    pub spawned: Vec<SessionJob>,
}

impl<H: ?Sized> SessionContext<'_, H> {
    /// Cache a result and schedule its expiry
    fn cache_result(&mut self, result: DiscoveryResult, claimed: bool) -> RecordId {
        let id = self.cache.push(result, claimed, self.now);
        self.touch(id);
        id
    }

    /// Push a record's expiry out by the configured delay
    fn touch(&mut self, id: RecordId) {
        let due = self.now + self.config.expiry_ticks();
        if let Some(record) = self.cache.get_mut(id) {
            record.expires_at = due;
        }
        self.deferred.schedule(due, Deferred::ExpireRecord(id));
    }

    fn despawn_later(&mut self, handles: Vec<MarkerHandle>) {
        if !handles.is_empty() {
            self.spawned.push(SessionJob::Despawn(DespawnTask::new(handles)));
        }
    }
}

/// Discovery options for a probe: markers on, no budget limit
pub fn probe_options(config: &FellingConfig) -> DiscoveryOptions {
    DiscoveryOptions {
        chop_limit: config.chop_limit,
        max_reachable: usize::MAX,
        spawn_markers: config.spawn_probe_markers,
    }
}

// --- Probe ---

enum ProbeStage {
    Discover(DiscoveryJob),
    Reconcile(ReconcileJob),
    Finished,
}

/// Builds an inspection report, from the cache when possible
pub struct ProbeTask {
    actor: ActorId,
    at: Coord,
    stage: ProbeStage,
    resolver: Resolver<ProbeResult>,
}

impl ProbeTask {
    pub fn discover(actor: ActorId, at: Coord, voxel: &Voxel, config: &FellingConfig) -> (Self, ProbeTicket) {
        let job = DiscoveryJob::new(at, voxel, probe_options(config));
        Self::with_stage(actor, at, ProbeStage::Discover(job))
    }

    pub fn reconcile(actor: ActorId, at: Coord, job: ReconcileJob) -> (Self, ProbeTicket) {
        Self::with_stage(actor, at, ProbeStage::Reconcile(job))
    }

    fn with_stage(actor: ActorId, at: Coord, stage: ProbeStage) -> (Self, ProbeTicket) {
        let (resolver, ticket) = ticket();
        let task = Self {
            actor,
            at,
            stage,
            resolver,
        };
        (task, ticket)
    }

    fn step<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>) -> StepResult {
        match mem::replace(&mut self.stage, ProbeStage::Finished) {
            ProbeStage::Discover(mut job) => {
                if job.step(&mut *ctx.host, ctx.rules) != StepResult::Done {
                    self.stage = ProbeStage::Discover(job);
                    return StepResult::Yield;
                }
                let Some(outcome) = job.take_outcome() else {
                    self.resolver.resolve(ProbeResult::Aborted { partial_size: 0 });
                    return StepResult::Done;
                };
                let id = ctx.cache_result(outcome.into_result(), false);
                self.report(ctx, id, false);
                StepResult::Done
            }
            ProbeStage::Reconcile(mut job) => {
                if job.step(&*ctx.host, ctx.rules) != StepResult::Done {
                    self.stage = ProbeStage::Reconcile(job);
                    return StepResult::Yield;
                }
                if ctx.cache.is_being_felled_at(self.at) {
                    log::debug!("{} probe at {} hit a tree being felled", self.actor, self.at);
                    self.resolver.resolve(ProbeResult::Unavailable);
                    return StepResult::Done;
                }
                let id = match job.apply(ctx.cache, &mut *ctx.host, false, ctx.now) {
                    Reconciled::Vanished => return self.rediscover(ctx),
                    Reconciled::Unchanged(id) => id,
                    Reconciled::Replaced { new, .. } | Reconciled::Appended { new, .. } => new,
                };
                ctx.touch(id);
                self.report(ctx, id, true);
                StepResult::Done
            }
            ProbeStage::Finished => StepResult::Done,
        }
    }

    /// The cached record went away while validating; start over from the grid
    fn rediscover<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>) -> StepResult {
        let voxel = ctx.host.resolve(self.at);
        if !voxel.is_valid() || !ctx.rules.is_included(&voxel.block) {
            self.resolver.resolve(ProbeResult::Aborted { partial_size: 0 });
            return StepResult::Done;
        }
        log::debug!("Cached record for {} vanished, rediscovering", self.at);
        self.stage = ProbeStage::Discover(DiscoveryJob::new(self.at, &voxel, probe_options(ctx.config)));
        StepResult::Yield
    }

    fn report<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>, id: RecordId, cached: bool) {
        let Some(record) = ctx.cache.get(id) else {
            self.resolver.resolve(ProbeResult::Aborted { partial_size: 0 });
            return;
        };
        let tool = ctx.host.lumberjack(self.actor).and_then(|j| j.tool);
        let report = InspectionReport::evaluate(
            &record.result,
            tool.as_ref(),
            ctx.config.durability_damage_per_block,
            ctx.config.chop_limit,
            cached,
        );
        log::debug!(
            "{} probed {} nodes at {} (cached: {})",
            self.actor,
            report.size,
            self.at,
            cached
        );
        ctx.host.report(self.actor, &report);
        self.resolver.resolve(ProbeResult::Reported(report));
    }

    fn abort<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>) {
        let partial_size = match mem::replace(&mut self.stage, ProbeStage::Finished) {
            ProbeStage::Discover(mut job) => {
                job.abort();
                match job.take_outcome() {
                    Some(outcome) => {
                        let mut partial = outcome.into_result();
                        partial.despawn_markers(&mut *ctx.host);
                        partial.size()
                    }
                    None => 0,
                }
            }
            ProbeStage::Reconcile(_) | ProbeStage::Finished => 0,
        };
        self.resolver.resolve(ProbeResult::Aborted { partial_size });
    }
}

// --- Break ---

enum FellStage {
    Discover(DiscoveryJob),
    Reconcile(ReconcileJob),
    Fell(FellingJob),
    Finished,
}

/// Discovers (or reuses) the tree around a broken log and fells it
pub struct FellTask {
    actor: ActorId,
    at: Coord,
    broken: Voxel,
    options: DiscoveryOptions,
    stage: FellStage,
    resolver: Option<Resolver<FellingReport>>,
}

impl FellTask {
    pub fn discover(actor: ActorId, at: Coord, broken: &Voxel, options: DiscoveryOptions) -> (Self, BreakTicket) {
        let job = DiscoveryJob::new(at, broken, options);
        Self::with_stage(actor, at, broken, options, FellStage::Discover(job))
    }

    pub fn reconcile(
        actor: ActorId,
        at: Coord,
        broken: &Voxel,
        options: DiscoveryOptions,
        job: ReconcileJob,
    ) -> (Self, BreakTicket) {
        Self::with_stage(actor, at, broken, options, FellStage::Reconcile(job))
    }

    fn with_stage(
        actor: ActorId,
        at: Coord,
        broken: &Voxel,
        options: DiscoveryOptions,
        stage: FellStage,
    ) -> (Self, BreakTicket) {
        let (resolver, ticket) = ticket();
        let task = Self {
            actor,
            at,
            broken: broken.clone(),
            options,
            stage,
            resolver: Some(resolver),
        };
        (task, ticket)
    }

    fn resolve(&mut self, report: FellingReport) {
        if let Some(resolver) = self.resolver.as_mut() {
            resolver.resolve(report);
        }
    }

    fn step<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>) -> StepResult {
        match mem::replace(&mut self.stage, FellStage::Finished) {
            FellStage::Discover(mut job) => {
                if job.step(&mut *ctx.host, ctx.rules) != StepResult::Done {
                    self.stage = FellStage::Discover(job);
                    return StepResult::Yield;
                }
                let Some(outcome) = job.take_outcome() else {
                    self.resolve(FellingReport::Aborted { removed: 0, cost: 0 });
                    return StepResult::Done;
                };
                let mut result = outcome.into_result();
                if ctx.cache.felling_overlap(&result).is_some() {
                    result.despawn_markers(&mut *ctx.host);
                    return self.conflict();
                }
                let id = ctx.cache_result(result, true);
                self.begin_felling(ctx, id)
            }
            FellStage::Reconcile(mut job) => {
                if job.step(&*ctx.host, ctx.rules) != StepResult::Done {
                    self.stage = FellStage::Reconcile(job);
                    return StepResult::Yield;
                }
                let busy = ctx
                    .cache
                    .get(job.record())
                    .and_then(|record| ctx.cache.felling_overlap(&record.result));
                if busy.is_some() || ctx.cache.is_being_felled_at(self.at) {
                    return self.conflict();
                }
                let id = match job.apply(ctx.cache, &mut *ctx.host, true, ctx.now) {
                    Reconciled::Vanished => {
                        log::debug!("Cached record for {} vanished, rediscovering", self.at);
                        let job = DiscoveryJob::new(self.at, &self.broken, self.options);
                        self.stage = FellStage::Discover(job);
                        return StepResult::Yield;
                    }
                    Reconciled::Unchanged(id) => id,
                    Reconciled::Replaced { new, .. } | Reconciled::Appended { new, .. } => {
                        ctx.touch(new);
                        new
                    }
                };
                self.begin_felling(ctx, id)
            }
            FellStage::Fell(mut job) => {
                let result = job.step(&mut *ctx.host, ctx.cache);
                if result != StepResult::Done {
                    self.stage = FellStage::Fell(job);
                }
                result
            }
            FellStage::Finished => StepResult::Done,
        }
    }

    fn conflict(&mut self) -> StepResult {
        log::warn!("{} broke {} while the tree is being felled", self.actor, self.at);
        self.resolve(FellingReport::Conflict);
        StepResult::Done
    }

    /// Plan against the claimed record and either start felling or reject
    fn begin_felling<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>, id: RecordId) -> StepResult {
        let Some(record) = ctx.cache.get(id) else {
            self.resolve(FellingReport::Aborted { removed: 0, cost: 0 });
            return StepResult::Done;
        };
        let tool = ctx.host.lumberjack(self.actor).and_then(|j| j.tool);
        let planned = plan_felling(
            record.size(),
            tool.as_ref(),
            ctx.config.durability_damage_per_block,
            ctx.config.chop_limit,
        );

        match planned {
            Ok(plan) => {
                let mut job = FellingJob::new(self.actor, self.at, record, plan, ctx.config);
                if let Some(resolver) = self.resolver.take() {
                    job = job.with_resolver(resolver);
                }
                self.stage = FellStage::Fell(job);
                StepResult::Yield
            }
            Err(why @ Infeasible::TooLarge { .. }) => {
                log::info!("{} cannot fell at {}: {}", self.actor, self.at, why);
                if let Some(mut record) = ctx.cache.remove(id) {
                    let handles = record.result.take_markers();
                    ctx.despawn_later(handles);
                }
                self.resolve(FellingReport::Rejected(why));
                StepResult::Done
            }
            Err(why) => {
                log::info!("{} cannot fell at {}: {}", self.actor, self.at, why);
                ctx.cache.release(id);
                self.resolve(FellingReport::Rejected(why));
                StepResult::Done
            }
        }
    }

    fn abort<H: Host + ?Sized>(&mut self, ctx: &mut SessionContext<'_, H>) {
        match mem::replace(&mut self.stage, FellStage::Finished) {
            FellStage::Discover(mut job) => {
                job.abort();
                if let Some(outcome) = job.take_outcome() {
                    outcome.into_result().despawn_markers(&mut *ctx.host);
                }
                self.resolve(FellingReport::Aborted { removed: 0, cost: 0 });
            }
            FellStage::Reconcile(_) => self.resolve(FellingReport::Aborted { removed: 0, cost: 0 }),
            FellStage::Fell(mut job) => job.abort(&mut *ctx.host, ctx.cache),
            FellStage::Finished => {}
        }
    }
}

// --- Marker cleanup ---

/// Despawns markers one per step
pub struct DespawnTask {
    handles: VecDeque<MarkerHandle>,
}

impl DespawnTask {
    pub fn new(handles: Vec<MarkerHandle>) -> Self {
        Self {
            handles: handles.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn step<M: MarkerProvider + ?Sized>(&mut self, markers: &mut M) -> StepResult {
        if let Some(handle) = self.handles.pop_front() {
            markers.despawn_marker(handle);
        }
        if self.handles.is_empty() {
            StepResult::Done
        } else {
            StepResult::Yield
        }
    }

    /// Despawn everything left at once
    pub fn despawn_all<M: MarkerProvider + ?Sized>(&mut self, markers: &mut M) -> usize {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            markers.despawn_marker(handle);
        }
        count
    }
}

// --- Job dispatch ---

/// Every kind of job a session schedules
pub enum SessionJob {
    Probe(ProbeTask),
    Fell(FellTask),
    Despawn(DespawnTask),
}

impl SessionJob {
    /// Actor the job belongs to; cleanup jobs belong to nobody
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            SessionJob::Probe(task) => Some(task.actor),
            SessionJob::Fell(task) => Some(task.actor),
            SessionJob::Despawn(_) => None,
        }
    }

    pub fn is_felling(&self) -> bool {
        matches!(self, SessionJob::Fell(_))
    }
}

impl<'a, H: Host + ?Sized> Job<SessionContext<'a, H>> for SessionJob {
    fn step(&mut self, ctx: &mut SessionContext<'a, H>) -> StepResult {
        match self {
            SessionJob::Probe(task) => task.step(ctx),
            SessionJob::Fell(task) => task.step(ctx),
            SessionJob::Despawn(task) => task.step(&mut *ctx.host),
        }
    }

    fn abort(&mut self, ctx: &mut SessionContext<'a, H>) {
        match self {
            SessionJob::Probe(task) => task.abort(ctx),
            SessionJob::Fell(task) => task.abort(ctx),
            SessionJob::Despawn(task) => {
                task.despawn_all(&mut *ctx.host);
            }
        }
    }

    fn owner(&self) -> Option<ActorId> {
        self.actor()
    }

    fn name(&self) -> &'static str {
        match self {
            SessionJob::Probe(_) => "probe",
            SessionJob::Fell(_) => "fell",
            SessionJob::Despawn(_) => "despawn",
        }
    }
}
