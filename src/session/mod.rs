//! Session: the entry point for host events
//!
//! A session owns the inspection cache, the job scheduler and the deferred
//! timers. The host forwards probe and break events, calls [`Session::tick`]
//! once per host tick, and reports disconnects.

pub mod outcome;
pub mod tasks;

use std::collections::HashMap;

use crate::config::FellingConfig;
use crate::core::time::TickClock;
use crate::core::types::{ActorId, Result};
use crate::discovery::DiscoveryOptions;
use crate::felling::Budget;
use crate::host::Host;
use crate::inspection::{InspectionCache, ReconcileJob, RecordId};
use crate::scheduler::{DeferredQueue, Scheduler, TickStats};
use crate::voxel::{Coord, InclusionRules, Voxel};

pub use outcome::{BreakOutcome, ProbeOutcome, ProbeResult, ProbeTicket};
pub use tasks::{Deferred, DespawnTask, FellTask, ProbeTask, SessionContext, SessionJob};

/// Tree felling state shared by every actor in one world
pub struct Session {
    config: FellingConfig,
    rules: InclusionRules,
    cache: InspectionCache,
    scheduler: Scheduler<SessionJob>,
    deferred: DeferredQueue<Deferred>,
    clock: TickClock,
    /// Tick of each actor's last accepted probe
    cooldowns: HashMap<ActorId, u64>,
}

impl Session {
    /// Create a new session from a validated config
    pub fn new(config: FellingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FellingConfig) -> Self {
        log::info!(
            "Session started (chop limit {}, {} steps per tick)",
            config.chop_limit,
            config.steps_per_tick
        );
        Self {
            rules: InclusionRules::from_config(&config),
            cache: InspectionCache::new(),
            scheduler: Scheduler::new(config.steps_per_tick, config.tick_slice_ms),
            deferred: DeferredQueue::new(),
            clock: TickClock::new(config.ticks_per_second),
            cooldowns: HashMap::new(),
            config,
        }
    }

    /// Swap in a new config. Queued jobs keep the limits they started with.
    pub fn set_config(&mut self, config: FellingConfig) -> Result<()> {
        config.validate()?;
        self.rules = InclusionRules::from_config(&config);
        self.scheduler.set_limits(config.steps_per_tick, config.tick_slice_ms);
        self.config = config;
        log::info!("Session config reloaded");
        Ok(())
    }

    // --- Accessors ---

    pub fn config(&self) -> &FellingConfig {
        &self.config
    }

    pub fn rules(&self) -> &InclusionRules {
        &self.rules
    }

    pub fn cache(&self) -> &InspectionCache {
        &self.cache
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn pending_jobs(&self) -> usize {
        self.scheduler.len()
    }

    /// Queued jobs that are discovering or felling a broken tree
    pub fn felling_jobs(&self) -> usize {
        self.scheduler.jobs().filter(|job| job.is_felling()).count()
    }

    /// No queued jobs and no pending timers
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty() && self.deferred.is_empty()
    }

    /// Latest live record covering `at`
    fn cached_record(&self, at: Coord) -> Option<RecordId> {
        self.cache.find(at).filter(|r| !r.is_done).last().map(|r| r.id)
    }

    // --- Events ---

    /// An actor inspects the log at `at`
    pub fn probe<H: Host + ?Sized>(&mut self, host: &H, actor: ActorId, at: Coord) -> ProbeOutcome {
        let now = self.clock.now();
        let has_tool = host.lumberjack(actor).is_some_and(|j| j.has_tool());
        if !has_tool {
            return ProbeOutcome::NoTool;
        }
        let voxel = host.resolve(at);
        if !voxel.is_valid() || !self.rules.is_included(&voxel.block) {
            return ProbeOutcome::NotALog;
        }
        if let Some(&last) = self.cooldowns.get(&actor) {
            if now < last + self.config.probe_cooldown_ticks {
                log::trace!("{} probe ignored, cooling down", actor);
                return ProbeOutcome::CoolingDown;
            }
        }
        if self.cache.is_being_felled_at(at) {
            return ProbeOutcome::Unavailable;
        }
        self.cooldowns.insert(actor, now);

        let reconcile = self
            .cached_record(at)
            .and_then(|id| ReconcileJob::new(&self.cache, id, at));
        let (task, ticket) = match reconcile {
            Some(job) => {
                log::debug!("{} probe at {} hits {}", actor, at, job.record());
                ProbeTask::reconcile(actor, at, job)
            }
            None => ProbeTask::discover(actor, at, &voxel, &self.config),
        };
        self.scheduler.spawn(SessionJob::Probe(task));
        ProbeOutcome::Pending(ticket)
    }

    /// An actor broke `broken` at `at`. The host has already removed it.
    pub fn break_block<H: Host + ?Sized>(
        &mut self,
        host: &H,
        actor: ActorId,
        at: Coord,
        broken: &Voxel,
    ) -> BreakOutcome {
        let Some(jack) = host.lumberjack(actor) else {
            return BreakOutcome::Ignored;
        };
        if !jack.is_survival_mode() {
            return BreakOutcome::Ignored;
        }
        if !self.rules.is_included(&broken.block) {
            return BreakOutcome::NotALog;
        }
        let Some(tool) = jack.tool else {
            return BreakOutcome::Ignored;
        };
        if self.cache.is_being_felled_at(at) {
            log::warn!("{} broke {} while the tree is being felled", actor, at);
            return BreakOutcome::Conflict;
        }

        // The broken log itself is free, so the budget covers one more node
        let budget = Budget::new(&tool, self.config.durability_damage_per_block);
        let options = DiscoveryOptions {
            chop_limit: self.config.chop_limit,
            max_reachable: budget.reachable_nodes().saturating_add(1),
            spawn_markers: false,
        };

        let reconcile = self
            .cached_record(at)
            .and_then(|id| ReconcileJob::new(&self.cache, id, at));
        let (task, ticket) = match reconcile {
            Some(job) => FellTask::reconcile(actor, at, broken, options, job),
            None => FellTask::discover(actor, at, broken, options),
        };
        self.scheduler.spawn(SessionJob::Fell(task));
        BreakOutcome::Pending(ticket)
    }

    /// Cancel every job of a departing actor and forget its cooldown
    pub fn disconnect<H: Host + ?Sized>(&mut self, host: &mut H, actor: ActorId) -> usize {
        self.cooldowns.remove(&actor);
        let now = self.clock.now();
        let mut ctx = SessionContext {
            host,
            cache: &mut self.cache,
            config: &self.config,
            rules: &self.rules,
            deferred: &mut self.deferred,
            now,
            spawned: Vec::new(),
        };
        let cancelled = self
            .scheduler
            .cancel_where(&mut ctx, |job| job.actor() == Some(actor));
        let SessionContext { spawned, .. } = ctx;
        for job in spawned {
            self.scheduler.spawn(job);
        }
        if cancelled > 0 {
            log::info!("{} disconnected, {} jobs cancelled", actor, cancelled);
        }
        cancelled
    }

    /// Host interrupt: abort every queued job
    pub fn interrupt<H: Host + ?Sized>(&mut self, host: &mut H) -> usize {
        let felling = self.felling_jobs();
        let now = self.clock.now();
        let mut ctx = SessionContext {
            host,
            cache: &mut self.cache,
            config: &self.config,
            rules: &self.rules,
            deferred: &mut self.deferred,
            now,
            spawned: Vec::new(),
        };
        let aborted = self.scheduler.abort_all(&mut ctx);
        // Marker cleanup spawned by aborts is finished on the spot
        let SessionContext { host, spawned, .. } = ctx;
        for job in spawned {
            if let SessionJob::Despawn(mut task) = job {
                task.despawn_all(&mut *host);
            }
        }
        log::warn!("Session interrupted, {} jobs aborted ({} felling)", aborted, felling);
        aborted
    }

    // --- Ticking ---

    /// Advance one host tick: fire due timers, then run jobs
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H) -> TickStats {
        let now = self.clock.advance();
        for event in self.deferred.drain_due(now) {
            self.handle_deferred(event, now);
        }

        let mut ctx = SessionContext {
            host,
            cache: &mut self.cache,
            config: &self.config,
            rules: &self.rules,
            deferred: &mut self.deferred,
            now,
            spawned: Vec::new(),
        };
        let stats = self.scheduler.run_tick(&mut ctx, now);
        let SessionContext { spawned, .. } = ctx;
        for job in spawned {
            self.scheduler.spawn(job);
        }
        stats
    }

    /// Tick until idle or `max_ticks` have passed. Returns the ticks run.
    pub fn run_until_idle<H: Host + ?Sized>(&mut self, host: &mut H, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while !self.is_idle() && ticks < max_ticks {
            self.tick(host);
            ticks += 1;
        }
        ticks
    }

    /// Tick until no jobs are queued, leaving timers pending
    pub fn run_jobs<H: Host + ?Sized>(&mut self, host: &mut H, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while !self.scheduler.is_empty() && ticks < max_ticks {
            self.tick(host);
            ticks += 1;
        }
        ticks
    }

    fn handle_deferred(&mut self, event: Deferred, now: u64) {
        match event {
            Deferred::ExpireRecord(id) => {
                let Some(record) = self.cache.get(id) else {
                    return;
                };
                if record.is_being_felled || record.expires_at > now {
                    return;
                }
                if let Some(mut record) = self.cache.remove(id) {
                    let handles = record.result.take_markers();
                    log::debug!("{} expired, despawning {} markers", id, handles.len());
                    if !handles.is_empty() {
                        self.scheduler.spawn(SessionJob::Despawn(DespawnTask::new(handles)));
                    }
                }
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::build(FellingConfig::default())
    }
}
