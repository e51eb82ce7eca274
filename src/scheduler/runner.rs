//! Round-robin job runner

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::job::{Job, JobId, StepResult};

/// Per-tick counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Steps executed
    pub steps: usize,
    /// Jobs that finished this tick
    pub completed: usize,
    /// Jobs still queued after the tick
    pub remaining: usize,
    /// Stopped because the wall-clock slice ran out
    pub timed_out: bool,
}

struct Slot<J> {
    id: JobId,
    job: J,
    /// First tick the job may run again
    wake_at: u64,
}

/// Interleaves jobs one step at a time.
///
/// Within a tick each runnable job gets a step in turn until either
/// `steps_per_tick` steps have run, the wall-clock slice is spent, or every
/// remaining job is asleep.
pub struct Scheduler<J> {
    jobs: VecDeque<Slot<J>>,
    next_id: u64,
    steps_per_tick: usize,
    /// None disables the wall-clock check
    slice: Option<Duration>,
}

impl<J> Scheduler<J> {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `steps_per_tick` - Maximum steps per tick (at least 1)
    /// * `slice_ms` - Wall-clock budget per tick, 0 for unlimited
    pub fn new(steps_per_tick: usize, slice_ms: u64) -> Self {
        Self {
            jobs: VecDeque::new(),
            next_id: 0,
            steps_per_tick: steps_per_tick.max(1),
            slice: (slice_ms > 0).then(|| Duration::from_millis(slice_ms)),
        }
    }

    /// Change the per-tick limits. Applies from the next tick.
    pub fn set_limits(&mut self, steps_per_tick: usize, slice_ms: u64) {
        self.steps_per_tick = steps_per_tick.max(1);
        self.slice = (slice_ms > 0).then(|| Duration::from_millis(slice_ms));
    }

    /// Queue a job. It runs starting with the next tick.
    pub fn spawn(&mut self, job: J) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.push_back(Slot {
            id,
            job,
            wake_at: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.iter().any(|s| s.id == id)
    }

    /// Iterate queued jobs in run order
    pub fn jobs(&self) -> impl Iterator<Item = &J> {
        self.jobs.iter().map(|s| &s.job)
    }

    /// Run one tick's worth of steps
    pub fn run_tick<C>(&mut self, ctx: &mut C, now: u64) -> TickStats
    where
        J: Job<C>,
    {
        let started = Instant::now();
        let mut stats = TickStats::default();
        // Consecutive sleeping jobs seen; a full lap means nothing can run
        let mut asleep = 0usize;

        while stats.steps < self.steps_per_tick && asleep < self.jobs.len() {
            let Some(mut slot) = self.jobs.pop_front() else {
                break;
            };
            if slot.wake_at > now {
                self.jobs.push_back(slot);
                asleep += 1;
                continue;
            }
            asleep = 0;

            let result = slot.job.step(ctx);
            stats.steps += 1;
            match result {
                StepResult::Yield => self.jobs.push_back(slot),
                StepResult::Sleep(ticks) => {
                    slot.wake_at = now + ticks.max(1);
                    self.jobs.push_back(slot);
                }
                StepResult::Done => {
                    log::trace!("Job {} ({:?}) done", slot.job.name(), slot.id);
                    stats.completed += 1;
                }
            }

            if let Some(slice) = self.slice {
                if started.elapsed() >= slice {
                    stats.timed_out = true;
                    log::debug!("Tick slice spent after {} steps", stats.steps);
                    break;
                }
            }
        }

        stats.remaining = self.jobs.len();
        stats
    }

    /// Abort and remove every job matching `pred`. Returns how many were removed.
    pub fn cancel_where<C>(&mut self, ctx: &mut C, mut pred: impl FnMut(&J) -> bool) -> usize
    where
        J: Job<C>,
    {
        let mut kept = VecDeque::with_capacity(self.jobs.len());
        let mut cancelled = 0;
        for mut slot in self.jobs.drain(..) {
            if pred(&slot.job) {
                log::warn!("Aborting job {} ({:?})", slot.job.name(), slot.id);
                slot.job.abort(ctx);
                cancelled += 1;
            } else {
                kept.push_back(slot);
            }
        }
        self.jobs = kept;
        cancelled
    }

    /// Abort every job
    pub fn abort_all<C>(&mut self, ctx: &mut C) -> usize
    where
        J: Job<C>,
    {
        self.cancel_where(ctx, |_| true)
    }
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self::new(256, 0)
    }
}
