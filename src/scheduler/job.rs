//! Job trait

use crate::core::types::ActorId;

/// What a job wants after a step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// More work, run again on the next rotation
    Yield,
    /// Skip this job for the given number of ticks
    Sleep(u64),
    /// Finished, drop the job
    Done,
}

/// Identifier assigned by the scheduler on spawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

/// A unit of cooperative work over a context `C`.
///
/// `step` must do a bounded amount of work. `abort` is called at most once,
/// instead of further steps, and must resolve anything the job promised.
pub trait Job<C> {
    fn step(&mut self, ctx: &mut C) -> StepResult;

    fn abort(&mut self, ctx: &mut C);

    /// Actor this job runs on behalf of
    fn owner(&self) -> Option<ActorId> {
        None
    }

    /// Short label for logging
    fn name(&self) -> &'static str;
}
