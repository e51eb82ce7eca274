//! Cooperative job scheduling
//!
//! Long-running work is split into jobs that advance one small step at a time.
//! The [`Scheduler`] interleaves them round-robin inside each host tick, under
//! a step count and a wall-clock slice. Deferred timers and one-shot tickets
//! cover the rest of the async surface.

pub mod job;
pub mod runner;
pub mod deferred;
pub mod ticket;

pub use job::{Job, JobId, StepResult};
pub use runner::{Scheduler, TickStats};
pub use deferred::DeferredQueue;
pub use ticket::{ticket, Resolver, Ticket};
