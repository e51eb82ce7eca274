//! Immediate answers to probe and break events

use crate::felling::executor::BreakTicket;
use crate::inspection::InspectionReport;
use crate::scheduler::Ticket;

/// Final answer to a probe
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeResult {
    /// Report delivered to the actor
    Reported(InspectionReport),
    /// Cancelled before a report could be built
    Aborted { partial_size: usize },
    /// The tree started being felled while its cached record was checked
    Unavailable,
}

pub type ProbeTicket = Ticket<ProbeResult>;

/// What happened when a probe event arrived
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Work was queued; the ticket resolves when it finishes
    Pending(ProbeTicket),
    /// Same actor probed too recently
    CoolingDown,
    /// Target is not an included log
    NotALog,
    /// Actor holds no felling tool (or is unknown)
    NoTool,
    /// The tree is being felled right now
    Unavailable,
}

impl ProbeOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProbeOutcome::Pending(_))
    }

    pub fn into_ticket(self) -> Option<ProbeTicket> {
        match self {
            ProbeOutcome::Pending(ticket) => Some(ticket),
            _ => None,
        }
    }
}

/// What happened when a log was broken
#[derive(Debug)]
pub enum BreakOutcome {
    /// Felling queued; the ticket resolves with the [`FellingReport`](crate::felling::FellingReport)
    Pending(BreakTicket),
    /// Broken block is not an included log
    NotALog,
    /// Actor is not in survival mode or holds no felling tool
    Ignored,
    /// The tree is already being felled
    Conflict,
}

impl BreakOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, BreakOutcome::Pending(_))
    }

    pub fn into_ticket(self) -> Option<BreakTicket> {
        match self {
            BreakOutcome::Pending(ticket) => Some(ticket),
            _ => None,
        }
    }
}
