//! Feasibility check before felling

use serde::{Deserialize, Serialize};

use super::tool::{durability_cost, ToolState};

/// Why a tree cannot be felled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Infeasible {
    /// More nodes than `chop_limit`
    TooLarge { size: usize, limit: usize },
    /// Felling would push the tool past its maximum durability
    NotEnoughDurability { required: u32, available: u32 },
    /// No felling tool held
    NoTool,
}

impl std::fmt::Display for Infeasible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Infeasible::TooLarge { size, limit } => {
                write!(f, "tree too large ({} logs, limit {})", size, limit)
            }
            Infeasible::NotEnoughDurability { required, available } => {
                write!(f, "not enough durability ({} required, {} available)", required, available)
            }
            Infeasible::NoTool => write!(f, "no felling tool held"),
        }
    }
}

/// Accepted felling plan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FellingPlan {
    /// Nodes to remove, origin excluded
    pub nodes: usize,
    pub total_cost: u32,
    /// Cost lands exactly on the maximum, so the tool breaks on completion
    pub destroys_tool: bool,
}

/// Decide whether a tree of `size` nodes can be felled with `tool`.
///
/// The origin is removed by the triggering break and costs nothing here.
pub fn plan_felling(
    size: usize,
    tool: Option<&ToolState>,
    base_cost: u32,
    chop_limit: usize,
) -> Result<FellingPlan, Infeasible> {
    if size > chop_limit {
        return Err(Infeasible::TooLarge {
            size,
            limit: chop_limit,
        });
    }
    let tool = tool.ok_or(Infeasible::NoTool)?;

    let nodes = size.saturating_sub(1);
    let total_cost = durability_cost(nodes, base_cost, tool.unbreaking);
    let after = tool.damage as u64 + total_cost as u64;
    let max = tool.max_durability as u64;

    if after > max {
        return Err(Infeasible::NotEnoughDurability {
            required: total_cost,
            available: tool.remaining(),
        });
    }

    Ok(FellingPlan {
        nodes,
        total_cost,
        destroys_tool: after == max,
    })
}
