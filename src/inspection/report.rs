//! Read-only report shown to a probing actor

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryResult;
use crate::felling::plan::{plan_felling, Infeasible};
use crate::felling::tool::{durability_cost, ToolState};
use crate::voxel::{BlockId, Coord};

/// Summary of a probed tree and whether the held tool can fell it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub origin: Coord,
    pub block: BlockId,
    pub variant: Option<String>,
    /// Logs in the tree, origin included
    pub size: usize,
    /// Durability felling would cost
    pub cost: u32,
    /// Durability already consumed
    pub damage: u32,
    pub max_durability: u32,
    pub infeasible: Option<Infeasible>,
    /// Served from the inspection cache
    pub cached: bool,
}

impl InspectionReport {
    /// Evaluate `result` against the held tool
    pub fn evaluate(
        result: &DiscoveryResult,
        tool: Option<&ToolState>,
        base_cost: u32,
        chop_limit: usize,
        cached: bool,
    ) -> Self {
        let size = result.size();
        let unbreaking = tool.map_or(0, |t| t.unbreaking);
        let (cost, infeasible) = match plan_felling(size, tool, base_cost, chop_limit) {
            Ok(plan) => (plan.total_cost, None),
            Err(why) => (durability_cost(size.saturating_sub(1), base_cost, unbreaking), Some(why)),
        };
        Self {
            origin: result.origin,
            block: result.block.clone(),
            variant: result.variant.clone(),
            size,
            cost,
            damage: tool.map_or(0, |t| t.damage),
            max_durability: tool.map_or(0, |t| t.max_durability),
            infeasible,
            cached,
        }
    }

    pub fn can_be_felled(&self) -> bool {
        self.infeasible.is_none()
    }

    /// Durability left after felling, if feasible
    pub fn remaining_after(&self) -> Option<u32> {
        if !self.can_be_felled() {
            return None;
        }
        Some(self.max_durability.saturating_sub(self.damage + self.cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_of(size: i32) -> DiscoveryResult {
        let mut r = DiscoveryResult::new(Coord::new(0, 0, 0), BlockId::new("minecraft:log"), Some("spruce".into()));
        for y in 0..size {
            r.insert(Coord::new(0, y, 0), None);
        }
        r
    }

    #[test]
    fn test_feasible_report() {
        let tool = ToolState::new(100, 1).with_damage(10);
        let report = InspectionReport::evaluate(&result_of(6), Some(&tool), 3, 300, false);
        assert!(report.can_be_felled());
        assert_eq!(report.size, 6);
        assert_eq!(report.cost, 8);
        assert_eq!(report.remaining_after(), Some(82));
        assert_eq!(report.variant.as_deref(), Some("spruce"));
    }

    #[test]
    fn test_infeasible_report_still_has_cost() {
        let tool = ToolState::new(20, 0).with_damage(10);
        let report = InspectionReport::evaluate(&result_of(6), Some(&tool), 3, 300, true);
        assert_eq!(report.cost, 15);
        assert_eq!(
            report.infeasible,
            Some(Infeasible::NotEnoughDurability {
                required: 15,
                available: 10
            })
        );
        assert_eq!(report.remaining_after(), None);
    }
}
