//! Tool durability and the lumberjack snapshot
//!
//! Durability is tracked the way the host reports it: `damage` counts up from
//! zero and the tool breaks when it reaches `max_durability`. Each felled log
//! costs `base / (unbreaking + 1)` durability, rounded up over the whole tree.

use serde::{Deserialize, Serialize};

use crate::core::types::ActorId;

/// Durability state of the held felling tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolState {
    /// Durability consumed so far
    pub damage: u32,
    pub max_durability: u32,
    /// Unbreaking enchantment level, 0 when absent
    pub unbreaking: u8,
}

impl ToolState {
    /// Create a new, undamaged tool
    pub fn new(max_durability: u32, unbreaking: u8) -> Self {
        Self {
            damage: 0,
            max_durability,
            unbreaking,
        }
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage.min(self.max_durability);
        self
    }

    /// Durability left before the tool breaks
    pub fn remaining(&self) -> u32 {
        self.max_durability.saturating_sub(self.damage)
    }
}

/// Durability cost of felling `nodes` logs, rounded up
pub fn durability_cost(nodes: usize, base_cost: u32, unbreaking: u8) -> u32 {
    let divisor = unbreaking as u64 + 1;
    let total = (nodes as u64 * base_cost as u64).div_ceil(divisor);
    total.min(u32::MAX as u64) as u32
}

/// Remaining tool capacity expressed in whole nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    remaining: u32,
    base_cost: u32,
    unbreaking: u8,
}

impl Budget {
    pub fn new(tool: &ToolState, base_cost: u32) -> Self {
        Self {
            remaining: tool.remaining(),
            base_cost,
            unbreaking: tool.unbreaking,
        }
    }

    /// Budget that never limits discovery
    pub fn unlimited() -> Self {
        Self {
            remaining: u32::MAX,
            base_cost: 0,
            unbreaking: 0,
        }
    }

    /// Number of nodes the remaining durability pays for
    pub fn reachable_nodes(&self) -> usize {
        if self.base_cost == 0 {
            return usize::MAX;
        }
        let scaled = self.remaining as u64 * (self.unbreaking as u64 + 1);
        (scaled / self.base_cost as u64).min(usize::MAX as u64) as usize
    }

    pub fn cost_of(&self, nodes: usize) -> u32 {
        durability_cost(nodes, self.base_cost, self.unbreaking)
    }
}

/// Outcome of applying durability damage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolWear {
    /// Tool survived with this much damage
    Intact { damage: u32 },
    /// Tool reached its maximum and was destroyed
    Broken,
    /// Nothing was held
    NoTool,
}

/// Owned snapshot of an actor, read from and committed back to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lumberjack {
    pub actor: ActorId,
    /// Creative and spectator actors are not survival
    pub survival: bool,
    /// Felling tool in the main hand, if any
    pub tool: Option<ToolState>,
}

impl Lumberjack {
    pub fn new(actor: ActorId, survival: bool, tool: Option<ToolState>) -> Self {
        Self {
            actor,
            survival,
            tool,
        }
    }

    pub fn is_survival_mode(&self) -> bool {
        self.survival
    }

    pub fn has_tool(&self) -> bool {
        self.tool.is_some()
    }

    /// Apply durability damage, destroying the tool once it reaches its maximum
    pub fn damage(&mut self, amount: u32) -> ToolWear {
        let Some(tool) = self.tool.as_mut() else {
            return ToolWear::NoTool;
        };
        tool.damage = tool.damage.saturating_add(amount);
        if tool.damage >= tool.max_durability {
            self.destroy_tool();
            ToolWear::Broken
        } else {
            ToolWear::Intact { damage: tool.damage }
        }
    }

    pub fn destroy_tool(&mut self) {
        self.tool = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_cost_rounds_up() {
        assert_eq!(durability_cost(5, 3, 0), 15);
        assert_eq!(durability_cost(5, 3, 1), 8);
        assert_eq!(durability_cost(5, 3, 2), 5);
        assert_eq!(durability_cost(0, 3, 3), 0);
    }

    #[test]
    fn test_reachable_nodes() {
        let tool = ToolState::new(250, 0).with_damage(244);
        assert_eq!(Budget::new(&tool, 3).reachable_nodes(), 2);

        let tool = ToolState::new(250, 2).with_damage(244);
        assert_eq!(Budget::new(&tool, 3).reachable_nodes(), 6);

        assert_eq!(Budget::unlimited().reachable_nodes(), usize::MAX);
    }

    #[test]
    fn test_damage_breaks_at_max() {
        let mut jack = Lumberjack::new(ActorId(1), true, Some(ToolState::new(10, 0)));
        assert_eq!(jack.damage(9), ToolWear::Intact { damage: 9 });
        assert_eq!(jack.damage(1), ToolWear::Broken);
        assert!(!jack.has_tool());
        assert_eq!(jack.damage(1), ToolWear::NoTool);
    }
}
