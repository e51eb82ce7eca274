//! Log inclusion rules

use std::collections::HashSet;

use crate::config::FellingConfig;

use super::family::VoxelFamily;
use super::voxel::BlockId;

/// Decides which block ids count as tree logs.
///
/// Priority: the exclude list (and every `stripped_` block), then the
/// include list, then the default family match (`*_log`, nether stems).
#[derive(Clone, Debug, Default)]
pub struct InclusionRules {
    included: HashSet<BlockId>,
    excluded: HashSet<BlockId>,
}

impl InclusionRules {
    pub fn new(
        included: impl IntoIterator<Item = BlockId>,
        excluded: impl IntoIterator<Item = BlockId>,
    ) -> Self {
        Self {
            included: included.into_iter().collect(),
            excluded: excluded.into_iter().collect(),
        }
    }

    /// Build from the configured include/exclude lists
    pub fn from_config(config: &FellingConfig) -> Self {
        Self::new(
            config.included_logs.iter().map(|s| BlockId::new(s.as_str())),
            config.excluded_logs.iter().map(|s| BlockId::new(s.as_str())),
        )
    }

    pub fn is_included(&self, block: &BlockId) -> bool {
        if self.excluded.contains(block) || block.as_str().contains("stripped_") {
            return false;
        }
        self.included.contains(block) || VoxelFamily::of(block).is_log_by_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BlockId {
        BlockId::new(s)
    }

    #[test]
    fn test_default_pattern() {
        let rules = InclusionRules::default();
        assert!(rules.is_included(&id("minecraft:oak_log")));
        assert!(rules.is_included(&id("minecraft:warped_stem")));
        assert!(!rules.is_included(&id("minecraft:oak_planks")));
        assert!(!rules.is_included(&id("minecraft:air")));
    }

    #[test]
    fn test_stripped_never_included() {
        let rules = InclusionRules::new([id("minecraft:stripped_oak_log")], []);
        assert!(!rules.is_included(&id("minecraft:stripped_oak_log")));
        assert!(!rules.is_included(&id("minecraft:stripped_crimson_stem")));
    }

    #[test]
    fn test_include_list() {
        let rules = InclusionRules::new([id("mod:bamboo_block")], []);
        assert!(rules.is_included(&id("mod:bamboo_block")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let rules = InclusionRules::new([id("minecraft:birch_log")], [id("minecraft:birch_log")]);
        assert!(!rules.is_included(&id("minecraft:birch_log")));
        assert!(rules.is_included(&id("minecraft:oak_log")));
    }

    #[test]
    fn test_from_config() {
        let config = FellingConfig {
            included_logs: vec!["mod:mushroom_stem".into()],
            excluded_logs: vec!["minecraft:jungle_log".into()],
            ..Default::default()
        };
        let rules = InclusionRules::from_config(&config);
        assert!(rules.is_included(&id("mod:mushroom_stem")));
        assert!(!rules.is_included(&id("minecraft:jungle_log")));
    }
}
