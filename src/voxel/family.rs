//! Block families and their variant accessors
//!
//! Different block families keep their sub-type in differently named
//! states (`old_log_type` on legacy logs, `wood_type` on wood blocks, none at
//! all on modern per-species logs). The family is resolved once from the
//! block id through a small table and then tells callers which state to read.

use super::voxel::BlockId;

/// Coarse grouping of block ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoxelFamily {
    /// `minecraft:log` with the species in `old_log_type`
    LegacyLog,
    /// `minecraft:log2` with the species in `new_log_type`
    LegacyLog2,
    /// `minecraft:wood` with the species in `wood_type`
    Wood,
    /// Per-species logs (`oak_log`, `cherry_log`, ...)
    Log,
    /// Nether stems
    Stem,
    Other,
}

enum Pattern {
    Exact(&'static str),
    Suffix(&'static str),
}

impl Pattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Exact(p) => name == *p,
            Pattern::Suffix(p) => name.ends_with(p),
        }
    }
}

/// Checked in order, first match wins
const FAMILY_TABLE: &[(Pattern, VoxelFamily)] = &[
    (Pattern::Exact("log"), VoxelFamily::LegacyLog),
    (Pattern::Exact("log2"), VoxelFamily::LegacyLog2),
    (Pattern::Exact("wood"), VoxelFamily::Wood),
    (Pattern::Suffix("_log"), VoxelFamily::Log),
    (Pattern::Suffix("crimson_stem"), VoxelFamily::Stem),
    (Pattern::Suffix("warped_stem"), VoxelFamily::Stem),
];

impl VoxelFamily {
    /// Resolve the family of a block id. The namespace is ignored.
    pub fn of(block: &BlockId) -> Self {
        let id = block.as_str();
        let name = id.rsplit_once(':').map_or(id, |(_, name)| name);
        FAMILY_TABLE
            .iter()
            .find(|(pattern, _)| pattern.matches(name))
            .map_or(VoxelFamily::Other, |(_, family)| *family)
    }

    /// Block state holding the sub-type, if the family has one
    pub fn variant_state(self) -> Option<&'static str> {
        match self {
            VoxelFamily::LegacyLog => Some("old_log_type"),
            VoxelFamily::LegacyLog2 => Some("new_log_type"),
            VoxelFamily::Wood => Some("wood_type"),
            VoxelFamily::Log | VoxelFamily::Stem | VoxelFamily::Other => None,
        }
    }

    /// Families treated as tree logs without explicit configuration
    pub fn is_log_by_default(self) -> bool {
        matches!(self, VoxelFamily::Log | VoxelFamily::Stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(id: &str) -> VoxelFamily {
        VoxelFamily::of(&BlockId::new(id))
    }

    #[test]
    fn test_family_lookup() {
        assert_eq!(family("minecraft:oak_log"), VoxelFamily::Log);
        assert_eq!(family("cherry_log"), VoxelFamily::Log);
        assert_eq!(family("minecraft:warped_stem"), VoxelFamily::Stem);
        assert_eq!(family("minecraft:log"), VoxelFamily::LegacyLog);
        assert_eq!(family("minecraft:log2"), VoxelFamily::LegacyLog2);
        assert_eq!(family("minecraft:wood"), VoxelFamily::Wood);
        assert_eq!(family("minecraft:dirt"), VoxelFamily::Other);
        assert_eq!(family("minecraft:oak_log_slab"), VoxelFamily::Other);
    }

    #[test]
    fn test_default_logs() {
        assert!(family("mod:palm_log").is_log_by_default());
        assert!(family("minecraft:crimson_stem").is_log_by_default());
        assert!(!family("minecraft:log").is_log_by_default());
        assert!(!family("minecraft:stone").is_log_by_default());
    }
}
