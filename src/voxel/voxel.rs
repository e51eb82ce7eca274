//! Voxel data type

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::family::VoxelFamily;

/// Block type identifier, e.g. `minecraft:oak_log`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// The air block
    pub const AIR: &'static str = "minecraft:air";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn air() -> Self {
        Self::new(Self::AIR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for both the namespaced and bare air ids
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR || self.0 == "air"
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A resolved voxel as reported by the host grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voxel {
    /// Block type id
    pub block: BlockId,
    /// False when the voxel lies in an unloaded region
    pub valid: bool,
    /// Block states (`wood_type`, `pillar_axis`, ...)
    #[serde(default)]
    pub states: BTreeMap<String, String>,
}

impl Voxel {
    /// Loaded voxel of the given type with no states
    pub fn new(block: impl Into<BlockId>) -> Self {
        Self {
            block: block.into(),
            valid: true,
            states: BTreeMap::new(),
        }
    }

    /// Loaded air voxel
    pub fn air() -> Self {
        Self::new(BlockId::air())
    }

    /// Voxel in an unloaded region
    pub fn unloaded() -> Self {
        Self {
            block: BlockId::air(),
            valid: false,
            states: BTreeMap::new(),
        }
    }

    /// Add a block state
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.states.insert(key.into(), value.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Family this voxel's type belongs to
    pub fn family(&self) -> VoxelFamily {
        VoxelFamily::of(&self.block)
    }

    /// Sub-type (wood species and the like) read through the family table
    pub fn variant(&self) -> Option<&str> {
        let state = self.family().variant_state()?;
        self.states.get(state).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_ids() {
        assert!(BlockId::air().is_air());
        assert!(BlockId::new("air").is_air());
        assert!(!BlockId::new("minecraft:oak_log").is_air());
    }

    #[test]
    fn test_unloaded_voxel() {
        let v = Voxel::unloaded();
        assert!(!v.is_valid());
        assert!(Voxel::air().is_valid());
    }

    #[test]
    fn test_variant_lookup() {
        let log = Voxel::new("minecraft:log").with_state("old_log_type", "birch");
        assert_eq!(log.variant(), Some("birch"));

        let oak = Voxel::new("minecraft:oak_log").with_state("pillar_axis", "y");
        assert_eq!(oak.variant(), None);

        let stem = Voxel::new("minecraft:crimson_stem");
        assert_eq!(stem.variant(), None);
    }
}
