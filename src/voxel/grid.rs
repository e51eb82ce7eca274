//! Read access to the host voxel grid

use super::coord::Coord;
use super::voxel::{BlockId, Voxel};

/// Resolves voxels by coordinate.
///
/// Implemented by the host. Coordinates outside loaded regions must resolve
/// to a voxel whose `valid` flag is false rather than failing.
pub trait VoxelGrid {
    /// Resolve the voxel at `at`
    fn resolve(&self, at: Coord) -> Voxel;

    /// True when the block id counts as empty space
    fn is_air(&self, block: &BlockId) -> bool {
        block.is_air()
    }
}
