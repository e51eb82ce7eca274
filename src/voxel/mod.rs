//! Voxel data structures and neighborhood queries

pub mod coord;
pub mod voxel;
pub mod family;
pub mod grid;
pub mod rules;
pub mod neighbors;

pub use coord::Coord;
pub use voxel::{BlockId, Voxel};
pub use family::VoxelFamily;
pub use grid::VoxelGrid;
pub use rules::InclusionRules;
pub use neighbors::{neighbors, NeighborCursor, Neighbors};
