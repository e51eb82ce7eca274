//! Graph node

use std::collections::BTreeSet;

use crate::voxel::Coord;

/// A single log voxel in a [`TreeGraph`](super::TreeGraph).
///
/// Neighbors are stored by coordinate. The graph owns every node, so a
/// neighbor reference is only meaningful while both ends are present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub coord: Coord,
    pub neighbors: BTreeSet<Coord>,
    /// Insertion order within the owning graph, used to correlate markers
    pub index: usize,
}

impl GraphNode {
    /// Create a new node with no neighbors
    pub fn new(coord: Coord, index: usize) -> Self {
        Self {
            coord,
            neighbors: BTreeSet::new(),
            index,
        }
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_linked_to(&self, other: Coord) -> bool {
        self.neighbors.contains(&other)
    }
}
