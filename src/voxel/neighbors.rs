//! Lazy 26-neighborhood enumeration
//!
//! A [`NeighborCursor`] walks the cube of side `2 * radius + 1` around a centre
//! voxel, x outer, y middle, z inner, all ascending. Visited coordinates and air
//! are skipped. The cursor only remembers its position, so a discovery job can
//! hold one across steps and pull a single candidate per step.

use std::collections::HashSet;

use super::coord::Coord;
use super::grid::VoxelGrid;
use super::voxel::Voxel;

/// Default neighborhood radius (the 26 surrounding voxels)
pub const DEFAULT_RADIUS: i32 = 1;

/// Step-wise position within a neighborhood cube
#[derive(Clone, Debug)]
pub struct NeighborCursor {
    center: Coord,
    radius: i32,
    index: i32,
}

impl NeighborCursor {
    /// Create a new cursor around `center` with the default radius
    pub fn new(center: Coord) -> Self {
        Self::with_radius(center, DEFAULT_RADIUS)
    }

    pub fn with_radius(center: Coord, radius: i32) -> Self {
        Self {
            center,
            radius: radius.max(0),
            index: 0,
        }
    }

    pub fn center(&self) -> Coord {
        self.center
    }

    fn side(&self) -> i32 {
        2 * self.radius + 1
    }

    /// True once every offset has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.side().pow(3)
    }

    /// Next raw offset coordinate, centre excluded, without any filtering
    fn next_coord(&mut self) -> Option<Coord> {
        let side = self.side();
        while !self.is_exhausted() {
            let i = self.index;
            self.index += 1;

            let dx = i / (side * side) - self.radius;
            let dy = (i / side) % side - self.radius;
            let dz = i % side - self.radius;
            if dx == 0 && dy == 0 && dz == 0 {
                continue;
            }
            return Some(self.center.offset(dx, dy, dz));
        }
        None
    }

    /// Advance to the next unvisited, non-air candidate.
    ///
    /// Unloaded voxels are returned too; filtering them is up to the caller.
    pub fn next_candidate<G: VoxelGrid + ?Sized>(
        &mut self,
        visited: &HashSet<Coord>,
        grid: &G,
    ) -> Option<(Coord, Voxel)> {
        while let Some(coord) = self.next_coord() {
            if visited.contains(&coord) {
                continue;
            }
            let voxel = grid.resolve(coord);
            if grid.is_air(&voxel.block) {
                continue;
            }
            return Some((coord, voxel));
        }
        None
    }
}

/// Iterator adapter over a [`NeighborCursor`]
pub struct Neighbors<'a, G: VoxelGrid + ?Sized> {
    cursor: NeighborCursor,
    visited: &'a HashSet<Coord>,
    grid: &'a G,
}

impl<G: VoxelGrid + ?Sized> Iterator for Neighbors<'_, G> {
    type Item = (Coord, Voxel);

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_candidate(self.visited, self.grid)
    }
}

/// Non-air neighbors of `center` not in `visited`
pub fn neighbors<'a, G: VoxelGrid + ?Sized>(
    center: Coord,
    visited: &'a HashSet<Coord>,
    grid: &'a G,
) -> Neighbors<'a, G> {
    Neighbors {
        cursor: NeighborCursor::new(center),
        visited,
        grid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct SolidGrid;

    impl VoxelGrid for SolidGrid {
        fn resolve(&self, _at: Coord) -> Voxel {
            Voxel::new("minecraft:stone")
        }
    }

    struct SparseGrid(HashMap<Coord, Voxel>);

    impl VoxelGrid for SparseGrid {
        fn resolve(&self, at: Coord) -> Voxel {
            self.0.get(&at).cloned().unwrap_or_else(Voxel::air)
        }
    }

    #[test]
    fn test_full_neighborhood() {
        let visited = HashSet::new();
        let all: Vec<_> = neighbors(Coord::new(0, 0, 0), &visited, &SolidGrid).collect();
        assert_eq!(all.len(), 26);
        assert!(all.iter().all(|(c, _)| *c != Coord::new(0, 0, 0)));
    }

    #[test]
    fn test_iteration_order() {
        let visited = HashSet::new();
        let coords: Vec<_> = neighbors(Coord::new(10, 10, 10), &visited, &SolidGrid)
            .map(|(c, _)| c)
            .collect();
        assert_eq!(coords[0], Coord::new(9, 9, 9));
        assert_eq!(coords[1], Coord::new(9, 9, 10));
        assert_eq!(coords[3], Coord::new(9, 10, 9));
        assert_eq!(coords[25], Coord::new(11, 11, 11));

        let mut sorted = coords.clone();
        sorted.sort();
        assert_eq!(coords, sorted);
    }

    #[test]
    fn test_skips_visited_and_air() {
        let mut blocks = HashMap::new();
        blocks.insert(Coord::new(0, 1, 0), Voxel::new("minecraft:oak_log"));
        blocks.insert(Coord::new(1, 1, 0), Voxel::new("minecraft:oak_log"));
        let grid = SparseGrid(blocks);

        let mut visited = HashSet::new();
        visited.insert(Coord::new(1, 1, 0));

        let found: Vec<_> = neighbors(Coord::new(0, 0, 0), &visited, &grid).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, Coord::new(0, 1, 0));
    }

    #[test]
    fn test_cursor_not_resumable_once_exhausted() {
        let visited = HashSet::new();
        let mut cursor = NeighborCursor::new(Coord::new(0, 0, 0));
        let mut count = 0;
        while cursor.next_candidate(&visited, &SolidGrid).is_some() {
            count += 1;
        }
        assert_eq!(count, 26);
        assert!(cursor.is_exhausted());
        assert!(cursor.next_candidate(&visited, &SolidGrid).is_none());
    }

    #[test]
    fn test_radius_two() {
        let visited = HashSet::new();
        let mut cursor = NeighborCursor::with_radius(Coord::new(0, 0, 0), 2);
        let mut count = 0;
        while cursor.next_candidate(&visited, &SolidGrid).is_some() {
            count += 1;
        }
        assert_eq!(count, 124);
    }
}
