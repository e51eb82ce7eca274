//! Trunk metadata derived from a discovered graph

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::graph::TreeGraph;
use crate::voxel::Coord;

/// Coarse trunk width class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrunkSize {
    /// One column
    #[default]
    Single,
    /// 2x2 style trunks (2 to 4 columns)
    Double,
    /// Anything wider
    Massive,
}

impl TrunkSize {
    pub fn from_columns(columns: usize) -> Self {
        match columns {
            0 | 1 => TrunkSize::Single,
            2..=4 => TrunkSize::Double,
            _ => TrunkSize::Massive,
        }
    }

    /// Horizontal radius of the trunk indicator drawn around the centre
    pub fn indicator_radius(self) -> f32 {
        match self {
            TrunkSize::Single => 0.75,
            TrunkSize::Double | TrunkSize::Massive => 1.5,
        }
    }
}

/// Trunk footprint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trunk {
    /// Centroid of the trunk columns, at voxel centres
    pub center: Vec2,
    pub size: TrunkSize,
    /// (x, z) of every trunk column
    pub columns: Vec<(i32, i32)>,
}

impl Trunk {
    /// Trunk of a lone column at `origin`
    pub fn single(origin: Coord) -> Self {
        Self {
            center: Vec2::new(origin.x as f32 + 0.5, origin.z as f32 + 0.5),
            size: TrunkSize::Single,
            columns: vec![origin.column()],
        }
    }

    /// Trunk columns are the columns within one block of the origin column
    /// that hold a node at the origin's height.
    pub fn analyze(graph: &TreeGraph, origin: Coord) -> Self {
        let mut columns = BTreeSet::new();
        for dx in -1..=1 {
            for dz in -1..=1 {
                let c = origin.offset(dx, 0, dz);
                if graph.contains(c) {
                    columns.insert(c.column());
                }
            }
        }
        if columns.is_empty() {
            return Self::single(origin);
        }

        let n = columns.len() as f32;
        let (sx, sz) = columns
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sz), &(x, z)| (sx + x as f32, sz + z as f32));

        Self {
            center: Vec2::new(sx / n + 0.5, sz / n + 0.5),
            size: TrunkSize::from_columns(columns.len()),
            columns: columns.into_iter().collect(),
        }
    }
}

/// Vertical levels occupied by the tree and whether each has been felled
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrunkProfile {
    levels: BTreeMap<i32, bool>,
}

impl TrunkProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occupied level, keeping its felled flag if already known
    pub fn record(&mut self, y: i32) {
        self.levels.entry(y).or_insert(false);
    }

    pub fn mark_felled(&mut self, y: i32) {
        if let Some(felled) = self.levels.get_mut(&y) {
            *felled = true;
        }
    }

    pub fn is_felled(&self, y: i32) -> bool {
        self.levels.get(&y).copied().unwrap_or(false)
    }

    /// Levels in ascending order with their felled flag
    pub fn levels(&self) -> impl Iterator<Item = (i32, bool)> + '_ {
        self.levels.iter().map(|(&y, &f)| (y, f))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn bottom(&self) -> Option<i32> {
        self.levels.keys().next().copied()
    }

    pub fn top(&self) -> Option<i32> {
        self.levels.keys().next_back().copied()
    }

    pub fn felled_count(&self) -> usize {
        self.levels.values().filter(|&&f| f).count()
    }

    /// Rebuild from the levels present in `graph`, keeping felled flags
    pub fn retain_graph(&mut self, graph: &TreeGraph) {
        let present: BTreeSet<i32> = graph.nodes().map(|n| n.coord.y).collect();
        self.levels.retain(|y, _| present.contains(y));
        for y in present {
            self.record(y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(coords: &[(i32, i32, i32)]) -> TreeGraph {
        let mut g = TreeGraph::new();
        for &c in coords {
            g.add_node(c.into());
        }
        g
    }

    #[test]
    fn test_single_trunk() {
        let g = graph_of(&[(4, 0, 7), (4, 1, 7), (5, 2, 7)]);
        let trunk = Trunk::analyze(&g, Coord::new(4, 0, 7));
        assert_eq!(trunk.size, TrunkSize::Single);
        assert_eq!(trunk.center, Vec2::new(4.5, 7.5));
        assert_eq!(trunk.size.indicator_radius(), 0.75);
    }

    #[test]
    fn test_double_trunk_centroid() {
        let g = graph_of(&[(0, 0, 0), (1, 0, 0), (0, 0, 1), (1, 0, 1), (0, 1, 0)]);
        let trunk = Trunk::analyze(&g, Coord::new(0, 0, 0));
        assert_eq!(trunk.size, TrunkSize::Double);
        assert_eq!(trunk.columns.len(), 4);
        assert_eq!(trunk.center, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_size_classes() {
        assert_eq!(TrunkSize::from_columns(1), TrunkSize::Single);
        assert_eq!(TrunkSize::from_columns(3), TrunkSize::Double);
        assert_eq!(TrunkSize::from_columns(9), TrunkSize::Massive);
    }

    #[test]
    fn test_profile() {
        let mut profile = TrunkProfile::new();
        for y in [3, 1, 2, 2] {
            profile.record(y);
        }
        assert_eq!(profile.len(), 3);
        assert_eq!((profile.bottom(), profile.top()), (Some(1), Some(3)));

        profile.mark_felled(2);
        profile.record(2);
        assert!(profile.is_felled(2));
        assert_eq!(profile.felled_count(), 1);

        let g = graph_of(&[(0, 2, 0), (0, 3, 0)]);
        profile.retain_graph(&g);
        assert_eq!(profile.levels().collect::<Vec<_>>(), vec![(2, true), (3, false)]);
    }
}
