//! Discovery output

use std::collections::BTreeMap;

use crate::graph::TreeGraph;
use crate::host::{MarkerHandle, MarkerProvider};
use crate::voxel::{BlockId, Coord};

use super::trunk::{Trunk, TrunkProfile};

/// A discovered tree.
///
/// `markers` is indexed by graph node index, so a node's marker is found
/// through `graph.get_node(c).index`.
#[derive(Clone, Debug)]
pub struct DiscoveryResult {
    pub origin: Coord,
    /// Block type of the origin; every node shares it
    pub block: BlockId,
    /// Species read through the block family, when the family stores one
    pub variant: Option<String>,
    pub graph: TreeGraph,
    pub profile: TrunkProfile,
    pub trunk: Trunk,
    pub markers: Vec<Option<MarkerHandle>>,
    pub type_counts: BTreeMap<BlockId, usize>,
}

impl DiscoveryResult {
    /// Empty result rooted at `origin`
    pub fn new(origin: Coord, block: BlockId, variant: Option<String>) -> Self {
        Self {
            origin,
            block,
            variant,
            graph: TreeGraph::new(),
            profile: TrunkProfile::new(),
            trunk: Trunk::single(origin),
            markers: Vec::new(),
            type_counts: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.graph.contains(coord)
    }

    /// Add a node of the result's block type, recording its level
    pub fn insert(&mut self, coord: Coord, marker: Option<MarkerHandle>) -> bool {
        if self.graph.contains(coord) {
            return false;
        }
        let index = self.graph.add_node(coord).index;
        if self.markers.len() <= index {
            self.markers.resize(index + 1, None);
        }
        self.markers[index] = marker;
        self.profile.record(coord.y);
        *self.type_counts.entry(self.block.clone()).or_insert(0) += 1;
        true
    }

    /// Remove a node, returning its marker handle if it had one
    pub fn remove(&mut self, coord: Coord) -> Option<MarkerHandle> {
        let node = self.graph.remove_node(coord)?;
        if let Some(count) = self.type_counts.get_mut(&self.block) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.type_counts.remove(&self.block);
            }
        }
        self.markers.get_mut(node.index).and_then(Option::take)
    }

    pub fn marker_for(&self, coord: Coord) -> Option<MarkerHandle> {
        let index = self.graph.get_node(coord)?.index;
        self.markers.get(index).copied().flatten()
    }

    /// Take every marker handle, leaving none behind
    pub fn take_markers(&mut self) -> Vec<MarkerHandle> {
        self.markers.iter_mut().filter_map(Option::take).collect()
    }

    /// Despawn every marker right away
    pub fn despawn_markers<H: MarkerProvider + ?Sized>(&mut self, host: &mut H) -> usize {
        let handles = self.take_markers();
        for &handle in &handles {
            host.despawn_marker(handle);
        }
        handles.len()
    }

    /// Recompute trunk metadata after the graph changed
    pub fn finalize(&mut self) {
        self.trunk = Trunk::analyze(&self.graph, self.origin);
    }

    /// Items yielded by felling: every node except the origin
    pub fn yield_counts(&self) -> BTreeMap<BlockId, usize> {
        let mut counts = self.type_counts.clone();
        if self.graph.contains(self.origin) {
            if let Some(n) = counts.get_mut(&self.block) {
                *n = n.saturating_sub(1);
            }
        }
        counts.retain(|_, n| *n > 0);
        counts
    }

    /// Sub-result holding only the component reachable from `start`, rooted
    /// at `start`.
    ///
    /// Node indices are reassigned in BFS order and markers follow their nodes.
    /// Markers of nodes left out stay in `self`.
    pub fn extract_component(&mut self, start: Coord) -> DiscoveryResult {
        let component = self.graph.component(start);
        let mut out = DiscoveryResult::new(start, self.block.clone(), self.variant.clone());
        out.markers = vec![None; component.len()];
        for node in component.nodes() {
            if let Some(old) = self.graph.get_node(node.coord) {
                out.markers[node.index] = self.markers.get_mut(old.index).and_then(Option::take);
            }
        }
        if !component.is_empty() {
            out.type_counts.insert(self.block.clone(), component.len());
        }
        out.profile = self.profile.clone();
        out.profile.retain_graph(&component);
        out.graph = component;
        out.finalize();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    fn column_result(height: i32, host: &mut MemoryHost) -> DiscoveryResult {
        let origin = Coord::new(0, 0, 0);
        let mut r = DiscoveryResult::new(origin, BlockId::new("minecraft:oak_log"), None);
        for y in 0..height {
            let c = Coord::new(0, y, 0);
            let marker = host.spawn_marker(c);
            r.insert(c, marker);
            if y > 0 {
                r.graph.add_edge(Coord::new(0, y - 1, 0), c);
            }
        }
        r
    }

    #[test]
    fn test_insert_and_remove_track_counts() {
        let mut host = MemoryHost::new();
        let mut r = column_result(4, &mut host);
        assert_eq!(r.size(), 4);
        assert_eq!(r.type_counts[&r.block], 4);
        assert_eq!(r.profile.len(), 4);
        assert!(!r.insert(Coord::new(0, 1, 0), None));

        let marker = r.remove(Coord::new(0, 3, 0));
        assert!(marker.is_some());
        assert_eq!(r.type_counts[&r.block], 3);
        assert!(r.marker_for(Coord::new(0, 3, 0)).is_none());
    }

    #[test]
    fn test_yield_excludes_origin() {
        let mut host = MemoryHost::new();
        let r = column_result(6, &mut host);
        assert_eq!(r.yield_counts()[&r.block], 5);
    }

    #[test]
    fn test_despawn_markers() {
        let mut host = MemoryHost::new();
        let mut r = column_result(3, &mut host);
        assert_eq!(host.marker_count(), 3);
        assert_eq!(r.despawn_markers(&mut host), 3);
        assert_eq!(host.marker_count(), 0);
        assert_eq!(r.despawn_markers(&mut host), 0);
    }

    #[test]
    fn test_extract_component_moves_markers() {
        let mut host = MemoryHost::new();
        let mut r = column_result(5, &mut host);
        r.graph.remove_edge(Coord::new(0, 2, 0), Coord::new(0, 3, 0));

        let upper = r.extract_component(Coord::new(0, 4, 0));
        assert_eq!(upper.size(), 2);
        assert_eq!(upper.markers.iter().flatten().count(), 2);
        assert!(upper.marker_for(Coord::new(0, 3, 0)).is_some());
        assert_eq!(upper.profile.bottom(), Some(3));
        assert_eq!(upper.origin, Coord::new(0, 4, 0));

        // The lower part keeps its own markers
        assert_eq!(r.markers.iter().flatten().count(), 3);
    }
}
