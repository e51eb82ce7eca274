//! Undirected graph of log voxels keyed by coordinate

use std::collections::{HashMap, HashSet, VecDeque};

use crate::voxel::Coord;

use super::node::GraphNode;
use super::traverse::{Traversal, TraversalOrder};

/// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Per-node contribution to the structural hash
fn coord_hash(c: Coord) -> u64 {
    let h = mix(c.x as u32 as u64);
    let h = mix(h ^ c.y as u32 as u64);
    mix(h ^ c.z as u32 as u64)
}

/// Node store with symmetric adjacency.
///
/// An edge exists only when both endpoints are present and each lists the
/// other. The structural hash is an order-independent sum of per-node
/// coordinate hashes, kept up to date on every insert and removal, so two
/// graphs over the same coordinate set compare equal in O(1). Collisions are
/// possible and accepted.
#[derive(Clone, Debug, Default)]
pub struct TreeGraph {
    nodes: HashMap<Coord, GraphNode>,
    next_index: usize,
    hash_sum: u64,
}

impl TreeGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Insert a node, or return the existing one
    pub fn add_node(&mut self, coord: Coord) -> &GraphNode {
        if !self.nodes.contains_key(&coord) {
            let index = self.next_index;
            self.next_index += 1;
            self.hash_sum = self.hash_sum.wrapping_add(coord_hash(coord));
            self.nodes.insert(coord, GraphNode::new(coord, index));
        }
        &self.nodes[&coord]
    }

    /// Remove a node together with every reference to it. Returns the node.
    pub fn remove_node(&mut self, coord: Coord) -> Option<GraphNode> {
        let node = self.nodes.remove(&coord)?;
        for n in &node.neighbors {
            if let Some(other) = self.nodes.get_mut(n) {
                other.neighbors.remove(&coord);
            }
        }
        self.hash_sum = self.hash_sum.wrapping_sub(coord_hash(coord));
        Some(node)
    }

    pub fn get_node(&self, coord: Coord) -> Option<&GraphNode> {
        self.nodes.get(&coord)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.nodes.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arbitrary order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Coordinates sorted by insertion index
    pub fn coords_in_order(&self) -> Vec<Coord> {
        let mut nodes: Vec<&GraphNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.index);
        nodes.into_iter().map(|n| n.coord).collect()
    }

    // --- Edges ---

    /// Link two present nodes. Returns false if either is missing or a == b.
    pub fn add_edge(&mut self, a: Coord, b: Coord) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.neighbors.insert(b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.neighbors.insert(a);
        }
        true
    }

    pub fn remove_edge(&mut self, a: Coord, b: Coord) {
        if !self.contains(a) || !self.contains(b) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.neighbors.remove(&b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.neighbors.remove(&a);
        }
    }

    pub fn has_edge(&self, a: Coord, b: Coord) -> bool {
        self.nodes.get(&a).is_some_and(|n| n.is_linked_to(b))
    }

    /// Neighbor coordinates of a node, ascending
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.nodes
            .get(&coord)
            .into_iter()
            .flat_map(|n| n.neighbors.iter().copied())
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.degree()).sum::<usize>() / 2
    }

    // --- Traversal ---

    /// Lazily walk the nodes reachable from `start`
    pub fn traverse(&self, start: Coord, order: TraversalOrder) -> Traversal<'_> {
        Traversal::new(self, start, order)
    }

    /// Sub-graph of nodes passing `keep`, with only edges between kept nodes.
    /// Insertion order is preserved.
    pub fn filter(&self, mut keep: impl FnMut(&GraphNode) -> bool) -> TreeGraph {
        let mut kept: Vec<&GraphNode> = self.nodes.values().filter(|n| keep(n)).collect();
        kept.sort_by_key(|n| n.index);

        let mut out = TreeGraph::new();
        for node in &kept {
            out.add_node(node.coord);
        }
        for node in &kept {
            for &n in &node.neighbors {
                out.add_edge(node.coord, n);
            }
        }
        out
    }

    /// Connected sub-graph reachable from `start`, indexed in BFS order.
    /// Empty if `start` is absent.
    pub fn component(&self, start: Coord) -> TreeGraph {
        let mut out = TreeGraph::new();
        let order: Vec<Coord> = self
            .traverse(start, TraversalOrder::Bfs)
            .map(|n| n.coord)
            .collect();
        for &c in &order {
            out.add_node(c);
        }
        for &c in &order {
            for n in self.neighbors(c) {
                out.add_edge(c, n);
            }
        }
        out
    }

    /// True when every node is reachable from `start`
    pub fn is_connected_from(&self, start: Coord) -> bool {
        if !self.contains(start) {
            return self.is_empty();
        }
        let mut seen = 0usize;
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);
        while let Some(c) = queue.pop_front() {
            seen += 1;
            for n in self.neighbors(c) {
                if visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen == self.len()
    }

    // --- Structural equality ---

    pub fn structural_hash(&self) -> u64 {
        self.hash_sum
    }

    /// Hash-based equality. Equal coordinate sets always compare equal.
    pub fn structurally_equal(&self, other: &TreeGraph) -> bool {
        self.len() == other.len() && self.hash_sum == other.hash_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32, z: i32) -> Coord {
        Coord::new(x, y, z)
    }

    fn column(height: i32) -> TreeGraph {
        let mut g = TreeGraph::new();
        for y in 0..height {
            g.add_node(c(0, y, 0));
            if y > 0 {
                g.add_edge(c(0, y - 1, 0), c(0, y, 0));
            }
        }
        g
    }

    fn assert_symmetric(g: &TreeGraph) {
        for node in g.nodes() {
            for &n in &node.neighbors {
                let other = g.get_node(n).expect("dangling edge");
                assert!(other.is_linked_to(node.coord), "asymmetric edge {} -> {}", node.coord, n);
            }
        }
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut g = TreeGraph::new();
        let first = g.add_node(c(1, 2, 3)).index;
        let second = g.add_node(c(1, 2, 3)).index;
        assert_eq!(first, second);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_edges_are_symmetric() {
        let mut g = TreeGraph::new();
        g.add_node(c(0, 0, 0));
        g.add_node(c(1, 0, 0));
        assert!(g.add_edge(c(0, 0, 0), c(1, 0, 0)));
        assert!(g.has_edge(c(1, 0, 0), c(0, 0, 0)));
        assert!(!g.add_edge(c(0, 0, 0), c(5, 5, 5)));
        assert_symmetric(&g);

        g.remove_edge(c(1, 0, 0), c(0, 0, 0));
        assert!(!g.has_edge(c(0, 0, 0), c(1, 0, 0)));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_remove_node_clears_back_references() {
        let mut g = column(3);
        g.remove_node(c(0, 1, 0));
        assert_eq!(g.len(), 2);
        assert_eq!(g.get_node(c(0, 0, 0)).unwrap().degree(), 0);
        assert_eq!(g.get_node(c(0, 2, 0)).unwrap().degree(), 0);
        assert_symmetric(&g);

        assert!(g.remove_node(c(9, 9, 9)).is_none());
    }

    #[test]
    fn test_bfs_and_dfs_visit_component() {
        let mut g = column(4);
        g.add_node(c(1, 0, 0));
        g.add_edge(c(0, 0, 0), c(1, 0, 0));
        g.add_node(c(7, 7, 7));

        let bfs: Vec<_> = g.traverse(c(0, 0, 0), TraversalOrder::Bfs).map(|n| n.coord).collect();
        let dfs: Vec<_> = g.traverse(c(0, 0, 0), TraversalOrder::Dfs).map(|n| n.coord).collect();
        assert_eq!(bfs.len(), 5);
        assert_eq!(dfs.len(), 5);
        assert_eq!(bfs[0], c(0, 0, 0));
        assert_eq!(dfs[0], c(0, 0, 0));
        assert!(!bfs.contains(&c(7, 7, 7)));

        // DFS goes deep up the column before the side branch
        assert_eq!(dfs[1..4], [c(0, 1, 0), c(0, 2, 0), c(0, 3, 0)]);
        assert_eq!(dfs[4], c(1, 0, 0));
    }

    #[test]
    fn test_traversal_from_missing_start() {
        let g = column(2);
        assert_eq!(g.traverse(c(5, 0, 0), TraversalOrder::Bfs).count(), 0);
    }

    #[test]
    fn test_filter_keeps_only_internal_edges() {
        let g = column(5);
        let upper = g.filter(|n| n.coord.y >= 2);
        assert_eq!(upper.len(), 3);
        assert_eq!(upper.edge_count(), 2);
        assert!(!upper.contains(c(0, 1, 0)));
        assert_symmetric(&upper);
        assert_eq!(upper.coords_in_order(), vec![c(0, 2, 0), c(0, 3, 0), c(0, 4, 0)]);
    }

    #[test]
    fn test_component() {
        let mut g = column(3);
        g.add_node(c(4, 0, 0));
        g.add_node(c(4, 1, 0));
        g.add_edge(c(4, 0, 0), c(4, 1, 0));

        let comp = g.component(c(0, 2, 0));
        assert_eq!(comp.len(), 3);
        assert_eq!(comp.get_node(c(0, 2, 0)).unwrap().index, 0);
        assert!(comp.is_connected_from(c(0, 0, 0)));
        assert!(!g.is_connected_from(c(0, 0, 0)));
        assert!(g.component(c(9, 9, 9)).is_empty());
    }

    #[test]
    fn test_structural_hash_is_order_independent() {
        let mut a = TreeGraph::new();
        let mut b = TreeGraph::new();
        for y in 0..4 {
            a.add_node(c(0, y, 0));
            b.add_node(c(0, 3 - y, 0));
        }
        assert!(a.structurally_equal(&b));

        b.remove_node(c(0, 0, 0));
        assert!(!a.structurally_equal(&b));
        b.add_node(c(0, 0, 0));
        assert!(a.structurally_equal(&b));
        assert_eq!(a.structural_hash(), b.structural_hash());
    }

    #[test]
    fn test_empty_graphs_equal() {
        assert!(TreeGraph::new().structurally_equal(&TreeGraph::default()));
        assert_eq!(TreeGraph::new().structural_hash(), 0);
    }
}
