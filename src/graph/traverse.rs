//! Lazy breadth/depth-first traversal

use std::collections::{HashSet, VecDeque};

use crate::voxel::Coord;

use super::node::GraphNode;
use super::tree_graph::TreeGraph;

/// Traversal order for [`TreeGraph::traverse`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    #[default]
    Bfs,
    Dfs,
}

/// Iterator over the nodes reachable from a start coordinate.
///
/// Holds a shared borrow of the graph, so the graph cannot change while a
/// traversal is live. Neighbors are expanded in ascending coordinate order.
pub struct Traversal<'g> {
    graph: &'g TreeGraph,
    order: TraversalOrder,
    frontier: VecDeque<Coord>,
    seen: HashSet<Coord>,
}

impl<'g> Traversal<'g> {
    pub(super) fn new(graph: &'g TreeGraph, start: Coord, order: TraversalOrder) -> Self {
        let mut frontier = VecDeque::new();
        let mut seen = HashSet::new();
        if graph.contains(start) {
            frontier.push_back(start);
            if order == TraversalOrder::Bfs {
                seen.insert(start);
            }
        }
        Self {
            graph,
            order,
            frontier,
            seen,
        }
    }

    fn next_bfs(&mut self) -> Option<&'g GraphNode> {
        let coord = self.frontier.pop_front()?;
        let node = self.graph.get_node(coord)?;
        for &n in &node.neighbors {
            if self.seen.insert(n) {
                self.frontier.push_back(n);
            }
        }
        Some(node)
    }

    fn next_dfs(&mut self) -> Option<&'g GraphNode> {
        while let Some(coord) = self.frontier.pop_back() {
            if !self.seen.insert(coord) {
                continue;
            }
            let Some(node) = self.graph.get_node(coord) else {
                continue;
            };
            // Reversed so the smallest neighbor is visited first
            for &n in node.neighbors.iter().rev() {
                if !self.seen.contains(&n) {
                    self.frontier.push_back(n);
                }
            }
            return Some(node);
        }
        None
    }
}

impl<'g> Iterator for Traversal<'g> {
    type Item = &'g GraphNode;

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            TraversalOrder::Bfs => self.next_bfs(),
            TraversalOrder::Dfs => self.next_dfs(),
        }
    }
}
