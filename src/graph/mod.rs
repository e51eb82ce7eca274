//! Tree graph: coordinate-keyed node store with symmetric adjacency

pub mod node;
pub mod tree_graph;
pub mod traverse;

pub use node::GraphNode;
pub use tree_graph::TreeGraph;
pub use traverse::{Traversal, TraversalOrder};
