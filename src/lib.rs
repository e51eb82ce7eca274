//! Treefell - Cooperative tree discovery and felling over a voxel grid

pub mod core;
pub mod config;
pub mod voxel;
pub mod graph;
pub mod discovery;
pub mod inspection;
pub mod felling;
pub mod host;
pub mod scheduler;
pub mod session;
