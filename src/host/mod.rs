//! Collaborators provided by the hosting environment
//!
//! The engine never touches the world directly. Everything it reads or changes
//! goes through these traits, and [`Host`] bundles them so jobs can take a
//! single `&mut H`.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::core::types::ActorId;
use crate::felling::tool::Lumberjack;
use crate::inspection::report::InspectionReport;
use crate::voxel::{BlockId, Coord, VoxelGrid};

pub use memory::{BlockOutline, MemoryHost};

/// Opaque handle of a spawned marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

/// Spawns and despawns visual block markers
pub trait MarkerProvider {
    /// Returns `None` when the host refuses to spawn a marker
    fn spawn_marker(&mut self, at: Coord) -> Option<MarkerHandle>;

    /// Despawning an unknown or already despawned handle is a no-op
    fn despawn_marker(&mut self, handle: MarkerHandle);
}

/// Destructive access to the voxel grid
pub trait BlockSink {
    fn remove_block(&mut self, at: Coord);

    /// Clear every voxel in the box spanned by `from` and `to`
    fn remove_range(&mut self, from: Coord, to: Coord) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.remove_block(Coord::new(x, y, z));
                }
            }
        }
    }

    /// Drop `count` items of `block` at `at`
    fn spawn_stack(&mut self, block: &BlockId, count: u32, at: Coord);
}

/// Presents inspection results to the actor that asked for them
pub trait ReportSink {
    fn report(&mut self, actor: ActorId, report: &InspectionReport);
}

/// Actor state access
pub trait ActorHost {
    /// Snapshot of the actor, `None` once disconnected
    fn lumberjack(&self, actor: ActorId) -> Option<Lumberjack>;

    /// Write back tool damage or destruction
    fn commit(&mut self, lumberjack: &Lumberjack);
}

/// Everything the engine needs from its host
pub trait Host: VoxelGrid + MarkerProvider + BlockSink + ReportSink + ActorHost {}

impl<T> Host for T where T: VoxelGrid + MarkerProvider + BlockSink + ReportSink + ActorHost {}
