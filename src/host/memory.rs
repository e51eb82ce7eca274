//! In-memory host
//!
//! Sparse voxel storage plus an ECS world for markers. Used by the demo
//! binary, the benches and most tests.

use std::collections::{HashMap, HashSet};

use crate::core::types::ActorId;
use crate::felling::stacks::ItemStack;
use crate::felling::tool::Lumberjack;
use crate::inspection::report::InspectionReport;
use crate::voxel::{BlockId, Coord, Voxel, VoxelGrid};

use super::{ActorHost, BlockSink, MarkerHandle, MarkerProvider, ReportSink};

/// Marker component: an outline drawn around one voxel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockOutline {
    pub at: Coord,
}

/// Host backed by plain collections
pub struct MemoryHost {
    /// Non-air voxels
    blocks: HashMap<Coord, Voxel>,
    /// Coordinates that resolve as unloaded
    unloaded: HashSet<Coord>,
    /// Marker entities
    markers: hecs::World,
    actors: HashMap<ActorId, Lumberjack>,
    drops: Vec<(Coord, ItemStack)>,
    reports: Vec<(ActorId, InspectionReport)>,
    /// Number of remove calls issued (single or ranged)
    removal_calls: usize,
    /// Refuse marker spawns
    markers_disabled: bool,
}

impl MemoryHost {
    /// Create a new empty host
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            unloaded: HashSet::new(),
            markers: hecs::World::new(),
            actors: HashMap::new(),
            drops: Vec::new(),
            reports: Vec::new(),
            removal_calls: 0,
            markers_disabled: false,
        }
    }

    // --- World editing ---

    /// Place a voxel. Placing air clears the coordinate.
    pub fn place(&mut self, at: Coord, voxel: Voxel) {
        if voxel.block.is_air() {
            self.blocks.remove(&at);
        } else {
            self.blocks.insert(at, voxel);
        }
    }

    /// Place a stateless block
    pub fn place_block(&mut self, at: Coord, block: &str) {
        self.place(at, Voxel::new(block));
    }

    /// Place a vertical column of `height` blocks starting at `base`
    pub fn place_column(&mut self, base: Coord, height: i32, block: &str) {
        for dy in 0..height {
            self.place_block(base.offset(0, dy, 0), block);
        }
    }

    pub fn set_unloaded(&mut self, at: Coord, unloaded: bool) {
        if unloaded {
            self.unloaded.insert(at);
        } else {
            self.unloaded.remove(&at);
        }
    }

    pub fn block_at(&self, at: Coord) -> Option<&BlockId> {
        self.blocks.get(&at).map(|v| &v.block)
    }

    /// Number of non-air voxels of the given type
    pub fn count_blocks(&self, block: &str) -> usize {
        self.blocks.values().filter(|v| v.block.as_str() == block).count()
    }

    // --- Actors ---

    pub fn add_actor(&mut self, lumberjack: Lumberjack) {
        self.actors.insert(lumberjack.actor, lumberjack);
    }

    pub fn remove_actor(&mut self, actor: ActorId) -> Option<Lumberjack> {
        self.actors.remove(&actor)
    }

    pub fn actor(&self, actor: ActorId) -> Option<&Lumberjack> {
        self.actors.get(&actor)
    }

    // --- Markers ---

    pub fn marker_count(&self) -> usize {
        self.markers.len() as usize
    }

    /// Coordinates of every live marker
    pub fn marker_positions(&self) -> Vec<Coord> {
        let mut query = self.markers.query::<&BlockOutline>();
        let mut positions: Vec<Coord> = query.iter().map(|(_, outline)| outline.at).collect();
        positions.sort();
        positions
    }

    pub fn set_markers_disabled(&mut self, disabled: bool) {
        self.markers_disabled = disabled;
    }

    // --- Recorded output ---

    pub fn drops(&self) -> &[(Coord, ItemStack)] {
        &self.drops
    }

    /// Total items dropped
    pub fn dropped_items(&self) -> u64 {
        self.drops.iter().map(|(_, s)| s.count as u64).sum()
    }

    pub fn reports(&self) -> &[(ActorId, InspectionReport)] {
        &self.reports
    }

    pub fn removal_calls(&self) -> usize {
        self.removal_calls
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelGrid for MemoryHost {
    fn resolve(&self, at: Coord) -> Voxel {
        if self.unloaded.contains(&at) {
            return Voxel::unloaded();
        }
        self.blocks.get(&at).cloned().unwrap_or_else(Voxel::air)
    }
}

impl MarkerProvider for MemoryHost {
    fn spawn_marker(&mut self, at: Coord) -> Option<MarkerHandle> {
        if self.markers_disabled {
            return None;
        }
        let entity = self.markers.spawn((BlockOutline { at },));
        Some(MarkerHandle(entity.to_bits().get()))
    }

    fn despawn_marker(&mut self, handle: MarkerHandle) {
        if let Some(entity) = hecs::Entity::from_bits(handle.0) {
            if self.markers.despawn(entity).is_err() {
                log::trace!("Marker {:?} already despawned", handle);
            }
        }
    }
}

impl BlockSink for MemoryHost {
    fn remove_block(&mut self, at: Coord) {
        self.blocks.remove(&at);
        self.removal_calls += 1;
    }

    fn remove_range(&mut self, from: Coord, to: Coord) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.blocks.remove(&Coord::new(x, y, z));
                }
            }
        }
        self.removal_calls += 1;
    }

    fn spawn_stack(&mut self, block: &BlockId, count: u32, at: Coord) {
        self.drops.push((
            at,
            ItemStack {
                block: block.clone(),
                count,
            },
        ));
    }
}

impl ReportSink for MemoryHost {
    fn report(&mut self, actor: ActorId, report: &InspectionReport) {
        self.reports.push((actor, report.clone()));
    }
}

impl ActorHost for MemoryHost {
    fn lumberjack(&self, actor: ActorId) -> Option<Lumberjack> {
        self.actors.get(&actor).cloned()
    }

    fn commit(&mut self, lumberjack: &Lumberjack) {
        if let Some(slot) = self.actors.get_mut(&lumberjack.actor) {
            *slot = lumberjack.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::felling::tool::ToolState;

    #[test]
    fn test_resolve() {
        let mut host = MemoryHost::new();
        let at = Coord::new(0, 64, 0);
        host.place_block(at, "minecraft:oak_log");

        assert_eq!(host.resolve(at).block.as_str(), "minecraft:oak_log");
        assert!(host.resolve(at.up()).block.is_air());

        host.set_unloaded(at, true);
        assert!(!host.resolve(at).is_valid());
    }

    #[test]
    fn test_markers_are_entities() {
        let mut host = MemoryHost::new();
        let a = host.spawn_marker(Coord::new(1, 2, 3)).unwrap();
        let b = host.spawn_marker(Coord::new(4, 5, 6)).unwrap();
        assert_ne!(a, b);
        assert_eq!(host.marker_count(), 2);
        assert_eq!(host.marker_positions(), vec![Coord::new(1, 2, 3), Coord::new(4, 5, 6)]);

        host.despawn_marker(a);
        host.despawn_marker(a);
        assert_eq!(host.marker_count(), 1);

        host.set_markers_disabled(true);
        assert!(host.spawn_marker(Coord::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_remove_range() {
        let mut host = MemoryHost::new();
        host.place_column(Coord::new(0, 0, 0), 5, "minecraft:oak_log");
        host.remove_range(Coord::new(0, 1, 0), Coord::new(0, 3, 0));
        assert_eq!(host.count_blocks("minecraft:oak_log"), 2);
        assert_eq!(host.removal_calls(), 1);
    }

    #[test]
    fn test_commit_actor() {
        let mut host = MemoryHost::new();
        let actor = ActorId(7);
        host.add_actor(Lumberjack::new(actor, true, Some(ToolState::new(59, 0))));

        let mut jack = host.lumberjack(actor).unwrap();
        jack.damage(10);
        host.commit(&jack);
        assert_eq!(host.actor(actor).unwrap().tool.unwrap().damage, 10);

        host.remove_actor(actor);
        assert!(host.lumberjack(actor).is_none());
    }
}
