//! Grouping removed nodes into ranged removals

use crate::voxel::Coord;

/// One removal issued to the host: every voxel from `from` to `to` inclusive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalBatch {
    pub from: Coord,
    pub to: Coord,
    /// Graph nodes covered by the range, bottom up
    pub nodes: Vec<Coord>,
}

impl RemovalBatch {
    pub fn is_single(&self) -> bool {
        self.from == self.to
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Sort by (x, z, y) and merge runs within a column whose vertical gap is at
/// most `max_gap`. Gaps wider than one voxel are cleared along with the logs.
pub fn group_adjacent(coords: impl IntoIterator<Item = Coord>, max_gap: i32) -> Vec<RemovalBatch> {
    let mut sorted: Vec<Coord> = coords.into_iter().collect();
    sorted.sort_by_key(|c| (c.x, c.z, c.y));
    sorted.dedup();

    let mut batches: Vec<RemovalBatch> = Vec::new();
    for c in sorted {
        match batches.last_mut() {
            Some(batch) if batch.to.column() == c.column() && c.y - batch.to.y <= max_gap => {
                batch.to = c;
                batch.nodes.push(c);
            }
            _ => batches.push(RemovalBatch {
                from: c,
                to: c,
                nodes: vec![c],
            }),
        }
    }
    batches
}
