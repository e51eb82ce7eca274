//! Item yield split into stacks

use std::collections::BTreeMap;

use crate::voxel::BlockId;

/// Split `total` items into full stacks of `stack_size` plus one partial stack
pub fn stack_distribution(total: usize, stack_size: u32) -> Vec<u32> {
    let size = stack_size.max(1) as usize;
    let mut stacks = vec![size as u32; total / size];
    let rest = total % size;
    if rest > 0 {
        stacks.push(rest as u32);
    }
    stacks
}

/// A single stack to drop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemStack {
    pub block: BlockId,
    pub count: u32,
}

/// Stacks for every block type, in block id order
pub fn yield_stacks(counts: &BTreeMap<BlockId, usize>, stack_size: u32) -> Vec<ItemStack> {
    counts
        .iter()
        .flat_map(|(block, &n)| {
            stack_distribution(n, stack_size)
                .into_iter()
                .map(move |count| ItemStack {
                    block: block.clone(),
                    count,
                })
        })
        .collect()
}
