//! Pinning of fixed and I/O blocks before clustering.

use crate::error::PlaceError;
use crate::netlist::Placement;
use std::collections::BTreeSet;
use tessera_arch::{CellType, Occupancy};
use tessera_common::{BlockId, BlockKind};

/// Places every pinned block on `occupancy`.
///
/// Blocks with an explicit coordinate go first. Remaining I/O blocks, in id
/// order, take the free I/O cells in board enumeration order. Returns the
/// set of pinned blocks.
pub fn pin_blocks(
    occupancy: &mut Occupancy<'_>,
    fixed: &Placement,
    blocks: &BTreeSet<BlockId>,
) -> Result<BTreeSet<BlockId>, PlaceError> {
    let mut pinned = BTreeSet::new();
    for (block, &coord) in fixed {
        occupancy.place(block, coord)?;
        pinned.insert(block.clone());
    }

    let io: Vec<&BlockId> = blocks
        .iter()
        .filter(|b| b.kind() == BlockKind::Io && !fixed.contains_key(*b))
        .collect();
    let free = occupancy.free_cells(CellType::Io);
    if io.len() > free.len() {
        return Err(PlaceError::InsufficientCapacity {
            cell: CellType::Io,
            required: io.len(),
            available: free.len(),
        });
    }
    for (block, coord) in io.into_iter().zip(free) {
        occupancy.place(block, coord)?;
        pinned.insert(block.clone());
    }

    tracing::debug!(pinned = pinned.len(), "pinned fixed and I/O blocks");
    Ok(pinned)
}
