//! Per-type cell demand, free board capacity and cluster reservations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tessera_arch::{CellType, Occupancy};
use tessera_common::{BlockId, BlockKind, ClusterId, Coord};

/// Slots a group of blocks needs, per slot kind.
///
/// With register folding, registers are counted apart from compute blocks
/// because they occupy the register slot of a compute cell. Without it they
/// are counted as compute and `registers` stays 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demand {
    /// Primary slots of compute cells needed.
    pub compute: usize,
    /// Register slots of compute cells needed.
    pub registers: usize,
    /// Memory cells needed.
    pub memory: usize,
}

impl Demand {
    /// Computes the demand of `blocks` under the register folding policy.
    pub fn of<'a>(blocks: impl IntoIterator<Item = &'a BlockId>, fold_registers: bool) -> Self {
        let (mut compute, mut registers, mut memory) = (0, 0, 0);
        for block in blocks {
            match block.kind() {
                BlockKind::Compute => compute += 1,
                BlockKind::Register => registers += 1,
                BlockKind::Memory => memory += 1,
                BlockKind::Io | BlockKind::Surrogate => {}
            }
        }
        if fold_registers {
            Self {
                compute,
                registers,
                memory,
            }
        } else {
            Self {
                compute: compute + registers,
                registers: 0,
                memory,
            }
        }
    }

    /// Returns the number of cells the group covers when packed tightly.
    ///
    /// Folded registers share compute cells, so compute cells count as
    /// `max(compute, registers)`.
    pub fn total(&self) -> usize {
        self.compute.max(self.registers) + self.memory
    }

    /// Returns the primary-slot demand for one cell type.
    pub fn get(&self, cell: CellType) -> usize {
        match cell {
            CellType::Compute => self.compute,
            CellType::Memory => self.memory,
            CellType::Io | CellType::Empty => 0,
        }
    }
}

impl std::ops::Add for Demand {
    type Output = Demand;

    fn add(self, rhs: Demand) -> Demand {
        Demand {
            compute: self.compute + rhs.compute,
            registers: self.registers + rhs.registers,
            memory: self.memory + rhs.memory,
        }
    }
}

/// Slots not taken by pinned blocks.
///
/// A compute cell holding a pinned compute block can still take a folded
/// register, and one holding a pinned register can still take a compute
/// block, so the two slot kinds are tracked separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeCells {
    /// Compute cells whose primary slot is free.
    pub compute: BTreeSet<Coord>,
    /// Compute cells whose register slot is free; empty without folding.
    pub registers: BTreeSet<Coord>,
    /// Free memory cells.
    pub memory: BTreeSet<Coord>,
}

impl FreeCells {
    /// Collects the free slots of an occupancy overlay.
    pub fn from_occupancy(occupancy: &Occupancy<'_>) -> Self {
        Self {
            compute: occupancy.free_cells(CellType::Compute),
            registers: occupancy.free_register_cells(),
            memory: occupancy.free_cells(CellType::Memory),
        }
    }

    /// Returns the cells whose primary slot of one type is free.
    pub fn of_type(&self, cell: CellType) -> Option<&BTreeSet<Coord>> {
        match cell {
            CellType::Compute => Some(&self.compute),
            CellType::Memory => Some(&self.memory),
            CellType::Io | CellType::Empty => None,
        }
    }

    /// Returns the number of cells with at least one free slot.
    pub fn total(&self) -> usize {
        self.compute.union(&self.registers).count() + self.memory.len()
    }
}

/// The concrete slots reserved for one cluster, plus its centroid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// The cluster the cells belong to.
    pub cluster: ClusterId,
    /// Compute cells whose primary slot is reserved.
    pub compute: BTreeSet<Coord>,
    /// Compute cells whose register slot is reserved.
    pub registers: BTreeSet<Coord>,
    /// Reserved memory cells.
    pub memory: BTreeSet<Coord>,
    /// Representative coordinate used as the cluster's surrogate position.
    pub centroid: Coord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arch::Board;

    fn ids(list: &[&str]) -> Vec<BlockId> {
        list.iter().map(|s| BlockId::new(*s).unwrap()).collect()
    }

    #[test]
    fn demand_with_folding() {
        let blocks = ids(&["p0", "p1", "r0", "r1", "r2", "m0", "i0"]);
        let d = Demand::of(&blocks, true);
        assert_eq!(
            d,
            Demand {
                compute: 2,
                registers: 3,
                memory: 1
            }
        );
        assert_eq!(d.total(), 4);
    }

    #[test]
    fn demand_without_folding() {
        let blocks = ids(&["p0", "p1", "r0", "r1", "r2", "m0"]);
        let d = Demand::of(&blocks, false);
        assert_eq!(d.get(CellType::Compute), 5);
        assert_eq!(d.get(CellType::Memory), 1);
        assert_eq!(d.registers, 0);
        assert_eq!(d.total(), 6);
    }

    #[test]
    fn free_cells_skip_pinned() {
        let board = Board::from_layout("t", &["ipmi", "ippi"]).unwrap();
        let mut occ = Occupancy::new(&board, true);
        occ.place(&BlockId::new("p9").unwrap(), Coord::new(1, 0)).unwrap();
        let free = FreeCells::from_occupancy(&occ);
        assert_eq!(free.compute.len(), 2);
        assert_eq!(free.registers.len(), 3);
        assert_eq!(free.memory.len(), 1);
        assert_eq!(free.total(), 4);
        assert!(free.of_type(CellType::Io).is_none());
    }

    #[test]
    fn pinned_register_leaves_primary_slot_free() {
        let board = Board::from_layout("t", &["pp"]).unwrap();
        let mut occ = Occupancy::new(&board, true);
        occ.place(&BlockId::new("r0").unwrap(), Coord::new(0, 0)).unwrap();
        let free = FreeCells::from_occupancy(&occ);
        assert!(free.compute.contains(&Coord::new(0, 0)));
        assert!(!free.registers.contains(&Coord::new(0, 0)));
        assert_eq!(free.registers.len(), 1);
        assert_eq!(free.total(), 2);
    }

    #[test]
    fn unfolded_board_offers_no_register_slots() {
        let board = Board::from_layout("t", &["pp"]).unwrap();
        let occ = Occupancy::new(&board, false);
        let free = FreeCells::from_occupancy(&occ);
        assert!(free.registers.is_empty());
        assert_eq!(free.total(), 2);
    }
}
