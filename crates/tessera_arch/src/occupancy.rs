//! Placement overlay over an immutable [`Board`].

use crate::board::Board;
use crate::cell::CellType;
use crate::error::ArchError;
use std::collections::{BTreeMap, BTreeSet};
use tessera_common::{BlockId, BlockKind, Coord};

#[derive(Debug, Default, Clone)]
struct Slots {
    primary: Option<BlockId>,
    register: Option<BlockId>,
}

/// Records which block occupies which cell of a board.
///
/// Every cell has a primary slot. Compute cells also have a register slot,
/// used only when register folding is enabled; with folding disabled a
/// register block takes the primary slot like a compute block would.
#[derive(Debug, Clone)]
pub struct Occupancy<'a> {
    board: &'a Board,
    fold_registers: bool,
    slots: BTreeMap<Coord, Slots>,
    positions: BTreeMap<BlockId, Coord>,
}

impl<'a> Occupancy<'a> {
    /// Creates an empty overlay.
    pub fn new(board: &'a Board, fold_registers: bool) -> Self {
        Self {
            board,
            fold_registers,
            slots: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Returns the underlying board.
    pub fn board(&self) -> &'a Board {
        self.board
    }

    /// Places `block` at `coord`, checking bounds, type legality and collisions.
    pub fn place(&mut self, block: &BlockId, coord: Coord) -> Result<(), ArchError> {
        if self.positions.contains_key(block) {
            return Err(ArchError::AlreadyPlaced(block.clone()));
        }
        let cell = self.board.cell_type(coord).ok_or_else(|| ArchError::OutOfBounds {
            block: block.clone(),
            coord,
        })?;
        if !cell.accepts(block.kind()) {
            return Err(ArchError::IllegalCell {
                block: block.clone(),
                coord,
                cell,
            });
        }

        let slots = self.slots.entry(coord).or_default();
        let slot = if block.kind() == BlockKind::Register && self.fold_registers {
            &mut slots.register
        } else {
            &mut slots.primary
        };
        if let Some(occupant) = slot {
            return Err(ArchError::Collision {
                block: block.clone(),
                coord,
                occupant: occupant.clone(),
            });
        }
        *slot = Some(block.clone());
        self.positions.insert(block.clone(), coord);
        Ok(())
    }

    /// Returns the coordinate of a placed block.
    pub fn position(&self, block: &BlockId) -> Option<Coord> {
        self.positions.get(block).copied()
    }

    /// Returns the block in the primary slot at `coord`.
    pub fn occupant(&self, coord: Coord) -> Option<&BlockId> {
        self.slots.get(&coord).and_then(|s| s.primary.as_ref())
    }

    /// Returns `true` if nothing holds the primary slot at `coord`.
    pub fn is_free(&self, coord: Coord) -> bool {
        self.occupant(coord).is_none()
    }

    /// Returns the folded register at `coord`, if any.
    pub fn register_occupant(&self, coord: Coord) -> Option<&BlockId> {
        self.slots.get(&coord).and_then(|s| s.register.as_ref())
    }

    /// Returns `true` if a register may still fold onto `coord`.
    ///
    /// Always `false` with folding disabled or on non-compute cells.
    pub fn is_register_free(&self, coord: Coord) -> bool {
        self.fold_registers
            && self.board.cell_type(coord) == Some(CellType::Compute)
            && self.register_occupant(coord).is_none()
    }

    /// Returns the cells of one type whose primary slot is free, in enumeration order.
    pub fn free_cells(&self, cell_type: CellType) -> BTreeSet<Coord> {
        self.board
            .cells_of_type(cell_type)
            .filter(|&coord| self.is_free(coord))
            .collect()
    }

    /// Returns the compute cells whose register slot is free.
    ///
    /// Empty when folding is disabled, since registers then use primary slots.
    pub fn free_register_cells(&self) -> BTreeSet<Coord> {
        self.board
            .cells_of_type(CellType::Compute)
            .filter(|&coord| self.is_register_free(coord))
            .collect()
    }

    /// Returns the number of placed blocks.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no block has been placed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns every placed block and its coordinate.
    pub fn positions(&self) -> &BTreeMap<BlockId, Coord> {
        &self.positions
    }

    /// Consumes the overlay, returning every placed block and its coordinate.
    pub fn into_positions(self) -> BTreeMap<BlockId, Coord> {
        self.positions
    }
}
