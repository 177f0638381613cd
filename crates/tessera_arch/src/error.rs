//! Error types for board construction and occupancy updates.

use crate::cell::CellType;
use tessera_common::{BlockId, Coord};

/// Errors produced while building a board or placing blocks on it.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// An I/O error occurred while reading the architecture file.
    #[error("failed to read architecture file: {0}")]
    IoError(#[from] std::io::Error),

    /// The architecture file is not valid TOML or is missing fields.
    #[error("failed to parse architecture file: {0}")]
    ParseError(String),

    /// The layout has no rows or no columns.
    #[error("board '{0}' has an empty layout")]
    EmptyLayout(String),

    /// A layout row differs in width from the first row.
    #[error("layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },

    /// A layout character does not name a cell type.
    #[error("unknown cell character '{ch}' at {coord}")]
    UnknownCell {
        /// The offending character.
        ch: char,
        /// Where it appears.
        coord: Coord,
    },

    /// A coordinate lies outside the board.
    #[error("block {block} placed at {coord}, outside the board")]
    OutOfBounds {
        /// The block being placed.
        block: BlockId,
        /// The requested coordinate.
        coord: Coord,
    },

    /// The block's kind cannot live on the cell's type.
    #[error("block {block} cannot be placed on {cell} cell {coord}")]
    IllegalCell {
        /// The block being placed.
        block: BlockId,
        /// The requested coordinate.
        coord: Coord,
        /// The type of the cell at `coord`.
        cell: CellType,
    },

    /// The slot the block needs is already taken.
    #[error("block {block} collides with {occupant} at {coord}")]
    Collision {
        /// The block being placed.
        block: BlockId,
        /// The requested coordinate.
        coord: Coord,
        /// The block already holding the slot.
        occupant: BlockId,
    },

    /// The block is already on the board.
    #[error("block {0} is placed twice")]
    AlreadyPlaced(BlockId),
}
