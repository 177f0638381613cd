//! Cell types and the block-to-cell legality rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_common::BlockKind;

/// The functional type of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// A processing element. Hosts compute blocks, and register blocks.
    Compute,
    /// A memory tile.
    Memory,
    /// An I/O tile on the board edge.
    Io,
    /// A cell with no programmable resource.
    Empty,
}

impl CellType {
    /// Parses one layout character: `p`, `m`, `i`, or `-`/`.`/space for empty.
    pub fn from_layout_char(c: char) -> Option<Self> {
        match c {
            'p' | 'P' => Some(CellType::Compute),
            'm' | 'M' => Some(CellType::Memory),
            'i' | 'I' => Some(CellType::Io),
            '-' | '.' | ' ' => Some(CellType::Empty),
            _ => None,
        }
    }

    /// Returns the cell type that hosts blocks of `kind`, if any.
    ///
    /// Registers live on compute cells whether or not they are folded; folding
    /// only changes whether they share the cell with a compute block.
    pub fn for_block(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Compute | BlockKind::Register => Some(CellType::Compute),
            BlockKind::Memory => Some(CellType::Memory),
            BlockKind::Io => Some(CellType::Io),
            BlockKind::Surrogate => None,
        }
    }

    /// Returns `true` if a block of `kind` may be placed on a cell of this type.
    pub fn accepts(self, kind: BlockKind) -> bool {
        CellType::for_block(kind) == Some(self)
    }

    /// Returns `true` for cell types blocks can be placed on.
    pub fn is_placeable(self) -> bool {
        self != CellType::Empty
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellType::Compute => write!(f, "compute"),
            CellType::Memory => write!(f, "memory"),
            CellType::Io => write!(f, "io"),
            CellType::Empty => write!(f, "empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_chars() {
        assert_eq!(CellType::from_layout_char('p'), Some(CellType::Compute));
        assert_eq!(CellType::from_layout_char('M'), Some(CellType::Memory));
        assert_eq!(CellType::from_layout_char('i'), Some(CellType::Io));
        assert_eq!(CellType::from_layout_char('.'), Some(CellType::Empty));
        assert_eq!(CellType::from_layout_char('-'), Some(CellType::Empty));
        assert_eq!(CellType::from_layout_char('z'), None);
    }

    #[test]
    fn legality() {
        assert!(CellType::Compute.accepts(BlockKind::Compute));
        assert!(CellType::Compute.accepts(BlockKind::Register));
        assert!(!CellType::Compute.accepts(BlockKind::Memory));
        assert!(CellType::Memory.accepts(BlockKind::Memory));
        assert!(CellType::Io.accepts(BlockKind::Io));
        assert!(!CellType::Empty.accepts(BlockKind::Compute));
        assert!(!CellType::Compute.accepts(BlockKind::Surrogate));
    }
}
