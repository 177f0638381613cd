//! The immutable CGRA tile grid.

use crate::cell::CellType;
use crate::error::ArchError;
use serde::{Deserialize, Serialize};
use tessera_common::{BlockId, Coord};

/// A rectangular grid of typed cells.
///
/// Cells are stored row-major. Enumeration order, which greedy assignment and
/// tie-breaking rely on, is ascending `y` then ascending `x`, the same order
/// as [`Coord`]'s `Ord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    name: String,
    width: u32,
    height: u32,
    cells: Vec<CellType>,
}

impl Board {
    /// Builds a board from layout rows, one character per cell.
    ///
    /// Row 0 is the first string; `x` is the column index.
    pub fn from_layout<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self, ArchError> {
        let expected = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if expected == 0 {
            return Err(ArchError::EmptyLayout(name.to_string()));
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(ArchError::RaggedLayout {
                    row: y,
                    expected,
                    found,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let cell = CellType::from_layout_char(ch).ok_or(ArchError::UnknownCell {
                    ch,
                    coord: Coord::new(x as u32, y as u32),
                })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            name: name.to_string(),
            width: expected as u32,
            height: rows.len() as u32,
            cells,
        })
    }

    /// Returns the board name from the architecture file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if `coord` lies on the board.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Returns the type of the cell at `coord`, or `None` when off the board.
    pub fn cell_type(&self, coord: Coord) -> Option<CellType> {
        if !self.contains(coord) {
            return None;
        }
        let index = coord.y as usize * self.width as usize + coord.x as usize;
        self.cells.get(index).copied()
    }

    /// Iterates over every cell in enumeration order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, CellType)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            (Coord::new((i % width) as u32, (i / width) as u32), cell)
        })
    }

    /// Iterates over the cells of one type in enumeration order.
    pub fn cells_of_type(&self, cell_type: CellType) -> impl Iterator<Item = Coord> + '_ {
        self.cells()
            .filter(move |&(_, cell)| cell == cell_type)
            .map(|(coord, _)| coord)
    }

    /// Returns the number of cells of one type.
    pub fn count(&self, cell_type: CellType) -> usize {
        self.cells.iter().filter(|&&cell| cell == cell_type).count()
    }

    /// Returns the number of cells a block can be placed on.
    pub fn placeable_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_placeable()).count()
    }

    /// Returns the board centre, rounded down.
    pub fn centre(&self) -> Coord {
        Coord::new(self.width / 2, self.height / 2)
    }

    /// Returns `true` if `block` may sit on the cell at `coord` by type alone.
    ///
    /// Collisions are the [`Occupancy`](crate::Occupancy) overlay's concern.
    pub fn is_legal(&self, block: &BlockId, coord: Coord) -> bool {
        self.cell_type(coord)
            .is_some_and(|cell| cell.accepts(block.kind()))
    }
}
