//! CGRA board model for the Tessera placer.
//!
//! A [`Board`] is an immutable grid of typed cells built once from an
//! architecture description. Placement never mutates it; instead an
//! [`Occupancy`] overlay records which block sits where and enforces the
//! legality and no-collision rules, including the register folding exception.
//!
//! # Usage
//!
//! ```
//! use tessera_arch::{Board, CellType, Occupancy};
//! use tessera_common::{BlockId, Coord};
//!
//! let board = Board::from_layout("demo", &["ipmi", "ippi"]).unwrap();
//! assert_eq!(board.count(CellType::Compute), 3);
//!
//! let mut occupancy = Occupancy::new(&board, true);
//! let pe = BlockId::new("p0").unwrap();
//! occupancy.place(&pe, Coord::new(1, 0)).unwrap();
//! assert!(occupancy.place(&BlockId::new("p1").unwrap(), Coord::new(1, 0)).is_err());
//! ```

#![warn(missing_docs)]

pub mod board;
pub mod cell;
pub mod error;
pub mod loader;
pub mod occupancy;

pub use board::Board;
pub use cell::CellType;
pub use error::ArchError;
pub use loader::{load_board, load_board_from_str};
pub use occupancy::Occupancy;
