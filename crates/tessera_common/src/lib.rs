//! Shared foundational types used across the Tessera CGRA placer.
//!
//! This crate provides block and cluster identifiers, grid coordinates,
//! content hashing for job fingerprints, and the common internal error type.

#![warn(missing_docs)]

pub mod block;
pub mod coord;
pub mod hash;
pub mod result;

pub use block::{BlockId, BlockKind, ClusterId, NetId, ParseBlockIdError};
pub use coord::Coord;
pub use hash::ContentHash;
pub use result::{InternalError, TesseraResult};
