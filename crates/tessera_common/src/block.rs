//! Block, cluster and net identifiers.
//!
//! Block ids are the strings produced by the packer (`p12`, `m3`, `i0`, ...).
//! The first character encodes the block kind, so a [`BlockId`] is validated
//! on construction and its [`BlockKind`] is always available.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a netlist block, encoded by the first character of its id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum BlockKind {
    /// A compute (PE) block, prefix `p`.
    Compute,
    /// A memory block, prefix `m`.
    Memory,
    /// A special I/O block, prefix `i`. Always pinned before clustering.
    Io,
    /// A register block, prefix `r`. May fold onto a compute cell.
    Register,
    /// A synthetic node standing in for a whole cluster, prefix `x`.
    Surrogate,
}

impl BlockKind {
    /// Returns the id prefix for this kind.
    pub fn prefix(self) -> char {
        match self {
            BlockKind::Compute => 'p',
            BlockKind::Memory => 'm',
            BlockKind::Io => 'i',
            BlockKind::Register => 'r',
            BlockKind::Surrogate => 'x',
        }
    }

    /// Returns the kind for an id prefix, if it is a known one.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'p' => Some(BlockKind::Compute),
            'm' => Some(BlockKind::Memory),
            'i' => Some(BlockKind::Io),
            'r' => Some(BlockKind::Register),
            'x' => Some(BlockKind::Surrogate),
            _ => None,
        }
    }

    /// Returns `true` for kinds that take part in clustering and annealing.
    pub fn is_movable(self) -> bool {
        matches!(
            self,
            BlockKind::Compute | BlockKind::Memory | BlockKind::Register
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Compute => write!(f, "compute"),
            BlockKind::Memory => write!(f, "memory"),
            BlockKind::Io => write!(f, "io"),
            BlockKind::Register => write!(f, "register"),
            BlockKind::Surrogate => write!(f, "surrogate"),
        }
    }
}

/// Error returned when a string is not a valid block id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBlockIdError {
    /// The id was empty.
    #[error("block id is empty")]
    Empty,
    /// The id's first character is not a known block kind prefix.
    #[error("block id '{0}' has an unknown kind prefix")]
    UnknownPrefix(String),
}

/// A validated netlist block id.
///
/// Ordering is the lexical order of the underlying string, which every
/// ordered collection in the placer relies on for determinism.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);

impl BlockId {
    /// Parses and validates a block id.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseBlockIdError> {
        let id = id.into();
        match id.chars().next() {
            None => Err(ParseBlockIdError::Empty),
            Some(c) if BlockKind::from_prefix(c).is_some() => Ok(Self(id)),
            Some(_) => Err(ParseBlockIdError::UnknownPrefix(id)),
        }
    }

    /// Returns the surrogate node id that stands in for `cluster`.
    pub fn surrogate(cluster: ClusterId) -> Self {
        Self(format!("x{}", cluster.as_raw()))
    }

    /// Returns the kind encoded by this id's prefix.
    pub fn kind(&self) -> BlockKind {
        self.0
            .chars()
            .next()
            .and_then(BlockKind::from_prefix)
            .unwrap_or(BlockKind::Surrogate)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BlockId {
    type Err = ParseBlockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BlockId {
    type Error = ParseBlockIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque, copyable id for a cluster of movable blocks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u32);

impl ClusterId {
    /// Creates an id from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a net in the packed netlist (`e12`, ...).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetId(String);

impl NetId {
    /// Creates a net id from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the net name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_prefix() {
        assert_eq!(BlockId::new("p12").unwrap().kind(), BlockKind::Compute);
        assert_eq!(BlockId::new("m3").unwrap().kind(), BlockKind::Memory);
        assert_eq!(BlockId::new("i0").unwrap().kind(), BlockKind::Io);
        assert_eq!(BlockId::new("r7").unwrap().kind(), BlockKind::Register);
        assert_eq!(BlockId::new("x1").unwrap().kind(), BlockKind::Surrogate);
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!(BlockId::new(""), Err(ParseBlockIdError::Empty));
        assert_eq!(
            BlockId::new("q1"),
            Err(ParseBlockIdError::UnknownPrefix("q1".to_string()))
        );
    }

    #[test]
    fn surrogate_naming() {
        let id = BlockId::surrogate(ClusterId::from_raw(4));
        assert_eq!(id.as_str(), "x4");
        assert_eq!(id.kind(), BlockKind::Surrogate);
    }

    #[test]
    fn prefix_roundtrip() {
        for kind in [
            BlockKind::Compute,
            BlockKind::Memory,
            BlockKind::Io,
            BlockKind::Register,
            BlockKind::Surrogate,
        ] {
            assert_eq!(BlockKind::from_prefix(kind.prefix()), Some(kind));
        }
    }

    #[test]
    fn movable_kinds() {
        assert!(BlockKind::Compute.is_movable());
        assert!(BlockKind::Register.is_movable());
        assert!(!BlockKind::Io.is_movable());
        assert!(!BlockKind::Surrogate.is_movable());
    }

    #[test]
    fn serde_validates() {
        let id: BlockId = serde_json::from_str("\"p5\"").unwrap();
        assert_eq!(id.as_str(), "p5");
        assert!(serde_json::from_str::<BlockId>("\"z5\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p5\"");
    }

    #[test]
    fn cluster_id_display() {
        assert_eq!(format!("{}", ClusterId::from_raw(9)), "9");
    }
}
