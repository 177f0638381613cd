//! Netlists, embeddings and placements as the placer sees them.

use crate::error::PlaceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tessera_common::{BlockId, Coord, NetId};

/// A finished or partial placement: block id to cell coordinate.
pub type Placement = BTreeMap<BlockId, Coord>;

/// Mapping from net id to the blocks it connects.
///
/// Each net lists its blocks in first-occurrence order with duplicates
/// removed, so reducing or costing a net never counts a block twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Netlist {
    nets: BTreeMap<NetId, Vec<BlockId>>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a net, collapsing duplicate block ids.
    pub fn insert(&mut self, net: NetId, blocks: impl IntoIterator<Item = BlockId>) {
        let mut deduped: Vec<BlockId> = Vec::new();
        for block in blocks {
            if !deduped.contains(&block) {
                deduped.push(block);
            }
        }
        self.nets.insert(net, deduped);
    }

    /// Returns the blocks of one net.
    pub fn get(&self, net: &NetId) -> Option<&[BlockId]> {
        self.nets.get(net).map(Vec::as_slice)
    }

    /// Iterates over nets in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NetId, &[BlockId])> {
        self.nets.iter().map(|(id, blocks)| (id, blocks.as_slice()))
    }

    /// Returns the number of nets.
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// Returns `true` if there are no nets.
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Returns every block referenced by some net.
    pub fn blocks(&self) -> BTreeSet<BlockId> {
        self.nets.values().flatten().cloned().collect()
    }
}

impl FromIterator<(NetId, Vec<BlockId>)> for Netlist {
    fn from_iter<I: IntoIterator<Item = (NetId, Vec<BlockId>)>>(iter: I) -> Self {
        let mut netlist = Netlist::new();
        for (net, blocks) in iter {
            netlist.insert(net, blocks);
        }
        netlist
    }
}

/// Block feature vectors used as clustering input.
///
/// All vectors share one dimension. Embeddings never serve as coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedding {
    dims: usize,
    vectors: BTreeMap<BlockId, Vec<f64>>,
}

impl Embedding {
    /// Creates an empty embedding of the given dimension.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            vectors: BTreeMap::new(),
        }
    }

    /// Adds a block's vector, checking its length.
    pub fn insert(&mut self, block: BlockId, vector: Vec<f64>) -> Result<(), PlaceError> {
        if vector.len() != self.dims {
            return Err(PlaceError::DimensionMismatch {
                block,
                expected: self.dims,
                found: vector.len(),
            });
        }
        self.vectors.insert(block, vector);
        Ok(())
    }

    /// Returns the shared dimension.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Returns a block's vector.
    pub fn get(&self, block: &BlockId) -> Option<&[f64]> {
        self.vectors.get(block).map(Vec::as_slice)
    }

    /// Returns `true` if the block has a vector.
    pub fn contains(&self, block: &BlockId) -> bool {
        self.vectors.contains_key(block)
    }

    /// Iterates over blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockId> {
        self.vectors.keys()
    }

    /// Returns the number of vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` if there are no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Everything the placer needs to know about one design.
#[derive(Debug, Clone, Default)]
pub struct Design {
    /// The global netlist.
    pub netlist: Netlist,
    /// Feature vectors for every movable block.
    pub embedding: Embedding,
    /// Blocks pinned to an explicit coordinate.
    pub fixed: Placement,
    /// Source names of blocks, as produced by the packer.
    pub names: BTreeMap<BlockId, String>,
}

impl Design {
    /// Returns every block named by the netlist, the embedding or the fixed map.
    pub fn blocks(&self) -> BTreeSet<BlockId> {
        let mut blocks = self.netlist.blocks();
        blocks.extend(self.embedding.blocks().cloned());
        blocks.extend(self.fixed.keys().cloned());
        blocks
    }

    /// Counts the distinct kernels named by [`Design::names`].
    ///
    /// A name's kernel is its prefix before the first `.` and then before
    /// the first `$`. Kernels start with `lb`; LUT kernels are not counted.
    pub fn kernel_count(&self) -> usize {
        self.names
            .values()
            .filter_map(|name| name.split('.').next())
            .filter_map(|name| name.split('$').next())
            .filter(|kernel| kernel.starts_with("lb") && !kernel.contains("lut"))
            .collect::<BTreeSet<&str>>()
            .len()
    }
}
