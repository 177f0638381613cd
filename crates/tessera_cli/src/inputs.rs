//! Readers for the packed netlist and embedding files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use tessera_common::{BlockId, BlockKind, NetId};
use tessera_place::{Embedding, Netlist, Placement};

/// The packer's output: connectivity plus block metadata.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackedNetlist {
    /// Net name to the blocks it connects.
    pub netlist: BTreeMap<NetId, Vec<BlockId>>,
    /// Block id to the name written in the placement file.
    #[serde(default)]
    pub id_to_name: BTreeMap<BlockId, String>,
    /// Registers folded into a host block by the packer.
    #[serde(default)]
    pub folded: BTreeMap<BlockId, BlockId>,
    /// Blocks pinned to a coordinate.
    #[serde(default)]
    pub fixed: Placement,
}

impl PackedNetlist {
    /// Collects the nets into a [`Netlist`], dropping repeated blocks.
    pub fn to_netlist(&self) -> Netlist {
        self.netlist
            .iter()
            .map(|(net, blocks)| (net.clone(), blocks.clone()))
            .collect()
    }
}

/// Reads a packed netlist from a JSON file.
pub fn load_packed(path: &Path) -> Result<PackedNetlist, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read packed netlist {}: {e}", path.display()))?;
    parse_packed(&text)
}

/// Parses a packed netlist from JSON text.
pub fn parse_packed(text: &str) -> Result<PackedNetlist, Box<dyn Error>> {
    let packed: PackedNetlist =
        serde_json::from_str(text).map_err(|e| format!("invalid packed netlist: {e}"))?;
    for (register, host) in &packed.folded {
        if host == register {
            return Err(format!("block {register} is folded into itself").into());
        }
    }
    Ok(packed)
}

/// Reads an embedding file.
pub fn load_embedding(path: &Path) -> Result<Embedding, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read embedding {}: {e}", path.display()))?;
    parse_embedding(&text)
}

/// Parses an embedding: a `<count> <dims>` header, then one
/// `<block> <v1> ... <vN>` line per block.
///
/// I/O blocks are pinned rather than clustered, so their vectors are skipped.
pub fn parse_embedding(text: &str) -> Result<Embedding, Box<dyn Error>> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines.next().ok_or("embedding file is empty")?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    let [count, dims] = fields.as_slice() else {
        return Err(format!("invalid embedding header '{header}', expected '<count> <dims>'").into());
    };
    let count: usize = count
        .parse()
        .map_err(|_| format!("invalid block count '{count}' in embedding header"))?;
    let dims: usize = dims
        .parse()
        .map_err(|_| format!("invalid dimension '{dims}' in embedding header"))?;

    let mut embedding = Embedding::new(dims);
    let mut seen = 0usize;
    for (index, line) in lines {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else { continue };
        let block = BlockId::new(name).map_err(|e| format!("line {}: {e}", index + 1))?;
        let vector = fields
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| format!("line {}: invalid value '{v}'", index + 1))
            })
            .collect::<Result<Vec<f64>, String>>()?;
        seen += 1;
        if block.kind() == BlockKind::Io {
            continue;
        }
        embedding.insert(block, vector)?;
    }
    if seen != count {
        tracing::warn!(declared = count, found = seen, "embedding block count mismatch");
    }
    Ok(embedding)
}
