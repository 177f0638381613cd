//! Self-contained detailed placement jobs.
//!
//! A job carries everything one detailed anneal needs, so it can run on any
//! worker, local or remote, without shared state. Jobs travel to remote
//! endpoints as `bincode` (serde mode) and are fingerprinted with XXH3 for
//! log correlation.

use crate::anneal::AnnealParams;
use crate::detailed::DetailedPlacer;
use crate::error::PlaceError;
use crate::netlist::{Netlist, Placement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tessera_common::{BlockId, BlockKind, ClusterId, ContentHash, Coord};

/// One cluster's detailed placement problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementJob {
    /// The cluster being placed.
    pub cluster: ClusterId,
    /// Blocks to place.
    pub members: BTreeSet<BlockId>,
    /// Compute cells whose primary slot is reserved for the cluster.
    pub compute_cells: BTreeSet<Coord>,
    /// Compute cells whose register slot is reserved for the cluster.
    ///
    /// Used only with register folding.
    pub register_cells: BTreeSet<Coord>,
    /// Memory cells reserved for the cluster.
    pub memory_cells: BTreeSet<Coord>,
    /// The netlist reduced onto this cluster.
    pub netlist: Netlist,
    /// Pinned blocks plus the surrogate of every other cluster at its centroid.
    pub fixed: Placement,
    /// Whether registers may share a compute cell with a compute block.
    pub fold_registers: bool,
    /// Seed for this job's generator.
    pub seed: u64,
    /// Step budget and cooling schedule.
    pub anneal: AnnealParams,
}

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

impl PlacementJob {
    /// Encodes the job for transport.
    pub fn encode(&self) -> Result<Vec<u8>, PlaceError> {
        bincode::serde::encode_to_vec(self, bincode_config())
            .map_err(|e| PlaceError::Codec(e.to_string()))
    }

    /// Decodes a job received from a dispatcher.
    pub fn decode(bytes: &[u8]) -> Result<Self, PlaceError> {
        let (job, _) = bincode::serde::decode_from_slice(bytes, bincode_config())
            .map_err(|e| PlaceError::Codec(e.to_string()))?;
        Ok(job)
    }

    /// Returns the XXH3 fingerprint of the encoded job.
    pub fn fingerprint(&self) -> Result<ContentHash, PlaceError> {
        Ok(ContentHash::from_bytes(&self.encode()?))
    }

    /// Runs the detailed anneal to completion.
    pub fn run(&self) -> Result<Placement, PlaceError> {
        Ok(DetailedPlacer::new(self)?.anneal())
    }

    /// Returns the reserved cells a block of this kind may occupy.
    fn cells_for(&self, kind: BlockKind) -> Option<&BTreeSet<Coord>> {
        match kind {
            BlockKind::Compute => Some(&self.compute_cells),
            BlockKind::Register if self.fold_registers => Some(&self.register_cells),
            BlockKind::Register => Some(&self.compute_cells),
            BlockKind::Memory => Some(&self.memory_cells),
            BlockKind::Io | BlockKind::Surrogate => None,
        }
    }

    /// Checks that `result` places exactly this job's members, each on a
    /// cell reserved for its kind.
    pub fn check_result(&self, result: &Placement) -> Result<(), PlaceError> {
        if let Some(missing) = self.members.iter().find(|b| !result.contains_key(*b)) {
            return Err(PlaceError::InconsistentResult {
                cluster: self.cluster,
                reason: format!("member {missing} is missing"),
            });
        }
        if let Some(foreign) = result.keys().find(|b| !self.members.contains(*b)) {
            return Err(PlaceError::InconsistentResult {
                cluster: self.cluster,
                reason: format!("block {foreign} is not a member"),
            });
        }
        for (block, coord) in result {
            if !self.cells_for(block.kind()).is_some_and(|cells| cells.contains(coord)) {
                return Err(PlaceError::InconsistentResult {
                    cluster: self.cluster,
                    reason: format!("block {block} at {coord} is outside the reserved cells"),
                });
            }
        }
        Ok(())
    }
}

/// Derives a job seed from the run seed and cluster id with one SplitMix64 step.
pub fn derive_seed(run_seed: u64, cluster: ClusterId) -> u64 {
    let mut z = run_seed
        .wrapping_add(0x9E37_79B9_7F4A_7C15u64.wrapping_mul(cluster.as_raw() as u64 + 1));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
