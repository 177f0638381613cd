//! Error type for the placement pipeline.

use tessera_arch::{ArchError, CellType};
use tessera_common::{BlockId, ClusterId, InternalError, NetId};
use tessera_config::ConfigError;

/// Errors that abort a placement run.
///
/// Coarse-placement infeasibility is not listed here: it is recovered from
/// inside the orchestrator and only surfaces as a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    /// A board operation failed: an illegal or colliding placement.
    #[error(transparent)]
    Arch(#[from] ArchError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An invariant of the placer was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// An input block id is not allowed in a netlist.
    #[error("invalid input block {block}: {reason}")]
    InvalidBlock {
        /// The offending block.
        block: BlockId,
        /// Why it was rejected.
        reason: String,
    },

    /// A movable block has no embedding vector.
    #[error("block {0} has no embedding")]
    MissingEmbedding(BlockId),

    /// An embedding vector's length differs from the file's dimension.
    #[error("embedding for {block} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        /// The block whose vector is malformed.
        block: BlockId,
        /// The shared dimension.
        expected: usize,
        /// This vector's length.
        found: usize,
    },

    /// The board does not have enough free cells of one type.
    #[error("not enough {cell} cells: {required} required, {available} available")]
    InsufficientCapacity {
        /// The cell type that ran out.
        cell: CellType,
        /// Cells needed.
        required: usize,
        /// Free cells on the board or in the reservation.
        available: usize,
    },

    /// Too few compute cells have a free register slot for the folded registers.
    #[error("not enough register slots: {required} required, {available} available")]
    InsufficientRegisterSlots {
        /// Register slots needed.
        required: usize,
        /// Free register slots on the board or in the reservation.
        available: usize,
    },

    /// A net references a block that belongs to no cluster and is not fixed.
    #[error("net {net} references block {block}, which no cluster or fixed position resolves")]
    UnresolvedBlock {
        /// The net being reduced or evaluated.
        net: NetId,
        /// The unresolvable block.
        block: BlockId,
    },

    /// The cluster partition does not cover the movable blocks exactly once.
    #[error("malformed cluster partition: {0}")]
    MalformedPartition(String),

    /// A detailed placement job failed on the local pool.
    #[error("detailed placement of cluster {cluster} failed: {reason}")]
    JobFailed {
        /// The cluster whose job failed.
        cluster: ClusterId,
        /// The failure reported by the worker.
        reason: String,
    },

    /// A remote endpoint did not return a usable result.
    #[error("remote placement of cluster {cluster} failed: {reason}")]
    Remote {
        /// The cluster whose job failed.
        cluster: ClusterId,
        /// The transport, status or decoding failure.
        reason: String,
    },

    /// A job's result disagrees with its member set.
    #[error("result for cluster {cluster} is inconsistent: {reason}")]
    InconsistentResult {
        /// The cluster whose result was rejected.
        cluster: ClusterId,
        /// Which block is missing or foreign.
        reason: String,
    },

    /// A job descriptor could not be encoded or decoded.
    #[error("job encoding failed: {0}")]
    Codec(String),

    /// The worker pool or async runtime could not be built.
    #[error("failed to start executor: {0}")]
    Executor(String),
}
