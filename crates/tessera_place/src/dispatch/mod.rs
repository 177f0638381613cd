//! Detailed placement job dispatch.
//!
//! An [`Executor`] runs every job of a placement run to completion and
//! merges the per-cluster results. [`LocalExecutor`] uses a `rayon` pool;
//! [`RemoteExecutor`] posts jobs to a placement endpoint such as the one
//! served by [`server::router`]. Any job failure fails the whole submission.

mod local;
mod remote;
pub mod server;

pub use local::{JobRunner, LocalExecutor};
pub use remote::RemoteExecutor;

use crate::error::PlaceError;
use crate::job::PlacementJob;
use crate::netlist::Placement;
use tessera_common::ClusterId;

/// Runs detailed placement jobs and merges their results.
pub trait Executor: Send + Sync {
    /// Runs every job and returns the union of their placements.
    ///
    /// Partial results are never returned: one failed job fails the call.
    fn submit(&self, jobs: Vec<PlacementJob>) -> Result<Placement, PlaceError>;

    /// Short name for log lines.
    fn name(&self) -> &'static str;
}

/// Merges per-job results in ascending cluster order.
///
/// Each result must place exactly its job's members, and no block may be
/// reported by two jobs.
pub(crate) fn merge(
    jobs: &[PlacementJob],
    results: Vec<(ClusterId, Placement)>,
) -> Result<Placement, PlaceError> {
    let mut ordered = results;
    ordered.sort_by_key(|(cluster, _)| *cluster);

    let mut merged = Placement::new();
    for (cluster, result) in ordered {
        let job = jobs.iter().find(|j| j.cluster == cluster).ok_or_else(|| {
            PlaceError::InconsistentResult {
                cluster,
                reason: "no job was submitted for this cluster".to_string(),
            }
        })?;
        job.check_result(&result)?;
        for (block, coord) in result {
            if merged.insert(block.clone(), coord).is_some() {
                return Err(PlaceError::InconsistentResult {
                    cluster,
                    reason: format!("block {block} was already placed by another cluster"),
                });
            }
        }
    }
    Ok(merged)
}
