//! Hierarchical placement engine for CGRA boards.
//!
//! The pipeline pins fixed and I/O blocks, clusters the movable blocks by
//! embedding proximity, anneals the clusters into a coarse layout (retrying
//! with fewer clusters when the layout is infeasible, and falling back to a
//! single flat cluster when none is), then anneals each cluster's blocks onto
//! its reserved cells through an [`Executor`] and merges the results.
//!
//! ```text
//! pin ─► cluster ─► coarse anneal ─► squeeze ─► reduce per cluster ─► dispatch ─► merge
//!           ▲            │ infeasible
//!           └── k - 1 ◄──┘   (k = 0: flat fallback)
//! ```

#![warn(missing_docs)]

pub mod anneal;
pub mod capacity;
pub mod centroid;
pub mod cluster;
pub mod coarse;
pub mod codes;
pub mod cost;
pub mod detailed;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod netlist;
pub mod partition;
pub mod pin;
pub mod reduce;

pub use dispatch::{Executor, LocalExecutor, RemoteExecutor};
pub use error::PlaceError;
pub use job::PlacementJob;
pub use netlist::{Design, Embedding, Netlist, Placement};

use anneal::AnnealParams;
use capacity::{FreeCells, Reservation};
use coarse::CoarsePlacer;
use partition::Partition;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reduce::{reduce_netlist, ReduceTarget};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tessera_arch::{Board, CellType, Occupancy};
use tessera_common::{BlockId, BlockKind, ClusterId, Coord, InternalError};
use tessera_config::PlacerConfig;
use tessera_diagnostics::{Diagnostic, DiagnosticSink};

/// Outcome of a successful placement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResult {
    /// Every block's final cell, pinned blocks included.
    pub placement: Placement,
    /// Number of clusters placed in detail (1 after the flat fallback).
    pub clusters_used: usize,
    /// Whether the flat fallback ran.
    pub fallback: bool,
    /// Total half-perimeter wirelength over the global netlist.
    pub wirelength: u64,
}

/// Builds the executor the configuration asks for.
///
/// A configured remote URL selects [`RemoteExecutor`]; otherwise jobs run on
/// a [`LocalExecutor`].
pub fn executor_for(config: &PlacerConfig) -> Box<dyn Executor> {
    match &config.remote.url {
        Some(url) => Box::new(
            RemoteExecutor::new(url.clone())
                .with_timeout(Duration::from_secs(config.remote.timeout_secs))
                .with_retries(config.remote.retries),
        ),
        None => Box::new(LocalExecutor::new(config.dispatch.workers)),
    }
}

/// Rejects surrogate ids and movable blocks without an embedding.
fn validate_design(design: &Design, blocks: &BTreeSet<BlockId>) -> Result<(), PlaceError> {
    for block in blocks {
        match block.kind() {
            BlockKind::Surrogate => {
                return Err(PlaceError::InvalidBlock {
                    block: block.clone(),
                    reason: "the 'x' prefix is reserved for cluster surrogates".to_string(),
                })
            }
            BlockKind::Io => {}
            BlockKind::Compute | BlockKind::Memory | BlockKind::Register => {
                if !design.fixed.contains_key(block) && !design.embedding.contains(block) {
                    return Err(PlaceError::MissingEmbedding(block.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Builds the detailed placement job for one cluster.
fn build_job(
    design: &Design,
    partition: &Partition,
    reservation: Reservation,
    centroids: &BTreeMap<ClusterId, Coord>,
    pinned: &Placement,
    config: &PlacerConfig,
    multiplier: usize,
) -> Result<PlacementJob, PlaceError> {
    let cluster = reservation.cluster;
    let members = partition
        .members(cluster)
        .cloned()
        .ok_or_else(|| InternalError::new(format!("reservation for unknown cluster {cluster}")))?;
    let netlist = reduce_netlist(
        &design.netlist,
        partition,
        pinned,
        ReduceTarget::Cluster(cluster),
    )?;

    let mut anchors = pinned.clone();
    for (&other, &centroid) in centroids {
        if other != cluster {
            anchors.insert(BlockId::surrogate(other), centroid);
        }
    }
    let fixed: Placement = netlist
        .blocks()
        .into_iter()
        .filter_map(|b| anchors.get(&b).map(|&c| (b, c)))
        .collect();

    Ok(PlacementJob {
        cluster,
        anneal: AnnealParams::detailed(&config.anneal, members.len(), multiplier),
        members,
        compute_cells: reservation.compute,
        register_cells: reservation.registers,
        memory_cells: reservation.memory,
        netlist,
        fixed,
        fold_registers: config.placer.fold_registers,
        seed: job::derive_seed(config.placer.seed, cluster),
    })
}

/// Runs the clustering retry loop.
///
/// Returns the partition, its reservations, and whether the flat fallback ran.
#[allow(clippy::too_many_arguments)]
fn cluster_and_reserve(
    design: &Design,
    board: &Board,
    movable: &BTreeSet<BlockId>,
    pinned: &Placement,
    free: &FreeCells,
    config: &PlacerConfig,
    rng: &mut StdRng,
    sink: &DiagnosticSink,
) -> Result<(Partition, Vec<Reservation>, bool), PlaceError> {
    let fold = config.placer.fold_registers;
    let initial = config
        .placer
        .clusters
        .resolve(movable.len(), design.kernel_count());
    let mut k = initial;

    while k > 0 {
        let partition = cluster::kmeans(movable, &design.embedding, k, rng)?;
        let condensed =
            reduce_netlist(&design.netlist, &partition, pinned, ReduceTarget::CondenseAll)?;
        match CoarsePlacer::new(
            board,
            free,
            &partition,
            &condensed,
            pinned,
            fold,
            AnnealParams::coarse(&config.anneal),
        ) {
            Ok(mut placer) => {
                tracing::info!(clusters = placer.cluster_count(), "running coarse placement");
                let layout = placer.anneal(rng);
                let reservations = placer.squeeze(&layout, free)?;
                return Ok((partition, reservations, false));
            }
            Err(infeasible) => {
                tracing::warn!(k, reason = %infeasible.reason, "coarse placement infeasible");
                sink.emit(
                    Diagnostic::warning(
                        codes::CLUSTER_RETRY,
                        format!("coarse placement infeasible with {k} clusters, retrying"),
                    )
                    .with_subject("clustering")
                    .with_note(infeasible.reason),
                );
                k -= 1;
            }
        }
    }

    let note = if initial == 0 {
        "the cluster count is set to 0".to_string()
    } else {
        format!("no cluster count from {initial} down to 1 could be seated")
    };
    sink.emit(
        Diagnostic::warning(
            codes::FLAT_FALLBACK,
            "falling back to flat placement of all movable blocks",
        )
        .with_subject("clustering")
        .with_note(note)
        .with_help("detailed placement runs with a larger step budget and may be slow"),
    );
    tracing::warn!(blocks = movable.len(), "netlist too big, falling back to flat placement");
    let partition = Partition::flat(movable.iter().cloned());
    let reservation = coarse::flat_fallback(board, free, &partition, fold)?;
    Ok((partition, vec![reservation], true))
}

/// Places a design on a board.
///
/// Pins fixed and I/O blocks, runs hierarchical placement with the retry and
/// flat-fallback strategy, dispatches one detailed job per cluster through
/// `executor`, and replays the merged result through a fresh occupancy
/// overlay so that legality and collisions are checked on the final answer.
/// Any fatal error aborts the run; no partial placement is returned.
pub fn place_design(
    design: &Design,
    board: &Board,
    config: &PlacerConfig,
    executor: &dyn Executor,
    sink: &DiagnosticSink,
) -> Result<PlacementResult, PlaceError> {
    tessera_config::validate_config(config)?;
    let fold = config.placer.fold_registers;
    let blocks = design.blocks();
    validate_design(design, &blocks)?;
    tracing::info!(
        board = board.name(),
        blocks = blocks.len(),
        nets = design.netlist.len(),
        seed = config.placer.seed,
        "placing design"
    );

    let mut occupancy = Occupancy::new(board, fold);
    let pinned_blocks = pin::pin_blocks(&mut occupancy, &design.fixed, &blocks)?;
    let pinned: Placement = occupancy.positions().clone();
    let free = FreeCells::from_occupancy(&occupancy);
    let movable: BTreeSet<BlockId> = blocks.difference(&pinned_blocks).cloned().collect();

    let (partition, reservations, fallback) = if movable.is_empty() {
        (Partition::default(), Vec::new(), false)
    } else {
        let mut rng = StdRng::seed_from_u64(config.placer.seed);
        cluster_and_reserve(
            design, board, &movable, &pinned, &free, config, &mut rng, sink,
        )?
    };
    partition.verify(&blocks, &pinned_blocks)?;

    let multiplier = if fallback {
        config.anneal.fallback_multiplier
    } else {
        1
    };
    let centroids: BTreeMap<ClusterId, Coord> =
        reservations.iter().map(|r| (r.cluster, r.centroid)).collect();
    let jobs = reservations
        .into_iter()
        .map(|r| build_job(design, &partition, r, &centroids, &pinned, config, multiplier))
        .collect::<Result<Vec<_>, _>>()?;

    let job_count = jobs.len();
    tracing::info!(executor = executor.name(), jobs = job_count, fallback, "starting detailed placement");
    let detailed = executor.submit(jobs)?;
    sink.emit(
        Diagnostic::note(
            codes::DISPATCH_SUMMARY,
            format!("{job_count} detailed placement jobs completed"),
        )
        .with_subject(executor.name()),
    );

    let mut merged = Occupancy::new(board, fold);
    for (block, &coord) in pinned.iter().chain(detailed.iter()) {
        merged.place(block, coord)?;
    }
    if let Some(missing) = movable.iter().find(|b| merged.position(b).is_none()) {
        return Err(InternalError::new(format!("block {missing} was not placed")).into());
    }
    let placement = merged.into_positions();
    let wirelength = cost::total_wirelength(&design.netlist, &placement);

    let used_compute: BTreeSet<Coord> = placement
        .iter()
        .filter(|(b, _)| matches!(b.kind(), BlockKind::Compute | BlockKind::Register))
        .map(|(_, &c)| c)
        .collect();
    sink.emit(
        Diagnostic::note(
            codes::PLACEMENT_SUMMARY,
            format!(
                "placed {} blocks in {} clusters, wirelength {wirelength}",
                placement.len(),
                partition.len()
            ),
        )
        .with_note(format!(
            "{}/{} compute cells used",
            used_compute.len(),
            board.count(CellType::Compute)
        )),
    );
    tracing::info!(
        clusters = partition.len(),
        fallback,
        wirelength,
        "placement finished"
    );

    Ok(PlacementResult {
        placement,
        clusters_used: partition.len(),
        fallback,
        wirelength,
    })
}
