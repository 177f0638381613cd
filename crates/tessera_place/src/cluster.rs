//! Embedding-space clustering of movable blocks.
//!
//! Lloyd's k-means with k-means++ seeding. All randomness comes from the
//! caller's generator, and points are visited in block-id order, so a given
//! seed always yields the same partition.

use crate::error::PlaceError;
use crate::netlist::Embedding;
use crate::partition::Partition;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tessera_common::{BlockId, ClusterId};

/// Upper bound on Lloyd iterations.
const MAX_ITERATIONS: usize = 300;

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64], centres: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, centre) in centres.iter().enumerate() {
        let d = squared_distance(point, centre);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

fn seed_centres(points: &[&[f64]], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centres: Vec<Vec<f64>> = Vec::with_capacity(k);
    centres.push(points[rng.gen_range(0..points.len())].to_vec());
    while centres.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centres
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        let index = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            rng.gen_range(0..points.len())
        };
        centres.push(points[index].to_vec());
    }
    centres
}

/// Partitions the given blocks into at most `k` clusters by embedding proximity.
///
/// Empty clusters are dropped and the rest numbered `0..` in order of their
/// smallest member id, so the result may hold fewer than `k` clusters.
pub fn kmeans(
    blocks: &BTreeSet<BlockId>,
    embedding: &Embedding,
    k: usize,
    rng: &mut StdRng,
) -> Result<Partition, PlaceError> {
    let ids: Vec<&BlockId> = blocks.iter().collect();
    let points: Vec<&[f64]> = ids
        .iter()
        .map(|b| embedding.get(b).ok_or_else(|| PlaceError::MissingEmbedding((*b).clone())))
        .collect::<Result<_, _>>()?;
    let k = k.min(points.len());
    if k == 0 {
        return Ok(Partition::default());
    }

    let mut centres = seed_centres(&points, k, rng);
    let mut assignment: Vec<usize> = points.iter().map(|p| nearest(p, &centres)).collect();

    for iteration in 0..MAX_ITERATIONS {
        let dims = embedding.dims();
        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (p, &a) in points.iter().zip(&assignment) {
            counts[a] += 1;
            for (s, v) in sums[a].iter_mut().zip(p.iter()) {
                *s += v;
            }
        }
        for (i, centre) in centres.iter_mut().enumerate() {
            // An emptied centre keeps its position.
            if counts[i] > 0 {
                *centre = sums[i].iter().map(|s| s / counts[i] as f64).collect();
            }
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centres)).collect();
        if next == assignment {
            tracing::debug!(iterations = iteration + 1, "k-means converged");
            break;
        }
        assignment = next;
    }

    let mut groups: Vec<BTreeSet<BlockId>> = vec![BTreeSet::new(); k];
    for (id, &a) in ids.iter().zip(&assignment) {
        groups[a].insert((*id).clone());
    }
    groups.retain(|g| !g.is_empty());
    groups.sort_by(|a, b| a.first().cmp(&b.first()));

    log_cluster_sizes(&groups);

    let clusters: BTreeMap<ClusterId, BTreeSet<BlockId>> = groups
        .into_iter()
        .enumerate()
        .map(|(i, g)| (ClusterId::from_raw(i as u32), g))
        .collect();
    Partition::new(clusters)
}

fn log_cluster_sizes(groups: &[BTreeSet<BlockId>]) {
    let sizes: Vec<f64> = groups.iter().map(|g| g.len() as f64).collect();
    let total: f64 = sizes.iter().sum();
    let mean = total / sizes.len().max(1) as f64;
    let variance =
        sizes.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / sizes.len().max(1) as f64;
    tracing::info!(
        clusters = groups.len(),
        average = mean,
        std_dev = variance.sqrt(),
        total,
        "clustered movable blocks"
    );
}
