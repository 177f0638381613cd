//! Cluster-level placement.
//!
//! Each cluster is modelled as a square footprint sized to its cell demand
//! and annealed across the board against the condensed netlist, where every
//! cluster is a single node. The annealed centres are then squeezed into a
//! concrete set of reserved cells per cluster. When no cluster count works,
//! [`flat_fallback`] reserves cells for one pseudo-cluster greedily.

use crate::anneal::{initial_temperature, AnnealParams, Schedule, TEMPERATURE_SAMPLES};
use crate::capacity::{Demand, FreeCells, Reservation};
use crate::centroid::centroid;
use crate::cost::hpwl_f64;
use crate::error::PlaceError;
use crate::netlist::{Netlist, Placement};
use crate::partition::Partition;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tessera_arch::{Board, CellType};
use tessera_common::{BlockId, ClusterId, Coord};

/// Cost per unit of pairwise footprint overlap area.
const OVERLAP_PENALTY: f64 = 4.0;

/// The clusters cannot be seated on the board at this cluster count.
///
/// Recoverable: the orchestrator retries with one cluster fewer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("coarse placement infeasible with {clusters} clusters: {reason}")]
pub struct Infeasible {
    /// The cluster count that was tried.
    pub clusters: usize,
    /// Which capacity check failed.
    pub reason: String,
}

#[derive(Debug, Clone)]
struct Footprint {
    cluster: ClusterId,
    demand: Demand,
    side: u32,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Cluster(usize),
    Fixed(f64, f64),
}

/// Final cluster centres of a coarse anneal.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseLayout {
    /// Footprint centre of each cluster.
    pub centres: BTreeMap<ClusterId, Coord>,
    /// Cost of the layout.
    pub cost: f64,
}

/// Anneals cluster footprints over the board.
#[derive(Debug, Clone)]
pub struct CoarsePlacer {
    width: u32,
    height: u32,
    footprints: Vec<Footprint>,
    origins: Vec<Coord>,
    nets: Vec<Vec<Node>>,
    cluster_nets: Vec<Vec<usize>>,
    params: AnnealParams,
}

impl CoarsePlacer {
    /// Builds a coarse placer, or reports why the clusters cannot be seated.
    ///
    /// `condensed` is the netlist reduced with every cluster condensed.
    pub fn new(
        board: &Board,
        free: &FreeCells,
        partition: &Partition,
        condensed: &Netlist,
        fixed: &Placement,
        fold_registers: bool,
        params: AnnealParams,
    ) -> Result<Self, Infeasible> {
        let clusters = partition.len();
        let infeasible = |reason: String| Infeasible { clusters, reason };

        let footprints: Vec<Footprint> = partition
            .iter()
            .map(|(cluster, members)| {
                let demand = Demand::of(members, fold_registers);
                let side = (demand.total() as f64).sqrt().ceil().max(1.0) as u32;
                Footprint {
                    cluster,
                    demand,
                    side,
                }
            })
            .collect();

        let total = footprints
            .iter()
            .fold(Demand::default(), |acc, f| acc + f.demand);
        for cell in [CellType::Compute, CellType::Memory] {
            let available = free.of_type(cell).map_or(0, BTreeSet::len);
            if total.get(cell) > available {
                return Err(infeasible(format!(
                    "{} {cell} cells needed, {available} free",
                    total.get(cell)
                )));
            }
        }
        if total.registers > free.registers.len() {
            return Err(infeasible(format!(
                "{} register slots needed, {} free",
                total.registers,
                free.registers.len()
            )));
        }
        for f in &footprints {
            if f.side > board.width() || f.side > board.height() {
                return Err(infeasible(format!(
                    "cluster {} needs a {}x{} footprint on a {}x{} board",
                    f.cluster,
                    f.side,
                    f.side,
                    board.width(),
                    board.height()
                )));
            }
        }
        let area: usize = footprints.iter().map(|f| (f.side * f.side) as usize).sum();
        if area > free.total() {
            return Err(infeasible(format!(
                "summed footprint area {area} exceeds {} free cells",
                free.total()
            )));
        }

        let index: BTreeMap<BlockId, usize> = footprints
            .iter()
            .enumerate()
            .map(|(i, f)| (BlockId::surrogate(f.cluster), i))
            .collect();
        let mut nets = Vec::with_capacity(condensed.len());
        let mut cluster_nets = vec![Vec::new(); footprints.len()];
        for (_, blocks) in condensed.iter() {
            let net_index = nets.len();
            // Reduction guarantees every node is a surrogate or fixed.
            let nodes: Vec<Node> = blocks
                .iter()
                .filter_map(|b| match index.get(b) {
                    Some(&i) => Some(Node::Cluster(i)),
                    None => fixed.get(b).map(|c| Node::Fixed(c.x as f64, c.y as f64)),
                })
                .collect();
            for node in &nodes {
                if let Node::Cluster(i) = node {
                    cluster_nets[*i].push(net_index);
                }
            }
            nets.push(nodes);
        }

        Ok(Self {
            width: board.width(),
            height: board.height(),
            origins: vec![Coord::new(0, 0); footprints.len()],
            footprints,
            nets,
            cluster_nets,
            params,
        })
    }

    /// Returns the number of clusters being placed.
    pub fn cluster_count(&self) -> usize {
        self.footprints.len()
    }

    fn centre_f64(&self, i: usize) -> (f64, f64) {
        let half = self.footprints[i].side as f64 / 2.0;
        (
            self.origins[i].x as f64 + half,
            self.origins[i].y as f64 + half,
        )
    }

    fn centre(&self, i: usize) -> Coord {
        let half = self.footprints[i].side / 2;
        Coord::new(self.origins[i].x + half, self.origins[i].y + half)
    }

    fn net_cost(&self, net: usize) -> f64 {
        hpwl_f64(self.nets[net].iter().map(|node| match *node {
            Node::Cluster(i) => self.centre_f64(i),
            Node::Fixed(x, y) => (x, y),
        }))
    }

    fn overlap(&self, a: usize, b: usize) -> f64 {
        let (oa, sa) = (self.origins[a], self.footprints[a].side);
        let (ob, sb) = (self.origins[b], self.footprints[b].side);
        let dx = (oa.x + sa).min(ob.x + sb).saturating_sub(oa.x.max(ob.x));
        let dy = (oa.y + sa).min(ob.y + sb).saturating_sub(oa.y.max(ob.y));
        (dx as f64) * (dy as f64)
    }

    fn total_cost(&self) -> f64 {
        let wire: f64 = (0..self.nets.len()).map(|n| self.net_cost(n)).sum();
        let mut overlap = 0.0;
        for a in 0..self.footprints.len() {
            for b in a + 1..self.footprints.len() {
                overlap += self.overlap(a, b);
            }
        }
        wire + OVERLAP_PENALTY * overlap
    }

    /// Cost of the nets and overlap pairs that involve `moved`.
    fn local_cost(&self, moved: &[usize]) -> f64 {
        let mut nets: Vec<usize> = moved
            .iter()
            .flat_map(|&i| self.cluster_nets[i].iter().copied())
            .collect();
        nets.sort_unstable();
        nets.dedup();
        let wire: f64 = nets.iter().map(|&n| self.net_cost(n)).sum();

        let mut overlap = 0.0;
        for (k, &m) in moved.iter().enumerate() {
            for other in 0..self.footprints.len() {
                if other == m || moved[..k].contains(&other) {
                    continue;
                }
                overlap += self.overlap(m, other);
            }
        }
        wire + OVERLAP_PENALTY * overlap
    }

    fn random_origin(&self, i: usize, rng: &mut StdRng) -> Coord {
        let side = self.footprints[i].side;
        Coord::new(
            rng.gen_range(0..=self.width - side),
            rng.gen_range(0..=self.height - side),
        )
    }

    fn clamp_origin(&self, i: usize, origin: Coord) -> Coord {
        let side = self.footprints[i].side;
        Coord::new(origin.x.min(self.width - side), origin.y.min(self.height - side))
    }

    /// Proposes a move, returning the moved clusters and their previous origins.
    fn propose(&mut self, rng: &mut StdRng) -> Vec<(usize, Coord)> {
        let n = self.footprints.len();
        let a = rng.gen_range(0..n);
        if n >= 2 && rng.gen_bool(0.5) {
            let mut b = rng.gen_range(0..n - 1);
            if b >= a {
                b += 1;
            }
            let (oa, ob) = (self.origins[a], self.origins[b]);
            self.origins[a] = self.clamp_origin(a, ob);
            self.origins[b] = self.clamp_origin(b, oa);
            vec![(a, oa), (b, ob)]
        } else {
            let old = self.origins[a];
            self.origins[a] = self.random_origin(a, rng);
            vec![(a, old)]
        }
    }

    fn undo(&mut self, moved: &[(usize, Coord)]) {
        for &(i, origin) in moved {
            self.origins[i] = origin;
        }
    }

    /// Evaluates a proposed move: cost after minus cost before.
    fn try_move(&mut self, rng: &mut StdRng) -> (Vec<(usize, Coord)>, f64) {
        let snapshot = self.origins.clone();
        let moved = self.propose(rng);
        let ids: Vec<usize> = moved.iter().map(|&(i, _)| i).collect();
        let after = self.local_cost(&ids);
        let proposed = std::mem::replace(&mut self.origins, snapshot);
        let before = self.local_cost(&ids);
        self.origins = proposed;
        (moved, after - before)
    }

    /// Anneals the cluster footprints for the configured step budget.
    ///
    /// Returns the best layout seen.
    pub fn anneal(&mut self, rng: &mut StdRng) -> CoarseLayout {
        for i in 0..self.footprints.len() {
            self.origins[i] = self.random_origin(i, rng);
        }

        let mut samples = Vec::with_capacity(TEMPERATURE_SAMPLES);
        for _ in 0..TEMPERATURE_SAMPLES.min(self.params.steps) {
            let (moved, delta) = self.try_move(rng);
            samples.push(delta);
            self.undo(&moved);
        }

        let mut schedule = Schedule::new(self.params, initial_temperature(&samples));
        let mut cost = self.total_cost();
        let mut best_cost = cost;
        let mut best = self.origins.clone();
        let mut accepted = 0usize;

        while schedule.advance() {
            let (moved, delta) = self.try_move(rng);
            if schedule.accept(delta, rng) {
                cost += delta;
                accepted += 1;
                if cost < best_cost - 1e-9 {
                    best_cost = cost;
                    best = self.origins.clone();
                }
            } else {
                self.undo(&moved);
            }
        }

        self.origins = best;
        let final_cost = self.total_cost();
        tracing::debug!(
            clusters = self.footprints.len(),
            steps = self.params.steps,
            accepted,
            cost = final_cost,
            "coarse anneal finished"
        );

        CoarseLayout {
            centres: (0..self.footprints.len())
                .map(|i| (self.footprints[i].cluster, self.centre(i)))
                .collect(),
            cost: final_cost,
        }
    }

    /// Expands annealed centres into concrete reserved cells.
    ///
    /// Clusters are processed in ascending id. Each claims, per slot kind,
    /// the free slots nearest its centre, ties broken by board enumeration
    /// order. Primary and register slots of one compute cell are claimed
    /// independently, so a cell may serve two clusters.
    pub fn squeeze(
        &self,
        layout: &CoarseLayout,
        free: &FreeCells,
    ) -> Result<Vec<Reservation>, PlaceError> {
        let mut compute = free.compute.clone();
        let mut registers = free.registers.clone();
        let mut memory = free.memory.clone();
        let mut reservations = Vec::with_capacity(self.footprints.len());

        for f in &self.footprints {
            let centre = layout.centres.get(&f.cluster).copied().ok_or_else(|| {
                tessera_common::InternalError::new(format!(
                    "no coarse centre for cluster {}",
                    f.cluster
                ))
            })?;
            let claimed_compute = claim_nearest(&mut compute, centre, f.demand.compute)
                .map_err(|available| PlaceError::InsufficientCapacity {
                    cell: CellType::Compute,
                    required: f.demand.compute,
                    available,
                })?;
            let claimed_registers = claim_nearest(&mut registers, centre, f.demand.registers)
                .map_err(|available| PlaceError::InsufficientRegisterSlots {
                    required: f.demand.registers,
                    available,
                })?;
            let claimed_memory = claim_nearest(&mut memory, centre, f.demand.memory)
                .map_err(|available| PlaceError::InsufficientCapacity {
                    cell: CellType::Memory,
                    required: f.demand.memory,
                    available,
                })?;
            let centroid = centroid(&claimed_compute)
                .or_else(|| centroid(&claimed_registers))
                .or_else(|| centroid(&claimed_memory))
                .unwrap_or(centre);
            reservations.push(Reservation {
                cluster: f.cluster,
                compute: claimed_compute,
                registers: claimed_registers,
                memory: claimed_memory,
                centroid,
            });
        }
        Ok(reservations)
    }
}

/// Removes and returns the `count` slots nearest `centre`.
///
/// Fails with the number of available slots when there are too few.
fn claim_nearest(
    available: &mut BTreeSet<Coord>,
    centre: Coord,
    count: usize,
) -> Result<BTreeSet<Coord>, usize> {
    if available.len() < count {
        return Err(available.len());
    }
    let mut ranked: Vec<Coord> = available.iter().copied().collect();
    ranked.sort_by_key(|c| (c.manhattan(centre), *c));
    let claimed: BTreeSet<Coord> = ranked.into_iter().take(count).collect();
    for c in &claimed {
        available.remove(c);
    }
    Ok(claimed)
}

/// Reserves cells for one pseudo-cluster holding every movable block.
///
/// The first free cells of each type in board enumeration order are taken.
/// Too few cells of a type is fatal. The centroid is the board centre.
pub fn flat_fallback(
    board: &Board,
    free: &FreeCells,
    partition: &Partition,
    fold_registers: bool,
) -> Result<Reservation, PlaceError> {
    let cluster = ClusterId::from_raw(0);
    let members = partition.members(cluster).ok_or_else(|| {
        tessera_common::InternalError::new("flat partition has no cluster 0")
    })?;
    let demand = Demand::of(members, fold_registers);

    let take = |cells: &BTreeSet<Coord>, required: usize| -> Result<BTreeSet<Coord>, usize> {
        if cells.len() < required {
            return Err(cells.len());
        }
        Ok(cells.iter().copied().take(required).collect())
    };
    let shortfall = |cell: CellType, required: usize| {
        move |available| PlaceError::InsufficientCapacity {
            cell,
            required,
            available,
        }
    };

    Ok(Reservation {
        cluster,
        compute: take(&free.compute, demand.compute)
            .map_err(shortfall(CellType::Compute, demand.compute))?,
        registers: take(&free.registers, demand.registers).map_err(|available| {
            PlaceError::InsufficientRegisterSlots {
                required: demand.registers,
                available,
            }
        })?,
        memory: take(&free.memory, demand.memory)
            .map_err(shortfall(CellType::Memory, demand.memory))?,
        centroid: board.centre(),
    })
}
