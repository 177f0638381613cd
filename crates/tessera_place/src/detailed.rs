//! Per-cluster detailed placement.
//!
//! Anneals one cluster's member blocks onto the cells reserved for it.
//! Legality is structural: each block can only ever occupy a slot from the
//! pool that matches its kind, so every proposed move is legal before its
//! cost is evaluated.
//!
//! | Block kind | Pool                                               |
//! |------------|----------------------------------------------------|
//! | compute    | primary slots of reserved compute cells            |
//! | memory     | primary slots of reserved memory cells             |
//! | register   | reserved register slots if folding, else the compute pool |

use crate::anneal::{initial_temperature, AnnealParams, Schedule, TEMPERATURE_SAMPLES};
use crate::cost::hpwl;
use crate::error::PlaceError;
use crate::job::PlacementJob;
use crate::netlist::Placement;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tessera_arch::CellType;
use tessera_common::{BlockId, BlockKind, ClusterId, Coord};

const COMPUTE_POOL: usize = 0;
const MEMORY_POOL: usize = 1;
const REGISTER_POOL: usize = 2;

#[derive(Debug, Clone)]
struct Pool {
    cell: CellType,
    slots: Vec<Coord>,
    occupant: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Member(usize),
    Fixed(Coord),
}

#[derive(Debug, Clone, Copy)]
struct Move {
    block: usize,
    from: usize,
    to: usize,
    displaced: Option<usize>,
}

/// Simulated annealing over one cluster's reserved cells.
#[derive(Debug, Clone)]
pub struct DetailedPlacer {
    cluster: ClusterId,
    blocks: Vec<BlockId>,
    pool_of: Vec<usize>,
    slot_of: Vec<usize>,
    pools: Vec<Pool>,
    nets: Vec<Vec<Node>>,
    block_nets: Vec<Vec<usize>>,
    net_cost: Vec<u64>,
    job: JobSettings,
}

#[derive(Debug, Clone, Copy)]
struct JobSettings {
    seed: u64,
    params: AnnealParams,
}

impl DetailedPlacer {
    /// Builds the initial state for a job.
    ///
    /// Members sorted by id are dealt onto their pool's slots in ascending
    /// coordinate order. Fails if a pool is too small for its blocks or if a
    /// net names a block that is neither a member nor a fixed point.
    pub fn new(job: &PlacementJob) -> Result<Self, PlaceError> {
        let mut pools = vec![
            Pool {
                cell: CellType::Compute,
                slots: job.compute_cells.iter().copied().collect(),
                occupant: Vec::new(),
            },
            Pool {
                cell: CellType::Memory,
                slots: job.memory_cells.iter().copied().collect(),
                occupant: Vec::new(),
            },
            Pool {
                cell: CellType::Compute,
                slots: if job.fold_registers {
                    job.register_cells.iter().copied().collect()
                } else {
                    Vec::new()
                },
                occupant: Vec::new(),
            },
        ];
        for pool in &mut pools {
            pool.occupant = vec![None; pool.slots.len()];
        }

        let blocks: Vec<BlockId> = job.members.iter().cloned().collect();
        let mut pool_of = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let pool = match block.kind() {
                BlockKind::Compute => COMPUTE_POOL,
                BlockKind::Memory => MEMORY_POOL,
                BlockKind::Register if job.fold_registers => REGISTER_POOL,
                BlockKind::Register => COMPUTE_POOL,
                BlockKind::Io | BlockKind::Surrogate => {
                    return Err(PlaceError::InvalidBlock {
                        block: block.clone(),
                        reason: format!("{} blocks are not movable", block.kind()),
                    })
                }
            };
            pool_of.push(pool);
        }

        let mut next_free = [0usize; 3];
        let mut slot_of = Vec::with_capacity(blocks.len());
        for (index, &pool) in pool_of.iter().enumerate() {
            let slot = next_free[pool];
            let capacity = pools[pool].slots.len();
            if slot >= capacity {
                let required = pool_of.iter().filter(|&&p| p == pool).count();
                return Err(if pool == REGISTER_POOL {
                    PlaceError::InsufficientRegisterSlots {
                        required,
                        available: capacity,
                    }
                } else {
                    PlaceError::InsufficientCapacity {
                        cell: pools[pool].cell,
                        required,
                        available: capacity,
                    }
                });
            }
            pools[pool].occupant[slot] = Some(index);
            slot_of.push(slot);
            next_free[pool] += 1;
        }

        let index: BTreeMap<&BlockId, usize> =
            blocks.iter().enumerate().map(|(i, b)| (b, i)).collect();
        let mut nets = Vec::with_capacity(job.netlist.len());
        let mut block_nets = vec![Vec::new(); blocks.len()];
        for (net, members) in job.netlist.iter() {
            let mut nodes = Vec::with_capacity(members.len());
            for block in members {
                let node = match (index.get(block), job.fixed.get(block)) {
                    (Some(&i), _) => Node::Member(i),
                    (None, Some(&coord)) => Node::Fixed(coord),
                    (None, None) => {
                        return Err(PlaceError::UnresolvedBlock {
                            net: net.clone(),
                            block: block.clone(),
                        })
                    }
                };
                if let Node::Member(i) = node {
                    block_nets[i].push(nets.len());
                }
                nodes.push(node);
            }
            nets.push(nodes);
        }

        let mut placer = Self {
            cluster: job.cluster,
            blocks,
            pool_of,
            slot_of,
            pools,
            nets,
            block_nets,
            net_cost: Vec::new(),
            job: JobSettings {
                seed: job.seed,
                params: job.anneal,
            },
        };
        placer.net_cost = (0..placer.nets.len()).map(|n| placer.compute_net(n)).collect();
        Ok(placer)
    }

    fn position(&self, block: usize) -> Coord {
        self.pools[self.pool_of[block]].slots[self.slot_of[block]]
    }

    fn compute_net(&self, net: usize) -> u64 {
        hpwl(self.nets[net].iter().map(|node| match *node {
            Node::Member(i) => self.position(i),
            Node::Fixed(c) => c,
        }))
    }

    /// Returns the current total wirelength of the reduced netlist.
    pub fn cost(&self) -> u64 {
        self.net_cost.iter().sum()
    }

    /// Returns the current position of every member.
    pub fn placement(&self) -> Placement {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.clone(), self.position(i)))
            .collect()
    }

    fn propose(&self, rng: &mut StdRng) -> Option<Move> {
        if self.blocks.is_empty() {
            return None;
        }
        let block = rng.gen_range(0..self.blocks.len());
        let pool = &self.pools[self.pool_of[block]];
        if pool.slots.len() < 2 {
            return None;
        }
        let from = self.slot_of[block];
        let mut to = rng.gen_range(0..pool.slots.len() - 1);
        if to >= from {
            to += 1;
        }
        Some(Move {
            block,
            from,
            to,
            displaced: pool.occupant[to],
        })
    }

    fn apply(&mut self, m: Move) {
        let pool = &mut self.pools[self.pool_of[m.block]];
        pool.occupant[m.to] = Some(m.block);
        pool.occupant[m.from] = m.displaced;
        self.slot_of[m.block] = m.to;
        if let Some(other) = m.displaced {
            self.slot_of[other] = m.from;
        }
    }

    fn revert(&mut self, m: Move) {
        let pool = &mut self.pools[self.pool_of[m.block]];
        pool.occupant[m.from] = Some(m.block);
        pool.occupant[m.to] = m.displaced;
        self.slot_of[m.block] = m.from;
        if let Some(other) = m.displaced {
            self.slot_of[other] = m.to;
        }
    }

    /// Applies `m` and returns the cost change with the touched nets' new costs.
    fn evaluate(&mut self, m: Move) -> (f64, Vec<(usize, u64)>) {
        let mut touched: Vec<usize> = self.block_nets[m.block].clone();
        if let Some(other) = m.displaced {
            touched.extend_from_slice(&self.block_nets[other]);
        }
        touched.sort_unstable();
        touched.dedup();

        let before: u64 = touched.iter().map(|&n| self.net_cost[n]).sum();
        self.apply(m);
        let updated: Vec<(usize, u64)> =
            touched.iter().map(|&n| (n, self.compute_net(n))).collect();
        let after: u64 = updated.iter().map(|&(_, c)| c).sum();
        (after as f64 - before as f64, updated)
    }

    /// Runs the anneal for the job's step budget and returns the best placement seen.
    pub fn anneal(mut self) -> Placement {
        let mut rng = StdRng::seed_from_u64(self.job.seed);
        let params = self.job.params;

        let mut samples = Vec::with_capacity(TEMPERATURE_SAMPLES);
        for _ in 0..TEMPERATURE_SAMPLES.min(params.steps) {
            if let Some(m) = self.propose(&mut rng) {
                let (delta, _) = self.evaluate(m);
                samples.push(delta);
                self.revert(m);
            }
        }

        let mut schedule = Schedule::new(params, initial_temperature(&samples));
        let initial_cost = self.cost();
        let mut best_cost = initial_cost;
        let mut best = self.slot_of.clone();
        let mut accepted = 0usize;

        while schedule.advance() {
            let Some(m) = self.propose(&mut rng) else {
                continue;
            };
            let (delta, updated) = self.evaluate(m);
            if schedule.accept(delta, &mut rng) {
                for (n, c) in updated {
                    self.net_cost[n] = c;
                }
                accepted += 1;
                let cost = self.cost();
                if cost < best_cost {
                    best_cost = cost;
                    best = self.slot_of.clone();
                }
            } else {
                self.revert(m);
            }
        }

        tracing::debug!(
            cluster = %self.cluster,
            blocks = self.blocks.len(),
            steps = params.steps,
            accepted,
            initial_cost,
            best_cost,
            "detailed anneal finished"
        );

        self.slot_of = best;
        self.placement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Netlist;
    use std::collections::BTreeSet;
    use tessera_common::NetId;

    fn id(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn job(members: &[&str], compute: &[(u32, u32)], nets: &[(&str, &[&str])]) -> PlacementJob {
        PlacementJob {
            cluster: ClusterId::from_raw(0),
            members: members.iter().map(|s| id(s)).collect(),
            compute_cells: compute.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
            register_cells: compute.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
            memory_cells: BTreeSet::new(),
            netlist: nets
                .iter()
                .map(|(n, b)| (NetId::from(*n), b.iter().map(|s| id(s)).collect()))
                .collect::<Netlist>(),
            fixed: Placement::new(),
            fold_registers: true,
            seed: 11,
            anneal: AnnealParams {
                steps: 2000,
                cooling_rate: 0.95,
                moves_per_temperature: 50,
            },
        }
    }

    #[test]
    fn initial_deal_is_sorted() {
        let j = job(&["p2", "p0", "p1"], &[(5, 5), (1, 0), (0, 1)], &[]);
        let placer = DetailedPlacer::new(&j).unwrap();
        let placement = placer.placement();
        assert_eq!(placement[&id("p0")], Coord::new(1, 0));
        assert_eq!(placement[&id("p1")], Coord::new(0, 1));
        assert_eq!(placement[&id("p2")], Coord::new(5, 5));
    }

    #[test]
    fn three_blocks_in_two_by_two() {
        let j = job(
            &["p0", "p1", "p2"],
            &[(0, 0), (1, 0), (0, 1), (1, 1)],
            &[("n0", &["p0", "p1", "p2"])],
        );
        let placement = DetailedPlacer::new(&j).unwrap().anneal();
        let cells: BTreeSet<Coord> = placement.values().copied().collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(hpwl(placement.values().copied()), 2);
    }

    #[test]
    fn anneal_never_worsens_the_start() {
        let cells: Vec<(u32, u32)> = (0..6).flat_map(|y| (0..6).map(move |x| (x, y))).collect();
        let members: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
        let member_refs: Vec<&str> = members.iter().map(String::as_str).collect();
        let chain: Vec<(String, Vec<&str>)> = (0..11)
            .map(|i| (format!("e{i}"), vec![member_refs[i], member_refs[i + 1]]))
            .collect();
        let nets: Vec<(&str, &[&str])> = chain
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_slice()))
            .collect();
        let j = job(&member_refs, &cells, &nets);
        let placer = DetailedPlacer::new(&j).unwrap();
        let start = placer.cost();
        let result = placer.anneal();
        let end = hpwl_total(&j, &result);
        assert!(end <= start);
    }

    fn hpwl_total(j: &PlacementJob, placement: &Placement) -> u64 {
        crate::cost::total_wirelength(&j.netlist, placement)
    }

    #[test]
    fn folded_registers_share_cells() {
        let j = job(&["p0", "r0"], &[(0, 0)], &[("n0", &["p0", "r0"])]);
        let placement = DetailedPlacer::new(&j).unwrap().anneal();
        assert_eq!(placement[&id("p0")], placement[&id("r0")]);
    }

    #[test]
    fn registers_use_only_reserved_register_slots() {
        let mut j = job(&["p0", "r0"], &[(0, 0), (1, 0)], &[("n0", &["p0", "r0"])]);
        j.compute_cells = [Coord::new(0, 0)].into_iter().collect();
        j.register_cells = [Coord::new(1, 0)].into_iter().collect();
        let placement = DetailedPlacer::new(&j).unwrap().anneal();
        assert_eq!(placement[&id("p0")], Coord::new(0, 0));
        assert_eq!(placement[&id("r0")], Coord::new(1, 0));

        j.register_cells.clear();
        assert!(matches!(
            DetailedPlacer::new(&j),
            Err(PlaceError::InsufficientRegisterSlots {
                required: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn unfolded_registers_need_their_own_cell() {
        let mut j = job(&["p0", "r0"], &[(0, 0)], &[]);
        j.fold_registers = false;
        let err = DetailedPlacer::new(&j).unwrap_err();
        assert!(matches!(
            err,
            PlaceError::InsufficientCapacity {
                required: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn fixed_points_pull_blocks() {
        let mut j = job(&["p0"], &[(0, 0), (9, 9)], &[("n0", &["p0", "x1"])]);
        j.fixed.insert(id("x1"), Coord::new(9, 8));
        let placement = DetailedPlacer::new(&j).unwrap().anneal();
        assert_eq!(placement[&id("p0")], Coord::new(9, 9));
    }

    #[test]
    fn unresolved_net_block_errors() {
        let j = job(&["p0"], &[(0, 0)], &[("n0", &["p0", "x3"])]);
        let err = DetailedPlacer::new(&j).unwrap_err();
        assert!(matches!(err, PlaceError::UnresolvedBlock { .. }));
    }

    #[test]
    fn same_seed_same_result() {
        let cells: Vec<(u32, u32)> = (0..4).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        let j = job(
            &["p0", "p1", "p2", "p3", "p4"],
            &cells,
            &[("n0", &["p0", "p3"]), ("n1", &["p1", "p4", "p2"])],
        );
        let a = DetailedPlacer::new(&j).unwrap().anneal();
        let b = DetailedPlacer::new(&j).unwrap().anneal();
        assert_eq!(a, b);
    }
}
