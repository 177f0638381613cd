//! Netlist reduction onto one cluster.
//!
//! A reduced netlist keeps only the nets that touch the target cluster and
//! replaces every block outside it with the surrogate node of its owning
//! cluster, so a detailed anneal can evaluate wirelength without knowing the
//! rest of the design. Under [`ReduceTarget::CondenseAll`] every cluster
//! becomes a surrogate, which is the graph the coarse placer anneals over.

use crate::error::PlaceError;
use crate::netlist::{Netlist, Placement};
use crate::partition::Partition;
use tessera_common::{BlockId, ClusterId};

/// Which cluster a reduction is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceTarget {
    /// Keep this cluster's blocks, condense every other cluster.
    Cluster(ClusterId),
    /// Condense every cluster, the target included.
    CondenseAll,
}

/// Reduces `netlist` onto `target`.
///
/// Fixed blocks keep their identity. A block that is neither fixed nor owned
/// by any cluster is an [`UnresolvedBlock`](PlaceError::UnresolvedBlock)
/// error: the partition is malformed.
pub fn reduce_netlist(
    netlist: &Netlist,
    partition: &Partition,
    fixed: &Placement,
    target: ReduceTarget,
) -> Result<Netlist, PlaceError> {
    let mut reduced = Netlist::new();
    for (net, blocks) in netlist.iter() {
        let touches_target = blocks.iter().any(|b| match target {
            ReduceTarget::Cluster(t) => partition.cluster_of(b) == Some(t),
            ReduceTarget::CondenseAll => partition.cluster_of(b).is_some(),
        });
        if !touches_target {
            continue;
        }

        let mut nodes: Vec<BlockId> = Vec::with_capacity(blocks.len());
        for block in blocks {
            let owner = partition.cluster_of(block);
            let node = match (owner, target) {
                (Some(c), ReduceTarget::Cluster(t)) if c == t => block.clone(),
                (Some(c), _) => BlockId::surrogate(c),
                (None, _) if fixed.contains_key(block) => block.clone(),
                (None, _) => {
                    return Err(PlaceError::UnresolvedBlock {
                        net: net.clone(),
                        block: block.clone(),
                    })
                }
            };
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        if target == ReduceTarget::CondenseAll && nodes.len() < 2 {
            continue;
        }
        reduced.insert(net.clone(), nodes);
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use tessera_common::{Coord, NetId};

    fn id(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn partition(groups: &[&[&str]]) -> Partition {
        let clusters = groups
            .iter()
            .enumerate()
            .map(|(i, g)| {
                (
                    ClusterId::from_raw(i as u32),
                    g.iter().map(|s| id(s)).collect::<BTreeSet<_>>(),
                )
            })
            .collect();
        Partition::new(clusters).unwrap()
    }

    fn netlist(nets: &[(&str, &[&str])]) -> Netlist {
        nets.iter()
            .map(|(n, blocks)| (NetId::from(*n), blocks.iter().map(|s| id(s)).collect()))
            .collect()
    }

    #[test]
    fn keeps_target_and_condenses_others() {
        let nl = netlist(&[("n1", &["p0", "p1", "p2"])]);
        let part = partition(&[&["p0", "p1"], &["p2"]]);
        let reduced = reduce_netlist(
            &nl,
            &part,
            &Placement::new(),
            ReduceTarget::Cluster(ClusterId::from_raw(0)),
        )
        .unwrap();
        assert_eq!(
            reduced.get(&NetId::from("n1")).unwrap(),
            &[id("p0"), id("p1"), id("x1")]
        );
    }

    #[test]
    fn drops_nets_outside_target() {
        let nl = netlist(&[("n1", &["p0", "p1"]), ("n2", &["p2", "i0"])]);
        let part = partition(&[&["p0", "p1"], &["p2"]]);
        let mut fixed = BTreeMap::new();
        fixed.insert(id("i0"), Coord::new(0, 0));
        let reduced = reduce_netlist(
            &nl,
            &part,
            &fixed,
            ReduceTarget::Cluster(ClusterId::from_raw(0)),
        )
        .unwrap();
        assert_eq!(reduced.len(), 1);
        assert!(reduced.get(&NetId::from("n2")).is_none());
    }

    #[test]
    fn fixed_blocks_keep_identity() {
        let nl = netlist(&[("n1", &["i0", "p0", "p2", "p3"])]);
        let part = partition(&[&["p0"], &["p2", "p3"]]);
        let mut fixed = BTreeMap::new();
        fixed.insert(id("i0"), Coord::new(0, 0));
        let reduced = reduce_netlist(
            &nl,
            &part,
            &fixed,
            ReduceTarget::Cluster(ClusterId::from_raw(0)),
        )
        .unwrap();
        assert_eq!(
            reduced.get(&NetId::from("n1")).unwrap(),
            &[id("i0"), id("p0"), id("x1")]
        );
    }

    #[test]
    fn condense_all() {
        let nl = netlist(&[
            ("n1", &["p0", "p1", "p2"]),
            ("n2", &["p0", "p1"]),
            ("n3", &["i0", "p2"]),
            ("n4", &["i0", "i1"]),
        ]);
        let part = partition(&[&["p0", "p1"], &["p2"]]);
        let mut fixed = BTreeMap::new();
        fixed.insert(id("i0"), Coord::new(0, 0));
        fixed.insert(id("i1"), Coord::new(1, 0));
        let reduced =
            reduce_netlist(&nl, &part, &fixed, ReduceTarget::CondenseAll).unwrap();
        assert_eq!(reduced.get(&NetId::from("n1")).unwrap(), &[id("x0"), id("x1")]);
        // n2 collapses to a single node and n4 touches no cluster.
        assert!(reduced.get(&NetId::from("n2")).is_none());
        assert!(reduced.get(&NetId::from("n4")).is_none());
        assert_eq!(reduced.get(&NetId::from("n3")).unwrap(), &[id("i0"), id("x1")]);
    }

    #[test]
    fn unresolved_block_is_an_error() {
        let nl = netlist(&[("n1", &["p0", "p7"])]);
        let part = partition(&[&["p0"]]);
        let err = reduce_netlist(
            &nl,
            &part,
            &Placement::new(),
            ReduceTarget::Cluster(ClusterId::from_raw(0)),
        )
        .unwrap_err();
        assert!(matches!(err, PlaceError::UnresolvedBlock { block, .. } if block == id("p7")));
    }

    #[test]
    fn reduction_is_idempotent() {
        let nl = netlist(&[("n1", &["p0", "p1", "p2"]), ("n2", &["p1", "p2"])]);
        let part = partition(&[&["p0", "p1"], &["p2"]]);
        let target = ReduceTarget::Cluster(ClusterId::from_raw(1));
        let first = reduce_netlist(&nl, &part, &Placement::new(), target).unwrap();
        let second = reduce_netlist(&nl, &part, &Placement::new(), target).unwrap();
        assert_eq!(first, second);
    }
}
