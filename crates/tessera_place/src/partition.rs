//! Cluster partitions of the movable blocks.

use crate::error::PlaceError;
use std::collections::{BTreeMap, BTreeSet};
use tessera_common::{BlockId, ClusterId};

/// Assignment of movable blocks to clusters.
///
/// Each block belongs to at most one cluster; [`Partition::verify`] checks
/// that clusters and pinned blocks together cover the design exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    clusters: BTreeMap<ClusterId, BTreeSet<BlockId>>,
    owner: BTreeMap<BlockId, ClusterId>,
}

impl Partition {
    /// Builds a partition, rejecting empty clusters and blocks listed twice.
    pub fn new(clusters: BTreeMap<ClusterId, BTreeSet<BlockId>>) -> Result<Self, PlaceError> {
        let mut owner = BTreeMap::new();
        for (&cluster, members) in &clusters {
            if members.is_empty() {
                return Err(PlaceError::MalformedPartition(format!(
                    "cluster {cluster} is empty"
                )));
            }
            for block in members {
                if let Some(previous) = owner.insert(block.clone(), cluster) {
                    return Err(PlaceError::MalformedPartition(format!(
                        "block {block} is in clusters {previous} and {cluster}"
                    )));
                }
            }
        }
        Ok(Self { clusters, owner })
    }

    /// A single pseudo-cluster `0` holding every given block.
    pub fn flat(blocks: impl IntoIterator<Item = BlockId>) -> Self {
        let members: BTreeSet<BlockId> = blocks.into_iter().collect();
        let cluster = ClusterId::from_raw(0);
        let owner = members.iter().map(|b| (b.clone(), cluster)).collect();
        let mut clusters = BTreeMap::new();
        if !members.is_empty() {
            clusters.insert(cluster, members);
        }
        Self { clusters, owner }
    }

    /// Returns the cluster a block belongs to.
    pub fn cluster_of(&self, block: &BlockId) -> Option<ClusterId> {
        self.owner.get(block).copied()
    }

    /// Returns the members of one cluster.
    pub fn members(&self, cluster: ClusterId) -> Option<&BTreeSet<BlockId>> {
        self.clusters.get(&cluster)
    }

    /// Iterates over clusters in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &BTreeSet<BlockId>)> {
        self.clusters.iter().map(|(&id, members)| (id, members))
    }

    /// Returns the cluster ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters.keys().copied()
    }

    /// Returns the number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns `true` if there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Checks that clusters and pinned blocks partition `all` with no overlap.
    pub fn verify(
        &self,
        all: &BTreeSet<BlockId>,
        pinned: &BTreeSet<BlockId>,
    ) -> Result<(), PlaceError> {
        for block in self.owner.keys() {
            if pinned.contains(block) {
                return Err(PlaceError::MalformedPartition(format!(
                    "block {block} is both pinned and clustered"
                )));
            }
            if !all.contains(block) {
                return Err(PlaceError::MalformedPartition(format!(
                    "clustered block {block} is not in the design"
                )));
            }
        }
        for block in all {
            if !pinned.contains(block) && !self.owner.contains_key(block) {
                return Err(PlaceError::MalformedPartition(format!(
                    "block {block} is neither pinned nor clustered"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<BlockId> {
        ids.iter().map(|s| id(s)).collect()
    }

    fn two_clusters() -> Partition {
        let mut clusters = BTreeMap::new();
        clusters.insert(ClusterId::from_raw(0), set(&["p0", "p1"]));
        clusters.insert(ClusterId::from_raw(1), set(&["p2", "m0"]));
        Partition::new(clusters).unwrap()
    }

    #[test]
    fn lookup() {
        let p = two_clusters();
        assert_eq!(p.len(), 2);
        assert_eq!(p.cluster_of(&id("m0")), Some(ClusterId::from_raw(1)));
        assert_eq!(p.cluster_of(&id("i0")), None);
    }

    #[test]
    fn rejects_overlap() {
        let mut clusters = BTreeMap::new();
        clusters.insert(ClusterId::from_raw(0), set(&["p0"]));
        clusters.insert(ClusterId::from_raw(1), set(&["p0"]));
        assert!(matches!(
            Partition::new(clusters),
            Err(PlaceError::MalformedPartition(_))
        ));
    }

    #[test]
    fn flat_partition() {
        let p = Partition::flat(set(&["p0", "p1", "m0"]));
        assert_eq!(p.len(), 1);
        assert_eq!(p.members(ClusterId::from_raw(0)).unwrap().len(), 3);
        assert!(Partition::flat(Vec::new()).is_empty());
    }

    #[test]
    fn verify_partition_invariant() {
        let p = two_clusters();
        let pinned = set(&["i0"]);
        p.verify(&set(&["p0", "p1", "p2", "m0", "i0"]), &pinned).unwrap();
        assert!(p.verify(&set(&["p0", "p1", "p2", "m0", "i0", "p3"]), &pinned).is_err());
        assert!(p.verify(&set(&["p0", "p1", "p2", "m0"]), &set(&["p0"])).is_err());
    }
}
