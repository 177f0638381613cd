//! Cluster centroids.

use std::collections::BTreeSet;
use tessera_common::Coord;

/// Returns the integer mean of a set of cells, rounded down.
///
/// Returns `None` for an empty set.
pub fn centroid(cells: &BTreeSet<Coord>) -> Option<Coord> {
    if cells.is_empty() {
        return None;
    }
    let n = cells.len() as u64;
    let (sx, sy) = cells
        .iter()
        .fold((0u64, 0u64), |(sx, sy), c| (sx + c.x as u64, sy + c.y as u64));
    Some(Coord::new((sx / n) as u32, (sy / n) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_rounds_down() {
        let cells: BTreeSet<Coord> = [Coord::new(1, 1), Coord::new(2, 1), Coord::new(2, 2)]
            .into_iter()
            .collect();
        assert_eq!(centroid(&cells), Some(Coord::new(1, 1)));
    }

    #[test]
    fn single_and_empty() {
        let one: BTreeSet<Coord> = [Coord::new(5, 3)].into_iter().collect();
        assert_eq!(centroid(&one), Some(Coord::new(5, 3)));
        assert_eq!(centroid(&BTreeSet::new()), None);
    }
}
