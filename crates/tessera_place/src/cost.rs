//! Wirelength cost functions.
//!
//! Both placement levels minimize half-perimeter wirelength (HPWL): the
//! half-perimeter of the bounding box of every node on a net.

use crate::netlist::{Netlist, Placement};
use tessera_common::Coord;

/// Computes the HPWL of a set of integer cell coordinates.
///
/// Returns 0 for fewer than two points.
pub fn hpwl(points: impl IntoIterator<Item = Coord>) -> u64 {
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return 0;
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for c in iter {
        min_x = min_x.min(c.x);
        max_x = max_x.max(c.x);
        min_y = min_y.min(c.y);
        max_y = max_y.max(c.y);
    }
    (max_x - min_x) as u64 + (max_y - min_y) as u64
}

/// Computes the HPWL of a set of continuous positions.
pub fn hpwl_f64(points: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_x > max_x {
        return 0.0;
    }
    (max_x - min_x) + (max_y - min_y)
}

/// Computes the total HPWL of a netlist under a placement.
///
/// Blocks missing from the placement are left out of their net's box.
pub fn total_wirelength(netlist: &Netlist, placement: &Placement) -> u64 {
    netlist
        .iter()
        .map(|(_, blocks)| hpwl(blocks.iter().filter_map(|b| placement.get(b).copied())))
        .sum()
}
