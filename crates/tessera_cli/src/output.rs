//! Placement file writer.

use crate::inputs::PackedNetlist;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tessera_arch::Board;
use tessera_common::{BlockId, Coord};
use tessera_place::Placement;

/// Renders a placement file.
///
/// After a header naming the inputs and a line with the array size, every
/// block gets one `name x y #id` row, sorted by block id. Folded registers
/// are written at their host's coordinate.
pub fn render_placement(
    placement: &Placement,
    packed: &PackedNetlist,
    board: &Board,
    inputs: &str,
) -> Result<String, Box<dyn Error>> {
    let mut rows: BTreeMap<&BlockId, Coord> = placement.iter().map(|(b, &c)| (b, c)).collect();
    for (register, host) in &packed.folded {
        let coord = placement
            .get(host)
            .ok_or_else(|| format!("folded register {register} has unplaced host {host}"))?;
        rows.insert(register, *coord);
    }

    let mut out = String::new();
    writeln!(out, "Netlists: {inputs}")?;
    writeln!(out, "Array size: {} x {}", board.width(), board.height())?;
    writeln!(out)?;
    writeln!(out, "Block Name\tX\tY\t#Block ID")?;
    writeln!(out, "---------------------------")?;
    for (block, coord) in rows {
        let name = packed
            .id_to_name
            .get(block)
            .map_or(block.as_str(), String::as_str);
        writeln!(out, "{name}\t{}\t{}\t#{block}", coord.x, coord.y)?;
    }
    Ok(out)
}

/// Writes a placement file to `path`.
pub fn write_placement(
    path: &Path,
    placement: &Placement,
    packed: &PackedNetlist,
    board: &Board,
    inputs: &str,
) -> Result<(), Box<dyn Error>> {
    let text = render_placement(placement, packed, board, inputs)?;
    std::fs::write(path, text)
        .map_err(|e| format!("cannot write placement {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn board() -> Board {
        Board::from_layout("b", &["iiii", "ippi", "ipmi", "iiii"]).unwrap()
    }

    fn placement() -> Placement {
        [
            (id("p1"), Coord::new(2, 1)),
            (id("i0"), Coord::new(0, 1)),
            (id("p0"), Coord::new(1, 1)),
            (id("m0"), Coord::new(2, 2)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn rows_sorted_by_id_with_names() {
        let mut packed = PackedNetlist::default();
        packed.id_to_name.insert(id("p0"), "add_1".to_string());
        let text = render_placement(&placement(), &packed, &board(), "d.json d.emb").unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Netlists: d.json d.emb");
        assert_eq!(lines[1], "Array size: 4 x 4");
        assert_eq!(
            &lines[5..],
            &["i0\t0\t1\t#i0", "m0\t2\t2\t#m0", "add_1\t1\t1\t#p0", "p1\t2\t1\t#p1"]
        );
    }

    #[test]
    fn folded_register_written_at_host() {
        let mut packed = PackedNetlist::default();
        packed.folded.insert(id("r5"), id("p1"));
        let text = render_placement(&placement(), &packed, &board(), "x").unwrap();
        assert!(text.lines().any(|l| l == "r5\t2\t1\t#r5"));
    }

    #[test]
    fn folded_register_with_unplaced_host_fails() {
        let mut packed = PackedNetlist::default();
        packed.folded.insert(id("r5"), id("p9"));
        assert!(render_placement(&placement(), &packed, &board(), "x").is_err());
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.place");
        write_placement(&path, &placement(), &PackedNetlist::default(), &board(), "x").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 9);
    }
}
