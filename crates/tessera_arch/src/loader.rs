//! Architecture file loading.
//!
//! The architecture file is TOML with a single `[board]` table:
//!
//! ```toml
//! [board]
//! name = "cgra4x4"
//! layout = [
//!     "iiii",
//!     "ipmi",
//!     "ippi",
//!     "iiii",
//! ]
//! ```

use crate::board::Board;
use crate::error::ArchError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArchFile {
    board: BoardSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoardSection {
    name: String,
    layout: Vec<String>,
}

/// Reads an architecture file and builds its board.
pub fn load_board(path: &Path) -> Result<Board, ArchError> {
    let content = std::fs::read_to_string(path)?;
    load_board_from_str(&content)
}

/// Parses an architecture description and builds its board.
pub fn load_board_from_str(content: &str) -> Result<Board, ArchError> {
    let file: ArchFile =
        toml::from_str(content).map_err(|e| ArchError::ParseError(e.to_string()))?;
    Board::from_layout(&file.board.name, &file.board.layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;

    const ARCH: &str = r#"
[board]
name = "cgra4x4"
layout = [
    "iiii",
    "ipmi",
    "ippi",
    "iiii",
]
"#;

    #[test]
    fn parse_board() {
        let board = load_board_from_str(ARCH).unwrap();
        assert_eq!(board.name(), "cgra4x4");
        assert_eq!(board.count(CellType::Compute), 3);
        assert_eq!(board.count(CellType::Io), 12);
    }

    #[test]
    fn missing_board_table() {
        let err = load_board_from_str("[chip]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, ArchError::ParseError(_)));
    }

    #[test]
    fn layout_errors_propagate() {
        let err = load_board_from_str("[board]\nname = \"x\"\nlayout = [\"pz\"]\n").unwrap_err();
        assert!(matches!(err, ArchError::UnknownCell { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arch.toml");
        std::fs::write(&path, ARCH).unwrap();
        let board = load_board(&path).unwrap();
        assert_eq!(board.width(), 4);
    }
}
