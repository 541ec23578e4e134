//! Board file loading.
//!
//! A board file is five header lines followed by the grid:
//!
//! ```text
//! Desert Duel
//! MaxSteps = 500
//! NumShells = 16
//! Rows = 4
//! Cols = 10
//! #   @    #
//!   2   #
//!    ##    1
//! @        #
//! ```
//!
//! Spaces around `=` are optional. Rows and columns must be positive.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tanks_core::board::{BoardLayout, GameBoard, LayoutOptions};
use tanks_core::error::GameError;
use thiserror::Error;

/// Number of header lines before the grid.
const HEADER_LINES: usize = 5;

/// Error type for board file operations.
#[derive(Error, Debug)]
pub enum MapError {
    /// File not found.
    #[error("Board file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read board file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Fewer lines than the header needs.
    #[error("Board file must have at least {HEADER_LINES} header lines, found {0}")]
    MissingHeader(usize),
    /// A header line is malformed.
    #[error("Invalid or missing {key} line: '{line}'")]
    InvalidHeader {
        /// Expected key.
        key: &'static str,
        /// Offending line.
        line: String,
    },
    /// The grid could not be turned into a board.
    #[error("Invalid board: {0}")]
    Board(#[from] GameError),
}

/// A parsed board file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFile {
    /// Map name with spaces replaced by underscores.
    pub name: String,
    /// Step limit.
    pub max_steps: usize,
    /// Shells per tank.
    pub num_shells: u32,
    /// Grid height.
    pub rows: usize,
    /// Grid width.
    pub cols: usize,
    /// Grid lines as found in the file.
    pub grid: Vec<String>,
}

impl MapFile {
    /// Load a board file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MapError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let map = Self::parse(&contents)?;
        tracing::debug!(
            path = %path.display(),
            name = %map.name,
            rows = map.rows,
            cols = map.cols,
            "Loaded board file"
        );
        Ok(map)
    }

    /// Parse board file contents.
    pub fn parse(contents: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() < HEADER_LINES {
            return Err(MapError::MissingHeader(lines.len()));
        }

        let name = lines[0].trim_end_matches('\r').replace(' ', "_");
        let max_steps = header_value(lines[1], "MaxSteps")?;
        let num_shells = header_value(lines[2], "NumShells")?;
        let rows = header_value(lines[3], "Rows")?;
        let cols = header_value(lines[4], "Cols")?;
        if rows == 0 {
            return Err(invalid("Rows", lines[3]));
        }
        if cols == 0 {
            return Err(invalid("Cols", lines[4]));
        }

        let grid = lines[HEADER_LINES..]
            .iter()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();

        Ok(Self {
            name,
            max_steps,
            num_shells: u32::try_from(num_shells).map_err(|_| invalid("NumShells", lines[2]))?,
            rows,
            cols,
            grid,
        })
    }

    /// Turn the grid into a board and tank start positions.
    pub fn layout(&self, options: &LayoutOptions) -> Result<BoardLayout, MapError> {
        Ok(GameBoard::from_lines(
            self.cols,
            self.rows,
            self.grid.as_slice(),
            options,
        )?)
    }
}

fn invalid(key: &'static str, line: &str) -> MapError {
    MapError::InvalidHeader {
        key,
        line: line.to_string(),
    }
}

/// Parse a `Key = value` header line holding a non-negative integer.
fn header_value(line: &str, key: &'static str) -> Result<usize, MapError> {
    let (left, right) = line.split_once('=').ok_or_else(|| invalid(key, line))?;
    if left.trim() != key {
        return Err(invalid(key, line));
    }
    right.trim().parse().map_err(|_| invalid(key, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = "Desert Duel\nMaxSteps = 500\nNumShells=16\nRows = 2\nCols = 5\n1 #  \n  @ 2\n";

    #[test]
    fn test_parse_header_and_grid() {
        let map = MapFile::parse(DUEL).unwrap();
        assert_eq!(map.name, "Desert_Duel");
        assert_eq!(map.max_steps, 500);
        assert_eq!(map.num_shells, 16);
        assert_eq!((map.rows, map.cols), (2, 5));
        assert_eq!(map.grid, vec!["1 #  ", "  @ 2"]);
    }

    #[test]
    fn test_layout() {
        let map = MapFile::parse(DUEL).unwrap();
        let layout = map.layout(&LayoutOptions::default()).unwrap();
        assert_eq!(layout.tank_positions.len(), 2);
        assert!(layout.warnings.is_empty());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let text = "m\nMaxStep = 5\nNumShells = 1\nRows = 1\nCols = 1\n";
        assert!(matches!(
            MapFile::parse(text),
            Err(MapError::InvalidHeader { key: "MaxSteps", .. })
        ));
    }

    #[test]
    fn test_negative_and_zero_values_rejected() {
        let negative = "m\nMaxSteps = -5\nNumShells = 1\nRows = 1\nCols = 1\n";
        assert!(MapFile::parse(negative).is_err());
        let zero_rows = "m\nMaxSteps = 5\nNumShells = 1\nRows = 0\nCols = 1\n";
        assert!(matches!(
            MapFile::parse(zero_rows),
            Err(MapError::InvalidHeader { key: "Rows", .. })
        ));
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(matches!(
            MapFile::parse("name\nMaxSteps = 1\n"),
            Err(MapError::MissingHeader(2))
        ));
    }

    #[test]
    fn test_missing_tank_surfaces_as_board_error() {
        let text = "m\nMaxSteps = 5\nNumShells = 1\nRows = 1\nCols = 3\n1  \n";
        let map = MapFile::parse(text).unwrap();
        assert!(matches!(
            map.layout(&LayoutOptions::default()),
            Err(MapError::Board(GameError::MissingTank(2)))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            MapFile::load("/definitely/not/here.txt"),
            Err(MapError::FileNotFound(_))
        ));
    }
}
