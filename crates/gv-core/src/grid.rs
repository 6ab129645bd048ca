//! Bounded grid locations and their compact display labels.
//!
//! The schematic lives on a fixed grid of at most 52x52 cells. A location is
//! displayed as a two-character label, one letter per axis: `a`-`z` for
//! indices 0-25 and `A`-`Z` for 26-51. Column letter first, then row.

use crate::error::{GvError, GvResult};
use core::fmt;

/// Maximum number of columns or rows on the grid.
pub const GRID_AXIS_MAX: u8 = 52;

/// An (x, y) cell address on the schematic grid. Pure identity: owns no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridLocation {
    col: u8,
    row: u8,
}

impl GridLocation {
    pub fn new(col: u8, row: u8) -> GvResult<Self> {
        if col >= GRID_AXIS_MAX || row >= GRID_AXIS_MAX {
            return Err(GvError::InvalidArg {
                what: "grid location outside the 52x52 bound",
            });
        }
        Ok(Self { col, row })
    }

    pub fn col(self) -> u8 {
        self.col
    }

    pub fn row(self) -> u8 {
        self.row
    }

    /// Flat cell index for a grid with `cols` columns.
    pub fn cell_index(self, cols: u8) -> usize {
        self.row as usize * cols as usize + self.col as usize
    }

    /// Two-character label, column letter then row letter.
    pub fn label(self) -> String {
        let mut s = String::with_capacity(2);
        s.push(axis_char(self.col));
        s.push(axis_char(self.row));
        s
    }

    /// Parse a two-character label back into a location.
    pub fn parse_label(label: &str) -> GvResult<Self> {
        let mut chars = label.chars();
        let (Some(c), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(GvError::InvalidArg {
                what: "grid label must be exactly two characters",
            });
        };
        let col = axis_index(c).ok_or(GvError::InvalidArg {
            what: "grid label column is not a letter",
        })?;
        let row = axis_index(r).ok_or(GvError::InvalidArg {
            what: "grid label row is not a letter",
        })?;
        Self::new(col, row)
    }
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn axis_char(i: u8) -> char {
    debug_assert!(i < GRID_AXIS_MAX);
    if i < 26 {
        (b'a' + i) as char
    } else {
        (b'A' + (i - 26)) as char
    }
}

fn axis_index(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a'),
        'A'..='Z' => Some(c as u8 - b'A' + 26),
        _ => None,
    }
}
