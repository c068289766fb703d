//! Positions in the engine's input.

use yaml_rust2::scanner::Marker;

/// A position in the decoded input. All fields are 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark {
    /// Character index from the start of the input
    pub index: usize,
    /// Line number (0-based)
    pub line: usize,
    /// Column number (0-based, in characters)
    pub column: usize,
}

impl Mark {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

impl From<&Marker> for Mark {
    fn from(marker: &Marker) -> Self {
        // yaml-rust2 counts lines from 1 and columns from 0.
        Self {
            index: marker.index(),
            line: marker.line().saturating_sub(1),
            column: marker.col(),
        }
    }
}

impl From<Marker> for Mark {
    fn from(marker: Marker) -> Self {
        Mark::from(&marker)
    }
}
