//! Client cell selection.

use serde::{Deserialize, Serialize};

/// Selected range as reported by the client grid.
///
/// `row`/`last_row` are positions in the sorted view. `col` is stored as a
/// declared column index once decoded; `last_col` is kept verbatim as sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub row: usize,
    pub col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl Selection {
    pub fn new(row: usize, col: usize, last_row: usize, last_col: usize) -> Self {
        Self { row, col, last_row, last_col }
    }

    /// Single-cell selection?
    pub fn is_single(&self) -> bool {
        self.row == self.last_row && self.col == self.last_col
    }
}
