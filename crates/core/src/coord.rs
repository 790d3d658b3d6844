//! Cell identity for the edit buffer.

use serde::{Deserialize, Serialize};

use crate::row_key::RowKey;

/// One editable cell: row identity plus *declared* column index.
///
/// The declared index is the column's position among all columns, not
/// among the currently rendered ones, so a coordinate survives columns
/// being hidden or shown between requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub row_key: RowKey,
    pub col: usize,
}

impl CellCoord {
    #[inline]
    pub fn new(row_key: RowKey, col: usize) -> Self {
        Self { row_key, col }
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.row_key, self.col)
    }
}
