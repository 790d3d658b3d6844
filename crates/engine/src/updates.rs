//! Records produced by a validate/commit cycle.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use gridsheet_core::{CellValue, RowKey};

/// One committed cell change.
///
/// Equality and hashing use the position only (`row_index`, `col_index`).
#[derive(Debug, Clone, Serialize)]
pub struct SheetUpdate<R> {
    /// Sorted position of the row when the change was committed.
    pub row_index: usize,
    pub row_key: RowKey,
    /// Declared column index.
    pub col_index: usize,
    /// The row after the write.
    pub row_data: R,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

impl<R> PartialEq for SheetUpdate<R> {
    fn eq(&self, other: &Self) -> bool {
        self.row_index == other.row_index && self.col_index == other.col_index
    }
}

impl<R> Eq for SheetUpdate<R> {}

impl<R> Hash for SheetUpdate<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.row_index.hash(state);
        self.col_index.hash(state);
    }
}

/// One failed conversion, required check or validator.
///
/// Equality uses the cell (`row_key`, `col_index`) only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadUpdate {
    pub row_key: RowKey,
    /// Declared column index.
    pub col_index: usize,
    pub column_header: Option<String>,
    /// Offending value (the raw text when conversion failed).
    #[serde(with = "gridsheet_core::value::tagged")]
    pub value: CellValue,
    pub message: String,
}

impl PartialEq for BadUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.row_key == other.row_key && self.col_index == other.col_index
    }
}

impl Eq for BadUpdate {}

impl Hash for BadUpdate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.row_key.hash(state);
        self.col_index.hash(state);
    }
}
