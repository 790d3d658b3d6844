//! Decoded client request, as handed to [`Sheet::decode`](crate::Sheet::decode).
//!
//! Column indices here are *visible* indices; the sheet maps them to
//! declared indices itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gridsheet_core::CellValue;

/// One `[row, col, oldValue, newValue]` delta entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDelta {
    /// Sorted row position.
    pub row: usize,
    /// Visible column index.
    pub col: usize,
    pub old_value: CellValue,
    pub new_value: String,
}

/// `[row, col, lastRow, lastCol]` plus the raw JSON echoed back on render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub row: usize,
    /// Visible column index.
    pub col: usize,
    pub last_row: usize,
    pub last_col: usize,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetInput {
    pub deltas: Vec<CellDelta>,
    pub selection: Option<SelectionInput>,
    pub focus: Option<String>,
    /// Visible index of the clicked sort column; negative means none.
    pub sort_by: Option<i64>,
    pub sort_order: Option<String>,
    /// Filter text by visible column index.
    pub filters: BTreeMap<usize, String>,
    pub behavior_event: Option<String>,
    pub behavior_source: Option<String>,
    /// Partial (AJAX) request.
    pub partial: bool,
}
