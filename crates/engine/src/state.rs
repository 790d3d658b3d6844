//! Sheet state carried across requests.
//!
//! Maps keyed by a composite key are stored as lists of pairs so the
//! snapshot encodes to JSON. A `None` piece restores to empty (or unset).

use serde::{Deserialize, Serialize};

use gridsheet_core::{CellCoord, CellValue, RowKey, Selection};

use crate::column::ColumnMapping;
use crate::expr::{Expression, Row};
use crate::filter::SortOrder;
use crate::row_map::{RowMap, RowMapEntry};
use crate::sheet::{Sheet, SheetPhase};
use crate::updates::BadUpdate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetState {
    pub submitted: Option<Vec<(CellCoord, String)>>,
    pub local: Option<Vec<LocalEntry>>,
    pub bad_updates: Option<Vec<BadUpdate>>,
    pub column_mapping: Option<ColumnMapping>,
    /// Source indices of the sorted view.
    pub sorted: Option<Vec<usize>>,
    pub row_map: Option<Vec<(RowKey, RowMapEntry)>>,
    pub valid: bool,
    pub local_value_set: bool,
    pub sort_by: Option<Expression>,
    pub sort_order: SortOrder,
    pub orig_sort_by: Option<SortSnapshot>,
    pub orig_sort_order: Option<SortOrder>,
    /// Filter input by declared column index.
    pub filter_values: Vec<Option<String>>,
    pub selection: Option<Selection>,
    pub selection_json: Option<String>,
    pub focus_id: Option<String>,
}

/// One converted value awaiting commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntry {
    pub coord: CellCoord,
    #[serde(with = "gridsheet_core::value::tagged")]
    pub value: CellValue,
}

/// First sort expression seen, kept as a struct so an unsorted snapshot
/// (`{"sort_by": null}`) stays distinct from no snapshot (`null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSnapshot {
    pub sort_by: Option<Expression>,
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl<R: Row + Clone> Sheet<R> {
    pub fn save_state(&self) -> SheetState {
        SheetState {
            submitted: non_empty(self.buffer.pending_submitted()),
            local: non_empty(
                self.buffer
                    .local_entries()
                    .into_iter()
                    .map(|(coord, value)| LocalEntry { coord, value })
                    .collect(),
            ),
            bad_updates: non_empty(self.bad_updates.clone()),
            column_mapping: Some(self.column_mapping.clone()),
            sorted: self.sorted.clone(),
            row_map: self.sorted.as_ref().map(|_| self.row_map.to_entries()),
            valid: self.valid,
            local_value_set: self.local_value_set,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            orig_sort_by: self
                .orig_sort_by
                .clone()
                .map(|sort_by| SortSnapshot { sort_by }),
            orig_sort_order: self.orig_sort_order,
            filter_values: self.columns.iter().map(|c| c.filter_value.clone()).collect(),
            selection: self.selection,
            selection_json: self.selection_json.clone(),
            focus_id: self.focus_id.clone(),
        }
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state).
    ///
    /// Rows and columns are not part of the snapshot; the host supplies the
    /// same collection it rendered from.
    pub fn restore_state(&mut self, state: SheetState) {
        self.buffer.clear();
        for (coord, text) in state.submitted.unwrap_or_default() {
            self.buffer.set_submitted(coord, text);
        }
        for entry in state.local.unwrap_or_default() {
            self.buffer.set_local(entry.coord, entry.value);
        }
        self.bad_updates = state.bad_updates.unwrap_or_default();
        self.column_mapping = state.column_mapping.unwrap_or_default();
        let rows = self.rows.len();
        let in_range = state.sorted.iter().flatten().all(|&i| i < rows)
            && state.row_map.iter().flatten().all(|(_, e)| e.source_index < rows);
        if in_range {
            self.sorted = state.sorted;
            self.row_map = state.row_map.map(RowMap::from_entries).unwrap_or_default();
        } else {
            // the next pass rebuilds the view from the current rows
            log::warn!("sheet {}: saved view does not fit {rows} rows, dropping it", self.options.client_id);
            self.sorted = None;
            self.row_map = RowMap::default();
        }
        self.valid = state.valid;
        self.local_value_set = state.local_value_set;
        self.sort_by = state.sort_by;
        self.sort_order = state.sort_order;
        self.orig_sort_by = state.orig_sort_by.map(|snap| snap.sort_by);
        self.orig_sort_order = state.orig_sort_order;
        for (column, filter) in self.columns.iter_mut().zip(state.filter_values) {
            column.filter_value = filter;
        }
        self.selection = state.selection;
        self.selection_json = state.selection_json;
        self.focus_id = state.focus_id;
        self.phase = SheetPhase::Clean;
    }
}
