//! The sheet: decode, validate, update-model and render support.
//!
//! A request runs through the phases in order:
//!
//! 1. [`Sheet::decode`] turns client deltas into submitted values and picks
//!    up selection, filter, sort and focus state.
//! 2. [`Sheet::validate`] converts and validates submitted values into local
//!    values, collecting [`BadUpdate`]s for anything that fails.
//! 3. [`Sheet::update_model`] writes local values into the rows (skipped
//!    when the sheet is invalid) and logs a [`SheetUpdate`] per cell.
//! 4. The rendering side reads [`Sheet::render_row`], [`Sheet::error_cells`]
//!    and the queued [`RenderRequest`]s.
//!
//! Nothing is returned from the phases except fatal errors; results are
//! observed through the update log, bad updates, messages and events.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use gridsheet_core::{CellCoord, CellValue, RowKey, Selection, SparseCellMap};

use crate::column::{Column, ColumnMapping};
use crate::edit_buffer::EditBuffer;
use crate::error::SheetError;
use crate::events::{BehaviorKind, EventCollector, SheetEvent};
use crate::expr::{EvalContext, Expression, Row};
use crate::filter::{self, SortOrder};
use crate::input::SheetInput;
use crate::message::{Diagnostic, SheetMessage, MESSAGE_REQUIRED};
use crate::row_map::{row_key_of, RowMap, RowMapEntry};
use crate::updates::{BadUpdate, SheetUpdate};

// =============================================================================
// Options
// =============================================================================

/// Display and identity options of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOptions {
    pub client_id: String,
    /// Client widget variable; derived from `client_id` when unset.
    pub widget_var: Option<String>,
    /// Row variable name used in expressions.
    pub var: String,
    /// Sheet-level message added when a validation pass has failures.
    pub error_message: Option<String>,
    pub style_class: Option<String>,
    pub row_style_class: Option<Expression>,
    pub current_row_class: Option<String>,
    pub current_col_class: Option<String>,
    pub stretch_h: Option<String>,
    pub empty_message: Option<String>,
    pub fixed_rows: Option<u32>,
    pub fixed_cols: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub show_column_headers: bool,
    pub show_row_headers: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            client_id: "sheet".to_string(),
            widget_var: None,
            var: "row".to_string(),
            error_message: None,
            style_class: None,
            row_style_class: None,
            current_row_class: None,
            current_col_class: None,
            stretch_h: None,
            empty_message: None,
            fixed_rows: None,
            fixed_cols: None,
            width: None,
            height: None,
            show_column_headers: true,
            show_row_headers: true,
        }
    }
}

impl SheetOptions {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Phase / render requests
// =============================================================================

/// Where the sheet is in the validate/commit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetPhase {
    #[default]
    Clean,
    Validating,
    Valid,
    Invalid,
    Committing,
}

/// Work queued for the rendering side of a partial request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Re-render these rows in place.
    Rows(Vec<RowKey>),
    /// Replace the client error map.
    Errors,
    /// Clear the client-side delta after a commit.
    ResetDelta,
}

/// One row rendered for the client grid. Indices are visible column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub key: RowKey,
    pub sorted_index: usize,
    pub values: Vec<Option<String>>,
    pub styles: Vec<(usize, String)>,
    pub read_only: Vec<usize>,
    pub row_style: Option<String>,
}

// =============================================================================
// Sheet
// =============================================================================

pub struct Sheet<R> {
    pub options: SheetOptions,
    pub(crate) row_key: Option<Expression>,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<R>,

    pub(crate) sort_by: Option<Expression>,
    pub(crate) sort_order: SortOrder,
    /// First-ever values before a sort change; restored by `reset`.
    pub(crate) orig_sort_by: Option<Option<Expression>>,
    pub(crate) orig_sort_order: Option<SortOrder>,

    pub(crate) buffer: EditBuffer,
    pub(crate) bad_updates: Vec<BadUpdate>,
    pub(crate) column_mapping: ColumnMapping,
    pub(crate) sorted: Option<Vec<usize>>,
    pub(crate) row_map: RowMap,
    pub(crate) valid: bool,
    pub(crate) local_value_set: bool,
    pub(crate) phase: SheetPhase,

    pub(crate) selection: Option<Selection>,
    pub(crate) selection_json: Option<String>,
    pub(crate) focus_id: Option<String>,

    updates: Vec<SheetUpdate<R>>,
    messages: Vec<SheetMessage>,
    events: EventCollector,
    render_requests: Vec<RenderRequest>,
    partial_request: bool,
}

impl<R: Row + Clone> Sheet<R> {
    pub fn new(options: SheetOptions) -> Self {
        Self {
            options,
            row_key: None,
            columns: Vec::new(),
            rows: Vec::new(),
            sort_by: None,
            sort_order: SortOrder::default(),
            orig_sort_by: None,
            orig_sort_order: None,
            buffer: EditBuffer::new(),
            bad_updates: Vec::new(),
            column_mapping: ColumnMapping::default(),
            sorted: None,
            row_map: RowMap::default(),
            valid: true,
            local_value_set: false,
            phase: SheetPhase::Clean,
            selection: None,
            selection_json: None,
            focus_id: None,
            updates: Vec::new(),
            messages: Vec::new(),
            events: EventCollector::new(),
            render_requests: Vec::new(),
            partial_request: false,
        }
    }

    pub fn with_row_key(mut self, expr: Expression) -> Self {
        self.row_key = Some(expr);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_rows(mut self, rows: Vec<R>) -> Self {
        self.set_rows(rows);
        self
    }

    /// Initial sort; does not touch the reset snapshot.
    pub fn with_sort(mut self, sort_by: Option<Expression>, order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = order;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn row_key(&self) -> Option<&Expression> {
        self.row_key.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    /// Replace the row collection. The sorted view is rebuilt on next use.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.sorted = None;
        self.row_map = RowMap::default();
    }

    pub fn sort_by(&self) -> Option<&Expression> {
        self.sort_by.as_ref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn bad_updates(&self) -> &[BadUpdate] {
        &self.bad_updates
    }

    pub fn updates(&self) -> &[SheetUpdate<R>] {
        &self.updates
    }

    pub fn messages(&self) -> &[SheetMessage] {
        &self.messages
    }

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    pub fn render_requests(&self) -> &[RenderRequest] {
        &self.render_requests
    }

    pub fn row_map(&self) -> &RowMap {
        &self.row_map
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.column_mapping
    }

    /// Source indices of the current view, if one has been built.
    pub fn sorted(&self) -> Option<&[usize]> {
        self.sorted.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_local_value_set(&self) -> bool {
        self.local_value_set
    }

    pub fn phase(&self) -> SheetPhase {
        self.phase
    }

    pub fn is_partial_request(&self) -> bool {
        self.partial_request
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Raw selection JSON as last sent by the client.
    pub fn selection_json(&self) -> Option<&str> {
        self.selection_json.as_deref()
    }

    pub fn focus_id(&self) -> Option<&str> {
        self.focus_id.as_deref()
    }

    pub fn widget_var(&self) -> String {
        match &self.options.widget_var {
            Some(var) => var.clone(),
            None => format!("widget_{}", self.options.client_id.replace([':', '-'], "_")),
        }
    }

    /// Rows in the current view (0 before the first sort/filter pass).
    pub fn row_count(&self) -> usize {
        self.sorted.as_ref().map_or(0, Vec::len)
    }

    pub fn is_has_styled_cells(&self) -> bool {
        self.columns.iter().any(|c| c.style_class.is_some())
    }

    /// Rendered columns with their declared indices.
    pub fn visible_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.rendered)
    }

    /// Visible index of the column sorted on, or -1.
    pub fn sort_col_render_index(&self) -> i64 {
        let Some(sort_by) = &self.sort_by else {
            return -1;
        };
        self.visible_columns()
            .enumerate()
            .find(|(_, (_, c))| c.sort_by.as_ref() == Some(sort_by))
            .map_or(-1, |(visible, _)| visible as i64)
    }

    // -------------------------------------------------------------------------
    // Sort / filter
    // -------------------------------------------------------------------------

    /// Change the sort expression, snapshotting the first-ever value.
    pub fn set_sort_by(&mut self, expr: Option<Expression>) {
        if self.orig_sort_by.is_none() {
            self.orig_sort_by = Some(self.sort_by.clone());
        }
        self.sort_by = expr;
    }

    /// Change the sort order, snapshotting the first-ever value.
    pub fn set_sort_order(&mut self, order: SortOrder) {
        if self.orig_sort_order.is_none() {
            self.orig_sort_order = Some(self.sort_order);
        }
        self.sort_order = order;
    }

    pub fn update_column_mappings(&mut self) {
        self.column_mapping = ColumnMapping::from_columns(&self.columns);
    }

    /// Re-run filter and sort, then rebuild the row map.
    pub fn sort_and_filter(&mut self) -> Result<(), SheetError> {
        let (sorted, row_map) = filter::sort_and_filter(
            &self.rows,
            &self.columns,
            self.sort_by.as_ref(),
            self.sort_order,
            &self.options.var,
            self.row_key.as_ref(),
        )?;
        self.sorted = Some(sorted);
        self.row_map = row_map;
        Ok(())
    }

    fn ensure_sorted(&mut self) -> Result<(), SheetError> {
        if self.sorted.is_none() {
            self.sort_and_filter()?;
        }
        Ok(())
    }

    /// Column mappings and view for an encode pass.
    pub fn prepare_render(&mut self) -> Result<(), SheetError> {
        self.update_column_mappings();
        self.sort_and_filter()
    }

    // -------------------------------------------------------------------------
    // Cell access
    // -------------------------------------------------------------------------

    fn column(&self, col: usize) -> Result<&Column, SheetError> {
        self.columns.get(col).ok_or(SheetError::ColumnOutOfRange(col))
    }

    fn source_row(&self, entry: RowMapEntry) -> Result<&R, SheetError> {
        self.rows
            .get(entry.source_index)
            .ok_or(SheetError::RowOutOfRange(entry.sorted_index))
    }

    /// Model value of a cell, read through the column's value expression.
    fn live_value(&self, entry: RowMapEntry, col: usize) -> Result<CellValue, SheetError> {
        let expr = self
            .column(col)?
            .value
            .as_ref()
            .ok_or(SheetError::MissingValueExpression(col))?;
        let row = self.source_row(entry)?;
        let mut ctx = EvalContext::new(&self.options.var);
        let bound = ctx.bind(row, entry.sorted_index);
        Ok(bound.eval(expr))
    }

    /// Local value if pending, else the model value.
    pub fn cell_value(&self, key: &RowKey, col: usize) -> Result<CellValue, SheetError> {
        let coord = CellCoord::new(key.clone(), col);
        self.buffer
            .cell_value(&coord, || self.live_value(self.row_map.entry(key)?, col))
    }

    /// Text to show in a cell; `None` for null.
    pub fn render_value(&self, key: &RowKey, col: usize) -> Result<Option<String>, SheetError> {
        let coord = CellCoord::new(key.clone(), col);
        let converter = self.column(col)?.converter.as_deref();
        self.buffer.render_value(
            &coord,
            || self.live_value(self.row_map.entry(key)?, col),
            converter,
        )
    }

    /// Render one row of the current view.
    pub fn render_row(&self, sorted_index: usize) -> Result<RenderedRow, SheetError> {
        let source_index = self
            .sorted
            .as_ref()
            .and_then(|s| s.get(sorted_index).copied())
            .ok_or(SheetError::RowOutOfRange(sorted_index))?;
        let row = self
            .rows
            .get(source_index)
            .ok_or(SheetError::RowOutOfRange(sorted_index))?;

        let mut ctx = EvalContext::new(&self.options.var);
        let bound = ctx.bind(row, sorted_index);
        let key = row_key_of(&bound, self.row_key.as_ref())?;

        let row_style = match bound.eval_opt(self.options.row_style_class.as_ref()) {
            CellValue::Null => None,
            v => Some(v.display_string()),
        };

        let mut rendered = RenderedRow {
            key: key.clone(),
            sorted_index,
            values: Vec::with_capacity(self.columns.len()),
            styles: Vec::new(),
            read_only: Vec::new(),
            row_style,
        };

        for (visible, (col, column)) in self.visible_columns().enumerate() {
            let coord = CellCoord::new(key.clone(), col);
            let value = self.buffer.render_value(
                &coord,
                || Ok(bound.eval_opt(column.value.as_ref())),
                column.converter.as_deref(),
            )?;
            rendered.values.push(value);

            if let Some(expr) = &column.style_class {
                let class = bound.eval(expr);
                if !class.is_empty() {
                    rendered.styles.push((visible, class.display_string()));
                }
            }
            if bound.eval_opt(column.readonly_cell.as_ref()).is_truthy() {
                rendered.read_only.push(visible);
            }
        }
        Ok(rendered)
    }

    /// Bad update messages by `(sorted_row, visible_col)`.
    ///
    /// Cells whose row is filtered out or whose column is hidden are left out.
    pub fn error_cells(&self) -> SparseCellMap<String> {
        let mut cells = SparseCellMap::new();
        for bad in &self.bad_updates {
            let Some(entry) = self.row_map.get(&bad.row_key) else {
                continue;
            };
            let Some(col) = self.column_mapping.to_visible(bad.col_index) else {
                continue;
            };
            cells.insert(entry.sorted_index, col, bad.message.clone());
        }
        cells
    }

    // -------------------------------------------------------------------------
    // Decode
    // -------------------------------------------------------------------------

    /// Submit text for the cell at `(sorted row, declared col)`.
    pub fn set_submitted_value(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<(), SheetError> {
        self.ensure_sorted()?;
        let source = self
            .sorted
            .as_ref()
            .and_then(|s| s.get(row).copied())
            .ok_or(SheetError::RowOutOfRange(row))?;
        let data = self.rows.get(source).ok_or(SheetError::RowOutOfRange(row))?;
        let key = {
            let mut ctx = EvalContext::new(&self.options.var);
            let bound = ctx.bind(data, row);
            row_key_of(&bound, self.row_key.as_ref())?
        };
        self.buffer.set_submitted(CellCoord::new(key, col), text);
        Ok(())
    }

    /// Apply one decoded request.
    pub fn decode(&mut self, input: &SheetInput) -> Result<(), SheetError> {
        self.updates.clear();
        self.messages.clear();
        self.events.clear();
        self.render_requests.clear();
        self.valid = true;
        self.partial_request = input.partial;

        for delta in &input.deltas {
            let col = self.column_mapping.to_declared(delta.col)?;
            self.column(col)?;
            self.set_submitted_value(delta.row, col, delta.new_value.clone())?;
        }

        if let Some(sel) = &input.selection {
            let col = self.column_mapping.to_declared(sel.col)?;
            self.selection = Some(Selection::new(sel.row, col, sel.last_row, sel.last_col));
            self.selection_json = Some(sel.raw.clone());
        }

        self.decode_behavior(input);

        let filterable: Vec<(usize, usize)> = self
            .visible_columns()
            .enumerate()
            .filter(|(_, (_, c))| c.is_filterable())
            .map(|(visible, (declared, _))| (visible, declared))
            .collect();
        for (visible, declared) in filterable {
            self.columns[declared].filter_value = input.filters.get(&visible).cloned();
        }

        if let Some(sort_col) = input.sort_by.filter(|c| *c >= 0) {
            let col = self.column_mapping.to_declared(sort_col as usize)?;
            let expr = self.column(col)?.sort_by.clone();
            self.set_sort_by(expr);
        }

        if let Some(order) = &input.sort_order {
            self.set_sort_order(order.parse()?);
        }

        self.focus_id = input.focus.clone();
        log::debug!(
            "decoded {} deltas for '{}' ({} submitted pending)",
            input.deltas.len(),
            self.options.client_id,
            self.buffer.submitted_len()
        );
        Ok(())
    }

    fn decode_behavior(&mut self, input: &SheetInput) {
        let (Some(event), Some(source)) = (&input.behavior_event, &input.behavior_source) else {
            return;
        };
        if source != &self.options.client_id {
            return;
        }
        match event.parse::<BehaviorKind>() {
            Ok(kind) => self.events.push(SheetEvent::Behavior { kind }),
            Err(e) => log::debug!("{e}"),
        }
    }

    // -------------------------------------------------------------------------
    // Validate
    // -------------------------------------------------------------------------

    /// Convert and validate every submitted value.
    ///
    /// Failures never abort the pass. A conversion failure leaves the text in
    /// submitted. A validator failure keeps the converted value in local.
    pub fn validate(&mut self) -> Result<(), SheetError> {
        self.phase = SheetPhase::Validating;
        let had_bad_updates = !self.bad_updates.is_empty();
        self.bad_updates.clear();
        self.ensure_sorted()?;

        // Columns that already failed in this pass; skips repeat required messages.
        let mut invalid_columns: FxHashSet<usize> = FxHashSet::default();

        for (coord, text) in self.buffer.pending_submitted() {
            self.row_map.entry(&coord.row_key)?;
            let column = self.column(coord.col)?;
            let header = Some(column.header_text.clone());

            let converted = match &column.converter {
                Some(converter) => converter.as_value(&text),
                None => Ok(CellValue::Text(text.clone())),
            };
            let value = match converted {
                Ok(value) => value,
                Err(diagnostic) => {
                    self.valid = false;
                    invalid_columns.insert(coord.col);
                    self.messages.push(SheetMessage::cell_error(coord.clone(), &diagnostic));
                    self.bad_updates.push(BadUpdate {
                        row_key: coord.row_key,
                        col_index: coord.col,
                        column_header: header,
                        value: CellValue::Text(text),
                        message: diagnostic.detail,
                    });
                    continue;
                }
            };

            if column.required && value.is_empty() {
                if !invalid_columns.contains(&coord.col) {
                    let text = column
                        .required_message
                        .clone()
                        .unwrap_or_else(|| MESSAGE_REQUIRED.to_string());
                    self.fail_cell(&coord, header, value, Diagnostic::plain(text));
                    invalid_columns.insert(coord.col);
                }
                self.valid = false;
                continue;
            }

            let failures: Vec<Diagnostic> = column
                .validators
                .iter()
                .filter_map(|v| v.validate(&value).err())
                .map(|d| match &column.validator_message {
                    Some(text) => Diagnostic::new(d.summary, text.clone()),
                    None => d,
                })
                .collect();

            self.buffer.move_to_local(coord.clone(), value.clone());
            self.local_value_set = true;

            for diagnostic in failures {
                self.valid = false;
                invalid_columns.insert(coord.col);
                self.fail_cell(&coord, header.clone(), value.clone(), diagnostic);
            }
        }

        let has_bad_updates = !self.bad_updates.is_empty();
        if (had_bad_updates || has_bad_updates) && self.partial_request {
            self.sort_and_filter()?;
            self.render_requests.push(RenderRequest::Errors);
        }

        if has_bad_updates {
            if let Some(text) = &self.options.error_message {
                self.messages.push(SheetMessage::global_error(text));
            }
            self.events.push(SheetEvent::ValidationFailed {
                bad_updates: self.bad_updates.clone(),
            });
        }

        self.phase = if self.valid { SheetPhase::Valid } else { SheetPhase::Invalid };
        log::debug!(
            "validated '{}': {} local, {} submitted, {} bad",
            self.options.client_id,
            self.buffer.local_len(),
            self.buffer.submitted_len(),
            self.bad_updates.len()
        );
        Ok(())
    }

    fn fail_cell(&mut self, coord: &CellCoord, header: Option<String>, value: CellValue, diagnostic: Diagnostic) {
        self.messages.push(SheetMessage::cell_error(coord.clone(), &diagnostic));
        self.bad_updates.push(BadUpdate {
            row_key: coord.row_key.clone(),
            col_index: coord.col,
            column_header: header,
            value,
            message: diagnostic.detail,
        });
    }

    // -------------------------------------------------------------------------
    // Update model
    // -------------------------------------------------------------------------

    /// Write every local value into its row.
    ///
    /// A no-op on an invalid sheet. Writes are not rolled back if a later
    /// cell fails fatally.
    pub fn update_model(&mut self) -> Result<(), SheetError> {
        if !self.valid {
            log::warn!(
                "skipping model update for '{}': {} bad updates",
                self.options.client_id,
                self.bad_updates.len()
            );
            return Ok(());
        }
        self.phase = SheetPhase::Committing;
        self.ensure_sorted()?;

        let mut dirty_rows: BTreeSet<RowKey> = BTreeSet::new();
        let mut count = 0;
        for coord in self.buffer.local_coords() {
            let entry = self.row_map.entry(&coord.row_key)?;
            let expr = self
                .column(coord.col)?
                .value
                .clone()
                .ok_or(SheetError::MissingValueExpression(coord.col))?;
            let old_value = self.live_value(entry, coord.col)?;
            let Some(new_value) = self.buffer.remove_local(&coord) else {
                continue;
            };

            let row = self
                .rows
                .get_mut(entry.source_index)
                .ok_or(SheetError::RowOutOfRange(entry.sorted_index))?;
            expr.assign(&self.options.var, row, new_value.clone())?;

            self.updates.push(SheetUpdate {
                row_index: entry.sorted_index,
                row_key: coord.row_key.clone(),
                col_index: coord.col,
                row_data: row.clone(),
                old_value,
                new_value,
            });
            dirty_rows.insert(coord.row_key);
            count += 1;
        }
        self.local_value_set = false;

        self.sort_and_filter()?;

        let dirty_rows: Vec<RowKey> = dirty_rows.into_iter().collect();
        if self.partial_request && !dirty_rows.is_empty() {
            self.render_requests.push(RenderRequest::Rows(dirty_rows.clone()));
        }
        log::debug!("committed {count} cells in {} rows", dirty_rows.len());
        self.events.push(SheetEvent::UpdatesApplied { count, dirty_rows });
        self.phase = SheetPhase::Clean;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reset / commit
    // -------------------------------------------------------------------------

    /// Drop all edits and bad updates, clear filters and restore the
    /// original sort.
    pub fn reset(&mut self) -> Result<(), SheetError> {
        self.buffer.clear();
        self.bad_updates.clear();
        if let Some(orig) = self.orig_sort_by.clone() {
            self.sort_by = orig;
        }
        if let Some(orig) = self.orig_sort_order {
            self.sort_order = orig;
        }
        for column in &mut self.columns {
            column.filter_value = None;
        }
        self.local_value_set = false;
        self.valid = true;
        self.phase = SheetPhase::Clean;
        self.sort_and_filter()
    }

    /// Forget submitted values once the host has persisted the updates.
    pub fn commit_updates(&mut self) {
        self.buffer.clear_submitted();
        if self.partial_request {
            self.render_requests.push(RenderRequest::ResetDelta);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::NumberConverter;
    use crate::input::{CellDelta, SelectionInput};
    use crate::validation::{NumericConstraint, ValidationRule};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn field(path: &str) -> Expression {
        Expression::field("row", path)
    }

    fn sheet() -> Sheet<Value> {
        Sheet::new(SheetOptions::new("form:grid"))
            .with_row_key(field("id"))
            .with_column(
                Column::new("Name", field("name"))
                    .with_filter_by(field("name"))
                    .with_sort_by(field("name")),
            )
            .with_column(
                Column::new("Qty", field("qty"))
                    .with_converter(Arc::new(NumberConverter::decimal()))
                    .with_validator(Arc::new(ValidationRule::decimal(NumericConstraint::greater_than_or_equal(0.0))))
                    .with_sort_by(field("qty")),
            )
            .with_rows(vec![
                json!({"id": 1, "name": "Pear", "qty": 2}),
                json!({"id": 2, "name": "apple", "qty": 7}),
                json!({"id": 3, "name": "Fig", "qty": 4}),
            ])
    }

    fn delta(row: usize, col: usize, text: &str) -> CellDelta {
        CellDelta {
            row,
            col,
            old_value: CellValue::Null,
            new_value: text.to_string(),
        }
    }

    #[test]
    fn test_widget_var_default() {
        assert_eq!(sheet().widget_var(), "widget_form_grid");
    }

    #[test]
    fn test_decode_validate_update() {
        let mut s = sheet();
        s.prepare_render().unwrap();
        s.decode(&SheetInput {
            deltas: vec![delta(2, 1, "10")],
            partial: true,
            ..SheetInput::default()
        })
        .unwrap();
        s.validate().unwrap();
        assert!(s.is_valid());
        assert_eq!(s.cell_value(&RowKey::Int(3), 1).unwrap(), CellValue::Number(10.0));

        s.update_model().unwrap();
        assert_eq!(s.rows()[2]["qty"], json!(10));
        assert_eq!(s.updates().len(), 1);
        assert_eq!(s.updates()[0].old_value, CellValue::Number(4.0));
        assert_eq!(s.render_requests(), &[RenderRequest::Rows(vec![RowKey::Int(3)])]);
        assert_eq!(s.phase(), SheetPhase::Clean);
    }

    #[test]
    fn test_validator_failure_keeps_local_and_skips_commit() {
        let mut s = sheet();
        s.prepare_render().unwrap();
        s.decode(&SheetInput {
            deltas: vec![delta(0, 1, "-1")],
            ..SheetInput::default()
        })
        .unwrap();
        s.validate().unwrap();
        assert!(!s.is_valid());
        assert_eq!(s.bad_updates().len(), 1);
        assert_eq!(s.buffer().get_local(&CellCoord::new(RowKey::Int(1), 1)), Some(&CellValue::Number(-1.0)));
        assert!(s.events().has_validation_failure());

        s.update_model().unwrap();
        assert!(s.updates().is_empty());
        assert_eq!(s.rows()[0]["qty"], json!(2));
    }

    #[test]
    fn test_sort_decode_and_reset_snapshot() {
        let mut s = sheet();
        s.prepare_render().unwrap();
        assert_eq!(s.sort_col_render_index(), -1);

        s.decode(&SheetInput {
            sort_by: Some(1),
            sort_order: Some("DESCENDING".into()),
            ..SheetInput::default()
        })
        .unwrap();
        s.sort_and_filter().unwrap();
        assert_eq!(s.sorted().unwrap(), &[1, 2, 0]);
        assert_eq!(s.sort_col_render_index(), 1);

        s.decode(&SheetInput {
            sort_by: Some(0),
            sort_order: Some("ascending".into()),
            ..SheetInput::default()
        })
        .unwrap();
        assert_eq!(s.sort_col_render_index(), 0);

        s.reset().unwrap();
        assert_eq!(s.sort_by(), None);
        assert_eq!(s.sort_order(), SortOrder::Ascending);
        assert_eq!(s.sorted().unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn test_invalid_sort_order_is_fatal() {
        let mut s = sheet();
        let err = s
            .decode(&SheetInput {
                sort_order: Some("sideways".into()),
                ..SheetInput::default()
            })
            .unwrap_err();
        assert_eq!(err, SheetError::InvalidSortOrder("sideways".into()));
    }

    #[test]
    fn test_decode_selection_maps_hidden_columns() {
        let mut s = sheet();
        s.columns_mut()[0].rendered = false;
        s.prepare_render().unwrap();
        s.decode(&SheetInput {
            selection: Some(SelectionInput {
                row: 1,
                col: 0,
                last_row: 1,
                last_col: 0,
                raw: "[1,0,1,0]".into(),
            }),
            ..SheetInput::default()
        })
        .unwrap();
        assert_eq!(s.selection().map(|sel| sel.col), Some(1));
        assert_eq!(s.selection_json(), Some("[1,0,1,0]"));
    }

    #[test]
    fn test_behavior_only_from_own_source() {
        let mut s = sheet();
        s.decode(&SheetInput {
            behavior_event: Some("cellSelect".into()),
            behavior_source: Some("other".into()),
            ..SheetInput::default()
        })
        .unwrap();
        assert!(s.events().is_empty());

        s.decode(&SheetInput {
            behavior_event: Some("cellSelect".into()),
            behavior_source: Some("form:grid".into()),
            ..SheetInput::default()
        })
        .unwrap();
        assert_eq!(s.events().behaviors(), vec![BehaviorKind::CellSelect]);
    }

    #[test]
    fn test_render_row_and_error_cells() {
        let mut s = sheet();
        s.options.row_style_class = Some(Expression::literal("striped"));
        s.columns_mut()[0].style_class = Some(field("name"));
        s.columns_mut()[1].readonly_cell = Some(Expression::literal("true"));
        s.prepare_render().unwrap();
        s.decode(&SheetInput {
            deltas: vec![delta(1, 1, "lots")],
            partial: true,
            ..SheetInput::default()
        })
        .unwrap();
        s.validate().unwrap();

        let row = s.render_row(1).unwrap();
        assert_eq!(row.key, RowKey::Int(2));
        assert_eq!(row.values, vec![Some("apple".to_string()), Some("lots".to_string())]);
        assert_eq!(row.styles, vec![(0, "apple".to_string())]);
        assert_eq!(row.read_only, vec![1]);
        assert_eq!(row.row_style.as_deref(), Some("striped"));

        let errors = s.error_cells();
        assert_eq!(errors.get(1, 1).map(String::as_str), Some("'lots' is not a number."));
        assert_eq!(s.render_requests(), &[RenderRequest::Errors]);
    }

    #[test]
    fn test_commit_updates_clears_submitted() {
        let mut s = sheet();
        s.prepare_render().unwrap();
        s.decode(&SheetInput {
            deltas: vec![delta(0, 1, "x")],
            partial: true,
            ..SheetInput::default()
        })
        .unwrap();
        s.commit_updates();
        assert_eq!(s.buffer().submitted_len(), 0);
        assert_eq!(s.render_requests(), &[RenderRequest::ResetDelta]);
    }

    #[test]
    fn test_filter_decode_clears_missing() {
        let mut s = sheet();
        s.columns_mut()[0].filter_value = Some("old".into());
        let mut input = SheetInput::default();
        s.decode(&input).unwrap();
        assert_eq!(s.columns()[0].filter_value, None);

        input.filters.insert(0, "p".into());
        s.decode(&input).unwrap();
        s.sort_and_filter().unwrap();
        assert_eq!(s.row_count(), 2);
    }

    #[test]
    fn test_reset_drops_edits_errors_and_filters() {
        let mut s = sheet();
        s.prepare_render().unwrap();
        let mut input = SheetInput {
            deltas: vec![delta(0, 1, "-1"), delta(1, 0, "Plum"), delta(2, 1, "lots")],
            ..SheetInput::default()
        };
        input.filters.insert(0, "p".into());
        s.decode(&input).unwrap();
        s.validate().unwrap();
        s.sort_and_filter().unwrap();

        // "lots" fails conversion and stays submitted
        assert_eq!(s.buffer().submitted_len(), 1);
        assert_eq!(s.buffer().local_len(), 2);
        assert_eq!(s.bad_updates().len(), 2);
        assert!(!s.is_valid());
        assert_eq!(s.columns()[0].filter_value.as_deref(), Some("p"));
        assert_eq!(s.row_count(), 2);

        s.reset().unwrap();
        assert_eq!(s.buffer().submitted_len(), 0);
        assert_eq!(s.buffer().local_len(), 0);
        assert!(s.bad_updates().is_empty());
        assert!(s.is_valid());
        assert!(s.columns().iter().all(|c| c.filter_value.is_none()));
        assert_eq!(s.row_count(), 3);
        assert_eq!(s.sorted().unwrap(), &[0, 1, 2]);
        assert_eq!(s.cell_value(&RowKey::Int(1), 1).unwrap(), CellValue::Number(2.0));
    }
}
