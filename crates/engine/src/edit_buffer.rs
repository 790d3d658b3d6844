//! Edit buffer: pending cell edits keyed by cell coordinate.
//!
//! Two maps:
//! - submitted: raw client text, between decode and validate
//! - local: converted values, between validate and model commit
//!
//! A coordinate moves from submitted to local in one step
//! ([`EditBuffer::move_to_local`]), so it is never in both.

use rustc_hash::FxHashMap;

use gridsheet_core::{CellCoord, CellValue};

use crate::convert::Converter;
use crate::error::SheetError;

#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    submitted: FxHashMap<CellCoord, String>,
    local: FxHashMap<CellCoord, CellValue>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Submitted values
    // -------------------------------------------------------------------------

    pub fn set_submitted(&mut self, coord: CellCoord, text: impl Into<String>) {
        self.local.remove(&coord);
        self.submitted.insert(coord, text.into());
    }

    pub fn get_submitted(&self, coord: &CellCoord) -> Option<&str> {
        self.submitted.get(coord).map(String::as_str)
    }

    pub fn has_submitted(&self, coord: &CellCoord) -> bool {
        self.submitted.contains_key(coord)
    }

    pub fn remove_submitted(&mut self, coord: &CellCoord) -> Option<String> {
        self.submitted.remove(coord)
    }

    pub fn clear_submitted(&mut self) {
        self.submitted.clear();
    }

    pub fn submitted_len(&self) -> usize {
        self.submitted.len()
    }

    /// Pending submitted entries, ordered by coordinate.
    pub fn pending_submitted(&self) -> Vec<(CellCoord, String)> {
        let mut out: Vec<_> = self
            .submitted
            .iter()
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    // -------------------------------------------------------------------------
    // Local values
    // -------------------------------------------------------------------------

    pub fn set_local(&mut self, coord: CellCoord, value: CellValue) {
        self.local.insert(coord, value);
    }

    pub fn get_local(&self, coord: &CellCoord) -> Option<&CellValue> {
        self.local.get(coord)
    }

    pub fn remove_local(&mut self, coord: &CellCoord) -> Option<CellValue> {
        self.local.remove(coord)
    }

    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    /// Coordinates with a local value, ordered.
    pub fn local_coords(&self) -> Vec<CellCoord> {
        let mut out: Vec<_> = self.local.keys().cloned().collect();
        out.sort();
        out
    }

    /// Local entries, ordered by coordinate.
    pub fn local_entries(&self) -> Vec<(CellCoord, CellValue)> {
        let mut out: Vec<_> = self
            .local
            .iter()
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Replace a submitted entry with its converted value.
    pub fn move_to_local(&mut self, coord: CellCoord, value: CellValue) {
        self.submitted.remove(&coord);
        self.local.insert(coord, value);
    }

    pub fn clear(&mut self) {
        self.submitted.clear();
        self.local.clear();
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Local value if one is pending, else the live model value.
    pub fn cell_value<F>(&self, coord: &CellCoord, live: F) -> Result<CellValue, SheetError>
    where
        F: FnOnce() -> Result<CellValue, SheetError>,
    {
        match self.local.get(coord) {
            Some(v) => Ok(v.clone()),
            None => live(),
        }
    }

    /// Text for the client grid.
    ///
    /// Pending submitted text is echoed verbatim, so invalid input shows up
    /// exactly as typed. Otherwise the cell value goes through the column's
    /// converter (plain string form without one). `None` for null.
    pub fn render_value<F>(
        &self,
        coord: &CellCoord,
        cell: F,
        converter: Option<&dyn Converter>,
    ) -> Result<Option<String>, SheetError>
    where
        F: FnOnce() -> Result<CellValue, SheetError>,
    {
        if let Some(text) = self.submitted.get(coord) {
            return Ok(Some(text.clone()));
        }
        let value = self.cell_value(coord, cell)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(match converter {
            Some(c) => c.as_string(&value),
            None => value.display_string(),
        }))
    }
}
