//! Column descriptors and the visible/declared column mapping.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::convert::Converter;
use crate::error::SheetError;
use crate::expr::Expression;
use crate::validation::Validator;

/// One entry of a filter drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A declared column.
///
/// A column's position in `Sheet::columns` is its declared index. Columns
/// with `rendered == false` keep that index but get no visible index.
#[derive(Debug, Clone)]
pub struct Column {
    pub header_text: String,
    /// Client grid type tag (`text`, `numeric`, `date`, `checkbox`, ...).
    pub col_type: String,
    pub col_width: Option<u32>,
    pub readonly: bool,
    /// Per-row read-only flag; truthy marks the cell read-only.
    pub readonly_cell: Option<Expression>,
    /// Per-row CSS class for the cell.
    pub style_class: Option<Expression>,
    /// Field the cell reads from and commits to.
    pub value: Option<Expression>,
    pub filter_by: Option<Expression>,
    pub filter_options: Option<Vec<FilterOption>>,
    /// Current filter input. Empty or `None` means no filter.
    pub filter_value: Option<String>,
    pub sort_by: Option<Expression>,
    pub rendered: bool,
    pub required: bool,
    pub required_message: Option<String>,
    /// Replaces the text of every validator failure on this column.
    pub validator_message: Option<String>,
    pub converter: Option<Arc<dyn Converter>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            header_text: String::new(),
            col_type: "text".to_string(),
            col_width: None,
            readonly: false,
            readonly_cell: None,
            style_class: None,
            value: None,
            filter_by: None,
            filter_options: None,
            filter_value: None,
            sort_by: None,
            rendered: true,
            required: false,
            required_message: None,
            validator_message: None,
            converter: None,
            validators: Vec::new(),
        }
    }
}

impl Column {
    /// Column bound to a field expression.
    pub fn new(header_text: impl Into<String>, value: Expression) -> Self {
        Self {
            header_text: header_text.into(),
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, col_type: impl Into<String>) -> Self {
        self.col_type = col_type.into();
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.col_width = Some(width);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn with_readonly_cell(mut self, expr: Expression) -> Self {
        self.readonly_cell = Some(expr);
        self
    }

    pub fn with_style_class(mut self, expr: Expression) -> Self {
        self.style_class = Some(expr);
        self
    }

    pub fn with_filter_by(mut self, expr: Expression) -> Self {
        self.filter_by = Some(expr);
        self
    }

    pub fn with_filter_options(mut self, options: Vec<FilterOption>) -> Self {
        self.filter_options = Some(options);
        self
    }

    pub fn with_filter_value(mut self, text: impl Into<String>) -> Self {
        self.filter_value = Some(text.into());
        self
    }

    pub fn with_sort_by(mut self, expr: Expression) -> Self {
        self.sort_by = Some(expr);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.rendered = false;
        self
    }

    pub fn required(mut self, message: Option<String>) -> Self {
        self.required = true;
        self.required_message = message;
        self
    }

    pub fn with_validator_message(mut self, message: impl Into<String>) -> Self {
        self.validator_message = Some(message.into());
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Filterable columns get a filter input on the client.
    pub fn is_filterable(&self) -> bool {
        self.filter_by.is_some()
    }

    pub fn is_sortable(&self) -> bool {
        self.sort_by.is_some()
    }

    /// Non-empty filter input, if any.
    pub fn active_filter(&self) -> Option<&str> {
        self.filter_value.as_deref().filter(|s| !s.is_empty())
    }
}

// =============================================================================
// ColumnMapping
// =============================================================================

/// Visible index -> declared index.
///
/// `None` when every column is rendered: the mapping is then the identity
/// and nothing is allocated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    visible_to_declared: Option<Vec<usize>>,
}

impl ColumnMapping {
    /// Build from the current `rendered` flags.
    pub fn from_columns(columns: &[Column]) -> Self {
        if columns.iter().all(|c| c.rendered) {
            return Self::default();
        }
        let map = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.rendered)
            .map(|(i, _)| i)
            .collect();
        Self {
            visible_to_declared: Some(map),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.visible_to_declared.is_none()
    }

    /// Declared index for a visible index.
    pub fn to_declared(&self, visible: usize) -> Result<usize, SheetError> {
        match &self.visible_to_declared {
            None => Ok(visible),
            Some(map) => map
                .get(visible)
                .copied()
                .ok_or(SheetError::InvalidColumnIndex(visible)),
        }
    }

    /// Visible index for a declared index; `None` when the column is hidden.
    pub fn to_visible(&self, declared: usize) -> Option<usize> {
        match &self.visible_to_declared {
            None => Some(declared),
            Some(map) => map.iter().position(|&d| d == declared),
        }
    }
}
