use std::fmt;

use gridsheet_core::RowKey;

/// Fatal sheet errors.
///
/// These are configuration or programming defects (no row key, an index
/// the client should never have sent). Per-cell conversion and validation
/// failures are not errors; they are collected as `BadUpdate`s.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    /// No row key expression configured on the sheet.
    MissingRowKey,
    /// The row key expression evaluated to null for the row at this position.
    NullRowKey { row: usize },
    /// Visible column index with no entry in the column mapping.
    InvalidColumnIndex(usize),
    /// Declared column index past the end of the column list.
    ColumnOutOfRange(usize),
    /// Row position outside the current sorted view.
    RowOutOfRange(usize),
    /// Row key not present in the current row map.
    UnknownRowKey(RowKey),
    /// Column has no value expression to read or write through.
    MissingValueExpression(usize),
    /// Attempted write through an expression that is not a field reference.
    ReadOnlyExpression(String),
    /// Row object rejected a field write.
    FieldWrite { path: String, reason: String },
    /// Expression text could not be parsed.
    ExpressionParse(String),
    /// Sort order text is not ascending, descending or unsorted.
    InvalidSortOrder(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRowKey => write!(f, "row key required on sheet"),
            Self::NullRowKey { row } => {
                write!(f, "row key must resolve to a non-null value (row {row})")
            }
            Self::InvalidColumnIndex(idx) => write!(f, "invalid index {idx}"),
            Self::ColumnOutOfRange(idx) => write!(f, "column {idx} out of range"),
            Self::RowOutOfRange(idx) => write!(f, "row {idx} out of range"),
            Self::UnknownRowKey(key) => write!(f, "no row for key '{key}'"),
            Self::MissingValueExpression(col) => {
                write!(f, "column {col} has no value expression")
            }
            Self::ReadOnlyExpression(expr) => write!(f, "cannot assign through '{expr}'"),
            Self::FieldWrite { path, reason } => write!(f, "cannot write '{path}': {reason}"),
            Self::ExpressionParse(msg) => write!(f, "expression parse error: {msg}"),
            Self::InvalidSortOrder(s) => write!(f, "invalid sort order '{s}'"),
        }
    }
}

impl std::error::Error for SheetError {}
