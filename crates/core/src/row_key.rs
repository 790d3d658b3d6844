//! Row identity.
//!
//! Rows are never identified by position or by object identity; each row
//! yields a key from the sheet's configured key expression. Keys must be
//! non-null and unique within one rendered view.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::value::{is_integral, CellValue, ISO_DATE};

/// Stable identity of one data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Bool(bool),
    Int(i64),
    Number(OrderedFloat<f64>),
    Text(String),
}

impl RowKey {
    /// Key for an evaluated key expression. `Null` has no key.
    pub fn from_value(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(RowKey::Bool(*b)),
            CellValue::Number(n) if is_integral(*n) => Some(RowKey::Int(*n as i64)),
            CellValue::Number(n) => Some(RowKey::Number(OrderedFloat(*n))),
            CellValue::Date(d) => Some(RowKey::Text(d.format(ISO_DATE).to_string())),
            CellValue::Text(s) => Some(RowKey::Text(s.clone())),
        }
    }
}

impl From<i64> for RowKey {
    fn from(n: i64) -> Self {
        RowKey::Int(n)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey::Text(s.to_string())
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKey::Bool(b) => write!(f, "{b}"),
            RowKey::Int(n) => write!(f, "{n}"),
            RowKey::Number(n) => write!(f, "{}", n.0),
            RowKey::Text(s) => f.write_str(s),
        }
    }
}
