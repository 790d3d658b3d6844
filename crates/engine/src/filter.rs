//! Filter and Sort - the sorted view of the row collection.
//!
//! The view is a list of source indices:
//! - Filtering keeps a row iff every column with a non-empty filter input
//!   has a filter-source value containing that input (case-insensitive)
//! - Sorting is stable over the filtered order
//! - The row map is rebuilt from the final view in the same pass
//!
//! Key invariants:
//! - No active filter means the full collection, in order
//! - Equal sort values keep their relative filtered order
//! - Nulls sort last in both directions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use gridsheet_core::CellValue;

use crate::column::Column;
use crate::error::SheetError;
use crate::expr::{EvalContext, Expression, Row};
use crate::row_map::RowMap;

// =============================================================================
// SortOrder
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
    /// Keep the filtered order.
    Unsorted,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
            SortOrder::Unsorted => "unsorted",
        }
    }
}

impl FromStr for SortOrder {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" => Ok(SortOrder::Ascending),
            "descending" => Ok(SortOrder::Descending),
            "unsorted" => Ok(SortOrder::Unsorted),
            _ => Err(SheetError::InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SortKey: For stable, deterministic sorting
// =============================================================================

/// Normalized sort value. Variant order is the type rank:
/// Numbers < Dates < Text < Bools.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Number(OrderedFloat<f64>),
    Date(NaiveDate),
    /// Already normalized: trimmed + lowercase
    Text(String),
    Bool(bool),
}

impl SortValue {
    /// `None` for null (nulls have no rank; they always go last).
    pub fn from_value(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Null => None,
            CellValue::Number(n) => Some(SortValue::Number(OrderedFloat(*n))),
            CellValue::Date(d) => Some(SortValue::Date(*d)),
            CellValue::Text(s) => Some(SortValue::Text(s.trim().to_lowercase())),
            CellValue::Bool(b) => Some(SortValue::Bool(*b)),
        }
    }
}

/// Key for sorting rows (includes tie-breaker for stability)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub value: Option<SortValue>,
    /// Position in the filtered order at the moment the sort runs.
    pub filtered_index: usize,
}

impl SortKey {
    pub fn compare(&self, other: &Self, order: SortOrder) -> Ordering {
        let by_value = match (&self.value, &other.value) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) if order == SortOrder::Descending => b.cmp(a),
            (Some(a), Some(b)) => a.cmp(b),
        };
        by_value.then(self.filtered_index.cmp(&other.filtered_index))
    }
}

// =============================================================================
// Filter / Sort passes
// =============================================================================

/// Case-insensitive substring match; a null source never matches.
pub fn filter_matches(source: &CellValue, needle: &str) -> bool {
    if source.is_null() {
        return false;
    }
    source
        .display_string()
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Source indices of the rows passing every active column filter.
pub fn filter_rows<R: Row>(rows: &[R], columns: &[Column], var: &str) -> Vec<usize> {
    // a column filtered without a `filter_by` source matches no row
    let active: Vec<(Option<&Expression>, &str)> = columns
        .iter()
        .filter_map(|c| Some((c.filter_by.as_ref(), c.active_filter()?)))
        .collect();

    if active.is_empty() {
        return (0..rows.len()).collect();
    }

    let mut ctx = EvalContext::new(var);
    let mut kept = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let bound = ctx.bind(row, i);
        if active
            .iter()
            .all(|(expr, needle)| expr.is_some_and(|e| filter_matches(&bound.eval(e), needle)))
        {
            kept.push(i);
        }
    }
    kept
}

/// Stable sort of `filtered` by the sort expression.
pub fn sort_rows<R: Row>(
    rows: &[R],
    filtered: Vec<usize>,
    sort_by: &Expression,
    order: SortOrder,
    var: &str,
) -> Vec<usize> {
    if order == SortOrder::Unsorted {
        return filtered;
    }

    let mut ctx = EvalContext::new(var);
    let mut sortable: Vec<(SortKey, usize)> = filtered
        .iter()
        .enumerate()
        .map(|(filtered_index, &source)| {
            let bound = ctx.bind(&rows[source], filtered_index);
            let key = SortKey {
                value: SortValue::from_value(&bound.eval(sort_by)),
                filtered_index,
            };
            (key, source)
        })
        .collect();

    sortable.sort_by(|a, b| a.0.compare(&b.0, order));
    sortable.into_iter().map(|(_, source)| source).collect()
}

/// One full pass: filter, sort, then re-index the row keys.
pub fn sort_and_filter<R: Row>(
    rows: &[R],
    columns: &[Column],
    sort_by: Option<&Expression>,
    order: SortOrder,
    var: &str,
    row_key: Option<&Expression>,
) -> Result<(Vec<usize>, RowMap), SheetError> {
    let filtered = filter_rows(rows, columns, var);
    let sorted = match sort_by {
        Some(expr) => sort_rows(rows, filtered, expr, order, var),
        None => filtered,
    };
    let row_map = RowMap::build(rows, &sorted, var, row_key)?;
    Ok((sorted, row_map))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gridsheet_core::RowKey;
    use serde_json::{json, Value};

    fn field(path: &str) -> Expression {
        Expression::field("row", path)
    }

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Banana", "qty": 3}),
            json!({"id": 2, "name": "Abacus", "qty": null}),
            json!({"id": 3, "name": "cherry", "qty": 1}),
            json!({"id": 4, "qty": 3}),
        ]
    }

    fn name_column(filter: &str) -> Column {
        Column::new("Name", field("name"))
            .with_filter_by(field("name"))
            .with_filter_value(filter)
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Descending".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert_eq!("unsorted".parse::<SortOrder>(), Ok(SortOrder::Unsorted));
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let cols = vec![name_column("")];
        assert_eq!(filter_rows(&rows(), &cols, "row"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let cols = vec![name_column("AB")];
        assert_eq!(filter_rows(&rows(), &cols, "row"), vec![1]);
    }

    #[test]
    fn test_filter_null_source_excluded() {
        let cols = vec![name_column("a")];
        // row 3 has no name
        assert_eq!(filter_rows(&rows(), &cols, "row"), vec![0, 1]);
    }

    #[test]
    fn test_filter_without_filter_by_matches_nothing() {
        // filters read `filter_by` only, never the cell value
        let cols = vec![Column::new("Name", field("name")).with_filter_value("an")];
        assert!(filter_rows(&rows(), &cols, "row").is_empty());
        let cols = vec![Column::new("Name", field("name")).with_filter_value("")];
        assert_eq!(filter_rows(&rows(), &cols, "row"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filter_all_columns_must_match() {
        let qty = Column::new("Qty", field("qty"))
            .with_filter_by(field("qty"))
            .with_filter_value("3");
        let cols = vec![name_column("an"), qty];
        assert_eq!(filter_rows(&rows(), &cols, "row"), vec![0]);
    }

    #[test]
    fn test_sort_ascending_nulls_last() {
        let sorted = sort_rows(&rows(), vec![0, 1, 2, 3], &field("qty"), SortOrder::Ascending, "row");
        assert_eq!(sorted, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_sort_descending_stable_nulls_last() {
        let sorted = sort_rows(&rows(), vec![0, 1, 2, 3], &field("qty"), SortOrder::Descending, "row");
        // 0 and 3 tie on qty=3 and keep their filtered order
        assert_eq!(sorted, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_sort_text_ignores_case() {
        let sorted = sort_rows(&rows(), vec![0, 1, 2], &field("name"), SortOrder::Ascending, "row");
        assert_eq!(sorted, vec![1, 0, 2]);
    }

    #[test]
    fn test_unsorted_keeps_filtered_order() {
        let sorted = sort_rows(&rows(), vec![3, 1, 0], &field("qty"), SortOrder::Unsorted, "row");
        assert_eq!(sorted, vec![3, 1, 0]);
    }

    #[test]
    fn test_type_rank() {
        let mut values = vec![
            SortValue::Bool(false),
            SortValue::Text("a".into()),
            SortValue::Number(OrderedFloat(9.0)),
        ];
        values.sort();
        assert!(matches!(values[0], SortValue::Number(_)));
        assert!(matches!(values[2], SortValue::Bool(_)));
    }

    #[test]
    fn test_sort_and_filter_rebuilds_row_map() {
        let cols = vec![name_column("r")];
        let key = field("id");
        let (sorted, map) = sort_and_filter(
            &rows(),
            &cols,
            Some(&field("name")),
            SortOrder::Descending,
            "row",
            Some(&key),
        )
        .unwrap();
        // "Banana" has no "r"; "cherry" does
        assert_eq!(sorted, vec![2]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entry(&RowKey::Int(3)).unwrap().sorted_index, 0);
    }
}
