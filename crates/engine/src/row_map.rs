//! Row key index.
//!
//! Maps each row key to the row's position in the source collection and its
//! position in the current sorted/filtered view. Rebuilt on every
//! sort/filter pass; entries from an earlier pass are never kept.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use gridsheet_core::RowKey;

use crate::error::SheetError;
use crate::expr::{EvalContext, Expression, Row};

/// Where a keyed row lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMapEntry {
    /// Index into the sheet's row collection.
    pub source_index: usize,
    /// Position in the sorted/filtered view.
    pub sorted_index: usize,
}

/// Row key of the row bound in `ctx`.
///
/// Fatal when no key expression is configured or the key evaluates to null.
pub fn row_key_of<R: Row>(
    ctx: &EvalContext<'_, R>,
    row_key: Option<&Expression>,
) -> Result<RowKey, SheetError> {
    let expr = row_key.ok_or(SheetError::MissingRowKey)?;
    RowKey::from_value(&ctx.eval(expr)).ok_or(SheetError::NullRowKey {
        row: ctx.row_index().unwrap_or_default(),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: FxHashMap<RowKey, RowMapEntry>,
}

impl RowMap {
    /// Index the sorted view.
    ///
    /// Keys are assumed unique; a duplicate key overwrites the earlier row.
    pub fn build<R: Row>(
        rows: &[R],
        sorted: &[usize],
        var: &str,
        row_key: Option<&Expression>,
    ) -> Result<Self, SheetError> {
        let mut entries = FxHashMap::default();
        entries.reserve(sorted.len());
        let mut ctx = EvalContext::new(var);
        for (sorted_index, &source_index) in sorted.iter().enumerate() {
            let bound = ctx.bind(&rows[source_index], sorted_index);
            let key = row_key_of(&bound, row_key)?;
            entries.insert(key, RowMapEntry { source_index, sorted_index });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &RowKey) -> Option<&RowMapEntry> {
        self.entries.get(key)
    }

    /// Like `get`, but an unknown key is an error.
    pub fn entry(&self, key: &RowKey) -> Result<RowMapEntry, SheetError> {
        self.entries
            .get(key)
            .copied()
            .ok_or_else(|| SheetError::UnknownRowKey(key.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, &RowMapEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn from_entries(entries: Vec<(RowKey, RowMapEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Entries ordered by sorted position.
    pub(crate) fn to_entries(&self) -> Vec<(RowKey, RowMapEntry)> {
        let mut out: Vec<_> = self.entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by_key(|(_, e)| e.sorted_index);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> Expression {
        Expression::field("row", "id")
    }

    #[test]
    fn test_build_maps_sorted_positions() {
        let rows = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let map = RowMap::build(&rows, &[2, 0, 1], "row", Some(&key())).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.entry(&RowKey::Int(3)).unwrap(),
            RowMapEntry { source_index: 2, sorted_index: 0 }
        );
        assert_eq!(map.get(&RowKey::Int(2)).map(|e| e.sorted_index), Some(2));
    }

    #[test]
    fn test_duplicate_keys_second_overwrites_first() {
        let rows = vec![json!({"id": 7, "n": "a"}), json!({"id": 7, "n": "b"})];
        let map = RowMap::build(&rows, &[0, 1], "row", Some(&key())).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.entry(&RowKey::Int(7)).unwrap().source_index, 1);
    }

    #[test]
    fn test_missing_key_expression_is_fatal() {
        let rows = vec![json!({"id": 1})];
        assert_eq!(RowMap::build(&rows, &[0], "row", None), Err(SheetError::MissingRowKey));
    }

    #[test]
    fn test_null_key_is_fatal() {
        let rows = vec![json!({"id": 1}), json!({"name": "x"})];
        let err = RowMap::build(&rows, &[0, 1], "row", Some(&key())).unwrap_err();
        assert_eq!(err, SheetError::NullRowKey { row: 1 });
    }

    #[test]
    fn test_unknown_key() {
        let map = RowMap::default();
        assert_eq!(
            map.entry(&RowKey::from("x")),
            Err(SheetError::UnknownRowKey(RowKey::from("x")))
        );
    }
}
