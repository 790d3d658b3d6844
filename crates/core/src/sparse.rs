//! Sparse per-cell maps keyed by view position.

use std::collections::BTreeMap;

/// Values for a few cells of the rendered grid, keyed by
/// `(sorted_row, visible_col)`.
///
/// Iteration is in row-major order so anything serialized from it is
/// deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseCellMap<T> {
    cells: BTreeMap<(usize, usize), T>,
}

impl<T> Default for SparseCellMap<T> {
    fn default() -> Self {
        Self { cells: BTreeMap::new() }
    }
}

impl<T> SparseCellMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the cell.
    pub fn insert(&mut self, row: usize, col: usize, value: T) {
        self.cells.insert((row, col), value);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.cells.get(&(row, col))
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_order() {
        let mut map = SparseCellMap::new();
        map.insert(2, 0, "c");
        map.insert(0, 3, "b");
        map.insert(0, 1, "a");

        let order: Vec<_> = map.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(map.get(0, 3), Some(&"b"));
        assert_eq!(map.len(), 3);
    }
}
