//! In-memory grid host.
//!
//! `MemoryGrid` implements both host contracts over plain vectors. It stands
//! in for the rendering widget in headless use and in tests: rows can be
//! pushed, removed and reordered (to mimic sort/filter), and every style class
//! the features toggle is recorded for inspection.

use std::collections::BTreeSet;

use gridkit_core::{CellValue, ColumnType, RowId};
use rustc_hash::FxHashMap;

use crate::host::{GridHost, StyleSink};

#[derive(Debug, Clone)]
struct MemoryColumn {
    binding: String,
    column_type: ColumnType,
    visible: bool,
}

#[derive(Debug, Clone)]
struct MemoryRow {
    id: RowId,
    cells: Vec<CellValue>,
}

/// Vector-backed grid with recorded style classes.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    columns: Vec<MemoryColumn>,
    rows: Vec<MemoryRow>,
    next_id: u64,
    row_classes: FxHashMap<RowId, BTreeSet<String>>,
    cell_classes: FxHashMap<(RowId, String), BTreeSet<String>>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visible column. Returns its index.
    pub fn add_column(&mut self, binding: &str, column_type: ColumnType) -> usize {
        self.columns.push(MemoryColumn {
            binding: binding.to_string(),
            column_type,
            visible: true,
        });
        for row in &mut self.rows {
            row.cells.push(CellValue::Empty);
        }
        self.columns.len() - 1
    }

    pub fn set_column_visible(&mut self, col: usize, visible: bool) {
        if let Some(column) = self.columns.get_mut(col) {
            column.visible = visible;
        }
    }

    /// Append a row. Missing trailing cells are empty, extra cells are dropped.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) -> RowId {
        cells.resize(self.columns.len(), CellValue::Empty);
        self.next_id += 1;
        let id = RowId::from_raw(self.next_id);
        self.rows.push(MemoryRow { id, cells });
        id
    }

    /// Remove the row at a display position, with its recorded classes.
    pub fn remove_row(&mut self, row: usize) -> Option<RowId> {
        if row >= self.rows.len() {
            return None;
        }
        let id = self.rows.remove(row).id;
        self.row_classes.remove(&id);
        self.cell_classes.retain(|(row_id, _), _| *row_id != id);
        Some(id)
    }

    /// Move a row to another display position (what a sort does to it).
    pub fn move_row(&mut self, from: usize, to: usize) {
        if from >= self.rows.len() || to >= self.rows.len() {
            return;
        }
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
    }

    /// Display position of a row.
    pub fn row_index(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn row_classes(&self, row: RowId) -> Vec<&str> {
        self.row_classes
            .get(&row)
            .map(|classes| classes.iter().map(|c| c.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn cell_classes(&self, row: RowId, binding: &str) -> Vec<&str> {
        self.cell_classes
            .get(&(row, binding.to_string()))
            .map(|classes| classes.iter().map(|c| c.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_row_class(&self, row: RowId, class: &str) -> bool {
        self.row_classes
            .get(&row)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn has_cell_class(&self, row: RowId, binding: &str, class: &str) -> bool {
        self.cell_classes
            .get(&(row, binding.to_string()))
            .is_some_and(|classes| classes.contains(class))
    }
}

impl GridHost for MemoryGrid {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn row_id(&self, row: usize) -> Option<RowId> {
        self.rows.get(row).map(|r| r.id)
    }

    fn column_binding(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(|c| c.binding.as_str())
    }

    fn column_type(&self, col: usize) -> ColumnType {
        self.columns
            .get(col)
            .map(|c| c.column_type)
            .unwrap_or_default()
    }

    fn is_column_visible(&self, col: usize) -> bool {
        self.columns.get(col).is_some_and(|c| c.visible)
    }

    fn cell_data(&self, row: usize, col: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(col))
            .cloned()
            .unwrap_or_default()
    }

    fn set_cell_data(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col)) {
            *cell = value;
        }
    }
}

impl StyleSink for MemoryGrid {
    fn add_row_class(&mut self, row: RowId, class: &str) {
        self.row_classes
            .entry(row)
            .or_default()
            .insert(class.to_string());
    }

    fn remove_row_class(&mut self, row: RowId, class: &str) {
        if let Some(classes) = self.row_classes.get_mut(&row) {
            classes.remove(class);
            if classes.is_empty() {
                self.row_classes.remove(&row);
            }
        }
    }

    fn add_cell_class(&mut self, row: RowId, binding: &str, class: &str) {
        self.cell_classes
            .entry((row, binding.to_string()))
            .or_default()
            .insert(class.to_string());
    }

    fn remove_cell_class(&mut self, row: RowId, binding: &str, class: &str) {
        let key = (row, binding.to_string());
        if let Some(classes) = self.cell_classes.get_mut(&key) {
            classes.remove(class);
            if classes.is_empty() {
                self.cell_classes.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_identity_when_moved() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Text);
        let first = grid.push_row(vec![CellValue::from("x")]);
        let second = grid.push_row(vec![CellValue::from("y")]);

        grid.move_row(1, 0);

        assert_eq!(grid.row_id(0), Some(second));
        assert_eq!(grid.row_id(1), Some(first));
        assert_eq!(grid.cell_data(0, 0), CellValue::from("y"));
    }

    #[test]
    fn test_add_column_pads_rows() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Text);
        grid.push_row(vec![CellValue::from("x")]);
        let col = grid.add_column("B", ColumnType::Number);

        assert_eq!(col, 1);
        assert_eq!(grid.cell_data(0, 1), CellValue::Empty);
        assert_eq!(grid.column_index("B"), Some(1));
    }

    #[test]
    fn test_style_classes() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Text);
        let id = grid.push_row(vec![]);

        grid.add_row_class(id, "warn");
        grid.add_cell_class(id, "A", "red");
        grid.add_cell_class(id, "A", "red");
        assert_eq!(grid.row_classes(id), vec!["warn"]);
        assert_eq!(grid.cell_classes(id, "A"), vec!["red"]);

        grid.remove_cell_class(id, "A", "red");
        grid.remove_row_class(id, "missing");
        assert!(!grid.has_cell_class(id, "A", "red"));
        assert!(grid.has_row_class(id, "warn"));
    }

    #[test]
    fn test_remove_row_drops_classes() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Text);
        let id = grid.push_row(vec![]);
        grid.add_row_class(id, "warn");

        assert_eq!(grid.remove_row(0), Some(id));
        assert!(grid.row_classes(id).is_empty());
        assert_eq!(grid.remove_row(0), None);
    }

    #[test]
    fn test_hidden_column() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Text);
        grid.set_column_visible(0, false);
        assert!(!grid.is_column_visible(0));
        assert!(!grid.is_column_visible(5));
    }
}
