//! Contracts with the rendering collaborator.
//!
//! The features never paint and never own row data. Whatever widget renders
//! the grid implements `GridHost` (identity resolution, cell data, column
//! metadata) and `StyleSink` (class toggling). The features are called by the
//! host on each notification and call back through these traits.

use gridkit_core::{CellValue, ColumnType, RowId};

/// Read/write access to the grid as currently displayed.
///
/// Row and column indices are display positions (after sort, filter, paging).
pub trait GridHost {
    /// Number of rows currently displayed.
    fn row_count(&self) -> usize;

    /// Number of columns, visible or not.
    fn column_count(&self) -> usize;

    /// Identity of the data item displayed at `row`.
    fn row_id(&self, row: usize) -> Option<RowId>;

    /// Binding of the column at `col`.
    fn column_binding(&self, col: usize) -> Option<&str>;

    /// Type of the column at `col`.
    fn column_type(&self, col: usize) -> ColumnType {
        let _ = col;
        ColumnType::Text
    }

    fn is_column_visible(&self, col: usize) -> bool {
        col < self.column_count()
    }

    /// Position of the column bound to `binding`.
    fn column_index(&self, binding: &str) -> Option<usize> {
        (0..self.column_count()).find(|&col| self.column_binding(col) == Some(binding))
    }

    fn cell_data(&self, row: usize, col: usize) -> CellValue;

    fn set_cell_data(&mut self, row: usize, col: usize, value: CellValue);
}

/// Style-class primitives applied by conditional formatting.
///
/// Implementations must only record the class change. Triggering a repaint
/// from here would re-enter the format pass that is calling us.
pub trait StyleSink {
    fn add_row_class(&mut self, row: RowId, class: &str);
    fn remove_row_class(&mut self, row: RowId, class: &str);
    fn add_cell_class(&mut self, row: RowId, binding: &str, class: &str);
    fn remove_cell_class(&mut self, row: RowId, binding: &str, class: &str);
}

/// Repaint requested by a mutation. The host polls and consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repaint {
    /// Nothing visible changed.
    #[default]
    None,
    /// Only this row's cells and header need repainting.
    Row(RowId),
    /// Repaint the whole grid.
    Full,
}

impl Repaint {
    /// Combine two requests into the smallest one covering both.
    pub fn merge(self, other: Repaint) -> Repaint {
        match (self, other) {
            (Repaint::None, r) | (r, Repaint::None) => r,
            (Repaint::Row(a), Repaint::Row(b)) if a == b => Repaint::Row(a),
            _ => Repaint::Full,
        }
    }

    pub fn is_needed(&self) -> bool {
        !matches!(self, Repaint::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repaint_merge() {
        let a = RowId::from_raw(1);
        let b = RowId::from_raw(2);

        assert_eq!(Repaint::None.merge(Repaint::None), Repaint::None);
        assert_eq!(Repaint::None.merge(Repaint::Row(a)), Repaint::Row(a));
        assert_eq!(Repaint::Row(a).merge(Repaint::Row(a)), Repaint::Row(a));
        assert_eq!(Repaint::Row(a).merge(Repaint::Row(b)), Repaint::Full);
        assert_eq!(Repaint::Full.merge(Repaint::None), Repaint::Full);
        assert!(!Repaint::None.is_needed());
    }
}
