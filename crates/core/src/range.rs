use serde::{Deserialize, Serialize};

/// A rectangular range of cells, inclusive on both ends.
///
/// Always normalized: `top_row <= bottom_row` and `left_col <= right_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRange")]
pub struct CellRange {
    pub top_row: usize,
    pub left_col: usize,
    pub bottom_row: usize,
    pub right_col: usize,
}

/// Wire shape of a range as the host sends it; corners may come in any order.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRange {
    top_row: usize,
    left_col: usize,
    bottom_row: usize,
    right_col: usize,
}

impl From<RawRange> for CellRange {
    fn from(raw: RawRange) -> Self {
        CellRange::new(raw.top_row, raw.left_col, raw.bottom_row, raw.right_col)
    }
}

impl CellRange {
    /// Create a new range, automatically normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            top_row: r1.min(r2),
            left_col: c1.min(c2),
            bottom_row: r1.max(r2),
            right_col: c1.max(c2),
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Rows `top..=bottom` across every one of `col_count` columns.
    ///
    /// `col_count` must be at least 1.
    pub fn full_rows(top: usize, bottom: usize, col_count: usize) -> Self {
        Self::new(top, 0, bottom, col_count.saturating_sub(1))
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top_row && row <= self.bottom_row &&
        col >= self.left_col && col <= self.right_col
    }

    /// Check if `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(other.top_row, other.left_col) && self.contains(other.bottom_row, other.right_col)
    }

    /// Check if this range shares at least one cell with another range.
    pub fn intersects(&self, other: &CellRange) -> bool {
        !(self.bottom_row < other.top_row
            || self.top_row > other.bottom_row
            || self.right_col < other.left_col
            || self.left_col > other.right_col)
    }

    /// Smallest range covering both ranges.
    pub fn combine(&self, other: &CellRange) -> CellRange {
        CellRange {
            top_row: self.top_row.min(other.top_row),
            left_col: self.left_col.min(other.left_col),
            bottom_row: self.bottom_row.max(other.bottom_row),
            right_col: self.right_col.max(other.right_col),
        }
    }

    /// Same rows, stretched (or shrunk) to the given column span.
    pub fn with_columns(&self, left: usize, right: usize) -> CellRange {
        CellRange::new(self.top_row, left, self.bottom_row, right)
    }

    /// Check if the range spans every one of `col_count` columns.
    pub fn is_full_width(&self, col_count: usize) -> bool {
        col_count > 0 && self.left_col == 0 && self.right_col == col_count - 1
    }

    pub fn row_count(&self) -> usize {
        self.bottom_row - self.top_row + 1
    }

    pub fn col_count(&self) -> usize {
        self.right_col - self.left_col + 1
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// Row indices covered by this range, top to bottom.
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.top_row..=self.bottom_row
    }

    /// Column indices covered by this range, left to right.
    pub fn cols(&self) -> std::ops::RangeInclusive<usize> {
        self.left_col..=self.right_col
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let cols = self.cols();
        self.rows().flat_map(move |r| cols.clone().map(move |c| (r, c)))
    }

    /// Check if this is a single cell.
    pub fn is_single(&self) -> bool {
        self.top_row == self.bottom_row && self.left_col == self.right_col
    }
}
