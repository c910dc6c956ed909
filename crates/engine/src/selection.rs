//! Multi-range selection
//!
//! The committed selection is the active range (the one being drawn) plus
//! the extended ranges kept from earlier additive selections. Row selectors
//! add a separate set of checked rows.
//!
//! Key invariants:
//! - In multi-range mode no two committed ranges intersect: a new range
//!   removes every extended range it touches before it is committed
//! - Equalization rewrites all ranges inside one deferred-update scope and
//!   emits at most one SelectionChanged event
//! - Derived views (all selections, selected rows, row data) never mutate,
//!   except the by-cell-range row count, which equalizes first
//! - A checked row is left out of the derived views when an explicit range
//!   already contains it

use std::collections::BTreeSet;

use gridkit_core::{CellRange, CellValue, RowId, SelectionMode};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::events::{EventCollector, GridEvent, SelectionChangedEvent};
use crate::host::GridHost;

// ============================================================================
// Derived data
// ============================================================================

/// One selected cell of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingValue {
    pub binding: String,
    pub value: CellValue,
}

/// Selected cells of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowData {
    pub row_index: usize,
    pub row_id: Option<RowId>,
    pub selected: Vec<BindingValue>,
}

// ============================================================================
// Selection state
// ============================================================================

#[derive(Debug)]
pub struct Selection {
    mode: SelectionMode,
    has_selectors: bool,
    active: Option<CellRange>,
    /// Where the active range was started.
    anchor: (usize, usize),
    /// Cursor cell: where the active range was last extended to.
    cursor: (usize, usize),
    extended: Vec<CellRange>,
    checked_rows: BTreeSet<usize>,
    defer_depth: usize,
    dirty: bool,
    events: EventCollector,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Selection {
    /// Multi-range selection, with or without a row selector column.
    pub fn new(has_selectors: bool) -> Self {
        Self {
            mode: SelectionMode::MultiRange,
            has_selectors,
            active: None,
            anchor: (0, 0),
            cursor: (0, 0),
            extended: Vec::new(),
            checked_rows: BTreeSet::new(),
            defer_depth: 0,
            dirty: false,
            events: EventCollector::new(),
        }
    }

    pub fn with_mode(has_selectors: bool, mode: SelectionMode) -> Result<Self, GridError> {
        let mut selection = Self::new(has_selectors);
        selection.set_mode(mode)?;
        selection.events.clear();
        Ok(selection)
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn has_selectors(&self) -> bool {
        self.has_selectors
    }

    /// Switch selection mode.
    ///
    /// Row-based modes are rejected. Switching to `None` drops everything;
    /// leaving multi-range mode drops the extended ranges.
    pub fn set_mode(&mut self, mode: SelectionMode) -> Result<(), GridError> {
        if !mode.is_supported() {
            log::warn!("selection: unsupported selection mode '{mode}'");
            return Err(GridError::UnsupportedSelectionMode(mode));
        }
        if mode == self.mode {
            return Ok(());
        }
        self.mode = mode;
        match mode {
            SelectionMode::None => {
                self.active = None;
                self.extended.clear();
                self.checked_rows.clear();
            }
            SelectionMode::Cell => {
                self.extended.clear();
                if self.active.is_some() {
                    self.active = Some(CellRange::single(self.cursor.0, self.cursor.1));
                    self.anchor = self.cursor;
                }
            }
            SelectionMode::MultiRange => {}
            _ => self.extended.clear(),
        }
        self.changed();
        Ok(())
    }

    /// Toggle the row selector column.
    pub fn set_has_selectors(&mut self, has_selectors: bool) {
        self.has_selectors = has_selectors;
        if !has_selectors && !self.checked_rows.is_empty() {
            self.checked_rows.clear();
            self.changed();
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Hook run before a range is committed: in multi-range mode every
    /// extended range intersecting `range` is dropped. Returns how many.
    pub fn selection_changing(&mut self, range: &CellRange) -> usize {
        if self.mode != SelectionMode::MultiRange {
            return 0;
        }
        let before = self.extended.len();
        self.extended.retain(|r| !r.intersects(range));
        before - self.extended.len()
    }

    /// Select a range. `additive` keeps the current ranges (ctrl+click) in
    /// multi-range mode and is ignored in the other modes.
    pub fn select(&mut self, range: CellRange, additive: bool) {
        let range = match self.mode {
            SelectionMode::None => {
                log::debug!("selection: select ignored in mode 'none'");
                return;
            }
            SelectionMode::Cell => CellRange::single(range.top_row, range.left_col),
            _ => range,
        };

        if self.mode == SelectionMode::MultiRange && additive {
            if let Some(previous) = self.active.take() {
                self.extended.push(previous);
            }
        } else {
            self.extended.clear();
        }
        self.selection_changing(&range);

        self.active = Some(range);
        self.anchor = (range.top_row, range.left_col);
        self.cursor = self.anchor;
        self.changed();
    }

    /// Drag the active range from its anchor to `(row, col)`.
    pub fn extend_active(&mut self, row: usize, col: usize) {
        if self.active.is_none() {
            return;
        }
        let range = match self.mode {
            SelectionMode::None => return,
            SelectionMode::Cell => CellRange::single(row, col),
            _ => CellRange::new(self.anchor.0, self.anchor.1, row, col),
        };
        self.selection_changing(&range);
        self.active = Some(range);
        self.cursor = (row, col);
        self.changed();
    }

    /// Focus the first cell of `row`, replacing the selection.
    pub fn select_and_focus_first_cell(&mut self, row: usize) {
        self.select(CellRange::single(row, 0), false);
    }

    /// Check or uncheck a row through its selector. No-op without selectors.
    pub fn set_row_checked(&mut self, row: usize, checked: bool) {
        if !self.has_selectors {
            log::debug!("selection: row {row} checked without row selectors, ignored");
            return;
        }
        let changed = if checked {
            self.checked_rows.insert(row)
        } else {
            self.checked_rows.remove(&row)
        };
        if changed {
            self.changed();
        }
    }

    pub fn is_row_checked(&self, row: usize) -> bool {
        self.checked_rows.contains(&row)
    }

    pub fn checked_rows(&self) -> Vec<usize> {
        self.checked_rows.iter().copied().collect()
    }

    /// Drop every range and every checked row.
    pub fn clear(&mut self) {
        if self.active.is_none() && self.extended.is_empty() && self.checked_rows.is_empty() {
            return;
        }
        self.active = None;
        self.extended.clear();
        self.checked_rows.clear();
        self.changed();
    }

    // ------------------------------------------------------------------------
    // Deferred update and events
    // ------------------------------------------------------------------------

    /// Run `f` with change notifications suspended; fire at most one
    /// SelectionChanged when the outermost scope ends.
    pub fn defer_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.defer_depth += 1;
        let result = f(self);
        self.defer_depth -= 1;
        if self.defer_depth == 0 && self.dirty {
            self.dirty = false;
            self.emit_changed();
        }
        result
    }

    fn changed(&mut self) {
        if self.defer_depth > 0 {
            self.dirty = true;
        } else {
            self.emit_changed();
        }
    }

    fn emit_changed(&mut self) {
        let ranges = self.selected_ranges();
        self.events
            .push(GridEvent::SelectionChanged(SelectionChangedEvent { ranges }));
    }

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Committed ranges, active first.
    pub fn selected_ranges(&self) -> Vec<CellRange> {
        self.active.iter().chain(self.extended.iter()).copied().collect()
    }

    pub fn active_range(&self) -> Option<CellRange> {
        self.active
    }

    /// Cursor cell of the active range.
    pub fn active_cell(&self) -> Option<CellRange> {
        self.active
            .map(|_| CellRange::single(self.cursor.0, self.cursor.1))
    }

    pub fn has_valid_selection(&self) -> bool {
        self.active.is_some()
    }

    /// Checked rows not covered by an explicit range (as full-width ranges),
    /// followed by the committed ranges.
    pub fn all_selections(&self, host: &dyn GridHost) -> Vec<CellRange> {
        let ranges = self.selected_ranges();
        let col_count = host.column_count();
        if col_count == 0 {
            return ranges;
        }
        let mut all: Vec<CellRange> = self
            .checked_rows
            .iter()
            .map(|&row| CellRange::full_rows(row, row, col_count))
            .filter(|checked| !ranges.iter().any(|r| r.contains_range(checked)))
            .collect();
        all.extend(ranges);
        all
    }

    /// True iff any selection intersects `range`.
    pub fn contains(&self, host: &dyn GridHost, range: &CellRange) -> bool {
        self.all_selections(host).iter().any(|r| r.intersects(range))
    }

    /// Stretch every committed range to the common column span and merge the
    /// ones that then overlap. Returns the committed ranges sorted by bottom
    /// row, then top row.
    ///
    /// Outside multi-range mode this is a no-op returning the active range.
    pub fn equalize_selection(&mut self, host: &dyn GridHost) -> Vec<CellRange> {
        if self.mode != SelectionMode::MultiRange {
            log::debug!("selection: equalize ignored in mode '{}'", self.mode);
            return self.active.into_iter().collect();
        }

        let all = self.all_selections(host);
        let (Some(left), Some(right)) = (
            all.iter().map(|r| r.left_col).min(),
            all.iter().map(|r| r.right_col).max(),
        ) else {
            return Vec::new();
        };

        self.defer_update(|sel| {
            let before = sel.selected_ranges();
            let has_active = sel.active.is_some();
            let mut ranges: Vec<CellRange> = before.iter().map(|r| r.with_columns(left, right)).collect();
            merge_overlapping(&mut ranges);

            if ranges != before {
                let mut ranges = ranges.into_iter();
                if has_active {
                    sel.active = ranges.next();
                }
                sel.extended = ranges.collect();
                sel.changed();
            }
        });

        let mut ranges = self.selected_ranges();
        ranges.sort_by_key(|r| (r.bottom_row, r.top_row));
        ranges
    }

    /// Full-width selected rows, in selection order, without duplicates.
    pub fn get_selected_rows(&self, host: &dyn GridHost) -> Vec<usize> {
        let col_count = host.column_count();
        let mut seen = BTreeSet::new();
        self.all_selections(host)
            .iter()
            .filter(|r| r.is_full_width(col_count))
            .flat_map(|r| r.rows())
            .filter(|row| seen.insert(*row))
            .collect()
    }

    pub fn get_selected_rows_count(&self, host: &dyn GridHost) -> usize {
        self.get_selected_rows(host).len()
    }

    pub fn has_selected_rows(&self, host: &dyn GridHost) -> bool {
        !self.get_selected_rows(host).is_empty()
    }

    /// Rows touched by any selection, counted once each. Equalizes first so
    /// a row split across two column blocks is not counted twice.
    pub fn get_selected_rows_count_by_cell_range(&mut self, host: &dyn GridHost) -> usize {
        self.equalize_selection(host);
        self.all_selections(host).iter().map(|r| r.row_count()).sum()
    }

    /// Every visible column of each full-width selected row.
    pub fn get_selected_rows_data(&self, host: &dyn GridHost) -> Vec<RowData> {
        let visible: Vec<usize> = (0..host.column_count())
            .filter(|&col| host.is_column_visible(col))
            .collect();
        self.get_selected_rows(host)
            .into_iter()
            .filter(|&row| row < host.row_count())
            .map(|row| RowData {
                row_index: row,
                row_id: host.row_id(row),
                selected: binding_values(host, row, &visible),
            })
            .collect()
    }

    /// Selected cells grouped by row: one record per row, in the order rows
    /// are first reached; each binding listed once; hidden columns skipped.
    pub fn get_all_selections_data(&self, host: &dyn GridHost) -> Vec<RowData> {
        let mut records: Vec<RowData> = Vec::new();
        let mut by_row: FxHashMap<usize, (usize, BTreeSet<usize>)> = FxHashMap::default();
        let row_count = host.row_count();
        let col_count = host.column_count();

        for range in self.all_selections(host) {
            let cols: Vec<usize> = range
                .cols()
                .filter(|&col| col < col_count && host.is_column_visible(col))
                .collect();
            for row in range.rows().filter(|&row| row < row_count) {
                let (index, seen) = by_row.entry(row).or_insert_with(|| {
                    records.push(RowData {
                        row_index: row,
                        row_id: host.row_id(row),
                        selected: Vec::new(),
                    });
                    (records.len() - 1, BTreeSet::new())
                });
                let fresh: Vec<usize> = cols.iter().copied().filter(|col| seen.insert(*col)).collect();
                records[*index].selected.extend(binding_values(host, row, &fresh));
            }
        }
        records
    }
}

fn binding_values(host: &dyn GridHost, row: usize, cols: &[usize]) -> Vec<BindingValue> {
    cols.iter()
        .filter_map(|&col| {
            host.column_binding(col).map(|binding| BindingValue {
                binding: binding.to_string(),
                value: host.cell_data(row, col),
            })
        })
        .collect()
}

/// Merge intersecting ranges until none intersect. A range absorbs the ones
/// after it, so the first range is never removed.
fn merge_overlapping(ranges: &mut Vec<CellRange>) {
    loop {
        let mut merged = false;
        let mut i = 0;
        while i < ranges.len() {
            let mut j = i + 1;
            while j < ranges.len() {
                if ranges[i].intersects(&ranges[j]) {
                    ranges[i] = ranges[i].combine(&ranges[j]);
                    ranges.remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !merged {
            break;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
