// Property-based tests for the multi-range selection invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use gridkit_core::{CellRange, CellValue, ColumnType};
use gridkit_engine::{MemoryGrid, Selection};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const ROWS: usize = 30;
const COLS: usize = 8;

fn grid() -> MemoryGrid {
    let mut grid = MemoryGrid::new();
    for c in 0..COLS {
        grid.add_column(&format!("C{c}"), ColumnType::Number);
    }
    for r in 0..ROWS {
        grid.push_row((0..COLS).map(|c| CellValue::from((r * COLS + c) as i64)).collect());
    }
    grid
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_range() -> impl Strategy<Value = CellRange> {
    (0..ROWS, 0..COLS, 0..ROWS, 0..COLS).prop_map(|(r1, c1, r2, c2)| CellRange::new(r1, c1, r2, c2))
}

/// User input: a range plus whether ctrl was held.
fn arb_clicks() -> impl Strategy<Value = Vec<(CellRange, bool)>> {
    prop::collection::vec((arb_range(), prop::bool::weighted(0.8)), 1..12)
}

/// Rows ticked through the selector column.
fn arb_checked() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..ROWS, 0..8)
}

fn select_all(clicks: &[(CellRange, bool)]) -> Selection {
    let mut selection = Selection::new(false);
    for (range, additive) in clicks {
        selection.select(*range, *additive);
    }
    selection
}

fn select_all_with_checks(clicks: &[(CellRange, bool)], checked: &[usize]) -> Selection {
    let mut selection = Selection::new(true);
    for (range, additive) in clicks {
        selection.select(*range, *additive);
    }
    for row in checked {
        selection.set_row_checked(*row, true);
    }
    selection
}

fn no_two_intersect(ranges: &[CellRange]) -> bool {
    ranges
        .iter()
        .enumerate()
        .all(|(i, a)| ranges[i + 1..].iter().all(|b| !a.intersects(b)))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn committed_ranges_never_overlap(clicks in arb_clicks()) {
        let selection = select_all(&clicks);
        prop_assert!(no_two_intersect(&selection.selected_ranges()));
    }

    #[test]
    fn drag_keeps_ranges_disjoint(clicks in arb_clicks(), row in 0..ROWS, col in 0..COLS) {
        let mut selection = select_all(&clicks);
        selection.extend_active(row, col);
        prop_assert!(no_two_intersect(&selection.selected_ranges()));
    }

    #[test]
    fn equalize_is_idempotent(clicks in arb_clicks()) {
        let host = grid();
        let mut selection = select_all(&clicks);

        let once = selection.equalize_selection(&host);
        let twice = selection.equalize_selection(&host);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn equalized_ranges_share_columns_and_are_disjoint(clicks in arb_clicks()) {
        let host = grid();
        let mut selection = select_all(&clicks);

        let ranges = selection.equalize_selection(&host);

        prop_assert!(no_two_intersect(&ranges));
        let spans: BTreeSet<(usize, usize)> = ranges.iter().map(|r| (r.left_col, r.right_col)).collect();
        prop_assert!(spans.len() <= 1);
        prop_assert!(ranges.windows(2).all(|w| (w[0].bottom_row, w[0].top_row) <= (w[1].bottom_row, w[1].top_row)));
    }

    #[test]
    fn count_by_cell_range_matches_distinct_rows(clicks in arb_clicks()) {
        let host = grid();
        let mut selection = select_all(&clicks);

        let count = selection.get_selected_rows_count_by_cell_range(&host);

        let distinct: BTreeSet<usize> = selection
            .all_selections(&host)
            .iter()
            .flat_map(|r| r.rows())
            .collect();
        prop_assert_eq!(count, distinct.len());
    }

    #[test]
    fn count_by_cell_range_matches_distinct_rows_with_checked_rows(
        clicks in arb_clicks(),
        checked in arb_checked(),
    ) {
        let host = grid();
        let mut selection = select_all_with_checks(&clicks, &checked);

        let count = selection.get_selected_rows_count_by_cell_range(&host);

        let distinct: BTreeSet<usize> = selection
            .all_selections(&host)
            .iter()
            .flat_map(|r| r.rows())
            .collect();
        prop_assert_eq!(count, distinct.len());
        prop_assert!(checked.iter().all(|row| distinct.contains(row)));
    }

    #[test]
    fn equalize_with_checked_rows_is_idempotent_and_disjoint(
        clicks in arb_clicks(),
        checked in arb_checked(),
    ) {
        let host = grid();
        let mut selection = select_all_with_checks(&clicks, &checked);

        let once = selection.equalize_selection(&host);
        let twice = selection.equalize_selection(&host);

        prop_assert!(no_two_intersect(&once));
        let spans: BTreeSet<(usize, usize)> = once.iter().map(|r| (r.left_col, r.right_col)).collect();
        prop_assert!(spans.len() <= 1);
        prop_assert_eq!(once, twice);
    }
}
