//! Conditional formatting - declarative rules to style classes
//!
//! Each column binding owns an ordered list of condition groups. A group is
//! satisfied when all of its rules hold (AND). During a format pass the first
//! satisfied group wins: its row class and cell class are added, the classes
//! of every other group of that binding are removed.
//!
//! Key invariants:
//! - Registering rules for a binding replaces the previous list
//! - An unknown comparator never matches; it is not an error
//! - Class toggling only records; it never asks for a repaint
//! - Applied classes are tracked per row in the metadata store, so a refresh
//!   or a rule removal can withdraw them without another format pass

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, SecondsFormat};
use gridkit_core::value::{parse_datetime, trim_seconds};
use gridkit_core::{CellValue, ColumnType, RowId};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::host::{GridHost, Repaint, StyleSink};
use crate::metadata::{FeatureLabel, RowMetadataStore};

/// Metadata label owned by the conditional format feature.
pub const CONDITIONAL_FORMAT_LABEL: FeatureLabel = FeatureLabel::new("__conditionalFormatFeature");

/// Operands dated before this year stand for "no date set".
const NULL_DATE_YEAR: i32 = 1911;

// ============================================================================
// Rules
// ============================================================================

/// Comparison applied by one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Comparator {
    GreaterOrEqualsTo,
    GreaterThan,
    Equals,
    LessOrEqualsTo,
    LessThan,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    /// Anything we could not parse. Never matches.
    Unknown,
}

impl Comparator {
    /// Accepts symbols, the platform's enum names and kebab/lower names.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            ">=" | "GreaterOrEqualsTo" => Comparator::GreaterOrEqualsTo,
            ">" | "GreaterThan" => Comparator::GreaterThan,
            "=" | "==" | "===" | "Equals" => Comparator::Equals,
            "<=" | "LessOrEqualsTo" => Comparator::LessOrEqualsTo,
            "<" | "LessThan" => Comparator::LessThan,
            "!=" | "!==" | "<>" | "NotEquals" => Comparator::NotEquals,
            "contains" | "Contains" => Comparator::Contains,
            "not-contains" | "notcontains" | "NotContains" => Comparator::NotContains,
            "starts-with" | "startswith" | "StartsWith" => Comparator::StartsWith,
            "ends-with" | "endswith" | "EndsWith" => Comparator::EndsWith,
            _ => Comparator::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::GreaterOrEqualsTo => ">=",
            Comparator::GreaterThan => ">",
            Comparator::Equals => "===",
            Comparator::LessOrEqualsTo => "<=",
            Comparator::LessThan => "<",
            Comparator::NotEquals => "!==",
            Comparator::Contains => "contains",
            Comparator::NotContains => "not-contains",
            Comparator::StartsWith => "starts-with",
            Comparator::EndsWith => "ends-with",
            Comparator::Unknown => "unknown",
        }
    }

    fn is_relational(&self) -> bool {
        matches!(
            self,
            Comparator::GreaterOrEqualsTo
                | Comparator::GreaterThan
                | Comparator::Equals
                | Comparator::LessOrEqualsTo
                | Comparator::LessThan
                | Comparator::NotEquals
        )
    }
}

impl From<String> for Comparator {
    fn from(s: String) -> Self {
        Comparator::parse(&s)
    }
}

impl From<Comparator> for String {
    fn from(c: Comparator) -> Self {
        c.as_str().to_string()
    }
}

/// `{ "condition": ">=", "value": 10 }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    #[serde(rename = "condition")]
    pub comparator: Comparator,
    #[serde(default)]
    pub value: CellValue,
}

impl ConditionRule {
    pub fn new(comparator: Comparator, value: impl Into<CellValue>) -> Self {
        Self {
            comparator,
            value: value.into(),
        }
    }

    pub fn evaluate(&self, cell: &CellValue, column_type: ColumnType) -> bool {
        evaluate(self.comparator, &self.value, cell, column_type)
    }
}

/// Rules combined with AND, plus the classes they turn on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_class: Option<String>,
    #[serde(rename = "format", default)]
    pub rules: Vec<ConditionRule>,
}

impl ConditionGroup {
    pub fn new(rules: Vec<ConditionRule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    pub fn with_cell_class(mut self, class: &str) -> Self {
        self.cell_class = Some(class.to_string());
        self
    }

    pub fn with_row_class(mut self, class: &str) -> Self {
        self.row_class = Some(class.to_string());
        self
    }

    /// True iff every rule holds. A group without rules always holds.
    pub fn evaluate(&self, cell: &CellValue, column_type: ColumnType) -> bool {
        self.rules.iter().all(|rule| rule.evaluate(cell, column_type))
    }

    fn cell_class(&self) -> Option<&str> {
        self.cell_class.as_deref().filter(|c| !c.is_empty())
    }

    fn row_class(&self) -> Option<&str> {
        self.row_class.as_deref().filter(|c| !c.is_empty())
    }
}

/// Ordered groups of one column. First match wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnRuleSet {
    groups: Vec<ConditionGroup>,
}

impl ColumnRuleSet {
    pub fn new(groups: Vec<ConditionGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    /// Index of the first satisfied group.
    pub fn first_match(&self, cell: &CellValue, column_type: ColumnType) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.evaluate(cell, column_type))
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Typed key both sides of a relational rule are reduced to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum CompareKey {
    Number(OrderedFloat<f64>),
    Bool(bool),
    Text(String),
    /// Milliseconds since the epoch.
    Ticks(i64),
}

/// Evaluate one comparator against a cell value.
pub fn evaluate(
    comparator: Comparator,
    operand: &CellValue,
    cell: &CellValue,
    column_type: ColumnType,
) -> bool {
    match comparator {
        Comparator::Unknown => false,
        Comparator::Contains => contains_ignore_case(cell, operand),
        Comparator::NotContains => !contains_ignore_case(cell, operand),
        Comparator::StartsWith => cell.display_text().starts_with(&operand.display_text()),
        Comparator::EndsWith => cell.display_text().ends_with(&operand.display_text()),
        _ => {
            debug_assert!(comparator.is_relational());
            let ordering = compare(cell, operand, column_type);
            // Empty cells are never strictly equal to a value
            let strict_mismatch = cell.is_empty() != operand.is_empty();
            match comparator {
                Comparator::Equals => !strict_mismatch && ordering == Some(Ordering::Equal),
                Comparator::NotEquals => strict_mismatch || ordering != Some(Ordering::Equal),
                Comparator::GreaterOrEqualsTo => {
                    matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
                }
                Comparator::GreaterThan => ordering == Some(Ordering::Greater),
                Comparator::LessOrEqualsTo => {
                    matches!(ordering, Some(Ordering::Less | Ordering::Equal))
                }
                Comparator::LessThan => ordering == Some(Ordering::Less),
                _ => false,
            }
        }
    }
}

fn contains_ignore_case(cell: &CellValue, operand: &CellValue) -> bool {
    cell.display_text()
        .to_lowercase()
        .contains(&operand.display_text().to_lowercase())
}

/// Order `cell` against `operand`. `None` when the two can't be compared.
fn compare(cell: &CellValue, operand: &CellValue, column_type: ColumnType) -> Option<Ordering> {
    let (a, b) = compare_keys(cell, operand, column_type)?;
    Some(a.cmp(&b))
}

fn compare_keys(
    cell: &CellValue,
    operand: &CellValue,
    column_type: ColumnType,
) -> Option<(CompareKey, CompareKey)> {
    let temporal = matches!(cell, CellValue::Date(_) | CellValue::DateTime(_)) || column_type.is_temporal();
    if temporal {
        let (a, b) = date_ticks(cell, operand)?;
        return Some((CompareKey::Ticks(a), CompareKey::Ticks(b)));
    }

    match (cell, operand) {
        (CellValue::Bool(a), CellValue::Bool(b)) => Some((CompareKey::Bool(*a), CompareKey::Bool(*b))),
        (CellValue::Text(a), CellValue::Text(b)) => Some((CompareKey::Text(a.clone()), CompareKey::Text(b.clone()))),
        // A missing value orders like zero against numbers
        (CellValue::Empty, CellValue::Number(b)) => {
            Some((CompareKey::Number(OrderedFloat(0.0)), CompareKey::Number(OrderedFloat(*b))))
        }
        (CellValue::Empty, CellValue::Empty) => Some((CompareKey::Bool(false), CompareKey::Bool(false))),
        _ => {
            let a = cell.as_number()?;
            let b = operand.as_number()?;
            Some((CompareKey::Number(OrderedFloat(a)), CompareKey::Number(OrderedFloat(b))))
        }
    }
}

/// Both sides as epoch milliseconds.
///
/// An operand dated before 1911 is the host's "no date" sentinel. Its calendar
/// date is recombined with the cell's own time of day (seconds reset) before
/// conversion, so historical timezone offsets of such old dates don't skew the
/// comparison.
fn date_ticks(cell: &CellValue, operand: &CellValue) -> Option<(i64, i64)> {
    let cell_dt = cell.as_datetime()?;
    let mut operand_dt = operand.as_datetime()?;

    if operand_dt.year() < NULL_DATE_YEAR {
        let cell_iso = cell_dt.to_rfc3339_opts(SecondsFormat::Millis, true);
        let time_of_day = cell_iso.split_once('T').map(|(_, t)| t)?;
        let rebuilt = format!(
            "{:04}-{:02}-{:02}T{}",
            operand_dt.year(),
            operand_dt.month(),
            operand_dt.day(),
            time_of_day
        );
        operand_dt = parse_datetime(&trim_seconds(&rebuilt))?;
    }

    Some((cell_dt.timestamp_millis(), operand_dt.timestamp_millis()))
}

// ============================================================================
// Applied class tracking
// ============================================================================

/// Classes this feature has applied to one row, by the binding that applied them.
#[derive(Debug, Clone, Default, PartialEq)]
struct AppliedClasses {
    row: BTreeMap<String, BTreeSet<String>>,
    cell: BTreeMap<String, BTreeSet<String>>,
}

impl AppliedClasses {
    fn row_class_held_elsewhere(&self, binding: &str, class: &str) -> bool {
        self.row
            .iter()
            .any(|(b, classes)| b != binding && classes.contains(class))
    }

    fn is_empty(&self) -> bool {
        self.row.values().all(|c| c.is_empty()) && self.cell.values().all(|c| c.is_empty())
    }
}

// ============================================================================
// Feature
// ============================================================================

/// Rule registry plus the format pass.
#[derive(Debug, Clone, Default)]
pub struct ConditionalFormat {
    rules: FxHashMap<String, ColumnRuleSet>,
}

impl ConditionalFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rules of `binding`.
    ///
    /// With `refresh`, every class applied so far (any binding) is withdrawn
    /// first.
    pub fn add_rules<S: StyleSink + ?Sized>(
        &mut self,
        store: &mut RowMetadataStore,
        sink: &mut S,
        binding: &str,
        groups: Vec<ConditionGroup>,
        refresh: bool,
    ) -> Repaint {
        if refresh {
            self.clear_applied(store, sink);
        }
        self.rules
            .insert(binding.to_string(), ColumnRuleSet::new(groups));
        Repaint::Full
    }

    /// `add_rules` from the platform JSON shape:
    /// `[{"cellClass": "..", "rowClass": "..", "format": [{"condition": ">=", "value": 10}]}]`
    pub fn add_rules_json<S: StyleSink + ?Sized>(
        &mut self,
        store: &mut RowMetadataStore,
        sink: &mut S,
        binding: &str,
        json: &str,
        refresh: bool,
    ) -> Result<Repaint, GridError> {
        let groups = parse_rules(json)?;
        Ok(self.add_rules(store, sink, binding, groups, refresh))
    }

    /// Drop the rules of `binding` and withdraw the classes they applied.
    pub fn remove_rules<S: StyleSink + ?Sized>(
        &mut self,
        store: &mut RowMetadataStore,
        sink: &mut S,
        binding: &str,
    ) -> Repaint {
        if self.rules.remove(binding).is_none() {
            return Repaint::None;
        }

        let rows: Vec<RowId> = store.rows_with(CONDITIONAL_FORMAT_LABEL).collect();
        for row in rows {
            let Some(applied) = store.get_mut::<AppliedClasses>(row, CONDITIONAL_FORMAT_LABEL) else {
                continue;
            };
            if let Some(classes) = applied.row.remove(binding) {
                for class in classes {
                    if !applied.row_class_held_elsewhere(binding, &class) {
                        sink.remove_row_class(row, &class);
                    }
                }
            }
            if let Some(classes) = applied.cell.remove(binding) {
                for class in classes {
                    sink.remove_cell_class(row, binding, &class);
                }
            }
            if applied.is_empty() {
                store.remove(row, CONDITIONAL_FORMAT_LABEL);
            }
        }
        Repaint::Full
    }

    pub fn has_rules(&self, binding: &str) -> bool {
        self.rules.contains_key(binding)
    }

    pub fn rules(&self, binding: &str) -> Option<&ColumnRuleSet> {
        self.rules.get(binding)
    }

    /// Bindings with rules, sorted.
    pub fn bindings(&self) -> Vec<&str> {
        let mut bindings: Vec<&str> = self.rules.keys().map(|b| b.as_str()).collect();
        bindings.sort_unstable();
        bindings
    }

    /// Withdraw every class this feature applied, on every row.
    pub fn clear_applied<S: StyleSink + ?Sized>(&self, store: &mut RowMetadataStore, sink: &mut S) {
        let rows: Vec<RowId> = store.rows_with(CONDITIONAL_FORMAT_LABEL).collect();
        for row in rows {
            let Some(applied) = store.get::<AppliedClasses>(row, CONDITIONAL_FORMAT_LABEL) else {
                continue;
            };
            let row_classes: BTreeSet<&String> = applied.row.values().flatten().collect();
            for class in row_classes {
                sink.remove_row_class(row, class);
            }
            for (binding, classes) in &applied.cell {
                for class in classes {
                    sink.remove_cell_class(row, binding, class);
                }
            }
        }
        store.clear_property(CONDITIONAL_FORMAT_LABEL);
    }

    /// Forget the classes tracked for a removed row.
    pub fn clear_row(&self, store: &mut RowMetadataStore, row: RowId) {
        store.remove(row, CONDITIONAL_FORMAT_LABEL);
    }

    /// Format pass for one cell. Returns the index of the matched group.
    ///
    /// Cells whose column has no rules (or no binding) are left alone.
    pub fn format_cell<H: GridHost + StyleSink + ?Sized>(
        &self,
        store: &mut RowMetadataStore,
        grid: &mut H,
        row: usize,
        col: usize,
    ) -> Option<usize> {
        let binding = grid.column_binding(col)?;
        let rule_set = self.rules.get(binding)?;
        let binding = binding.to_string();
        let row_id = grid.row_id(row)?;
        let value = grid.cell_data(row, col);
        let matched = rule_set.first_match(&value, grid.column_type(col));

        let (want_row, want_cell) = match matched {
            Some(i) => {
                let group = &rule_set.groups[i];
                (group.row_class(), group.cell_class())
            }
            None => (None, None),
        };

        let applied = store.get_or_insert_with(row_id, CONDITIONAL_FORMAT_LABEL, AppliedClasses::default);

        for (i, group) in rule_set.groups.iter().enumerate() {
            if Some(i) == matched {
                continue;
            }
            if let Some(class) = group.row_class().filter(|c| Some(*c) != want_row) {
                if let Some(held) = applied.row.get_mut(&binding) {
                    held.remove(class);
                }
                if !applied.row_class_held_elsewhere(&binding, class) {
                    grid.remove_row_class(row_id, class);
                }
            }
            if let Some(class) = group.cell_class().filter(|c| Some(*c) != want_cell) {
                if let Some(held) = applied.cell.get_mut(&binding) {
                    held.remove(class);
                }
                grid.remove_cell_class(row_id, &binding, class);
            }
        }

        if let Some(class) = want_row {
            applied
                .row
                .entry(binding.clone())
                .or_default()
                .insert(class.to_string());
            grid.add_row_class(row_id, class);
        }
        if let Some(class) = want_cell {
            applied
                .cell
                .entry(binding.clone())
                .or_default()
                .insert(class.to_string());
            grid.add_cell_class(row_id, &binding, class);
        }

        if applied.is_empty() {
            store.remove(row_id, CONDITIONAL_FORMAT_LABEL);
        }
        matched
    }

    /// Full-view variant: format every ruled column of the given rows.
    pub fn format_rows<H, I>(&self, store: &mut RowMetadataStore, grid: &mut H, rows: I)
    where
        H: GridHost + StyleSink + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        if self.rules.is_empty() {
            return;
        }
        let ruled: Vec<usize> = (0..grid.column_count())
            .filter(|&col| {
                grid.column_binding(col)
                    .is_some_and(|binding| self.rules.contains_key(binding))
            })
            .collect();
        for row in rows {
            for &col in &ruled {
                self.format_cell(store, grid, row, col);
            }
        }
    }
}

/// Parse rule groups from the platform JSON shape.
pub fn parse_rules(json: &str) -> Result<Vec<ConditionGroup>, GridError> {
    serde_json::from_str(json).map_err(|e| GridError::InvalidRules(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGrid;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn number_grid(values: &[f64]) -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.add_column("Qty", ColumnType::Number);
        for v in values {
            grid.push_row(vec![CellValue::from(*v)]);
        }
        grid
    }

    fn ge(value: f64) -> ConditionRule {
        ConditionRule::new(Comparator::GreaterOrEqualsTo, value)
    }

    #[test]
    fn test_comparator_parse() {
        assert_eq!(Comparator::parse(">="), Comparator::GreaterOrEqualsTo);
        assert_eq!(Comparator::parse("GreaterOrEqualsTo"), Comparator::GreaterOrEqualsTo);
        assert_eq!(Comparator::parse("==="), Comparator::Equals);
        assert_eq!(Comparator::parse("!=="), Comparator::NotEquals);
        assert_eq!(Comparator::parse("not-contains"), Comparator::NotContains);
        assert_eq!(Comparator::parse("EndsWith"), Comparator::EndsWith);
        assert_eq!(Comparator::parse("between"), Comparator::Unknown);
    }

    #[test]
    fn test_numeric_threshold() {
        let rule = ge(10.0);
        assert!(rule.evaluate(&CellValue::from(10), ColumnType::Number));
        assert!(!rule.evaluate(&CellValue::from(9), ColumnType::Number));
    }

    #[test]
    fn test_relational_operators() {
        let cell = CellValue::from(5);
        let ty = ColumnType::Number;
        assert!(evaluate(Comparator::GreaterThan, &CellValue::from(4), &cell, ty));
        assert!(evaluate(Comparator::LessThan, &CellValue::from(6), &cell, ty));
        assert!(evaluate(Comparator::LessOrEqualsTo, &CellValue::from(5), &cell, ty));
        assert!(evaluate(Comparator::Equals, &CellValue::from(5), &cell, ty));
        assert!(evaluate(Comparator::NotEquals, &CellValue::from(6), &cell, ty));
        assert!(!evaluate(Comparator::NotEquals, &CellValue::from(5), &cell, ty));
    }

    #[test]
    fn test_unknown_comparator_is_false() {
        let rule = ConditionRule::new(Comparator::Unknown, 1);
        assert!(!rule.evaluate(&CellValue::from(1), ColumnType::Number));
    }

    #[test]
    fn test_text_comparators() {
        let cell = CellValue::from("Hello World");
        let ty = ColumnType::Text;
        assert!(evaluate(Comparator::Contains, &CellValue::from("WORLD"), &cell, ty));
        assert!(!evaluate(Comparator::NotContains, &CellValue::from("world"), &cell, ty));
        assert!(evaluate(Comparator::StartsWith, &CellValue::from("Hello"), &cell, ty));
        assert!(!evaluate(Comparator::StartsWith, &CellValue::from("hello"), &cell, ty));
        assert!(evaluate(Comparator::EndsWith, &CellValue::from("World"), &cell, ty));
        assert!(evaluate(Comparator::LessThan, &CellValue::from("Zebra"), &cell, ty));
    }

    #[test]
    fn test_empty_cell_against_number() {
        let empty = CellValue::Empty;
        let ty = ColumnType::Number;
        assert!(evaluate(Comparator::LessThan, &CellValue::from(1), &empty, ty));
        assert!(!evaluate(Comparator::Equals, &CellValue::from(0), &empty, ty));
        assert!(evaluate(Comparator::NotEquals, &CellValue::from(0), &empty, ty));
    }

    #[test]
    fn test_incomparable_values() {
        let cell = CellValue::from(true);
        let ty = ColumnType::Checkbox;
        assert!(!evaluate(Comparator::Equals, &CellValue::from("x"), &cell, ty));
        assert!(evaluate(Comparator::NotEquals, &CellValue::from("x"), &cell, ty));
        assert!(!evaluate(Comparator::GreaterThan, &CellValue::from("x"), &cell, ty));
    }

    #[test]
    fn test_date_comparison() {
        let cell = CellValue::from(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let ty = ColumnType::Date;
        assert!(evaluate(Comparator::GreaterThan, &CellValue::from("2024-04-30"), &cell, ty));
        assert!(evaluate(Comparator::Equals, &CellValue::from("2024-05-01"), &cell, ty));
    }

    #[test]
    fn test_null_sentinel_date_uses_cell_time_of_day() {
        let cell = CellValue::from(Utc.with_ymd_and_hms(1900, 1, 1, 13, 45, 0).unwrap());
        // Sentinel operand at midnight; after recombination it carries 13:45
        let operand = CellValue::from("1900-01-01");
        assert!(evaluate(Comparator::Equals, &operand, &cell, ColumnType::DateTime));

        // Same rebuild for a later cell: only the calendar date differs
        let later = CellValue::from(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
        assert!(evaluate(Comparator::GreaterThan, &operand, &later, ColumnType::DateTime));
    }

    #[test]
    fn test_null_sentinel_resets_seconds() {
        let cell = CellValue::from(Utc.with_ymd_and_hms(1900, 1, 1, 13, 45, 30).unwrap());
        let operand = CellValue::from("1900-01-01");
        // Operand becomes 13:45:00, so the cell is 30 seconds later
        assert!(evaluate(Comparator::GreaterThan, &operand, &cell, ColumnType::DateTime));
    }

    #[test]
    fn test_null_sentinel_year_boundary() {
        // 1910 is still the "no date" sentinel: rebuilt with the cell's time of day
        let cell = CellValue::from(Utc.with_ymd_and_hms(1910, 12, 31, 13, 45, 0).unwrap());
        let operand = CellValue::from("1910-12-31");
        assert!(evaluate(Comparator::Equals, &operand, &cell, ColumnType::DateTime));

        // 1911 is a real date and keeps its own midnight
        let cell = CellValue::from(Utc.with_ymd_and_hms(1911, 1, 1, 13, 45, 0).unwrap());
        let operand = CellValue::from("1911-01-01");
        assert!(!evaluate(Comparator::Equals, &operand, &cell, ColumnType::DateTime));
        assert!(evaluate(Comparator::GreaterThan, &operand, &cell, ColumnType::DateTime));
    }

    #[test]
    fn test_empty_group_always_matches() {
        let group = ConditionGroup::new(vec![]);
        assert!(group.evaluate(&CellValue::Empty, ColumnType::Text));
    }

    #[test]
    fn test_and_semantics() {
        let group = ConditionGroup::new(vec![ge(10.0), ConditionRule::new(Comparator::LessThan, 20)]);
        assert!(group.evaluate(&CellValue::from(15), ColumnType::Number));
        assert!(!group.evaluate(&CellValue::from(25), ColumnType::Number));
    }

    #[test]
    fn test_first_match_wins() {
        let mut grid = number_grid(&[50.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![
                ConditionGroup::new(vec![ge(10.0)]).with_cell_class("high"),
                ConditionGroup::new(vec![ge(0.0)]).with_cell_class("positive"),
            ],
            false,
        );

        let matched = format.format_cell(&mut store, &mut grid, 0, 0);
        let id = grid.row_id(0).unwrap();

        assert_eq!(matched, Some(0));
        assert_eq!(grid.cell_classes(id, "Qty"), vec!["high"]);
    }

    #[test]
    fn test_classes_toggle_with_value() {
        let mut grid = number_grid(&[50.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![ConditionGroup::new(vec![ge(10.0)])
                .with_cell_class("high")
                .with_row_class("row-high")],
            false,
        );
        let id = grid.row_id(0).unwrap();

        format.format_cell(&mut store, &mut grid, 0, 0);
        assert!(grid.has_cell_class(id, "Qty", "high"));
        assert!(grid.has_row_class(id, "row-high"));

        grid.set_cell_data(0, 0, CellValue::from(3));
        assert_eq!(format.format_cell(&mut store, &mut grid, 0, 0), None);
        assert!(!grid.has_cell_class(id, "Qty", "high"));
        assert!(!grid.has_row_class(id, "row-high"));
        assert!(!store.has(id, CONDITIONAL_FORMAT_LABEL));
    }

    #[test]
    fn test_switching_groups_swaps_classes() {
        let mut grid = number_grid(&[50.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![
                ConditionGroup::new(vec![ge(10.0)]).with_cell_class("high"),
                ConditionGroup::new(vec![ge(0.0)]).with_cell_class("low"),
            ],
            false,
        );
        let id = grid.row_id(0).unwrap();

        format.format_cell(&mut store, &mut grid, 0, 0);
        grid.set_cell_data(0, 0, CellValue::from(5));
        format.format_cell(&mut store, &mut grid, 0, 0);

        assert_eq!(grid.cell_classes(id, "Qty"), vec!["low"]);
    }

    #[test]
    fn test_row_class_shared_between_bindings() {
        let mut grid = MemoryGrid::new();
        grid.add_column("A", ColumnType::Number);
        grid.add_column("B", ColumnType::Number);
        grid.push_row(vec![CellValue::from(50), CellValue::from(50)]);
        let id = grid.row_id(0).unwrap();
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        for binding in ["A", "B"] {
            format.add_rules(
                &mut store,
                &mut grid,
                binding,
                vec![ConditionGroup::new(vec![ge(10.0)]).with_row_class("warn")],
                false,
            );
        }

        format.format_rows(&mut store, &mut grid, 0..1);
        grid.set_cell_data(0, 0, CellValue::from(1));
        format.format_cell(&mut store, &mut grid, 0, 0);

        // B still matches, the row keeps the class
        assert!(grid.has_row_class(id, "warn"));
    }

    #[test]
    fn test_unruled_column_untouched() {
        let mut grid = number_grid(&[50.0]);
        let mut store = RowMetadataStore::new();
        let format = ConditionalFormat::new();

        assert_eq!(format.format_cell(&mut store, &mut grid, 0, 0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_refresh_clears_all_applied_classes() {
        let mut grid = number_grid(&[50.0, 60.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![ConditionGroup::new(vec![ge(10.0)]).with_cell_class("high")],
            false,
        );
        format.format_rows(&mut store, &mut grid, 0..2);

        let repaint = format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![ConditionGroup::new(vec![ge(100.0)]).with_cell_class("huge")],
            true,
        );

        assert_eq!(repaint, Repaint::Full);
        for row in 0..2 {
            let id = grid.row_id(row).unwrap();
            assert!(grid.cell_classes(id, "Qty").is_empty());
        }
        assert!(store.rows_with(CONDITIONAL_FORMAT_LABEL).next().is_none());
    }

    #[test]
    fn test_remove_rules_withdraws_classes() {
        let mut grid = number_grid(&[50.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        format.add_rules(
            &mut store,
            &mut grid,
            "Qty",
            vec![ConditionGroup::new(vec![ge(10.0)])
                .with_cell_class("high")
                .with_row_class("warn")],
            false,
        );
        format.format_cell(&mut store, &mut grid, 0, 0);
        let id = grid.row_id(0).unwrap();

        assert_eq!(format.remove_rules(&mut store, &mut grid, "Qty"), Repaint::Full);
        assert!(!format.has_rules("Qty"));
        assert!(grid.cell_classes(id, "Qty").is_empty());
        assert!(grid.row_classes(id).is_empty());
        assert_eq!(format.remove_rules(&mut store, &mut grid, "Qty"), Repaint::None);
    }

    #[test]
    fn test_add_rules_json() {
        let mut grid = number_grid(&[12.0]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();
        let json = r#"[{"cellClass": "big", "rowClass": "", "format": [{"condition": ">=", "value": 10}]}]"#;

        format
            .add_rules_json(&mut store, &mut grid, "Qty", json, false)
            .unwrap();
        format.format_cell(&mut store, &mut grid, 0, 0);
        let id = grid.row_id(0).unwrap();

        assert!(grid.has_cell_class(id, "Qty", "big"));
        // Empty class names are ignored
        assert!(grid.row_classes(id).is_empty());
    }

    #[test]
    fn test_add_rules_json_rejects_garbage() {
        let mut grid = number_grid(&[]);
        let mut store = RowMetadataStore::new();
        let mut format = ConditionalFormat::new();

        let err = format
            .add_rules_json(&mut store, &mut grid, "Qty", "{not json", false)
            .unwrap_err();
        assert!(matches!(err, GridError::InvalidRules(_)));
    }

    #[test]
    fn test_rules_serialize_platform_shape() {
        let group = ConditionGroup::new(vec![ge(10.0)]).with_cell_class("high");
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cellClass": "high", "format": [{"condition": ">=", "value": 10.0}]})
        );
    }
}
