//! Row-keyed metadata shared by the grid features.
//!
//! Every feature that needs to remember something about a data row stores it
//! here under its own `FeatureLabel`. Entries are keyed by `RowId`, so they
//! follow the row through sort, filter and paging.
//!
//! Key invariants:
//! - Reads never create entries; lazy initialization is explicit
//!   (`get_or_insert_with`)
//! - A row without an entry for a label is indistinguishable from a clean row
//! - `clear_row` drops every label of that row at once
//! - Labels are private namespaces; a payload stored under one label is never
//!   visible under another

use std::any::Any;

use gridkit_core::RowId;
use rustc_hash::FxHashMap;

/// Namespace owned by one feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeatureLabel(&'static str);

impl FeatureLabel {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

type Entries = FxHashMap<FeatureLabel, Box<dyn Any>>;

/// Mapping from (row, label) to an arbitrary feature-owned payload.
///
/// Payloads are stored type-erased; `get` with the wrong type behaves like a
/// missing entry.
#[derive(Default)]
pub struct RowMetadataStore {
    rows: FxHashMap<RowId, Entries>,
}

impl std::fmt::Debug for RowMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowMetadataStore")
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl RowMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the payload for `row` under `label`.
    pub fn set<T: Any>(&mut self, row: RowId, label: FeatureLabel, payload: T) {
        self.rows
            .entry(row)
            .or_default()
            .insert(label, Box::new(payload));
    }

    /// Payload for `row` under `label`, if one exists and has type `T`.
    pub fn get<T: Any>(&self, row: RowId, label: FeatureLabel) -> Option<&T> {
        self.rows
            .get(&row)
            .and_then(|entries| entries.get(&label))
            .and_then(|payload| payload.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, row: RowId, label: FeatureLabel) -> Option<&mut T> {
        self.rows
            .get_mut(&row)
            .and_then(|entries| entries.get_mut(&label))
            .and_then(|payload| payload.downcast_mut::<T>())
    }

    /// Payload for `row` under `label`, created with `init` when missing.
    ///
    /// A payload of a different type stored under the same label is replaced.
    pub fn get_or_insert_with<T: Any>(
        &mut self,
        row: RowId,
        label: FeatureLabel,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        let entries = self.rows.entry(row).or_default();
        if !entries.get(&label).is_some_and(|payload| payload.is::<T>()) {
            entries.insert(label, Box::new(init()));
        }
        match entries.get_mut(&label).and_then(|payload| payload.downcast_mut::<T>()) {
            Some(payload) => payload,
            // The slot was just checked or filled with a `T`.
            None => unreachable!(),
        }
    }

    /// Check if `row` has an entry under `label`.
    pub fn has(&self, row: RowId, label: FeatureLabel) -> bool {
        self.rows
            .get(&row)
            .is_some_and(|entries| entries.contains_key(&label))
    }

    /// Remove `label` from every row. Rows left without entries are dropped.
    pub fn clear_property(&mut self, label: FeatureLabel) {
        self.rows.retain(|_, entries| {
            entries.remove(&label);
            !entries.is_empty()
        });
    }

    /// Remove a single entry.
    pub fn remove(&mut self, row: RowId, label: FeatureLabel) {
        if let Some(entries) = self.rows.get_mut(&row) {
            entries.remove(&label);
            if entries.is_empty() {
                self.rows.remove(&row);
            }
        }
    }

    /// Remove every entry of a row (row deleted from the data source).
    pub fn clear_row(&mut self, row: RowId) {
        self.rows.remove(&row);
    }

    /// Rows that currently hold an entry under `label`. No particular order.
    pub fn rows_with(&self, label: FeatureLabel) -> impl Iterator<Item = RowId> + '_ {
        self.rows
            .iter()
            .filter(move |(_, entries)| entries.contains_key(&label))
            .map(|(row, _)| *row)
    }

    /// Number of rows holding at least one entry.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
