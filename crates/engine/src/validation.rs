//! Validation marks for cells and rows
//!
//! Records, per data row, whether each validated cell passed and which error
//! message goes with it. The host decides validity (its own rules, server
//! round-trips, ...); this feature only remembers the verdict and answers the
//! two render-time questions: is this cell invalid, is this row invalid.
//!
//! ## Semantics
//!
//! - A binding that was never validated is neither valid nor invalid. It does
//!   not count towards the row verdict.
//! - A row is invalid iff at least one of its validated bindings is `false`.
//! - Marks live in the `RowMetadataStore` under their own label, keyed by
//!   `RowId`, so they follow the row through sort/filter/paging.

use gridkit_core::RowId;
use rustc_hash::FxHashMap;

use crate::host::{GridHost, Repaint};
use crate::metadata::{FeatureLabel, RowMetadataStore};

/// Metadata label owned by the validation feature.
pub const VALIDATION_LABEL: FeatureLabel = FeatureLabel::new("__validationMarkFeature");

// ============================================================================
// Per-row entry
// ============================================================================

/// Validation state of one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationEntry {
    /// Binding -> passed validation.
    cell_validity: FxHashMap<String, bool>,
    /// Binding -> last error message set for it.
    cell_error_message: FxHashMap<String, String>,
}

impl ValidationEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the verdict and message for a binding, replacing earlier ones.
    pub fn set(&mut self, binding: &str, is_valid: bool, error_message: impl Into<String>) {
        self.cell_validity.insert(binding.to_string(), is_valid);
        self.cell_error_message
            .insert(binding.to_string(), error_message.into());
    }

    /// `None` when the binding was never validated.
    pub fn validity(&self, binding: &str) -> Option<bool> {
        self.cell_validity.get(binding).copied()
    }

    pub fn is_invalid(&self, binding: &str) -> bool {
        self.validity(binding) == Some(false)
    }

    pub fn error_message(&self, binding: &str) -> Option<&str> {
        self.cell_error_message.get(binding).map(|s| s.as_str())
    }

    /// True iff any validated binding is `false`.
    pub fn has_invalid(&self) -> bool {
        self.cell_validity.values().any(|valid| !valid)
    }

    /// Bindings currently marked invalid, sorted.
    pub fn invalid_bindings(&self) -> Vec<&str> {
        let mut bindings: Vec<&str> = self
            .cell_validity
            .iter()
            .filter(|(_, valid)| !**valid)
            .map(|(binding, _)| binding.as_str())
            .collect();
        bindings.sort_unstable();
        bindings
    }

    /// Number of bindings with a verdict.
    pub fn validated_count(&self) -> usize {
        self.cell_validity.len()
    }
}

// ============================================================================
// Feature
// ============================================================================

/// Validation mark feature.
///
/// Holds no row state of its own; everything goes through the shared store
/// under `VALIDATION_LABEL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMark;

impl ValidationMark {
    pub fn new() -> Self {
        Self
    }

    /// Set the verdict and error message of a cell. Creates the row's entry on
    /// first use.
    pub fn validate(
        &self,
        store: &mut RowMetadataStore,
        row: RowId,
        binding: &str,
        is_valid: bool,
        error_message: &str,
    ) -> Repaint {
        store
            .get_or_insert_with(row, VALIDATION_LABEL, ValidationEntry::new)
            .set(binding, is_valid, error_message);
        Repaint::Row(row)
    }

    /// `validate` addressed by display position. Rows the host can't resolve
    /// are ignored.
    pub fn validate_at(
        &self,
        store: &mut RowMetadataStore,
        host: &dyn GridHost,
        row: usize,
        binding: &str,
        is_valid: bool,
        error_message: &str,
    ) -> Repaint {
        match host.row_id(row) {
            Some(row_id) => self.validate(store, row_id, binding, is_valid, error_message),
            None => {
                log::debug!("validate: no data item at row {row}");
                Repaint::None
            }
        }
    }

    /// The row's entry, if any binding of it was ever validated.
    pub fn entry<'a>(&self, store: &'a RowMetadataStore, row: RowId) -> Option<&'a ValidationEntry> {
        store.get::<ValidationEntry>(row, VALIDATION_LABEL)
    }

    pub fn has_metadata(&self, store: &RowMetadataStore, row: RowId) -> bool {
        store.has(row, VALIDATION_LABEL)
    }

    /// True iff the binding was validated and its last verdict was `false`.
    pub fn is_invalid(&self, store: &RowMetadataStore, row: RowId, binding: &str) -> bool {
        self.entry(store, row)
            .is_some_and(|entry| entry.is_invalid(binding))
    }

    /// Last message set for the binding; `None` if never validated.
    pub fn error_message<'a>(
        &self,
        store: &'a RowMetadataStore,
        row: RowId,
        binding: &str,
    ) -> Option<&'a str> {
        self.entry(store, row)
            .and_then(|entry| entry.error_message(binding))
    }

    /// True iff at least one validated binding of the row is `false`.
    pub fn is_invalid_row(&self, store: &RowMetadataStore, row: RowId) -> bool {
        self.entry(store, row).is_some_and(|entry| entry.has_invalid())
    }

    /// Rows currently holding at least one invalid cell, sorted by id.
    pub fn invalid_rows(&self, store: &RowMetadataStore) -> Vec<RowId> {
        let mut rows: Vec<RowId> = store
            .rows_with(VALIDATION_LABEL)
            .filter(|row| self.is_invalid_row(store, *row))
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Drop the marks of one row (row removed from the data source).
    pub fn clear_row(&self, store: &mut RowMetadataStore, row: RowId) -> Repaint {
        if !self.has_metadata(store, row) {
            return Repaint::None;
        }
        store.remove(row, VALIDATION_LABEL);
        Repaint::Row(row)
    }

    /// Drop the marks of every row that has no invalid cell left.
    pub fn clear_valid_rows(&self, store: &mut RowMetadataStore) -> Repaint {
        let valid: Vec<RowId> = store
            .rows_with(VALIDATION_LABEL)
            .filter(|row| !self.is_invalid_row(store, *row))
            .collect();
        let mut repaint = Repaint::None;
        for row in valid {
            repaint = repaint.merge(self.clear_row(store, row));
        }
        repaint
    }

    /// Drop every mark of every row.
    pub fn clear(&self, store: &mut RowMetadataStore) -> Repaint {
        store.clear_property(VALIDATION_LABEL);
        Repaint::Full
    }

    // ------------------------------------------------------------------------
    // Render-time predicates
    // ------------------------------------------------------------------------

    /// Should the cell at this display position get the invalid marker?
    pub fn is_invalid_cell(
        &self,
        store: &RowMetadataStore,
        host: &dyn GridHost,
        row: usize,
        col: usize,
    ) -> bool {
        match (host.row_id(row), host.column_binding(col)) {
            (Some(row_id), Some(binding)) => self.is_invalid(store, row_id, binding),
            _ => false,
        }
    }

    /// Should the row header at this display position get the invalid marker?
    pub fn is_invalid_row_at(&self, store: &RowMetadataStore, host: &dyn GridHost, row: usize) -> bool {
        host.row_id(row)
            .is_some_and(|row_id| self.is_invalid_row(store, row_id))
    }
}

// ============================================================================
// Tests
// ============================================================================
