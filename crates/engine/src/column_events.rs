//! Binding -> handler dispatch for cell value changes.
//!
//! Edits, pastes, undo and redo all end up here. The changed value is read
//! from the host (or taken from the undo action), normalized for date-like
//! columns and handed to every handler registered for the binding.

use gridkit_core::{CellValue, ColumnType};
use rustc_hash::FxHashMap;

use crate::error::GridError;
use crate::events::{CellValueCallback, CellValueChange};
use crate::host::GridHost;

/// One undoable cell edit, as recorded by the host's undo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    pub row: usize,
    pub col: usize,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

struct ColumnEntry {
    column_type: ColumnType,
    handlers: Vec<CellValueCallback>,
}

/// Dispatch table from column binding to value-change handlers.
#[derive(Default)]
pub struct ColumnEvents {
    columns: FxHashMap<String, ColumnEntry>,
    ready: bool,
}

impl std::fmt::Debug for ColumnEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnEvents")
            .field("columns", &self.columns.len())
            .field("ready", &self.ready)
            .finish()
    }
}

impl ColumnEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column. Re-registering keeps the handlers and updates the type.
    pub fn register_column(&mut self, binding: &str, column_type: ColumnType) {
        self.columns
            .entry(binding.to_string())
            .and_modify(|entry| entry.column_type = column_type)
            .or_insert_with(|| ColumnEntry {
                column_type,
                handlers: Vec::new(),
            });
    }

    pub fn unregister_column(&mut self, binding: &str) -> bool {
        self.columns.remove(binding).is_some()
    }

    pub fn is_registered(&self, binding: &str) -> bool {
        self.columns.contains_key(binding)
    }

    pub fn column_type(&self, binding: &str) -> Option<ColumnType> {
        self.columns.get(binding).map(|entry| entry.column_type)
    }

    /// Attach a handler to a registered column.
    pub fn on_cell_value_change(
        &mut self,
        binding: &str,
        handler: impl FnMut(&CellValueChange) + 'static,
    ) -> Result<(), GridError> {
        let entry = self
            .columns
            .get_mut(binding)
            .ok_or_else(|| GridError::UnknownColumn(binding.to_string()))?;
        entry.handlers.push(Box::new(handler));
        Ok(())
    }

    /// Mark the host as fully initialized. Undo/redo routing starts here.
    pub fn features_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Cell edit ended or value pasted: dispatch the value the host now holds.
    pub fn dispatch(&mut self, host: &dyn GridHost, row: usize, col: usize) -> Option<CellValueChange> {
        let value = host.cell_data(row, col);
        self.dispatch_value(host, row, col, value)
    }

    /// Undo: dispatch the value the cell goes back to.
    pub fn on_undo(&mut self, host: &dyn GridHost, action: &UndoAction) -> Option<CellValueChange> {
        if !self.ready {
            log::debug!("undo at ({}, {}) before features ready, ignored", action.row, action.col);
            return None;
        }
        self.dispatch_value(host, action.row, action.col, action.old_value.clone())
    }

    /// Redo: dispatch the value the cell is set to again.
    pub fn on_redo(&mut self, host: &dyn GridHost, action: &UndoAction) -> Option<CellValueChange> {
        if !self.ready {
            log::debug!("redo at ({}, {}) before features ready, ignored", action.row, action.col);
            return None;
        }
        self.dispatch_value(host, action.row, action.col, action.new_value.clone())
    }

    /// Normalize `value` for the column at `col` and run its handlers.
    ///
    /// Returns the delivered change, or `None` when the column has no binding
    /// or the binding is not registered.
    pub fn dispatch_value(
        &mut self,
        host: &dyn GridHost,
        row: usize,
        col: usize,
        value: CellValue,
    ) -> Option<CellValueChange> {
        let binding = host.column_binding(col)?;
        let Some(entry) = self.columns.get_mut(binding) else {
            log::debug!("value change on unregistered binding '{binding}'");
            return None;
        };

        let change = CellValueChange {
            row,
            row_id: host.row_id(row),
            binding: binding.to_string(),
            value: normalize(value, entry.column_type),
        };
        for handler in entry.handlers.iter_mut() {
            handler(&change);
        }
        Some(change)
    }
}

/// Date columns deliver `YYYY-MM-DD`, datetime columns the full timestamp.
/// Values that don't read as dates pass through untouched.
pub fn normalize(value: CellValue, column_type: ColumnType) -> CellValue {
    let normalized = match column_type {
        ColumnType::Date => value.to_iso_date(),
        ColumnType::DateTime => value.to_iso_datetime(),
        _ => None,
    };
    normalized.map(CellValue::Text).unwrap_or(value)
}
