//! Grid features facade
//!
//! `GridFeatures` owns the row metadata store and the features built on it,
//! and is what the host talks to: its notification hooks (edit ended, paste,
//! undo/redo, selection changing, format pass, view update) and the API
//! surface exposed to callers (validation, rules, selection, columns,
//! properties).
//!
//! Nothing here paints. Mutations queue `GridEvent`s (repaint requests, cell
//! value changes, selection changes) that the host drains with `take_events`.

use gridkit_config::GridConfig;
use gridkit_core::{CellRange, CellValue, ColumnType, RowId, SelectionMode};
use serde_json::Value;

use crate::column_events::{ColumnEvents, UndoAction};
use crate::columns::{has_new_columns, validate_binding, ColumnDescriptor, ColumnGenerator};
use crate::conditional_format::{ConditionGroup, ConditionalFormat};
use crate::error::GridError;
use crate::events::{CellValueChange, EventCollector, GridEvent};
use crate::host::{GridHost, Repaint, StyleSink};
use crate::metadata::RowMetadataStore;
use crate::properties::PropertyTable;
use crate::selection::Selection;
use crate::validation::ValidationMark;

#[derive(Debug)]
pub struct GridFeatures {
    config: GridConfig,
    store: RowMetadataStore,
    validation: ValidationMark,
    conditional_format: ConditionalFormat,
    selection: Selection,
    column_events: ColumnEvents,
    properties: PropertyTable,
    columns: Vec<ColumnDescriptor>,
    schema: Option<Value>,
    events: EventCollector,
}

impl GridFeatures {
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        let selection = Selection::with_mode(config.has_selectors, config.selection_mode)?;
        Ok(Self {
            config,
            store: RowMetadataStore::new(),
            validation: ValidationMark::new(),
            conditional_format: ConditionalFormat::new(),
            selection,
            column_events: ColumnEvents::new(),
            properties: PropertyTable::new(),
            columns: Vec::new(),
            schema: None,
            events: EventCollector::new(),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn store(&self) -> &RowMetadataStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn conditional_format(&self) -> &ConditionalFormat {
        &self.conditional_format
    }

    pub fn column_events_mut(&mut self) -> &mut ColumnEvents {
        &mut self.column_events
    }

    fn request(&mut self, repaint: Repaint) {
        if repaint.is_needed() {
            self.events.push(GridEvent::RepaintRequested(repaint));
        }
    }

    /// Queued events of every feature, selection events included.
    pub fn take_events(&mut self) -> Vec<GridEvent> {
        let mut events = self.events.drain();
        events.extend(self.selection.take_events());
        events
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// The host finished initializing. Undo/redo notifications are routed
    /// from here on.
    pub fn features_ready(&mut self) {
        self.column_events.features_ready();
    }

    /// Host is about to drop the data item `row`: forget everything about it.
    pub fn remove_row(&mut self, row: RowId) {
        self.store.clear_row(row);
        self.request(Repaint::Full);
    }

    /// Discard pending changes. With `clear_validation` every mark goes;
    /// otherwise only rows still holding an invalid cell keep theirs.
    pub fn clear_all_changes(&mut self, clear_validation: bool) {
        let repaint = if clear_validation {
            self.validation.clear(&mut self.store)
        } else {
            self.validation.clear_valid_rows(&mut self.store)
        };
        self.request(repaint);
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub fn on_cell_edit_ended(&mut self, host: &dyn GridHost, row: usize, col: usize) -> Option<CellValueChange> {
        let change = self.column_events.dispatch(host, row, col)?;
        self.events.push(GridEvent::CellValueChanged(change.clone()));
        Some(change)
    }

    pub fn on_pasted_cell(&mut self, host: &dyn GridHost, row: usize, col: usize) -> Option<CellValueChange> {
        self.on_cell_edit_ended(host, row, col)
    }

    pub fn on_undo(&mut self, host: &dyn GridHost, action: &UndoAction) -> Option<CellValueChange> {
        let change = self.column_events.on_undo(host, action)?;
        self.events.push(GridEvent::CellValueChanged(change.clone()));
        Some(change)
    }

    pub fn on_redo(&mut self, host: &dyn GridHost, action: &UndoAction) -> Option<CellValueChange> {
        let change = self.column_events.on_redo(host, action)?;
        self.events.push(GridEvent::CellValueChanged(change.clone()));
        Some(change)
    }

    pub fn on_selection_changing(&mut self, range: &CellRange) {
        self.selection.selection_changing(range);
    }

    /// Format pass for one visible cell.
    pub fn on_format_item<H: GridHost + StyleSink>(&mut self, grid: &mut H, row: usize, col: usize) {
        self.conditional_format
            .format_cell(&mut self.store, grid, row, col);
    }

    /// Full-view update of a block of visible rows.
    pub fn on_updated_view<H: GridHost + StyleSink>(&mut self, grid: &mut H, rows: std::ops::Range<usize>) {
        self.conditional_format
            .format_rows(&mut self.store, grid, rows);
    }

    /// Write a cell through the features. DateTime values lose their seconds.
    pub fn set_cell_data(&mut self, host: &mut dyn GridHost, row: usize, col: usize, value: CellValue) {
        let value = match host.column_type(col) {
            ColumnType::DateTime => value.trim_seconds(),
            _ => value,
        };
        host.set_cell_data(row, col, value);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    pub fn validate(&mut self, row: RowId, binding: &str, is_valid: bool, error_message: &str) {
        let repaint = self
            .validation
            .validate(&mut self.store, row, binding, is_valid, error_message);
        self.request(repaint);
    }

    /// `validate` addressed by host column index instead of binding.
    pub fn validate_column(
        &mut self,
        host: &dyn GridHost,
        row: RowId,
        col: usize,
        is_valid: bool,
        error_message: &str,
    ) -> Result<(), GridError> {
        let binding = host
            .column_binding(col)
            .ok_or_else(|| GridError::UnknownColumn(col.to_string()))?;
        self.validate(row, binding, is_valid, error_message);
        Ok(())
    }

    pub fn validate_at(&mut self, host: &dyn GridHost, row: usize, binding: &str, is_valid: bool, error_message: &str) {
        let repaint = self
            .validation
            .validate_at(&mut self.store, host, row, binding, is_valid, error_message);
        self.request(repaint);
    }

    pub fn is_invalid(&self, row: RowId, binding: &str) -> bool {
        self.validation.is_invalid(&self.store, row, binding)
    }

    pub fn error_message(&self, row: RowId, binding: &str) -> Option<&str> {
        self.validation.error_message(&self.store, row, binding)
    }

    pub fn is_invalid_row(&self, row: RowId) -> bool {
        self.validation.is_invalid_row(&self.store, row)
    }

    pub fn is_invalid_cell(&self, host: &dyn GridHost, row: usize, col: usize) -> bool {
        self.validation.is_invalid_cell(&self.store, host, row, col)
    }

    pub fn is_invalid_row_at(&self, host: &dyn GridHost, row: usize) -> bool {
        self.validation.is_invalid_row_at(&self.store, host, row)
    }

    pub fn invalid_rows(&self) -> Vec<RowId> {
        self.validation.invalid_rows(&self.store)
    }

    pub fn clear_validation(&mut self) {
        let repaint = self.validation.clear(&mut self.store);
        self.request(repaint);
    }

    // ========================================================================
    // Conditional formatting
    // ========================================================================

    pub fn add_rules<S: StyleSink + ?Sized>(
        &mut self,
        sink: &mut S,
        binding: &str,
        groups: Vec<ConditionGroup>,
        refresh: bool,
    ) {
        let repaint = self
            .conditional_format
            .add_rules(&mut self.store, sink, binding, groups, refresh);
        self.request(repaint);
    }

    pub fn add_rules_json<S: StyleSink + ?Sized>(
        &mut self,
        sink: &mut S,
        binding: &str,
        json: &str,
        refresh: bool,
    ) -> Result<(), GridError> {
        let repaint = self
            .conditional_format
            .add_rules_json(&mut self.store, sink, binding, json, refresh)?;
        self.request(repaint);
        Ok(())
    }

    pub fn remove_rules<S: StyleSink + ?Sized>(&mut self, sink: &mut S, binding: &str) {
        let repaint = self
            .conditional_format
            .remove_rules(&mut self.store, sink, binding);
        self.request(repaint);
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> Result<(), GridError> {
        self.selection.set_mode(mode)?;
        self.config.selection_mode = mode;
        Ok(())
    }

    pub fn set_has_selectors(&mut self, has_selectors: bool) {
        self.selection.set_has_selectors(has_selectors);
        self.config.has_selectors = has_selectors;
    }

    // ========================================================================
    // Columns
    // ========================================================================

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn is_read_only(&self) -> bool {
        !self.config.allow_edit
    }

    pub fn set_allow_edit(&mut self, allow_edit: bool) {
        self.config.allow_edit = allow_edit;
        for column in &mut self.columns {
            column.allow_edit = allow_edit;
        }
    }

    /// Register a column declared by the host.
    ///
    /// With `validate_bindings`, the binding must resolve against the current
    /// schema (when one was assigned).
    pub fn add_column(&mut self, column: ColumnDescriptor) -> Result<(), GridError> {
        if self.config.validate_bindings {
            if let Some(schema) = &self.schema {
                validate_binding(schema, &column.binding)?;
            }
        }
        self.column_events
            .register_column(&column.binding, column.column_type);
        self.columns.retain(|c| c.binding != column.binding);
        self.columns.push(column);
        Ok(())
    }

    pub fn remove_column(&mut self, binding: &str) -> Result<ColumnDescriptor, GridError> {
        let index = self
            .columns
            .iter()
            .position(|c| c.binding == binding)
            .ok_or_else(|| GridError::UnknownColumn(binding.to_string()))?;
        self.column_events.unregister_column(binding);
        Ok(self.columns.remove(index))
    }

    /// Assign a data source schema.
    ///
    /// Declared columns are checked against it (`validate_bindings`). When
    /// the grid has no columns yet, or the schema brings bindings that are
    /// not registered, the column set is regenerated wholesale.
    pub fn generate_columns(&mut self, schema: &Value) -> Result<&[ColumnDescriptor], GridError> {
        if self.config.validate_bindings {
            for column in self.columns.iter().filter(|c| !c.auto_generated) {
                validate_binding(schema, &column.binding)?;
            }
        }

        let existing: Vec<&str> = self.columns.iter().map(|c| c.binding.as_str()).collect();
        let regenerate = self.columns.is_empty() || has_new_columns(&existing, schema);
        if regenerate {
            let generated = ColumnGenerator::generate(schema, self.config.allow_edit)?;
            for column in self.columns.drain(..) {
                self.column_events.unregister_column(&column.binding);
            }
            for column in &generated {
                self.column_events
                    .register_column(&column.binding, column.column_type);
            }
            log::debug!("generated {} columns", generated.len());
            self.columns = generated;
        }

        self.schema = Some(schema.clone());
        Ok(&self.columns)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Change a grid property by name.
    pub fn change_property(&mut self, name: &str, value: &Value) -> Result<(), GridError> {
        let (_, handler) = self.properties.grid_handler(name)?;
        handler(self, value)
    }

    /// Change a property of the column bound to `binding`.
    pub fn change_column_property(
        &mut self,
        sink: &mut dyn StyleSink,
        binding: &str,
        name: &str,
        value: &Value,
    ) -> Result<(), GridError> {
        if !self.column_events.is_registered(binding) {
            log::warn!("changeColumnProperty: column '{binding}' not found");
            return Err(GridError::UnknownColumn(binding.to_string()));
        }
        let (_, handler) = self.properties.column_handler(name)?;
        handler(self, sink, binding, value)
    }
}
