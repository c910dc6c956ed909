//! Event types for grid feature notifications.
//!
//! Features never call back into the host synchronously while mutating.
//! They queue events here; the host drains them once its notification
//! handler has returned.

use gridkit_core::{CellRange, CellValue, RowId};

use crate::host::Repaint;

/// Events emitted by the grid features.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The committed selection changed.
    /// Emitted at most once per deferred-update scope.
    SelectionChanged(SelectionChangedEvent),

    /// A mutation needs the grid (or one row) repainted.
    RepaintRequested(Repaint),

    /// A cell value changed through edit, paste, undo or redo, after
    /// date normalization.
    CellValueChanged(CellValueChange),
}

/// Emitted after the set of selected ranges changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChangedEvent {
    /// All committed ranges after the change, active range first.
    pub ranges: Vec<CellRange>,
}

/// Payload delivered to "on cell value change" handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct CellValueChange {
    /// Display row where the change happened.
    pub row: usize,
    /// Identity of the data item, when the host could resolve it.
    pub row_id: Option<RowId>,
    /// Binding of the changed column.
    pub binding: String,
    /// New value. Date columns carry `YYYY-MM-DD` text, DateTime columns a
    /// full RFC 3339 timestamp.
    pub value: CellValue,
}

/// Callback type for receiving cell value changes.
pub type CellValueCallback = Box<dyn FnMut(&CellValueChange)>;

/// Simple event queue, drained by the host.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    /// Take every queued event, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only SelectionChanged events.
    pub fn selection_changed(&self) -> Vec<&SelectionChangedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::SelectionChanged(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Filter to only CellValueChanged events.
    pub fn cell_value_changed(&self) -> Vec<&CellValueChange> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::CellValueChanged(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Combined repaint request of every queued RepaintRequested event.
    pub fn repaint(&self) -> Repaint {
        self.events.iter().fold(Repaint::None, |acc, e| match e {
            GridEvent::RepaintRequested(r) => acc.merge(*r),
            _ => acc,
        })
    }
}
