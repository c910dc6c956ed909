//! Grid feature engine: row metadata, validation marks, conditional
//! formatting, multi-range selection and column generation, driven by the
//! host grid through `GridHost` / `StyleSink`.

pub mod column_events;
pub mod columns;
pub mod conditional_format;
pub mod error;
pub mod events;
pub mod features;
pub mod host;
pub mod memory;
pub mod metadata;
pub mod properties;
pub mod selection;
pub mod validation;

pub use column_events::{ColumnEvents, UndoAction};
pub use columns::{ColumnDescriptor, ColumnGenerator};
pub use conditional_format::{Comparator, ConditionGroup, ConditionRule, ConditionalFormat};
pub use error::GridError;
pub use events::{CellValueChange, EventCollector, GridEvent};
pub use features::GridFeatures;
pub use host::{GridHost, Repaint, StyleSink};
pub use memory::MemoryGrid;
pub use metadata::{FeatureLabel, RowMetadataStore};
pub use properties::{ColumnProperty, GridProperty, PropertyTable};
pub use selection::{BindingValue, RowData, Selection};
pub use validation::{ValidationEntry, ValidationMark};
