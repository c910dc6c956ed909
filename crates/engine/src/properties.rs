//! Property name -> typed handler dispatch.
//!
//! The host changes grid and column settings by name at runtime. Names are
//! resolved once against a table built with the features; each entry maps to
//! a handler that parses the JSON value into its own type.

use gridkit_core::SelectionMode;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::conditional_format::{parse_rules, ConditionGroup};
use crate::error::GridError;
use crate::features::GridFeatures;
use crate::host::StyleSink;

/// Grid-level properties that can change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridProperty {
    SelectionMode,
    AllowEdit,
    HasSelectors,
}

impl GridProperty {
    pub const ALL: [GridProperty; 3] = [
        GridProperty::SelectionMode,
        GridProperty::AllowEdit,
        GridProperty::HasSelectors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GridProperty::SelectionMode => "selectionMode",
            GridProperty::AllowEdit => "allowEdit",
            GridProperty::HasSelectors => "hasSelectors",
        }
    }
}

/// Column-level properties that can change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnProperty {
    ConditionalFormat,
}

impl ColumnProperty {
    pub const ALL: [ColumnProperty; 1] = [ColumnProperty::ConditionalFormat];

    pub fn name(&self) -> &'static str {
        match self {
            ColumnProperty::ConditionalFormat => "conditionalFormat",
        }
    }
}

pub type GridHandler = fn(&mut GridFeatures, &Value) -> Result<(), GridError>;
pub type ColumnHandler = fn(&mut GridFeatures, &mut dyn StyleSink, &str, &Value) -> Result<(), GridError>;

/// Name -> handler table.
#[derive(Clone)]
pub struct PropertyTable {
    grid: FxHashMap<&'static str, (GridProperty, GridHandler)>,
    column: FxHashMap<&'static str, (ColumnProperty, ColumnHandler)>,
}

impl std::fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyTable")
            .field("grid", &self.grid.keys().collect::<Vec<_>>())
            .field("column", &self.column.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyTable {
    pub fn new() -> Self {
        let mut grid: FxHashMap<&'static str, (GridProperty, GridHandler)> = FxHashMap::default();
        for property in GridProperty::ALL {
            let handler: GridHandler = match property {
                GridProperty::SelectionMode => set_selection_mode,
                GridProperty::AllowEdit => set_allow_edit,
                GridProperty::HasSelectors => set_has_selectors,
            };
            grid.insert(property.name(), (property, handler));
        }

        let mut column: FxHashMap<&'static str, (ColumnProperty, ColumnHandler)> = FxHashMap::default();
        for property in ColumnProperty::ALL {
            let handler: ColumnHandler = match property {
                ColumnProperty::ConditionalFormat => set_conditional_format,
            };
            column.insert(property.name(), (property, handler));
        }

        Self { grid, column }
    }

    pub fn grid_handler(&self, name: &str) -> Result<(GridProperty, GridHandler), GridError> {
        self.grid.get(name).copied().ok_or_else(|| {
            log::warn!("changeProperty: property '{name}' can't be changed");
            GridError::UnknownProperty(name.to_string())
        })
    }

    pub fn column_handler(&self, name: &str) -> Result<(ColumnProperty, ColumnHandler), GridError> {
        self.column.get(name).copied().ok_or_else(|| {
            log::warn!("changeColumnProperty: property '{name}' can't be changed");
            GridError::UnknownProperty(name.to_string())
        })
    }
}

fn invalid(property: &str, message: impl Into<String>) -> GridError {
    GridError::InvalidPropertyValue {
        property: property.to_string(),
        message: message.into(),
    }
}

fn expect_bool(property: GridProperty, value: &Value) -> Result<bool, GridError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(property.name(), format!("expected a boolean, got {value}")))
}

fn set_selection_mode(features: &mut GridFeatures, value: &Value) -> Result<(), GridError> {
    let mode: SelectionMode = serde_json::from_value(value.clone())
        .map_err(|e| invalid(GridProperty::SelectionMode.name(), e.to_string()))?;
    features.set_selection_mode(mode)
}

fn set_allow_edit(features: &mut GridFeatures, value: &Value) -> Result<(), GridError> {
    let allow_edit = expect_bool(GridProperty::AllowEdit, value)?;
    features.set_allow_edit(allow_edit);
    Ok(())
}

fn set_has_selectors(features: &mut GridFeatures, value: &Value) -> Result<(), GridError> {
    let has_selectors = expect_bool(GridProperty::HasSelectors, value)?;
    features.set_has_selectors(has_selectors);
    Ok(())
}

/// Accepts the rules as JSON text (the platform sends a string) or as an
/// already parsed array. An empty list leaves the current rules in place.
fn set_conditional_format(
    features: &mut GridFeatures,
    sink: &mut dyn StyleSink,
    binding: &str,
    value: &Value,
) -> Result<(), GridError> {
    let groups: Vec<ConditionGroup> = match value {
        Value::String(json) => parse_rules(json)?,
        Value::Array(_) => serde_json::from_value(value.clone())
            .map_err(|e| GridError::InvalidRules(e.to_string()))?,
        other => {
            return Err(invalid(
                ColumnProperty::ConditionalFormat.name(),
                format!("expected rules as JSON text or an array, got {other}"),
            ))
        }
    };
    if groups.is_empty() {
        return Ok(());
    }
    features.add_rules(sink, binding, groups, true);
    Ok(())
}
