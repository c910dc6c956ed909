use std::fmt;

use gridkit_core::SelectionMode;

/// Configuration errors raised synchronously to the caller.
///
/// Evaluation gaps (unknown comparator, binding without rules, row without
/// validation entries) are not errors and never show up here.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Selection mode the selection feature does not handle.
    UnsupportedSelectionMode(SelectionMode),
    /// Column binding does not resolve against the data source schema.
    BindingNotFound { binding: String },
    /// Column schema is not a JSON object.
    InvalidSchema(String),
    /// Property name without a registered handler.
    UnknownProperty(String),
    /// Property value has the wrong shape for its handler.
    InvalidPropertyValue { property: String, message: String },
    /// No column registered for the binding or index.
    UnknownColumn(String),
    /// Conditional format rules could not be parsed.
    InvalidRules(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSelectionMode(mode) => {
                write!(f, "unsupported selection mode '{mode}'")
            }
            Self::BindingNotFound { binding } => write!(
                f,
                "binding '{binding}' doesn't match any field of the data source (expected format: \"EntityName.FieldName\")"
            ),
            Self::InvalidSchema(msg) => write!(f, "invalid column schema: {msg}"),
            Self::UnknownProperty(name) => write!(f, "property '{name}' can't be changed"),
            Self::InvalidPropertyValue { property, message } => {
                write!(f, "invalid value for property '{property}': {message}")
            }
            Self::UnknownColumn(col) => write!(f, "unknown column: {col}"),
            Self::InvalidRules(msg) => write!(f, "invalid conditional format rules: {msg}"),
        }
    }
}

impl std::error::Error for GridError {}
