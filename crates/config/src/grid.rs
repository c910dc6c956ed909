// Grid feature settings
// Loaded from a TOML or JSON file next to the host's page definition

use gridkit_core::SelectionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    // Selection
    pub selection_mode: SelectionMode,

    /// Adds a checkbox column to the row headers for row-level checking
    pub has_selectors: bool,

    // Editing
    pub allow_edit: bool,

    // Columns
    /// Reject column bindings that do not resolve against the data source schema
    pub validate_bindings: bool,

    /// Display format for date columns; the engine itself always emits ISO
    pub date_format: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            // Selection
            selection_mode: SelectionMode::MultiRange,
            has_selectors: false,
            // Editing
            allow_edit: true,
            // Columns
            validate_bindings: true,
            date_format: "yyyy-MM-dd".to_string(),
        }
    }
}

impl GridConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: GridConfig =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk, falling back to defaults when the file does not exist.
    ///
    /// `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_toml(&contents),
        }
    }

    /// Reject combinations the selection feature cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.selection_mode.is_supported() {
            return Err(ConfigError::Validation(format!(
                "unsupported selectionMode '{}'",
                self.selection_mode
            )));
        }
        Ok(())
    }

    /// Serialize back to TOML (used when the host persists edited settings).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
