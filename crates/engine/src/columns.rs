//! Column generation from type metadata.
//!
//! A data source describes its rows with a nested JSON object whose leaves are
//! type names: `{"Customer": {"Name": "string", "Age": "int32"}, "Active": "boolean"}`.
//! Generation flattens it, in key order, into one descriptor per leaf with a
//! dotted binding (`Customer.Name`).

use std::collections::HashSet;

use gridkit_core::ColumnType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GridError;

/// Decimal places forced on generated `decimal` columns.
pub const DECIMAL_PLACES: u32 = 2;

/// A generated column, ready for the host's column registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub binding: String,
    pub header: String,
    pub column_type: ColumnType,
    pub auto_generated: bool,
    pub allow_edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
}

/// Column type for a metadata type name, matched case-insensitively.
///
/// `None` for `byte[]`: binary columns are not generated. Unknown names fall
/// back to text.
pub fn column_type_for(type_name: &str) -> Option<ColumnType> {
    match type_name.to_ascii_lowercase().as_str() {
        "int32" | "int64" | "decimal" => Some(ColumnType::Number),
        "boolean" => Some(ColumnType::Checkbox),
        "datetime" => Some(ColumnType::DateTime),
        "date" => Some(ColumnType::Date),
        "byte[]" => None,
        _ => Some(ColumnType::Text),
    }
}

/// Flattens a schema into column descriptors.
#[derive(Debug, Default)]
pub struct ColumnGenerator {
    /// Headers handed out so far in the current pass.
    headers: HashSet<String>,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnGenerator {
    /// Generate the columns of `schema`.
    ///
    /// A header already used earlier in the pass is replaced by the full
    /// binding, so `{"Name": .., "Parent": {"Name": ..}}` yields headers
    /// `Name` and `Parent.Name`.
    pub fn generate(schema: &Value, allow_edit: bool) -> Result<Vec<ColumnDescriptor>, GridError> {
        let object = schema
            .as_object()
            .ok_or_else(|| GridError::InvalidSchema("schema must be a JSON object".into()))?;
        let mut generator = ColumnGenerator::default();
        generator.walk(object, "", allow_edit)?;
        Ok(generator.columns)
    }

    fn walk(&mut self, object: &Map<String, Value>, prefix: &str, allow_edit: bool) -> Result<(), GridError> {
        for (key, value) in object {
            let binding = format!("{prefix}{key}");
            match value {
                Value::String(type_name) => {
                    let Some(column_type) = column_type_for(type_name) else {
                        log::debug!("skipping binary column '{binding}'");
                        continue;
                    };
                    self.push(key, binding, column_type, type_name, allow_edit);
                }
                Value::Object(children) => {
                    self.walk(children, &format!("{binding}."), allow_edit)?;
                }
                other => {
                    return Err(GridError::InvalidSchema(format!(
                        "'{binding}' must be a type name or an object, got {other}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, key: &str, binding: String, column_type: ColumnType, type_name: &str, allow_edit: bool) {
        let header = if self.headers.contains(key) {
            binding.clone()
        } else {
            key.to_string()
        };
        self.headers.insert(header.clone());

        let decimal_places = type_name
            .eq_ignore_ascii_case("decimal")
            .then_some(DECIMAL_PLACES);

        self.columns.push(ColumnDescriptor {
            binding,
            header,
            column_type,
            auto_generated: true,
            allow_edit,
            decimal_places,
        });
    }
}

/// Check that a dotted binding resolves through the schema, segment by segment.
pub fn validate_binding(schema: &Value, binding: &str) -> Result<(), GridError> {
    let mut current = schema;
    for segment in binding.split('.') {
        current = current
            .as_object()
            .and_then(|object| object.get(segment))
            .ok_or_else(|| {
                log::warn!("binding '{binding}' not found in data source schema");
                GridError::BindingNotFound {
                    binding: binding.to_string(),
                }
            })?;
    }
    Ok(())
}

/// Would assigning `schema` add bindings not in `existing`?
///
/// Checked one level deep: every field of each top-level entity must already
/// be registered as `Entity.Field`.
pub fn has_new_columns<S: AsRef<str>>(existing: &[S], schema: &Value) -> bool {
    let Some(object) = schema.as_object() else {
        return false;
    };
    let known: HashSet<&str> = existing.iter().map(|b| b.as_ref()).collect();
    object.iter().any(|(source, value)| match value {
        Value::Object(fields) => fields
            .keys()
            .any(|field| !known.contains(format!("{source}.{field}").as_str())),
        _ => !known.contains(source.as_str()),
    })
}
