use serde::{Deserialize, Serialize};

/// Kind of column, driving editors, value normalization and rule comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Checkbox,
    Date,
    DateTime,
}

impl ColumnType {
    /// Date and DateTime columns carry calendar semantics.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Checkbox => write!(f, "checkbox"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "dateTime"),
        }
    }
}
