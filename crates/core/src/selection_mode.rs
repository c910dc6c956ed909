use serde::{Deserialize, Serialize};

/// How the user is allowed to select cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    /// Nothing can be selected.
    None,
    /// A single cell at a time.
    Cell,
    /// One contiguous block of cells.
    CellRange,
    /// A single whole row.
    Row,
    /// A contiguous block of whole rows.
    RowRange,
    /// Arbitrary whole rows toggled individually.
    ListBox,
    /// Any number of non-overlapping cell blocks.
    #[default]
    MultiRange,
}

impl SelectionMode {
    /// Row-based modes conflict with row selectors (checkbox column) and are
    /// not handled by the selection feature.
    pub fn is_supported(&self) -> bool {
        !matches!(self, SelectionMode::Row | SelectionMode::RowRange | SelectionMode::ListBox)
    }

    pub fn allows_multiple_ranges(&self) -> bool {
        matches!(self, SelectionMode::MultiRange)
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Cell => write!(f, "cell"),
            Self::CellRange => write!(f, "cellRange"),
            Self::Row => write!(f, "row"),
            Self::RowRange => write!(f, "rowRange"),
            Self::ListBox => write!(f, "listBox"),
            Self::MultiRange => write!(f, "multiRange"),
        }
    }
}
