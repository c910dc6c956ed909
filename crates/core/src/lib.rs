//! Core types shared by the grid feature engine: row identity, cell ranges,
//! cell values, column types and selection modes.

pub mod column;
pub mod range;
pub mod row;
pub mod selection_mode;
pub mod value;

pub use column::ColumnType;
pub use range::CellRange;
pub use row::RowId;
pub use selection_mode::SelectionMode;
pub use value::CellValue;
