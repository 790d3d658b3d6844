//! Value objects shared by the sheet engine, the wire protocol and the CLI.

pub mod coord;
pub mod row_key;
pub mod selection;
pub mod sparse;
pub mod value;

pub use coord::CellCoord;
pub use row_key::RowKey;
pub use selection::Selection;
pub use sparse::SparseCellMap;
pub use value::CellValue;
