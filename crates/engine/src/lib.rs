pub mod column;
pub mod convert;
pub mod edit_buffer;
pub mod error;
pub mod events;
pub mod expr;
pub mod filter;
pub mod input;
pub mod message;
pub mod row_map;
pub mod sheet;
pub mod state;
pub mod updates;
pub mod validation;

pub use column::{Column, ColumnMapping, FilterOption};
pub use error::SheetError;
pub use expr::{EvalContext, Expression, Row};
pub use filter::SortOrder;
pub use input::SheetInput;
pub use sheet::{RenderRequest, RenderedRow, Sheet, SheetOptions, SheetPhase};
pub use state::{LocalEntry, SheetState};
pub use updates::{BadUpdate, SheetUpdate};
