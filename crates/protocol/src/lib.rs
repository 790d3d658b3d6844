//! Sheet wire format.
//!
//! The client widget posts its state as request parameters prefixed with the
//! sheet's client id and receives either a full widget configuration (initial
//! render) or a list of scripts (partial update).
//!
//! # Usage
//!
//! ```ignore
//! use gridsheet_protocol::{parse_request, partial_scripts};
//!
//! let input = parse_request(&sheet.options.client_id, &params);
//! sheet.decode(&input)?;
//! sheet.validate()?;
//! sheet.update_model()?;
//! for script in partial_scripts(&sheet)? {
//!     response.push(script);
//! }
//! ```

pub mod render;
pub mod request;
pub mod script;

pub use render::{
    container_class, hidden_fields, init_script, widget_config, ColumnSpec, FilterSpec, HiddenField, WidgetConfig,
    DEFAULT_EMPTY_MESSAGE,
};
pub use request::{parse_deltas, parse_request, parse_selection, PayloadError};
pub use script::partial_scripts;
