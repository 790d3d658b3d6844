//! Inbound request parameters.
//!
//! Every parameter is prefixed with the sheet's client id:
//!
//! | param | content |
//! |---|---|
//! | `{id}_input` | `{"<any>": [row, col, oldValue, newValue], ...}` |
//! | `{id}_selection` | `[row, col, lastRow, lastCol]` |
//! | `{id}_focus` | focus id |
//! | `{id}_sortby` | visible column index, `-1` for none |
//! | `{id}_sortorder` | `ascending` / `descending` / `unsorted` |
//! | `{id}_filter_<n>` | filter text of visible column `n` |
//!
//! Malformed JSON is logged and the whole payload is dropped.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use gridsheet_core::CellValue;
use gridsheet_engine::input::{CellDelta, SelectionInput, SheetInput};

pub const BEHAVIOR_EVENT_PARAM: &str = "javax.faces.behavior.event";
pub const BEHAVIOR_SOURCE_PARAM: &str = "javax.faces.source";
pub const PARTIAL_PARAM: &str = "javax.faces.partial.ajax";

/// Why a payload was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadError {
    Json(String),
    Shape(String),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Json(msg) => write!(f, "invalid JSON: {msg}"),
            PayloadError::Shape(msg) => write!(f, "unexpected shape: {msg}"),
        }
    }
}

impl std::error::Error for PayloadError {}

fn index_at(items: &[Value], i: usize, what: &str) -> Result<usize, PayloadError> {
    items
        .get(i)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| PayloadError::Shape(format!("{what} must be a non-negative integer")))
}

/// `newValue` text. The client sends strings, but numbers and booleans
/// from pasted data are accepted; null is blank.
fn text_of(value: &Value) -> Result<String, PayloadError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(PayloadError::Shape(format!("cell value {other} is not a scalar"))),
    }
}

/// Decode the `_input` delta object.
pub fn parse_deltas(json: &str) -> Result<Vec<CellDelta>, PayloadError> {
    let object: serde_json::Map<String, Value> =
        serde_json::from_str(json).map_err(|e| PayloadError::Json(e.to_string()))?;

    let mut deltas = Vec::with_capacity(object.len());
    for (name, entry) in &object {
        let items = entry
            .as_array()
            .filter(|a| a.len() == 4)
            .ok_or_else(|| PayloadError::Shape(format!("delta '{name}' must be [row, col, old, new]")))?;
        deltas.push(CellDelta {
            row: index_at(items, 0, "row")?,
            col: index_at(items, 1, "col")?,
            old_value: CellValue::from_json(&items[2]),
            new_value: text_of(&items[3])?,
        });
    }
    Ok(deltas)
}

/// Decode the `_selection` array.
pub fn parse_selection(json: &str) -> Result<SelectionInput, PayloadError> {
    let items: Vec<Value> = serde_json::from_str(json).map_err(|e| PayloadError::Json(e.to_string()))?;
    if items.len() < 4 {
        return Err(PayloadError::Shape("selection must be [row, col, lastRow, lastCol]".into()));
    }
    Ok(SelectionInput {
        row: index_at(&items, 0, "row")?,
        col: index_at(&items, 1, "col")?,
        last_row: index_at(&items, 2, "lastRow")?,
        last_col: index_at(&items, 3, "lastCol")?,
        raw: json.to_string(),
    })
}

fn non_blank(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name).filter(|v| !v.is_empty()).cloned()
}

/// Decode every sheet parameter of one request.
pub fn parse_request(client_id: &str, params: &HashMap<String, String>) -> SheetInput {
    let param = |suffix: &str| format!("{client_id}_{suffix}");
    let mut input = SheetInput::default();

    if let Some(json) = non_blank(params, &param("input")) {
        match parse_deltas(&json) {
            Ok(deltas) => input.deltas = deltas,
            Err(e) => log::error!("Failed parsing cell updates for '{client_id}': {e}"),
        }
    }

    if let Some(json) = non_blank(params, &param("selection")) {
        match parse_selection(&json) {
            Ok(selection) => input.selection = Some(selection),
            Err(e) => log::error!("Failed parsing cell selection for '{client_id}': {e}"),
        }
    }

    input.focus = params.get(&param("focus")).cloned();

    if let Some(text) = params.get(&param("sortby")) {
        match text.trim().parse::<i64>() {
            Ok(col) => input.sort_by = Some(col),
            Err(e) => log::error!("Bad sort column '{text}' for '{client_id}': {e}"),
        }
    }
    input.sort_order = params.get(&param("sortorder")).cloned();

    let filter_prefix = param("filter_");
    input.filters = params
        .iter()
        .filter_map(|(name, value)| {
            let col = name.strip_prefix(&filter_prefix)?.parse::<usize>().ok()?;
            Some((col, value.clone()))
        })
        .collect::<BTreeMap<_, _>>();

    input.behavior_event = params.get(BEHAVIOR_EVENT_PARAM).cloned();
    input.behavior_source = params.get(BEHAVIOR_SOURCE_PARAM).cloned();
    input.partial = params.get(PARTIAL_PARAM).is_some_and(|v| v == "true");
    input
}
