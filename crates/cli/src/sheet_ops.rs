//! `render` and `apply` commands.
//!
//! The data file is the model: a JSON array of row objects. `apply` runs
//! one request against it and prints a JSON report; with `--write` the
//! committed rows are written back and the client delta is reset.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use gridsheet_config::SheetConfig;
use gridsheet_engine::events::SheetEvent;
use gridsheet_engine::message::SheetMessage;
use gridsheet_engine::{BadUpdate, Sheet, SheetState, SheetUpdate};
use gridsheet_protocol::request::PARTIAL_PARAM;
use gridsheet_protocol::{hidden_fields, init_script, parse_request, partial_scripts, widget_config, HiddenField};

use crate::exit_codes::EXIT_BAD_UPDATES;
use crate::CliError;

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::output(format!("cannot encode {}: {e}", path.display())))?;
    std::fs::write(path, text + "\n").map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn print_stdout(text: &str) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}").map_err(|e| CliError::output(format!("stdout: {e}")))
}

/// Rows of the data file. Must be a JSON array.
pub(crate) fn load_rows(path: &Path) -> Result<Vec<Value>, CliError> {
    let text = read_text(path)?;
    match serde_json::from_str(&text) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(_) => Err(CliError::data(format!("{}: expected a JSON array of rows", path.display()))),
        Err(e) => Err(CliError::data(format!("{}: {e}", path.display()))),
    }
}

/// Request parameters. Strings are taken as-is; other values are posted as
/// their JSON text, so `_input` can be written as an object.
pub(crate) fn load_params(path: &Path) -> Result<HashMap<String, String>, CliError> {
    let text = read_text(path)?;
    let object: serde_json::Map<String, Value> = serde_json::from_str(&text)
        .map_err(|e| CliError::data(format!("{}: {e}", path.display())))
        .map_err(|e| e.with_hint("the request file is a JSON object of parameter name -> value"))?;
    Ok(object
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, value)| match value {
            Value::String(s) => (name, s),
            other => (name, other.to_string()),
        })
        .collect())
}

/// Saved state, or `None` when the file does not exist yet.
pub(crate) fn load_state(path: &Path) -> Result<Option<SheetState>, CliError> {
    if !path.exists() {
        log::debug!("no state at {}, starting fresh", path.display());
        return Ok(None);
    }
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| CliError::data(format!("{}: {e}", path.display())))
}

fn build_sheet(config: &Path, data: &Path) -> Result<Sheet<Value>, CliError> {
    let config = SheetConfig::load(config)?;
    let rows = load_rows(data)?;
    log::debug!("{} rows from {}", rows.len(), data.display());
    Ok(config.build_sheet(rows)?)
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

pub fn cmd_render(config: &Path, data: &Path, json: bool) -> Result<(), CliError> {
    let mut sheet = build_sheet(config, data)?;
    sheet.prepare_render()?;

    if json {
        let cfg = widget_config(&sheet)?;
        let text = serde_json::to_string_pretty(&cfg).map_err(|e| CliError::output(e.to_string()))?;
        print_stdout(&text)
    } else {
        print_stdout(&init_script(&sheet)?)
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

pub struct ApplyArgs {
    pub config: PathBuf,
    pub data: PathBuf,
    pub request: PathBuf,
    pub state: Option<PathBuf>,
    pub partial: bool,
    pub write: bool,
    pub save_state: Option<PathBuf>,
    pub strict: bool,
}

/// Printed by `apply`.
#[derive(Debug, Serialize)]
pub struct ApplyReport<'a> {
    pub valid: bool,
    pub updates: &'a [SheetUpdate<Value>],
    pub bad_updates: &'a [BadUpdate],
    pub messages: &'a [SheetMessage],
    pub events: &'a [SheetEvent],
    /// Partial-update scripts, or the full init script.
    pub scripts: Vec<String>,
    pub hidden_fields: Vec<HiddenField>,
}

pub fn cmd_apply(args: ApplyArgs) -> Result<(), CliError> {
    let mut sheet = build_sheet(&args.config, &args.data)?;

    let restored = match &args.state {
        Some(path) => load_state(path)?,
        None => None,
    };
    match restored {
        Some(state) => sheet.restore_state(state),
        None => sheet.prepare_render()?,
    }

    let mut params = load_params(&args.request)?;
    if args.partial {
        params.insert(PARTIAL_PARAM.to_string(), "true".to_string());
    }
    let input = parse_request(&sheet.options.client_id, &params);

    sheet.decode(&input)?;
    sheet.validate()?;
    sheet.update_model()?;

    if args.write && sheet.is_valid() {
        write_json(&args.data, &sheet.rows())?;
        log::info!("wrote {} rows to {}", sheet.rows().len(), args.data.display());
        sheet.commit_updates();
    }

    let scripts = if input.partial {
        partial_scripts(&sheet)?
    } else {
        sheet.prepare_render()?;
        vec![init_script(&sheet)?]
    };

    if let Some(path) = &args.save_state {
        write_json(path, &sheet.save_state())?;
        log::debug!("saved state to {}", path.display());
    }

    let report = ApplyReport {
        valid: sheet.is_valid(),
        updates: sheet.updates(),
        bad_updates: sheet.bad_updates(),
        messages: sheet.messages(),
        events: sheet.events().events(),
        scripts,
        hidden_fields: hidden_fields(&sheet),
    };
    let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::output(e.to_string()))?;
    print_stdout(&text)?;

    if args.strict && !report.valid {
        return Err(CliError {
            code: EXIT_BAD_UPDATES,
            message: format!("{} bad updates", report.bad_updates.len()),
            hint: None,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_params_stringifies_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(
            &path,
            r#"{"s_input": {"a": [0, 1, "x", "y"]}, "s_sortby": 2, "s_focus": "s", "s_selection": null}"#,
        )
        .unwrap();
        let params = load_params(&path).unwrap();
        assert_eq!(params["s_input"], r#"{"a":[0,1,"x","y"]}"#);
        assert_eq!(params["s_sortby"], "2");
        assert_eq!(params["s_focus"], "s");
        assert!(!params.contains_key("s_selection"));
    }

    #[test]
    fn test_load_rows_requires_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"{"id": 1}"#).unwrap();
        let err = load_rows(&path).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_DATA);
    }

    #[test]
    fn test_missing_state_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_state(&dir.path().join("state.json")).unwrap().is_none());
    }
}
