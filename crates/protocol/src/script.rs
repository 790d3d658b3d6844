//! Scripts for partial (AJAX) responses.

use gridsheet_core::RowKey;
use gridsheet_engine::{RenderRequest, Row, Sheet, SheetError};

use crate::render::error_map;

/// JSON text of a serializable value that cannot fail to encode.
fn json_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Replace the data of each dirty row still in the view, then redraw.
pub fn row_update_script<R: Row + Clone>(sheet: &Sheet<R>, keys: &[RowKey]) -> Result<String, SheetError> {
    let w = sheet.widget_var();
    let mut script = String::new();
    for key in keys {
        // filtered out by the refresh after commit
        let Some(entry) = sheet.row_map().get(key) else {
            continue;
        };
        let row = sheet.render_row(entry.sorted_index)?;
        let values: Vec<String> = row.values.into_iter().map(Option::unwrap_or_default).collect();
        script.push_str(&format!("{w}.cfg.data[{}]={};", entry.sorted_index, json_text(&values)));
    }
    script.push_str(&format!("{w}.ht.render();"));
    Ok(script)
}

/// Replace the client error map and redraw.
pub fn error_script<R: Row + Clone>(sheet: &Sheet<R>) -> String {
    let w = sheet.widget_var();
    format!("{w}.cfg.errors={};{w}.ht.render();", json_text(&error_map(sheet)))
}

/// Toggle the container error class.
pub fn error_class_script<R: Row + Clone>(sheet: &Sheet<R>) -> String {
    let w = sheet.widget_var();
    if sheet.bad_updates().is_empty() {
        format!("{w}.sheetDiv.removeClass('ui-state-error')")
    } else {
        format!("{w}.sheetDiv.removeClass('ui-state-error').addClass('ui-state-error')")
    }
}

/// Clear the posted delta and the client-side delta var.
pub fn reset_delta_script(client_id: &str) -> String {
    let jquery_id = client_id.replace(':', "\\\\:");
    let delta_var = client_id.replace(':', "_");
    format!("$('#{jquery_id}_input').val('');{delta_var}_delta={{}};")
}

/// Every script queued by the last request, in queue order.
pub fn partial_scripts<R: Row + Clone>(sheet: &Sheet<R>) -> Result<Vec<String>, SheetError> {
    let mut scripts = Vec::new();
    for request in sheet.render_requests() {
        match request {
            RenderRequest::Rows(keys) => scripts.push(row_update_script(sheet, keys)?),
            RenderRequest::Errors => {
                scripts.push(error_script(sheet));
                scripts.push(error_class_script(sheet));
            }
            RenderRequest::ResetDelta => scripts.push(reset_delta_script(&sheet.options.client_id)),
        }
    }
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsheet_core::CellValue;
    use gridsheet_engine::input::CellDelta;
    use gridsheet_engine::{Column, Expression, SheetInput, SheetOptions};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn sheet() -> Sheet<Value> {
        let mut s = Sheet::new(SheetOptions::new("grid"))
            .with_row_key(Expression::field("row", "id"))
            .with_column(Column::new("Name", Expression::field("row", "name")))
            .with_column(
                Column::new("Qty", Expression::field("row", "qty"))
                    .with_converter(Arc::new(gridsheet_engine::convert::NumberConverter::integer())),
            )
            .with_rows(vec![json!({"id": 1, "name": "a", "qty": 1}), json!({"id": 2, "name": "b", "qty": 2})]);
        s.prepare_render().unwrap();
        s
    }

    fn submit(s: &mut Sheet<Value>, row: usize, col: usize, text: &str) {
        s.decode(&SheetInput {
            deltas: vec![CellDelta {
                row,
                col,
                old_value: CellValue::Null,
                new_value: text.into(),
            }],
            partial: true,
            ..SheetInput::default()
        })
        .unwrap();
    }

    #[test]
    fn test_row_update_script() {
        let mut s = sheet();
        submit(&mut s, 1, 0, "z");
        s.validate().unwrap();
        s.update_model().unwrap();
        let scripts = partial_scripts(&s).unwrap();
        assert_eq!(scripts, vec![r#"widget_grid.cfg.data[1]=["z","2"];widget_grid.ht.render();"#.to_string()]);
    }

    #[test]
    fn test_error_scripts_escape_quotes() {
        let mut s = sheet();
        submit(&mut s, 0, 1, "1.5");
        s.validate().unwrap();
        let scripts = partial_scripts(&s).unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(
            scripts[0],
            "widget_grid.cfg.errors={\"r0_c1\":\"&apos;1.5&apos; must be a number consisting of one or more digits.\"};widget_grid.ht.render();"
        );
        assert_eq!(
            scripts[1],
            "widget_grid.sheetDiv.removeClass('ui-state-error').addClass('ui-state-error')"
        );
    }

    #[test]
    fn test_reset_delta_script() {
        assert_eq!(reset_delta_script("f:grid"), r"$('#f\\:grid_input').val('');f_grid_delta={};");
    }
}
