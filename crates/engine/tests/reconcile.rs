use std::sync::Arc;

use serde_json::{json, Value};

use gridsheet_core::{CellCoord, CellValue, RowKey};
use gridsheet_engine::convert::NumberConverter;
use gridsheet_engine::events::SheetEvent;
use gridsheet_engine::input::CellDelta;
use gridsheet_engine::message::{MessageTarget, MESSAGE_REQUIRED};
use gridsheet_engine::{Column, Expression, RenderRequest, Sheet, SheetError, SheetInput, SheetOptions};

fn field(path: &str) -> Expression {
    Expression::field("row", path)
}

fn delta(row: usize, col: usize, old: CellValue, new: &str) -> CellDelta {
    CellDelta {
        row,
        col,
        old_value: old,
        new_value: new.to_string(),
    }
}

fn deltas(items: Vec<CellDelta>) -> SheetInput {
    SheetInput {
        deltas: items,
        partial: true,
        ..SheetInput::default()
    }
}

fn three_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "amount": "old", "name": "Abacus"}),
        json!({"id": 2, "amount": "old", "name": "Bench"}),
        json!({"id": 3, "amount": "old", "name": null}),
    ]
}

fn amount_sheet(rows: Vec<Value>) -> Sheet<Value> {
    Sheet::new(SheetOptions::new("grid"))
        .with_row_key(field("id"))
        .with_column(
            Column::new("Amount", field("amount"))
                .with_type("numeric")
                .with_converter(Arc::new(NumberConverter::decimal())),
        )
        .with_column(Column::new("Name", field("name")).with_filter_by(field("name")))
        .with_rows(rows)
}

// -------------------------------------------------------------------------
// Scenario A: a numeric edit flows through to the model
// -------------------------------------------------------------------------

#[test]
fn numeric_edit_commits_to_model() {
    let mut sheet = amount_sheet(three_rows());
    sheet.prepare_render().unwrap();

    sheet
        .decode(&deltas(vec![delta(1, 0, CellValue::text("old"), "5")]))
        .unwrap();
    sheet.validate().unwrap();
    assert!(sheet.is_valid());
    assert!(sheet.bad_updates().is_empty());

    let coord = CellCoord::new(RowKey::Int(2), 0);
    assert_eq!(sheet.buffer().get_local(&coord), Some(&CellValue::Number(5.0)));
    assert_eq!(sheet.cell_value(&RowKey::Int(2), 0).unwrap(), CellValue::Number(5.0));
    assert_eq!(sheet.rows()[1]["amount"], json!("old"));

    sheet.update_model().unwrap();
    assert_eq!(sheet.rows()[1]["amount"], json!(5));
    assert!(sheet.buffer().get_local(&coord).is_none());
    assert_eq!(sheet.cell_value(&RowKey::Int(2), 0).unwrap(), CellValue::Number(5.0));

    let updates = sheet.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].row_index, 1);
    assert_eq!(updates[0].col_index, 0);
    assert_eq!(updates[0].old_value, CellValue::text("old"));
    assert_eq!(updates[0].new_value, CellValue::Number(5.0));
    assert_eq!(updates[0].row_data["amount"], json!(5));

    assert_eq!(sheet.render_requests(), &[RenderRequest::Rows(vec![RowKey::Int(2)])]);
    assert!(matches!(
        sheet.events().events().last(),
        Some(SheetEvent::UpdatesApplied { count: 1, .. })
    ));
}

// -------------------------------------------------------------------------
// Scenario B: a blank required cell
// -------------------------------------------------------------------------

#[test]
fn blank_required_cell_is_bad_update() {
    let mut sheet = amount_sheet(three_rows());
    sheet.columns_mut()[1].required = true;
    sheet.prepare_render().unwrap();

    sheet
        .decode(&deltas(vec![delta(0, 1, CellValue::text("Abacus"), "")]))
        .unwrap();
    sheet.validate().unwrap();

    assert!(!sheet.is_valid());
    assert_eq!(sheet.bad_updates().len(), 1);
    assert_eq!(sheet.bad_updates()[0].message, "A valid value for this column is required.");
    assert_eq!(sheet.bad_updates()[0].message, MESSAGE_REQUIRED);
    assert_eq!(sheet.bad_updates()[0].column_header.as_deref(), Some("Name"));
    let coord = CellCoord::new(RowKey::Int(1), 1);
    assert!(sheet.buffer().get_local(&coord).is_none());
    assert_eq!(sheet.buffer().get_submitted(&coord), Some(""));
}

#[test]
fn required_message_override_and_sheet_error_message() {
    let mut sheet = amount_sheet(three_rows());
    sheet.columns_mut()[1].required = true;
    sheet.columns_mut()[1].required_message = Some("Name please".into());
    sheet.options.error_message = Some("Fix the grid".into());
    sheet.prepare_render().unwrap();

    sheet
        .decode(&deltas(vec![
            delta(0, 1, CellValue::Null, ""),
            delta(1, 1, CellValue::Null, ""),
        ]))
        .unwrap();
    sheet.validate().unwrap();

    // second blank on the same column is not reported again
    assert_eq!(sheet.bad_updates().len(), 1);
    assert_eq!(sheet.bad_updates()[0].message, "Name please");
    let global: Vec<_> = sheet
        .messages()
        .iter()
        .filter(|m| m.target == MessageTarget::Global)
        .collect();
    assert_eq!(global.len(), 1);
    assert_eq!(global[0].detail, "Fix the grid");
}

// -------------------------------------------------------------------------
// Scenario C: case-insensitive filtering
// -------------------------------------------------------------------------

#[test]
fn filter_matches_case_insensitively_and_drops_nulls() {
    let mut sheet = amount_sheet(three_rows());
    sheet.columns_mut()[1].filter_value = Some("ab".into());
    sheet.prepare_render().unwrap();

    assert_eq!(sheet.row_count(), 1);
    assert_eq!(sheet.render_row(0).unwrap().key, RowKey::Int(1));
    assert!(sheet.row_map().get(&RowKey::Int(3)).is_none());

    sheet.columns_mut()[1].filter_value = Some("e".into());
    sheet.sort_and_filter().unwrap();
    // "Bench" matches, the null name never does
    assert_eq!(sheet.row_count(), 1);
    assert_eq!(sheet.render_row(0).unwrap().key, RowKey::Int(2));
}

// -------------------------------------------------------------------------
// Partial failure
// -------------------------------------------------------------------------

#[test]
fn one_conversion_failure_does_not_abort_batch() {
    let mut sheet = amount_sheet(three_rows());
    sheet.prepare_render().unwrap();

    sheet
        .decode(&deltas(vec![
            delta(0, 0, CellValue::Null, "1"),
            delta(1, 0, CellValue::Null, "two"),
            delta(2, 0, CellValue::Null, "3"),
            delta(0, 1, CellValue::Null, "Abc"),
        ]))
        .unwrap();
    sheet.validate().unwrap();

    assert_eq!(sheet.bad_updates().len(), 1);
    assert_eq!(sheet.bad_updates()[0].row_key, RowKey::Int(2));
    assert_eq!(sheet.bad_updates()[0].value, CellValue::text("two"));
    assert_eq!(sheet.buffer().local_len(), 3);
    assert_eq!(sheet.buffer().submitted_len(), 1);
    assert_eq!(
        sheet.buffer().get_submitted(&CellCoord::new(RowKey::Int(2), 0)),
        Some("two")
    );
    assert_eq!(sheet.render_requests(), &[RenderRequest::Errors]);

    // invalid sheets are not committed
    sheet.update_model().unwrap();
    assert!(sheet.updates().is_empty());
    assert_eq!(sheet.buffer().local_len(), 3);
}

#[test]
fn bad_updates_reflect_latest_pass_only() {
    let mut sheet = amount_sheet(three_rows());
    sheet.prepare_render().unwrap();

    sheet.decode(&deltas(vec![delta(0, 0, CellValue::Null, "x")])).unwrap();
    sheet.validate().unwrap();
    assert_eq!(sheet.bad_updates().len(), 1);

    sheet.decode(&deltas(vec![delta(0, 0, CellValue::Null, "7")])).unwrap();
    sheet.validate().unwrap();
    assert!(sheet.bad_updates().is_empty());
    // a previous failure still refreshes the client error map
    assert_eq!(sheet.render_requests(), &[RenderRequest::Errors]);
}

// -------------------------------------------------------------------------
// Row keys
// -------------------------------------------------------------------------

#[test]
fn duplicate_row_keys_collide() {
    let rows = vec![
        json!({"id": 1, "amount": 10, "name": "first"}),
        json!({"id": 1, "amount": 20, "name": "second"}),
    ];
    let mut sheet = amount_sheet(rows);
    sheet.prepare_render().unwrap();
    assert_eq!(sheet.row_map().len(), 1);
    assert_eq!(sheet.row_map().entry(&RowKey::Int(1)).unwrap().sorted_index, 1);
}

#[test]
fn missing_row_key_is_fatal() {
    let mut sheet: Sheet<Value> = Sheet::new(SheetOptions::new("grid"))
        .with_column(Column::new("A", field("a")))
        .with_rows(vec![json!({"a": 1})]);
    assert_eq!(sheet.prepare_render(), Err(SheetError::MissingRowKey));
}

#[test]
fn delta_for_hidden_mapping_gap_is_fatal() {
    let mut sheet = amount_sheet(three_rows());
    sheet.columns_mut()[0].rendered = false;
    sheet.prepare_render().unwrap();
    let err = sheet
        .decode(&deltas(vec![delta(0, 1, CellValue::Null, "x")]))
        .unwrap_err();
    assert_eq!(err, SheetError::InvalidColumnIndex(1));
    assert_eq!(err.to_string(), "invalid index 1");
}
