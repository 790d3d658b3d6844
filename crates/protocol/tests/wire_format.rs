// End-to-end request/response tests: raw params in, widget JSON and scripts out.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use gridsheet_engine::convert::NumberConverter;
use gridsheet_engine::validation::{NumericConstraint, ValidationRule};
use gridsheet_engine::{Column, Expression, Sheet, SheetOptions};
use gridsheet_protocol::{hidden_fields, parse_request, partial_scripts, widget_config};

fn field(path: &str) -> Expression {
    Expression::field("row", path)
}

fn sheet() -> Sheet<Value> {
    let mut s = Sheet::new(SheetOptions::new("form:qty"))
        .with_row_key(field("sku"))
        .with_column(
            Column::new("SKU", field("sku"))
                .read_only()
                .with_filter_by(field("sku"))
                .with_sort_by(field("sku")),
        )
        .with_column(
            Column::new("Qty", field("qty"))
                .with_type("numeric")
                .with_sort_by(field("qty"))
                .with_converter(Arc::new(NumberConverter::integer()))
                .with_validator(Arc::new(
                    ValidationRule::whole_number(NumericConstraint::between(0.0, 100.0)),
                )),
        )
        .with_rows(vec![
            json!({"sku": "b-2", "qty": 7}),
            json!({"sku": "a-1", "qty": 3}),
            json!({"sku": "c-3", "qty": 12}),
        ])
        .with_sort(Some(field("sku")), gridsheet_engine::SortOrder::Ascending);
    s.prepare_render().unwrap();
    s
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn initial_render_is_sorted() {
    let s = sheet();
    let cfg = serde_json::to_value(widget_config(&s).unwrap()).unwrap();
    assert_eq!(cfg["data"], json!([["a-1", "3"], ["b-2", "7"], ["c-3", "12"]]));
    assert_eq!(cfg["readOnly"], json!({}));
    assert_eq!(cfg["columns"], json!([{"type": "text", "readOnly": true}, {"type": "numeric"}]));
    assert_eq!(cfg["filters"], json!([true, false]));
    assert_eq!(cfg["sortable"], json!([true, true]));
}

#[test]
fn edit_round_trip_updates_one_row() {
    let mut s = sheet();
    let input = parse_request(
        "form:qty",
        &params(&[
            ("form:qty_input", r#"{"0": [1, 1, 7, "9"]}"#),
            ("form:qty_sortby", "0"),
            ("form:qty_sortorder", "ascending"),
            ("javax.faces.partial.ajax", "true"),
        ]),
    );
    s.decode(&input).unwrap();
    s.validate().unwrap();
    s.update_model().unwrap();
    s.commit_updates();

    assert_eq!(s.rows()[0]["qty"], json!(9));
    let scripts = partial_scripts(&s).unwrap();
    assert_eq!(
        scripts,
        vec![
            r#"widget_form_qty.cfg.data[1]=["b-2","9"];widget_form_qty.ht.render();"#.to_string(),
            r"$('#form\\:qty_input').val('');form_qty_delta={};".to_string(),
        ]
    );
}

#[test]
fn out_of_range_value_reports_error_map() {
    let mut s = sheet();
    let input = parse_request(
        "form:qty",
        &params(&[
            ("form:qty_input", r#"{"0": [2, 1, 12, "500"]}"#),
            ("javax.faces.partial.ajax", "true"),
        ]),
    );
    s.decode(&input).unwrap();
    s.validate().unwrap();
    s.update_model().unwrap();

    assert!(!s.is_valid());
    assert_eq!(s.rows()[2]["qty"], json!(12));
    let scripts = partial_scripts(&s).unwrap();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].starts_with(r#"widget_form_qty.cfg.errors={"r2_c1":"#));
    assert!(scripts[1].ends_with(".addClass('ui-state-error')"));

    // the rejected value is still displayed for correction
    let cfg = serde_json::to_value(widget_config(&s).unwrap()).unwrap();
    assert_eq!(cfg["data"][2], json!(["c-3", "500"]));
}

#[test]
fn sort_and_filter_params_echo_back() {
    let mut s = sheet();
    let input = parse_request(
        "form:qty",
        &params(&[
            ("form:qty_sortby", "1"),
            ("form:qty_sortorder", "descending"),
            ("form:qty_filter_0", "-"),
            ("form:qty_selection", "[0,1,0,1]"),
        ]),
    );
    s.decode(&input).unwrap();
    s.prepare_render().unwrap();

    let cfg = serde_json::to_value(widget_config(&s).unwrap()).unwrap();
    assert_eq!(cfg["data"], json!([["c-3", "12"], ["b-2", "7"], ["a-1", "3"]]));

    let fields: HashMap<String, String> = hidden_fields(&s).into_iter().map(|f| (f.name, f.value)).collect();
    assert_eq!(fields["form:qty_sortby"], "1");
    assert_eq!(fields["form:qty_sortorder"], "descending");
    assert_eq!(fields["form:qty_filter_0"], "-");
    assert_eq!(fields["form:qty_selection"], "[0,1,0,1]");
    assert_eq!(fields["form:qty_input"], "");
}
