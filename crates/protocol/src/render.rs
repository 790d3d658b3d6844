//! Outbound widget configuration and hidden inputs.

use std::collections::BTreeMap;

use serde::Serialize;

use gridsheet_core::SparseCellMap;
use gridsheet_engine::{FilterOption, Row, Sheet, SheetError};

pub const DEFAULT_EMPTY_MESSAGE: &str = "No Records Found";

/// Wire key of a sparse cell entry.
pub fn cell_key(row: usize, col: usize) -> String {
    format!("r{row}_c{col}")
}

/// Sparse cell map as a `{"r0_c1": value}` object.
pub fn sparse_object<T: Clone>(cells: &SparseCellMap<T>) -> BTreeMap<String, T> {
    cells
        .iter()
        .map(|((row, col), v)| (cell_key(row, col), v.clone()))
        .collect()
}

/// Error messages for the client error map.
pub fn error_map<R: Row + Clone>(sheet: &Sheet<R>) -> BTreeMap<String, String> {
    sparse_object(&sheet.error_cells())
        .into_iter()
        .map(|(k, msg)| (k, msg.replace('\'', "&apos;")))
        .collect()
}

/// Per-column filter widget: `false`, `true` (text input) or drop-down options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterSpec {
    Enabled(bool),
    Options(Vec<FilterOption>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    #[serde(rename = "type")]
    pub col_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// Client widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub id: String,
    pub widget_var: String,
    pub errors: BTreeMap<String, String>,
    pub data: Vec<Vec<String>>,
    pub styles: BTreeMap<String, String>,
    pub row_styles: Vec<Option<String>>,
    pub read_only: BTreeMap<String, bool>,
    pub delta: serde_json::Map<String, serde_json::Value>,
    pub filters: Vec<FilterSpec>,
    pub sortable: Vec<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_columns_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_rows_top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub empty_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stretch_h: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_row_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_col_class_name: Option<String>,
    pub row_headers: bool,
    /// Header texts, or `false` when headers are turned off.
    pub col_headers: serde_json::Value,
    pub columns: Vec<ColumnSpec>,
}

/// Build the widget config from the current view.
///
/// Call [`Sheet::prepare_render`] first so the view and mapping are fresh.
pub fn widget_config<R: Row + Clone>(sheet: &Sheet<R>) -> Result<WidgetConfig, SheetError> {
    let opts = &sheet.options;

    let mut data = Vec::with_capacity(sheet.row_count());
    let mut row_styles = Vec::with_capacity(sheet.row_count());
    let mut styles = SparseCellMap::new();
    let mut read_only = SparseCellMap::new();
    for i in 0..sheet.row_count() {
        let row = sheet.render_row(i)?;
        data.push(row.values.into_iter().map(Option::unwrap_or_default).collect());
        row_styles.push(row.row_style);
        for (col, class) in row.styles {
            styles.insert(i, col, class);
        }
        for col in row.read_only {
            read_only.insert(i, col, true);
        }
    }

    let visible: Vec<_> = sheet.visible_columns().map(|(_, c)| c).collect();
    let filters = visible
        .iter()
        .map(|c| match (&c.filter_by, &c.filter_options) {
            (None, _) => FilterSpec::Enabled(false),
            (Some(_), None) => FilterSpec::Enabled(true),
            (Some(_), Some(options)) => FilterSpec::Options(options.clone()),
        })
        .collect();
    let col_headers = if opts.show_column_headers {
        serde_json::Value::from(visible.iter().map(|c| c.header_text.clone()).collect::<Vec<_>>())
    } else {
        serde_json::Value::Bool(false)
    };

    Ok(WidgetConfig {
        id: opts.client_id.clone(),
        widget_var: sheet.widget_var(),
        errors: error_map(sheet),
        data,
        styles: sparse_object(&styles),
        row_styles,
        read_only: sparse_object(&read_only),
        delta: serde_json::Map::new(),
        filters,
        sortable: visible.iter().map(|c| c.is_sortable()).collect(),
        fixed_columns_left: opts.fixed_cols,
        fixed_rows_top: opts.fixed_rows,
        width: opts.width,
        height: opts.height,
        empty_message: opts
            .empty_message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_EMPTY_MESSAGE.to_string()),
        stretch_h: opts.stretch_h.clone(),
        current_row_class_name: opts.current_row_class.clone(),
        current_col_class_name: opts.current_col_class.clone(),
        row_headers: opts.show_row_headers,
        col_headers,
        columns: visible
            .iter()
            .map(|c| ColumnSpec {
                col_type: c.col_type.clone(),
                width: c.col_width,
                read_only: c.readonly,
            })
            .collect(),
    })
}

/// DOM-ready widget construction script.
pub fn init_script<R: Row + Clone>(sheet: &Sheet<R>) -> Result<String, SheetError> {
    let cfg = widget_config(sheet)?;
    // WidgetConfig holds only strings, numbers, bools and maps with string keys.
    let json = serde_json::to_string(&cfg).unwrap_or_else(|_| "{}".to_string());
    Ok(format!(
        "$(function(){{PrimeFaces.cw(\"Sheet\",\"{}\",{json});}});",
        cfg.widget_var
    ))
}

/// CSS classes of the outer container.
pub fn container_class<R: Row + Clone>(sheet: &Sheet<R>) -> String {
    let mut class = String::from("ui-handsontable ui-widget");
    if let Some(extra) = &sheet.options.style_class {
        class.push(' ');
        class.push_str(extra);
    }
    if !sheet.is_valid() {
        class.push_str(" ui-state-error");
    }
    class
}

/// A hidden input the client posts back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

impl HiddenField {
    fn new(name: String, value: impl Into<String>) -> Self {
        Self { name, value: value.into() }
    }
}

/// Hidden inputs echoing the current client state.
pub fn hidden_fields<R: Row + Clone>(sheet: &Sheet<R>) -> Vec<HiddenField> {
    let id = &sheet.options.client_id;
    let mut fields = vec![
        HiddenField::new(format!("{id}_input"), ""),
        HiddenField::new(format!("{id}_focus"), sheet.focus_id().unwrap_or_default()),
        HiddenField::new(format!("{id}_selection"), sheet.selection_json().unwrap_or_default()),
        HiddenField::new(format!("{id}_sortby"), sheet.sort_col_render_index().to_string()),
        HiddenField::new(format!("{id}_sortorder"), sheet.sort_order().as_str()),
    ];
    for (visible, (_, column)) in sheet.visible_columns().enumerate() {
        if column.is_filterable() {
            fields.push(HiddenField::new(
                format!("{id}_filter_{visible}"),
                column.filter_value.clone().unwrap_or_default(),
            ));
        }
    }
    fields
}
