// Sheet definitions loaded from TOML
//
// ```toml
// [sheet]
// client_id = "orders"
// row_key = "#{row.id}"
// sort_by = "#{row.name}"
//
// [[columns]]
// header = "Qty"
// value = "#{row.qty}"
// type = "numeric"
// converter = { kind = "integer" }
//
// [[columns.validators]]
// kind = "range"
// min = 0
// max = 100
// ```

pub mod column;
pub mod error;

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use gridsheet_engine::filter::SortOrder;
use gridsheet_engine::{Expression, Sheet, SheetOptions};

pub use column::{ColumnConfig, ConverterConfig, ValidatorConfig, ValidatorKind};
pub use error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetConfig {
    pub sheet: SheetSection,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetSection {
    pub client_id: String,
    pub widget_var: Option<String>,
    pub var: String,
    pub row_key: Option<Expression>,
    pub sort_by: Option<Expression>,
    pub sort_order: SortOrder,
    pub error_message: Option<String>,
    pub style_class: Option<String>,
    pub row_style_class: Option<Expression>,
    pub current_row_class: Option<String>,
    pub current_col_class: Option<String>,
    pub stretch_h: Option<String>,
    pub empty_message: Option<String>,
    pub fixed_rows: Option<u32>,
    pub fixed_cols: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub show_column_headers: bool,
    pub show_row_headers: bool,
}

impl Default for SheetSection {
    fn default() -> Self {
        let opts = SheetOptions::default();
        Self {
            client_id: opts.client_id,
            widget_var: None,
            var: opts.var,
            row_key: None,
            sort_by: None,
            sort_order: SortOrder::default(),
            error_message: None,
            style_class: None,
            row_style_class: None,
            current_row_class: None,
            current_col_class: None,
            stretch_h: None,
            empty_message: None,
            fixed_rows: None,
            fixed_cols: None,
            width: None,
            height: None,
            show_column_headers: opts.show_column_headers,
            show_row_headers: opts.show_row_headers,
        }
    }
}

impl SheetSection {
    pub fn options(&self) -> SheetOptions {
        SheetOptions {
            client_id: self.client_id.clone(),
            widget_var: self.widget_var.clone(),
            var: self.var.clone(),
            error_message: self.error_message.clone(),
            style_class: self.style_class.clone(),
            row_style_class: self.row_style_class.clone(),
            current_row_class: self.current_row_class.clone(),
            current_col_class: self.current_col_class.clone(),
            stretch_h: self.stretch_h.clone(),
            empty_message: self.empty_message.clone(),
            fixed_rows: self.fixed_rows,
            fixed_cols: self.fixed_cols,
            width: self.width,
            height: self.height,
            show_column_headers: self.show_column_headers,
            show_row_headers: self.show_row_headers,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl SheetConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: SheetConfig = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::debug!(
            "loaded sheet '{}' with {} columns from {}",
            config.sheet.client_id,
            config.columns.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("client_id must not be blank".into()));
        }
        if self.columns.is_empty() {
            return Err(ConfigError::Invalid("at least one column is required".into()));
        }

        // Field expressions must read the row variable
        let var = &self.sheet.var;
        let check = |owner: &str, expr: &Expression| match expr {
            Expression::Field { var: v, .. } if v != var => Err(ConfigError::Invalid(format!(
                "{owner}: expression '{expr}' uses variable '{v}', expected '{var}'"
            ))),
            _ => Ok(()),
        };
        for expr in [&self.sheet.row_key, &self.sheet.sort_by, &self.sheet.row_style_class]
            .into_iter()
            .flatten()
        {
            check("sheet", expr)?;
        }
        for column in &self.columns {
            let owner = format!("column '{}'", column.header);
            if !column.value.is_field() {
                return Err(ConfigError::Invalid(format!("{owner}: value must be a field expression")));
            }
            for expr in column.expressions() {
                check(&owner, expr)?;
            }
        }
        Ok(())
    }

    /// Assemble a sheet over `rows`.
    ///
    /// Converters and validators are built here, so a bad pattern fails
    /// before any request is handled.
    pub fn build_sheet(&self, rows: Vec<Value>) -> Result<Sheet<Value>, ConfigError> {
        let mut sheet = Sheet::new(self.sheet.options())
            .with_sort(self.sheet.sort_by.clone(), self.sheet.sort_order)
            .with_rows(rows);
        if let Some(key) = &self.sheet.row_key {
            sheet = sheet.with_row_key(key.clone());
        }
        for column in &self.columns {
            sheet = sheet.with_column(column.build()?);
        }
        Ok(sheet)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
