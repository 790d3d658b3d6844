use std::sync::Arc;

use serde::Deserialize;

use gridsheet_engine::convert::{BooleanConverter, Converter, DateConverter, NumberConverter};
use gridsheet_engine::validation::{NumericConstraint, ValidationRule, Validator};
use gridsheet_engine::{Column, Expression, FilterOption};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub header: String,
    pub value: Expression,
    #[serde(rename = "type", default = "default_type")]
    pub col_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub readonly_cell: Option<Expression>,
    #[serde(default)]
    pub style_class: Option<Expression>,
    #[serde(default)]
    pub filter_by: Option<Expression>,
    #[serde(default)]
    pub filter_options: Option<Vec<FilterOption>>,
    #[serde(default)]
    pub sort_by: Option<Expression>,
    #[serde(default = "default_true")]
    pub rendered: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub required_message: Option<String>,
    #[serde(default)]
    pub validator_message: Option<String>,
    #[serde(default)]
    pub converter: Option<ConverterConfig>,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

fn default_type() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl ColumnConfig {
    /// Every expression the column declares.
    pub(crate) fn expressions(&self) -> impl Iterator<Item = &Expression> {
        std::iter::once(&self.value).chain(
            [&self.readonly_cell, &self.style_class, &self.filter_by, &self.sort_by]
                .into_iter()
                .flatten(),
        )
    }

    pub fn build(&self) -> Result<Column, ConfigError> {
        let mut column = Column::new(self.header.clone(), self.value.clone()).with_type(self.col_type.clone());
        column.col_width = self.width;
        column.readonly = self.readonly;
        column.readonly_cell = self.readonly_cell.clone();
        column.style_class = self.style_class.clone();
        column.filter_by = self.filter_by.clone();
        column.filter_options = self.filter_options.clone();
        column.sort_by = self.sort_by.clone();
        column.rendered = self.rendered;
        column.required = self.required;
        column.required_message = self.required_message.clone();
        column.validator_message = self.validator_message.clone();
        column.converter = self.converter.as_ref().map(ConverterConfig::build);
        for validator in &self.validators {
            column.validators.push(validator.build(&self.header)?);
        }
        Ok(column)
    }
}

// ---------------------------------------------------------------------------
// Converters
// ---------------------------------------------------------------------------

/// `converter = { kind = "date", pattern = "%d/%m/%Y" }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConverterConfig {
    Number,
    Integer,
    Boolean,
    Date {
        #[serde(default)]
        pattern: Option<String>,
    },
}

impl ConverterConfig {
    pub fn build(&self) -> Arc<dyn Converter> {
        match self {
            Self::Number => Arc::new(NumberConverter::decimal()),
            Self::Integer => Arc::new(NumberConverter::integer()),
            Self::Boolean => Arc::new(BooleanConverter),
            Self::Date { pattern: Some(p) } => Arc::new(DateConverter::with_pattern(p.clone())),
            Self::Date { pattern: None } => Arc::new(DateConverter::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorKind {
    /// Decimal within bounds.
    Range,
    /// Whole number, optionally within bounds.
    Whole,
    /// Text length within bounds.
    Length,
    List,
    Pattern,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    pub kind: ValidatorKind,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default = "default_true")]
    pub ignore_blank: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidatorConfig {
    fn constraint(&self, column: &str) -> Result<Option<NumericConstraint>, ConfigError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(ConfigError::Invalid(format!(
                "column '{column}': min {min} is greater than max {max}"
            ))),
            (Some(min), Some(max)) => Ok(Some(NumericConstraint::between(min, max))),
            (Some(min), None) => Ok(Some(NumericConstraint::greater_than_or_equal(min))),
            (None, Some(max)) => Ok(Some(NumericConstraint::less_than_or_equal(max))),
            (None, None) => Ok(None),
        }
    }

    fn bounded(&self, column: &str) -> Result<NumericConstraint, ConfigError> {
        self.constraint(column)?.ok_or_else(|| {
            ConfigError::Invalid(format!("column '{column}': {:?} validator needs min or max", self.kind))
        })
    }

    pub fn build(&self, column: &str) -> Result<Arc<dyn Validator>, ConfigError> {
        let rule = match self.kind {
            ValidatorKind::Range => ValidationRule::decimal(self.bounded(column)?),
            ValidatorKind::Length => ValidationRule::text_length(self.bounded(column)?),
            ValidatorKind::Whole => {
                let constraint = self
                    .constraint(column)?
                    .unwrap_or_else(|| NumericConstraint::between(i64::MIN as f64, i64::MAX as f64));
                ValidationRule::whole_number(constraint)
            }
            ValidatorKind::List => {
                if self.items.is_empty() {
                    return Err(ConfigError::Invalid(format!("column '{column}': list validator has no items")));
                }
                ValidationRule::list(self.items.clone())
            }
            ValidatorKind::Pattern => {
                let regex = self.regex.as_deref().ok_or_else(|| {
                    ConfigError::Invalid(format!("column '{column}': pattern validator needs regex"))
                })?;
                ValidationRule::pattern(regex).map_err(|e| ConfigError::Regex {
                    column: column.to_string(),
                    source: e.to_string(),
                })?
            }
        };
        let rule = rule.with_ignore_blank(self.ignore_blank);
        let rule = match &self.message {
            Some(text) => rule.with_message(text.clone()),
            None => rule,
        };
        Ok(Arc::new(rule))
    }
}
