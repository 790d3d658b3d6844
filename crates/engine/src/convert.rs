//! Value converters.
//!
//! A converter turns submitted cell text into a typed value and a typed
//! value back into the text the grid displays. Blank input always converts
//! to `Null`, so required checks see blank cells regardless of type.

use std::fmt::Debug;

use chrono::NaiveDate;

use gridsheet_core::value::ISO_DATE;
use gridsheet_core::CellValue;

use crate::message::Diagnostic;
use crate::validation::{parse_numeric_input, NumericParseError};

const CONVERSION_ERROR: &str = "Conversion Error";

/// Text <-> value conversion for one column.
pub trait Converter: Debug + Send + Sync {
    /// Display text for a value.
    fn as_string(&self, value: &CellValue) -> String;

    /// Typed value for submitted text.
    fn as_value(&self, text: &str) -> Result<CellValue, Diagnostic>;
}

// ============================================================================
// Numbers
// ============================================================================

/// Decimal or whole numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumberConverter {
    pub integer_only: bool,
}

impl NumberConverter {
    pub fn decimal() -> Self {
        Self { integer_only: false }
    }

    pub fn integer() -> Self {
        Self { integer_only: true }
    }
}

impl Converter for NumberConverter {
    fn as_string(&self, value: &CellValue) -> String {
        value.display_string()
    }

    fn as_value(&self, text: &str) -> Result<CellValue, Diagnostic> {
        match parse_numeric_input(text, !self.integer_only) {
            Ok(n) => Ok(CellValue::Number(n)),
            Err(NumericParseError::Empty) => Ok(CellValue::Null),
            Err(_) if self.integer_only => Err(Diagnostic::new(
                CONVERSION_ERROR,
                format!("'{text}' must be a number consisting of one or more digits."),
            )),
            Err(_) => Err(Diagnostic::new(
                CONVERSION_ERROR,
                format!("'{text}' is not a number."),
            )),
        }
    }
}

// ============================================================================
// Booleans
// ============================================================================

/// `true` (any case) is true, any other non-blank text is false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
    fn as_string(&self, value: &CellValue) -> String {
        match value {
            CellValue::Null => String::new(),
            other => other.is_truthy().to_string(),
        }
    }

    fn as_value(&self, text: &str) -> Result<CellValue, Diagnostic> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Null);
        }
        Ok(CellValue::Bool(trimmed.eq_ignore_ascii_case("true")))
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Dates in a chrono format pattern (ISO by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConverter {
    pub pattern: String,
}

impl Default for DateConverter {
    fn default() -> Self {
        Self {
            pattern: ISO_DATE.to_string(),
        }
    }
}

impl DateConverter {
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }

    fn example(&self) -> String {
        NaiveDate::from_ymd_opt(2013, 1, 31)
            .map(|d| d.format(&self.pattern).to_string())
            .unwrap_or_default()
    }
}

impl Converter for DateConverter {
    fn as_string(&self, value: &CellValue) -> String {
        match value {
            CellValue::Date(d) => d.format(&self.pattern).to_string(),
            other => other.display_string(),
        }
    }

    fn as_value(&self, text: &str) -> Result<CellValue, Diagnostic> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Null);
        }
        NaiveDate::parse_from_str(trimmed, &self.pattern)
            .map(CellValue::Date)
            .map_err(|_| {
                Diagnostic::new(
                    CONVERSION_ERROR,
                    format!(
                        "'{text}' could not be understood as a date. Example: {}",
                        self.example()
                    ),
                )
            })
    }
}
