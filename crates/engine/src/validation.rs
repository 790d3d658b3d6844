//! Cell validators.
//!
//! Validators run after a submitted value has been converted and placed in
//! the edit buffer. They see the typed value only; a failure is reported as
//! a [`Diagnostic`] and never rolls the value back.
//!
//! ## Case Sensitivity
//!
//! - **List validation matching**: Case-sensitive. "Yes" != "yes".
//! - **Pattern validation**: whatever the regex says.

use std::fmt::Debug;

use regex::Regex;

use gridsheet_core::CellValue;

use crate::message::Diagnostic;

const VALIDATION_ERROR: &str = "Validation Error";

/// A check applied to a converted cell value.
pub trait Validator: Debug + Send + Sync {
    fn validate(&self, value: &CellValue) -> Result<(), Diagnostic>;
}

// ============================================================================
// Core Types
// ============================================================================

/// A validation rule that constrains cell input.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    /// The type of validation to apply.
    pub rule_type: ValidationType,
    /// If true, empty/blank values are always valid.
    pub ignore_blank: bool,
    /// Message used instead of the generated one.
    pub message: Option<String>,
}

impl ValidationRule {
    /// Create a new validation rule with the given type.
    pub fn new(rule_type: ValidationType) -> Self {
        Self {
            rule_type,
            ignore_blank: true,
            message: None,
        }
    }

    /// Set ignore_blank option.
    pub fn with_ignore_blank(mut self, ignore: bool) -> Self {
        self.ignore_blank = ignore;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Create a list validation rule from inline values.
    pub fn list(values: Vec<String>) -> Self {
        Self::new(ValidationType::List(values))
    }

    /// Create a whole number validation rule.
    pub fn whole_number(constraint: NumericConstraint) -> Self {
        Self::new(ValidationType::WholeNumber(constraint))
    }

    /// Create a decimal validation rule.
    pub fn decimal(constraint: NumericConstraint) -> Self {
        Self::new(ValidationType::Decimal(constraint))
    }

    /// Create a text length validation rule.
    pub fn text_length(constraint: NumericConstraint) -> Self {
        Self::new(ValidationType::TextLength(constraint))
    }

    /// Create a pattern rule. The whole display text must match.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self::new(ValidationType::Pattern(anchored)))
    }

    fn fail(&self, generated: String) -> Diagnostic {
        Diagnostic::new(VALIDATION_ERROR, self.message.clone().unwrap_or(generated))
    }
}

/// The type of validation to apply.
#[derive(Debug, Clone)]
pub enum ValidationType {
    /// No validation (accept any value).
    AnyValue,
    /// Restrict to integers within bounds.
    WholeNumber(NumericConstraint),
    /// Restrict to decimals within bounds.
    Decimal(NumericConstraint),
    /// Restrict text to character count bounds.
    TextLength(NumericConstraint),
    /// Restrict to a list of allowed values.
    List(Vec<String>),
    /// Display text must match the regex.
    Pattern(Regex),
}

/// Numeric constraint for validation (used by WholeNumber, Decimal, TextLength).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericConstraint {
    /// The comparison operator.
    pub operator: ComparisonOperator,
    /// First value (required for all operators).
    pub value1: f64,
    /// Second value (required for Between/NotBetween).
    pub value2: Option<f64>,
}

impl NumericConstraint {
    fn single(operator: ComparisonOperator, value: f64) -> Self {
        Self {
            operator,
            value1: value,
            value2: None,
        }
    }

    /// Create a "between" constraint.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            operator: ComparisonOperator::Between,
            value1: min,
            value2: Some(max),
        }
    }

    /// Create a "not between" constraint.
    pub fn not_between(min: f64, max: f64) -> Self {
        Self {
            operator: ComparisonOperator::NotBetween,
            value1: min,
            value2: Some(max),
        }
    }

    pub fn equal_to(value: f64) -> Self {
        Self::single(ComparisonOperator::EqualTo, value)
    }

    pub fn not_equal_to(value: f64) -> Self {
        Self::single(ComparisonOperator::NotEqualTo, value)
    }

    pub fn greater_than(value: f64) -> Self {
        Self::single(ComparisonOperator::GreaterThan, value)
    }

    pub fn less_than(value: f64) -> Self {
        Self::single(ComparisonOperator::LessThan, value)
    }

    pub fn greater_than_or_equal(value: f64) -> Self {
        Self::single(ComparisonOperator::GreaterThanOrEqual, value)
    }

    pub fn less_than_or_equal(value: f64) -> Self {
        Self::single(ComparisonOperator::LessThanOrEqual, value)
    }

    pub fn holds(&self, x: f64) -> bool {
        eval_numeric_constraint(x, self.operator, self.value1, self.value2)
    }

    /// Human description, e.g. "between 1 and 10".
    pub fn describe(&self) -> String {
        let a = fmt_bound(self.value1);
        let b = fmt_bound(self.value2.unwrap_or(self.value1));
        match self.operator {
            ComparisonOperator::Between => format!("between {a} and {b}"),
            ComparisonOperator::NotBetween => format!("not between {a} and {b}"),
            ComparisonOperator::EqualTo => format!("equal to {a}"),
            ComparisonOperator::NotEqualTo => format!("not equal to {a}"),
            ComparisonOperator::GreaterThan => format!("greater than {a}"),
            ComparisonOperator::LessThan => format!("less than {a}"),
            ComparisonOperator::GreaterThanOrEqual => format!("greater than or equal to {a}"),
            ComparisonOperator::LessThanOrEqual => format!("less than or equal to {a}"),
        }
    }
}

fn fmt_bound(n: f64) -> String {
    CellValue::Number(n).display_string()
}

/// Comparison operator for numeric constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

// ============================================================================
// Numeric Helpers
// ============================================================================

/// Error when parsing numeric input.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericParseError {
    /// Input is empty (after trimming whitespace).
    Empty,
    /// Input contains invalid characters or format.
    InvalidFormat,
    /// Input has a fractional part but an integer is required.
    FractionalNotAllowed,
}

impl std::fmt::Display for NumericParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericParseError::Empty => write!(f, "Value is empty"),
            NumericParseError::InvalidFormat => write!(f, "Value is not a valid number"),
            NumericParseError::FractionalNotAllowed => write!(f, "Whole number required (no decimals)"),
        }
    }
}

/// Parse user input as a number.
///
/// # Rules
/// - Whitespace is trimmed
/// - Leading `+` is allowed
/// - Decimal point allowed only if `allow_decimal` is true
/// - Without decimals: rejects any fractional input (including `3.0`, `3.`)
///
/// # Examples
/// ```
/// use gridsheet_engine::validation::parse_numeric_input;
///
/// assert!(parse_numeric_input("3.14", true).is_ok());
/// assert!(parse_numeric_input(".5", true).is_ok());
///
/// assert!(parse_numeric_input("3.14", false).is_err());
/// assert!(parse_numeric_input("3.0", false).is_err());
/// assert!(parse_numeric_input("3", false).is_ok());
/// ```
pub fn parse_numeric_input(value: &str, allow_decimal: bool) -> Result<f64, NumericParseError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }

    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if normalized.is_empty() {
        return Err(NumericParseError::InvalidFormat);
    }

    if !allow_decimal && normalized.contains('.') {
        return Err(NumericParseError::FractionalNotAllowed);
    }

    let n = normalized
        .parse::<f64>()
        .map_err(|_| NumericParseError::InvalidFormat)?;
    if !n.is_finite() {
        return Err(NumericParseError::InvalidFormat);
    }
    Ok(n)
}

/// Evaluate a numeric constraint.
///
/// # Between Inclusivity
/// - `Between(a, b)`: returns true if `a <= x <= b` (inclusive)
/// - `NotBetween(a, b)`: returns true if `x < a || x > b`
pub fn eval_numeric_constraint(
    x: f64,
    operator: ComparisonOperator,
    a: f64,
    b: Option<f64>,
) -> bool {
    match operator {
        ComparisonOperator::Between => {
            let max = b.unwrap_or(a);
            x >= a && x <= max
        }
        ComparisonOperator::NotBetween => {
            let max = b.unwrap_or(a);
            x < a || x > max
        }
        ComparisonOperator::EqualTo => (x - a).abs() < f64::EPSILON,
        ComparisonOperator::NotEqualTo => (x - a).abs() >= f64::EPSILON,
        ComparisonOperator::GreaterThan => x > a,
        ComparisonOperator::LessThan => x < a,
        ComparisonOperator::GreaterThanOrEqual => x >= a,
        ComparisonOperator::LessThanOrEqual => x <= a,
    }
}

/// Numeric reading of a converted value. Text is accepted when it parses,
/// so rules also work on columns without a converter.
fn numeric_value(value: &CellValue, allow_decimal: bool) -> Option<f64> {
    match value {
        CellValue::Number(n) if allow_decimal || n.fract() == 0.0 => Some(*n),
        CellValue::Text(s) => parse_numeric_input(s, allow_decimal).ok(),
        _ => None,
    }
}

// ============================================================================
// Validator impl
// ============================================================================

impl Validator for ValidationRule {
    fn validate(&self, value: &CellValue) -> Result<(), Diagnostic> {
        if self.ignore_blank && value.is_empty() {
            return Ok(());
        }

        match &self.rule_type {
            ValidationType::AnyValue => Ok(()),
            ValidationType::WholeNumber(c) => match numeric_value(value, false) {
                Some(n) if c.holds(n) => Ok(()),
                _ => Err(self.fail(format!("Value must be a whole number {}.", c.describe()))),
            },
            ValidationType::Decimal(c) => match numeric_value(value, true) {
                Some(n) if c.holds(n) => Ok(()),
                _ => Err(self.fail(format!("Value must be a number {}.", c.describe()))),
            },
            ValidationType::TextLength(c) => {
                let len = value.display_string().chars().count() as f64;
                if c.holds(len) {
                    Ok(())
                } else {
                    Err(self.fail(format!("Length must be {}.", c.describe())))
                }
            }
            ValidationType::List(items) => {
                let text = value.display_string();
                let trimmed = text.trim();
                if items.iter().any(|item| item.trim() == trimmed) {
                    Ok(())
                } else {
                    Err(self.fail(format!("Value must be one of: {}.", items.join(", "))))
                }
            }
            ValidationType::Pattern(re) => {
                if re.is_match(&value.display_string()) {
                    Ok(())
                } else {
                    Err(self.fail("Value does not match the expected format.".to_string()))
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
