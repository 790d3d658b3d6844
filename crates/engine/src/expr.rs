//! Row expressions and the row evaluation context.
//!
//! Per-row configuration (row key, cell value, filter source, sort key,
//! style classes) is written as `#{var.path}` expressions. They are
//! evaluated against an explicit [`EvalContext`]: a row is bound for the
//! duration of a [`RowBinding`] guard and unbound when the guard drops, so
//! a stale row can never leak into a later evaluation, even when the
//! caller bails out early with `?`.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use gridsheet_core::CellValue;

use crate::error::SheetError;

// =============================================================================
// Row
// =============================================================================

/// An application row object the sheet can read and write fields of.
pub trait Row {
    /// Value at a field path. Missing fields read as `Null`.
    fn field(&self, path: &[String]) -> CellValue;

    /// Write a value at a field path.
    fn set_field(&mut self, path: &[String], value: CellValue) -> Result<(), SheetError>;
}

/// JSON rows: objects addressed by dotted key paths.
impl Row for serde_json::Value {
    fn field(&self, path: &[String]) -> CellValue {
        let mut current = self;
        for segment in path {
            match current.get(segment) {
                Some(next) => current = next,
                None => return CellValue::Null,
            }
        }
        CellValue::from_json(current)
    }

    fn set_field(&mut self, path: &[String], value: CellValue) -> Result<(), SheetError> {
        let Some((last, parents)) = path.split_last() else {
            return Err(SheetError::FieldWrite {
                path: String::new(),
                reason: "empty path".to_string(),
            });
        };

        let mut current = self;
        for segment in parents {
            let object = current.as_object_mut().ok_or_else(|| not_an_object(path))?;
            current = object
                .entry(segment.clone())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        }

        let object = current.as_object_mut().ok_or_else(|| not_an_object(path))?;
        object.insert(last.clone(), value.to_json());
        Ok(())
    }
}

fn not_an_object(path: &[String]) -> SheetError {
    SheetError::FieldWrite {
        path: path.join("."),
        reason: "not an object".to_string(),
    }
}

// =============================================================================
// Expression
// =============================================================================

/// A per-row expression.
///
/// `#{row.qty}` reads field `qty` of the row bound to variable `row`.
/// Anything else is a literal; `true` and `false` evaluate to booleans.
/// Equality is by source form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Expression {
    Field { var: String, path: Vec<String> },
    Literal(String),
}

impl Expression {
    /// Field reference, e.g. `Expression::field("row", "address.city")`.
    pub fn field(var: impl Into<String>, path: &str) -> Self {
        Expression::Field {
            var: var.into(),
            path: path.split('.').map(str::to_string).collect(),
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Expression::Literal(text.into())
    }

    pub fn parse(text: &str) -> Result<Self, SheetError> {
        let trimmed = text.trim();
        let Some(inner) = trimmed.strip_prefix("#{").and_then(|s| s.strip_suffix('}')) else {
            return Ok(Expression::Literal(text.to_string()));
        };

        let mut segments = inner.trim().split('.').map(str::trim);
        let var = match segments.next() {
            Some(v) if is_identifier(v) => v.to_string(),
            _ => return Err(SheetError::ExpressionParse(format!("bad variable in '{text}'"))),
        };
        let mut path = Vec::new();
        for segment in segments {
            if !is_identifier(segment) {
                return Err(SheetError::ExpressionParse(format!("bad path segment in '{text}'")));
            }
            path.push(segment.to_string());
        }
        Ok(Expression::Field { var, path })
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Expression::Field { .. })
    }

    /// Write `value` into `row` through this expression.
    ///
    /// `var` is the sheet's row variable; a field expression naming another
    /// variable cannot be written through.
    pub fn assign<R: Row>(&self, var: &str, row: &mut R, value: CellValue) -> Result<(), SheetError> {
        match self {
            Expression::Field { var: v, path } if v == var => row.set_field(path, value),
            _ => Err(SheetError::ReadOnlyExpression(self.to_string())),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field { var, path } if path.is_empty() => write!(f, "#{{{var}}}"),
            Expression::Field { var, path } => write!(f, "#{{{var}.{}}}", path.join(".")),
            Expression::Literal(text) => f.write_str(text),
        }
    }
}

impl FromStr for Expression {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

impl TryFrom<String> for Expression {
    type Error = SheetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Expression::parse(&s)
    }
}

impl From<Expression> for String {
    fn from(expr: Expression) -> Self {
        expr.to_string()
    }
}

// =============================================================================
// Evaluation context
// =============================================================================

/// Explicit evaluation context: the row variable name plus the row
/// currently bound to it, if any.
pub struct EvalContext<'r, R> {
    var: &'r str,
    row: Option<&'r R>,
    row_index: Option<usize>,
}

impl<'r, R: Row> EvalContext<'r, R> {
    pub fn new(var: &'r str) -> Self {
        Self { var, row: None, row_index: None }
    }

    /// Bind `row` (at sorted position `index`) for the life of the guard.
    pub fn bind<'c>(&'c mut self, row: &'r R, index: usize) -> RowBinding<'c, 'r, R> {
        self.row = Some(row);
        self.row_index = Some(index);
        RowBinding { ctx: self }
    }

    pub fn var(&self) -> &str {
        self.var
    }

    pub fn is_bound(&self) -> bool {
        self.row.is_some()
    }

    /// Sorted position of the bound row.
    pub fn row_index(&self) -> Option<usize> {
        self.row_index
    }

    /// Evaluate an expression. Field references to an unbound or unknown
    /// variable evaluate to `Null`.
    pub fn eval(&self, expr: &Expression) -> CellValue {
        match expr {
            Expression::Literal(text) => match text.as_str() {
                "true" => CellValue::Bool(true),
                "false" => CellValue::Bool(false),
                _ => CellValue::Text(text.clone()),
            },
            Expression::Field { var, path } => match self.row {
                Some(row) if var == self.var => row.field(path),
                _ => CellValue::Null,
            },
        }
    }

    /// Evaluate an optional expression; absent evaluates to `Null`.
    pub fn eval_opt(&self, expr: Option<&Expression>) -> CellValue {
        expr.map(|e| self.eval(e)).unwrap_or(CellValue::Null)
    }
}

/// Scope guard for a bound row. Unbinds on drop.
pub struct RowBinding<'c, 'r, R> {
    ctx: &'c mut EvalContext<'r, R>,
}

impl<'c, 'r, R> Deref for RowBinding<'c, 'r, R> {
    type Target = EvalContext<'r, R>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'c, 'r, R> Drop for RowBinding<'c, 'r, R> {
    fn drop(&mut self) {
        self.ctx.row = None;
        self.ctx.row_index = None;
    }
}
