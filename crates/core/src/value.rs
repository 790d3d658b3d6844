//! Typed cell values.
//!
//! A `CellValue` is what a column accessor reads from a row and what a
//! converter produces from submitted text. It is deliberately small: the
//! client grid only ever sees strings, so anything richer lives in the
//! application's row objects.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for the plain string form of dates.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// A typed value held by (or destined for) one cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or empty text. Used for required-field checks.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness for flag expressions (read-only cells and the like).
    ///
    /// Text counts as true only when it spells `true` (any case).
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0,
            CellValue::Date(_) => true,
            CellValue::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }

    /// Plain string form, used when a column has no converter.
    pub fn display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Date(d) => d.format(ISO_DATE).to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Build from a JSON value. Arrays and objects keep their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// JSON form. Integral numbers are written as integers, dates as ISO text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Number(n) => {
                if is_integral(*n) {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            CellValue::Date(d) => serde_json::Value::String(d.format(ISO_DATE).to_string()),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

pub(crate) fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

fn format_number(n: f64) -> String {
    if is_integral(n) {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Tagged serde form (`{"type": "text", "value": "2024-03-09"}`).
///
/// The plain form is untagged, so text that parses as a date would come
/// back as a date. Snapshots use this one with `#[serde(with = ...)]`.
pub mod tagged {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::CellValue;

    #[derive(Serialize, Deserialize)]
    #[serde(tag = "type", content = "value", rename_all = "lowercase")]
    enum Tagged {
        Null,
        Bool(bool),
        Number(f64),
        Date(NaiveDate),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &CellValue, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = match value {
            CellValue::Null => Tagged::Null,
            CellValue::Bool(b) => Tagged::Bool(*b),
            CellValue::Number(n) => Tagged::Number(*n),
            CellValue::Date(d) => Tagged::Date(*d),
            CellValue::Text(s) => Tagged::Text(s.clone()),
        };
        tagged.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CellValue, D::Error> {
        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::Null => CellValue::Null,
            Tagged::Bool(b) => CellValue::Bool(b),
            Tagged::Number(n) => CellValue::Number(n),
            Tagged::Date(d) => CellValue::Date(d),
            Tagged::Text(s) => CellValue::Text(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_string() {
        assert_eq!(CellValue::Null.display_string(), "");
        assert_eq!(CellValue::Number(5.0).display_string(), "5");
        assert_eq!(CellValue::Number(2.5).display_string(), "2.5");
        assert_eq!(CellValue::Bool(true).display_string(), "true");
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(CellValue::Date(d).display_string(), "2024-03-09");
    }

    #[test]
    fn test_is_empty() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::text("").is_empty());
        assert!(!CellValue::text(" ").is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(CellValue::from_json(&json!(3)), CellValue::Number(3.0));
        assert_eq!(CellValue::from_json(&json!("x")), CellValue::text("x"));
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Null);
        assert_eq!(CellValue::Number(3.0).to_json(), json!(3));
        assert_eq!(CellValue::Number(3.25).to_json(), json!(3.25));
    }

    #[test]
    fn test_truthiness() {
        assert!(CellValue::Bool(true).is_truthy());
        assert!(CellValue::text("TRUE").is_truthy());
        assert!(!CellValue::text("yes").is_truthy());
        assert!(!CellValue::Null.is_truthy());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapped(#[serde(with = "super::tagged")] CellValue);

    #[test]
    fn test_tagged_keeps_date_like_text() {
        let text = Wrapped(CellValue::text("2024-03-09"));
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json, json!({"type": "text", "value": "2024-03-09"}));
        assert_eq!(serde_json::from_value::<Wrapped>(json).unwrap(), text);

        let date = Wrapped(CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()));
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(serde_json::from_str::<Wrapped>(&json).unwrap(), date);

        let null: Wrapped = serde_json::from_value(json!({"type": "null"})).unwrap();
        assert_eq!(null, Wrapped(CellValue::Null));
    }
}
