//! User-facing diagnostics.

use serde::{Deserialize, Serialize};

use gridsheet_core::CellCoord;

/// Default text when a required cell is left blank.
pub const MESSAGE_REQUIRED: &str = "A valid value for this column is required.";

/// Failure reported by a converter or validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Same text for summary and detail.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            summary: text.clone(),
            detail: text,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// What a message is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageTarget {
    /// Not tied to any component (the sheet-level error message).
    Global,
    /// A single cell of this sheet.
    Cell { coord: CellCoord },
}

/// A message queued for display during the current request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetMessage {
    pub target: MessageTarget,
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl SheetMessage {
    pub fn cell_error(coord: CellCoord, diagnostic: &Diagnostic) -> Self {
        Self {
            target: MessageTarget::Cell { coord },
            severity: Severity::Error,
            summary: diagnostic.summary.clone(),
            detail: diagnostic.detail.clone(),
        }
    }

    pub fn global_error(text: &str) -> Self {
        Self {
            target: MessageTarget::Global,
            severity: Severity::Error,
            summary: text.to_string(),
            detail: text.to_string(),
        }
    }
}
