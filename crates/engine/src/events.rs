//! Event types for sheet notifications.
//!
//! Events are collected per request and read by the host after each phase.
//! They are also what the tests use to check phase ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use gridsheet_core::RowKey;

use crate::updates::BadUpdate;

/// Client behaviors the sheet can fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Cell values changed on the client.
    #[default]
    #[serde(rename = "change")]
    Change,
    /// Selection moved.
    #[serde(rename = "cellSelect")]
    CellSelect,
}

impl BehaviorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Change => "change",
            BehaviorKind::CellSelect => "cellSelect",
        }
    }
}

impl FromStr for BehaviorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" => Ok(BehaviorKind::Change),
            "cellSelect" => Ok(BehaviorKind::CellSelect),
            other => Err(format!("unknown behavior event '{other}'")),
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by a Sheet during one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SheetEvent {
    /// A client behavior was fired from this sheet.
    Behavior { kind: BehaviorKind },

    /// Model updates were committed.
    UpdatesApplied {
        /// Number of cells written.
        count: usize,
        /// Rows touched, in key order.
        dirty_rows: Vec<RowKey>,
    },

    /// A validation pass produced bad updates.
    ValidationFailed { bad_updates: Vec<BadUpdate> },
}

/// Simple event collector.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SheetEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: SheetEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SheetEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only Behavior events.
    pub fn behaviors(&self) -> Vec<BehaviorKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SheetEvent::Behavior { kind } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Dirty rows of every UpdatesApplied event, flattened.
    pub fn dirty_rows(&self) -> Vec<&RowKey> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SheetEvent::UpdatesApplied { dirty_rows, .. } => Some(dirty_rows),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Was any validation failure reported?
    pub fn has_validation_failure(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, SheetEvent::ValidationFailed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_kind_names() {
        assert_eq!("cellSelect".parse::<BehaviorKind>(), Ok(BehaviorKind::CellSelect));
        assert!("blur".parse::<BehaviorKind>().is_err());
        assert_eq!(BehaviorKind::default().to_string(), "change");
    }

    #[test]
    fn test_collector_filters() {
        let mut c = EventCollector::new();
        c.push(SheetEvent::Behavior { kind: BehaviorKind::Change });
        c.push(SheetEvent::UpdatesApplied {
            count: 2,
            dirty_rows: vec![RowKey::Int(1), RowKey::Int(4)],
        });
        assert_eq!(c.len(), 2);
        assert_eq!(c.behaviors(), vec![BehaviorKind::Change]);
        assert_eq!(c.dirty_rows(), vec![&RowKey::Int(1), &RowKey::Int(4)]);
        assert!(!c.has_validation_failure());
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let e = SheetEvent::Behavior { kind: BehaviorKind::CellSelect };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json, serde_json::json!({"type": "behavior", "kind": "cellSelect"}));
    }
}
