//! Action requests, recorded action events and the bounded logs that hold them.

use cb_core::ActionId;
use cb_scenario::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Capacity of the code-blue action log.
pub const ACTION_LOG_CAPACITY: usize = 200;

/// A trainee action as submitted to an engine, before it is stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub payload: Option<serde_json::Value>,
    /// Scene element that produced the action, if any.
    pub source_hotspot: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            payload: None,
            source_hotspot: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn from_hotspot(mut self, hotspot: impl Into<String>) -> Self {
        self.source_hotspot = Some(hotspot.into());
        self
    }

    /// Boolean payload field, if present and boolean.
    pub fn payload_bool(&self, key: &str) -> Option<bool> {
        self.payload.as_ref()?.get(key)?.as_bool()
    }

    /// Numeric payload field, if present, numeric and finite.
    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload
            .as_ref()?
            .get(key)?
            .as_f64()
            .filter(|v| v.is_finite())
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}

/// A recorded action. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub id: ActionId,
    /// Simulation time at dispatch (ms).
    pub t_ms: f64,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hotspot: Option<String>,
}

/// Append-only ring of at most `capacity` entries; the oldest is dropped first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &T> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

pub type ActionLog = BoundedLog<ActionEvent>;

impl Default for ActionLog {
    fn default() -> Self {
        Self::with_capacity(ACTION_LOG_CAPACITY)
    }
}

/// Insert `entry` at the front of a newest-first list, keeping at most `cap`.
pub(crate) fn push_newest_first(list: &mut Vec<String>, entry: String, cap: usize) {
    list.insert(0, entry);
    list.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_drops_oldest_when_full() {
        let mut log = BoundedLog::with_capacity(3);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.to_vec(), vec![2, 3, 4]);
        assert_eq!(log.tail(2).copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(log.tail(10).count(), 3);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut log = BoundedLog::with_capacity(0);
        log.push("a");
        log.push("b");
        assert_eq!(log.to_vec(), vec!["b"]);
    }

    #[test]
    fn newest_first_truncates() {
        let mut list = Vec::new();
        for i in 0..4 {
            push_newest_first(&mut list, i.to_string(), 3);
        }
        assert_eq!(list, vec!["3", "2", "1"]);
    }

    #[test]
    fn payload_accessors() {
        let action = Action::new(ActionKind::VentToggle)
            .with_payload(json!({ "ventOn": false, "flow": 12.5, "bad": "x" }))
            .from_hotspot("vent_panel");
        assert_eq!(action.payload_bool("ventOn"), Some(false));
        assert_eq!(action.payload_f64("flow"), Some(12.5));
        assert_eq!(action.payload_f64("bad"), None);
        assert_eq!(action.payload_bool("missing"), None);
        assert_eq!(action.source_hotspot.as_deref(), Some("vent_panel"));
    }

    #[test]
    fn event_serializes_kind_as_name() {
        let event = ActionEvent {
            id: ActionId::from_index(0),
            t_ms: 1500.0,
            kind: ActionKind::MedEpi,
            payload: None,
            source_hotspot: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "MED_EPI");
        assert!(value.get("payload").is_none());
    }
}
