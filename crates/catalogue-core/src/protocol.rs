//! Change events emitted on the event bus.
//!
//! Topic naming: `<kind>.create`, `<kind>.update`, `<kind>.delete`.
//!
//! Envelope:
//!   { "topic": "service.create", "kind": "service", "action": "create",
//!     "occurred_at": "...", "payload": { ...public bundle... } }

use crate::types::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Topic for a kind/action pair.
pub fn topic(kind: &str, action: ChangeAction) -> String {
    format!("{}.{}", kind, action)
}

/// Envelope delivered to event bus subscribers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub topic: String,
    pub kind: String,
    pub action: ChangeAction,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(kind: ResourceKind, action: ChangeAction, payload: serde_json::Value) -> Self {
        Self::named(kind.name(), action, payload)
    }

    /// For topics outside the resource kinds (e.g. `catalogue.update`).
    pub fn named(kind: &str, action: ChangeAction, payload: serde_json::Value) -> Self {
        Self {
            topic: topic(kind, action),
            kind: kind.to_string(),
            action,
            occurred_at: Utc::now(),
            payload,
        }
    }
}
