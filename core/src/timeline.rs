//! Timeline types for the agent runtime pane.
//!
//! An [`AgentEvent`] is what the backend pushes on the event channel; a
//! [`TimelineEvent`] is what the pane displays once the coordinator has
//! observed it. Timeline entries are immutable after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status of the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunStatus {
    /// No run started yet
    #[default]
    Idle,
    /// Launch call issued and not yet settled
    Running,
    /// Launch call settled successfully without any error event
    Completed,
    /// An error event arrived or the launch call failed
    Error,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// Kind of a run event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Status,
    Thought,
    ToolCall,
    ToolResult,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Status => "status",
            EventKind::Thought => "thought",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::Error => "error",
        };
        f.pad(name)
    }
}

/// Tagged payload delivered on the agent event channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub kind: EventKind,
    #[serde(default)]
    pub data: Value,
}

impl AgentEvent {
    pub fn new(kind: EventKind, data: impl Into<Value>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn status(data: impl Into<Value>) -> Self {
        Self::new(EventKind::Status, data)
    }

    pub fn thought(data: impl Into<Value>) -> Self {
        Self::new(EventKind::Thought, data)
    }

    pub fn tool_call(data: impl Into<Value>) -> Self {
        Self::new(EventKind::ToolCall, data)
    }

    pub fn tool_result(data: impl Into<Value>) -> Self {
        Self::new(EventKind::ToolResult, data)
    }

    pub fn error(data: impl Into<Value>) -> Self {
        Self::new(EventKind::Error, data)
    }
}

/// A single observed entry of a run's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub kind: EventKind,
    pub payload: Value,
    pub observed_at: DateTime<Utc>,
}

impl TimelineEvent {
    /// Human-readable text of the payload.
    ///
    /// Strings are returned verbatim, objects with a string `message` yield
    /// that message, anything else is rendered as compact JSON.
    pub fn payload_text(&self) -> String {
        payload_text(&self.payload)
    }
}

pub(crate) fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => payload.to_string(),
        },
        other => other.to_string(),
    }
}

/// Build a timeline id from the observation time and a sequence number.
///
/// The sequence disambiguates arrivals within the same millisecond.
pub fn timeline_id(observed_at: DateTime<Utc>, sequence: u64) -> String {
    format!("{:013}-{:06}", observed_at.timestamp_millis(), sequence)
}
