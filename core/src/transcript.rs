//! Conversion of persisted run transcripts into timeline entries.
//!
//! The backend stores a run as ordered `{id, role, content}` records. The
//! mapping to timeline kinds is lossy: `assistant` becomes `Thought`, every
//! other role becomes `Status`, and structured content is kept as text.

use crate::errors::ConversionError;
use crate::timeline::{EventKind, TimelineEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A persisted transcript record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub id: String,
    pub role: String, // "user", "assistant", "tool", "system"
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TranscriptRecord {
    pub fn kind(&self) -> EventKind {
        if self.role == "assistant" {
            EventKind::Thought
        } else {
            EventKind::Status
        }
    }

    pub fn into_timeline_event(self) -> TimelineEvent {
        let kind = self.kind();
        TimelineEvent {
            id: self.id,
            kind,
            payload: Value::String(self.content),
            // Unknown historical time maps to a fixed sentinel so that
            // reloading the same transcript yields the same timeline.
            observed_at: self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

/// Convert one raw record, reporting why it cannot be used.
pub fn convert_record(index: usize, raw: Value) -> Result<TimelineEvent, ConversionError> {
    let record: TranscriptRecord =
        serde_json::from_value(raw).map_err(|e| ConversionError::MalformedRecord {
            index,
            reason: e.to_string(),
        })?;

    if record.id.trim().is_empty() {
        return Err(ConversionError::MalformedRecord {
            index,
            reason: "empty id".to_string(),
        });
    }

    Ok(record.into_timeline_event())
}

/// Convert a whole transcript. Malformed records are logged and dropped.
pub fn convert_transcript(raw_records: Vec<Value>) -> Vec<TimelineEvent> {
    raw_records
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match convert_record(index, raw) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Dropping transcript record: {}", e);
                None
            }
        })
        .collect()
}
