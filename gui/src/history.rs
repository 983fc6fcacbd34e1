//! Cold-start display of a past run's transcript.

use crate::command_gateway::CommandGateway;
use cowork_core::{convert_transcript, GatewayResult, TimelineEvent};
use serde_json::{json, Value};
use tracing::info;

/// Loads a persisted transcript through the gateway and converts it into
/// timeline entries (see [`cowork_core::transcript`] for the mapping).
#[derive(Clone)]
pub struct HistoryLoader {
    gateway: CommandGateway,
    command: String,
}

impl HistoryLoader {
    pub fn new(gateway: CommandGateway, command: impl Into<String>) -> Self {
        Self {
            gateway,
            command: command.into(),
        }
    }

    pub async fn load(&self, run_id: &str) -> GatewayResult<Vec<TimelineEvent>> {
        let records: Vec<Value> = self
            .gateway
            .invoke(&self.command, json!({ "chatId": run_id }))
            .await?;
        let total = records.len();
        let events = convert_transcript(records);
        info!(
            "Loaded transcript {} ({} of {} records usable)",
            run_id,
            events.len(),
            total
        );
        Ok(events)
    }
}
