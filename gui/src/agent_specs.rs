/// Agent-builder spec commands
///
/// Saves, loads and lists agent specs through the backend. Specs are
/// validated locally before they are sent.
use crate::command_gateway::CommandGateway;
use cowork_core::{AgentSpec, GatewayError, SpecError};
use serde_json::json;
use thiserror::Error;
use tracing::info;

/// Errors from agent spec commands
#[derive(Error, Debug)]
pub enum SpecClientError {
    #[error("Invalid agent spec: {0}")]
    Invalid(#[from] SpecError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type SpecClientResult<T> = Result<T, SpecClientError>;

#[derive(Clone)]
pub struct AgentSpecClient {
    gateway: CommandGateway,
}

impl AgentSpecClient {
    pub fn new(gateway: CommandGateway) -> Self {
        Self { gateway }
    }

    /// Validate and save a spec; returns where the backend stored it
    pub async fn save_agent_spec(&self, spec: &AgentSpec) -> SpecClientResult<String> {
        spec.validate()?;
        let location: String = self
            .gateway
            .invoke("save_agent_spec", json!({ "spec": spec }))
            .await?;
        info!("Saved agent spec {} to {}", spec.id, location);
        Ok(location)
    }

    pub async fn load_agent_spec(&self, id: &str) -> SpecClientResult<AgentSpec> {
        Ok(self
            .gateway
            .invoke("load_agent_spec", json!({ "id": id }))
            .await?)
    }

    pub async fn list_agent_specs(&self) -> SpecClientResult<Vec<AgentSpec>> {
        Ok(self.gateway.invoke("list_agent_specs", json!({})).await?)
    }
}
