//! Typed one-shot command calls to the backend.

use cowork_core::{CommandTransport, GatewayError, GatewayResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Thin typed wrapper over a [`CommandTransport`]. Stateless and cheap to
/// clone; safe to call while an event subscription is active.
#[derive(Clone)]
pub struct CommandGateway {
    transport: Arc<dyn CommandTransport>,
}

impl CommandGateway {
    pub fn new(transport: Arc<dyn CommandTransport>) -> Self {
        Self { transport }
    }

    /// Invoke `command` once and decode its result as `T`.
    pub async fn invoke<T, A>(&self, command: &str, args: A) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        A: Serialize,
    {
        let args = serde_json::to_value(args)?;
        let value = self.transport.invoke(command, args).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!("Unexpected result shape from {}: {}", command, e);
            GatewayError::Serialization(format!("Invalid result for {}: {}", command, e))
        })
    }
}
