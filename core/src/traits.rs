/// Seams between the shell and its backend.
///
/// The backend is reachable only through two primitives: a one-shot named
/// command and a push-only named event channel. Both are traits so the shell
/// runs against the real daemon transport or an in-memory fake.
use crate::errors::GatewayResult;
use crate::timeline::AgentEvent;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// One-shot request/response call to the backend.
///
/// Implementations make a single attempt and impose no timeout; the backend
/// owns timeout policy.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Invoke `command` with JSON `args`, returning the raw JSON result.
    async fn invoke(&self, command: &str, args: Value) -> GatewayResult<Value>;
}

/// Source of a named, push-only event channel.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Open `channel` and return a feed of its events.
    ///
    /// The feed is unbounded; events are delivered in transport order. The
    /// feed ends when the receiver is dropped or the transport closes.
    async fn open(&self, channel: &str) -> GatewayResult<mpsc::UnboundedReceiver<AgentEvent>>;
}
