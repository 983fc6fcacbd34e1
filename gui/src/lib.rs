//! Cowork GUI shell: backend transports and the agent runtime pane.

pub mod agent_runtime;
pub mod agent_specs;
pub mod command_gateway;
pub mod event_client;
pub mod event_subscription;
pub mod history;
pub mod rpc_client;

pub use agent_runtime::{AgentRuntime, RunRequest, StartedRun};
pub use agent_specs::{AgentSpecClient, SpecClientError, SpecClientResult};
pub use command_gateway::CommandGateway;
pub use event_client::{ClientMessage, ServerMessage, WsEventChannel};
pub use event_subscription::{subscribe, SubscriptionHandle};
pub use history::HistoryLoader;
pub use rpc_client::{RpcClient, RpcClientConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
