//! In-memory backend used by the agent runtime tests.
//!
//! Launch calls stay pending until the test settles them, and events are
//! pushed into whatever channel the runtime currently has open.

#![allow(dead_code)]

use async_trait::async_trait;
use cowork_core::{
    AgentEvent, CommandTransport, EventChannel, GatewayError, GatewayResult, NotificationCenter,
    RunState, RuntimeConfig,
};
use cowork_gui::{AgentRuntime, CommandGateway};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};

pub const LAUNCH: &str = "run_agent_workflow";
pub const TRANSCRIPT: &str = "get_agent_chat_history";

#[derive(Default)]
pub struct FakeBackend {
    launches: Mutex<VecDeque<oneshot::Sender<GatewayResult<Value>>>>,
    launch_ready: Notify,
    pub calls: Mutex<Vec<(String, Value)>>,
    transcript: Mutex<Option<GatewayResult<Value>>>,
    event_tx: Mutex<Option<mpsc::UnboundedSender<AgentEvent>>>,
    pub opened: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_transcript(&self, result: GatewayResult<Value>) {
        *self.transcript.lock() = Some(result);
    }

    /// Settle the oldest pending launch call, waiting for one to be issued.
    pub async fn settle_launch(&self, result: GatewayResult<Value>) {
        loop {
            let pending = self.launches.lock().pop_front();
            match pending {
                Some(tx) => {
                    let _ = tx.send(result);
                    return;
                }
                None => self.launch_ready.notified().await,
            }
        }
    }

    pub async fn fail_launch(&self, message: &str) {
        self.settle_launch(Err(GatewayError::Rpc {
            code: -32000,
            message: message.to_string(),
        }))
        .await;
    }

    /// Push an event on the open channel. Returns false if nobody listens.
    pub fn emit(&self, event: AgentEvent) -> bool {
        match self.event_tx.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// The transport gives up: the open feed ends.
    pub fn drop_channel(&self) {
        self.event_tx.lock().take();
    }

    pub fn channel_closed(&self) -> bool {
        self.event_tx
            .lock()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }

    /// Wait until `count` launch calls have reached the backend.
    pub async fn wait_for_launches(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.launch_calls().len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for launch calls");
    }

    pub fn launch_calls(&self) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(command, _)| command == LAUNCH)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

#[async_trait]
impl CommandTransport for FakeBackend {
    async fn invoke(&self, command: &str, args: Value) -> GatewayResult<Value> {
        self.calls.lock().push((command.to_string(), args));

        match command {
            LAUNCH => {
                let (tx, rx) = oneshot::channel();
                self.launches.lock().push_back(tx);
                self.launch_ready.notify_one();
                rx.await
                    .unwrap_or_else(|_| Err(GatewayError::Connection("backend gone".to_string())))
            }
            TRANSCRIPT => self
                .transcript
                .lock()
                .clone()
                .unwrap_or_else(|| Ok(Value::Array(Vec::new()))),
            other => Err(GatewayError::Rpc {
                code: -32601,
                message: format!("Method not found: {}", other),
            }),
        }
    }
}

#[async_trait]
impl EventChannel for FakeBackend {
    async fn open(&self, _channel: &str) -> GatewayResult<mpsc::UnboundedReceiver<AgentEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.event_tx.lock() = Some(tx);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub notifications: Arc<NotificationCenter>,
    pub runtime: AgentRuntime,
}

impl Harness {
    pub async fn active() -> Self {
        let harness = Self::inactive();
        harness.runtime.activate().await.unwrap();
        harness
    }

    pub fn inactive() -> Self {
        let backend = FakeBackend::new();
        let notifications = Arc::new(NotificationCenter::new());
        let runtime = AgentRuntime::new(
            CommandGateway::new(backend.clone()),
            backend.clone(),
            notifications.clone(),
            RuntimeConfig::default(),
            tokio::runtime::Handle::current(),
        );
        Self {
            backend,
            notifications,
            runtime,
        }
    }

    /// Wait until the state satisfies `predicate`, failing after two seconds.
    pub async fn wait_for(&self, predicate: impl FnMut(&RunState) -> bool) -> RunState {
        let mut rx = self.runtime.watch();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for run state")
            .expect("state channel closed");
        state.clone()
    }

    pub async fn wait_for_len(&self, len: usize) -> RunState {
        self.wait_for(|s| s.timeline.len() == len).await
    }
}
