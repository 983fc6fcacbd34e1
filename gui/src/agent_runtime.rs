//! Agent runtime pane coordinator
//!
//! Launches runs through the command gateway and folds the agent event
//! channel into the pane's [`RunState`]. The launch call's settlement and the
//! event channel race each other; both feed [`RunTransition`]s into a single
//! watch channel, so every update is an atomic read-modify-write and
//! consumers only ever see whole snapshots.

use crate::command_gateway::CommandGateway;
use crate::event_subscription::{self, SubscriptionHandle};
use crate::history::HistoryLoader;
use chrono::Utc;
use cowork_core::{
    AgentEvent, EventChannel, GatewayError, GatewayResult, Notification, Notifier, RunState,
    RunTransition, RuntimeConfig, TransitionOutcome,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Arguments of the launch command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub prompt: String,
    pub model_id: String,
    pub workspace_id: String,
}

impl RunRequest {
    pub fn new(
        prompt: impl Into<String>,
        model_id: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model_id: model_id.into(),
            workspace_id: workspace_id.into(),
        }
    }
}

/// A launched run whose call may still be pending
#[derive(Debug)]
pub struct StartedRun {
    pub generation: u64,
    settlement: JoinHandle<()>,
}

impl StartedRun {
    /// Wait until the launch call has settled and its transition was applied.
    pub async fn settled(self) {
        if let Err(e) = self.settlement.await {
            error!("Settlement task for run {} failed: {}", self.generation, e);
        }
    }
}

/// Coordinator of the agent runtime pane.
///
/// Owns the run state and the event subscription. Call [`activate`] before
/// starting runs and [`shutdown`] when the pane goes away.
///
/// [`activate`]: AgentRuntime::activate
/// [`shutdown`]: AgentRuntime::shutdown
pub struct AgentRuntime {
    gateway: CommandGateway,
    events: Arc<dyn EventChannel>,
    notifier: Arc<dyn Notifier>,
    history: HistoryLoader,
    config: RuntimeConfig,
    runtime: Handle,
    state: Arc<watch::Sender<RunState>>,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl AgentRuntime {
    /// `runtime` runs the launch calls, so [`start`](AgentRuntime::start) can
    /// be called from threads outside it, such as a UI event loop.
    pub fn new(
        gateway: CommandGateway,
        events: Arc<dyn EventChannel>,
        notifier: Arc<dyn Notifier>,
        config: RuntimeConfig,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(RunState::new());
        let history = HistoryLoader::new(gateway.clone(), config.transcript_command.clone());

        Self {
            gateway,
            events,
            notifier,
            history,
            config,
            runtime,
            state: Arc::new(state),
            subscription: Mutex::new(None),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Subscribe to the run event channel, releasing any previous
    /// subscription first.
    pub async fn activate(&self) -> GatewayResult<()> {
        let mut slot = self.subscription.lock().await;
        if let Some(previous) = slot.take() {
            previous.unsubscribe().await;
        }

        let state = Arc::clone(&self.state);
        let notifier = Arc::clone(&self.notifier);
        let lost_state = Arc::clone(&self.state);
        let lost_notifier = Arc::clone(&self.notifier);
        let handle = event_subscription::subscribe(
            self.events.as_ref(),
            &self.config.event_channel,
            move |event: AgentEvent| {
                apply(
                    &state,
                    notifier.as_ref(),
                    RunTransition::AppendEvent {
                        event,
                        observed_at: Utc::now(),
                    },
                );
            },
            move |e| channel_lost(&lost_state, lost_notifier.as_ref(), e),
        )
        .await?;

        *slot = Some(handle);
        Ok(())
    }

    /// Release the event subscription. No event is applied after this returns.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.subscription.lock().await.take() {
            handle.unsubscribe().await;
        }
    }

    pub async fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// Start a run.
    ///
    /// The state is reset before the launch call is issued, so nothing of a
    /// previous run can appear after this returns. The call runs in the
    /// background on the runtime given to [`new`](AgentRuntime::new); a
    /// previous run's call is not cancelled, its late settlement is ignored.
    pub fn start(&self, request: RunRequest) -> StartedRun {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.apply(RunTransition::Reset);
            generation = state.generation();
        });
        info!(
            "Starting run {} (model {}, workspace {})",
            generation, request.model_id, request.workspace_id
        );

        let gateway = self.gateway.clone();
        let command = self.config.launch_command.clone();
        let state = Arc::clone(&self.state);
        let notifier = Arc::clone(&self.notifier);

        let settlement = self.runtime.spawn(async move {
            let transition = match gateway.invoke::<Value, _>(&command, &request).await {
                Ok(_) => {
                    info!("Run {} launch call succeeded", generation);
                    RunTransition::SettleSuccess { generation }
                }
                Err(e) => {
                    error!("Run {} launch call failed: {}", generation, e);
                    RunTransition::SettleFailure {
                        generation,
                        message: e.message(),
                        observed_at: Utc::now(),
                    }
                }
            };
            apply(&state, notifier.as_ref(), transition);
        });

        StartedRun {
            generation,
            settlement,
        }
    }

    /// Replace the timeline with a past run's transcript. Status is left
    /// untouched; a failure is only reported through a notification.
    pub async fn load_history(&self, run_id: &str) -> GatewayResult<usize> {
        match self.history.load(run_id).await {
            Ok(events) => {
                let count = events.len();
                apply(
                    &self.state,
                    self.notifier.as_ref(),
                    RunTransition::ReplaceTimeline(events),
                );
                Ok(count)
            }
            Err(e) => {
                error!("Failed to load transcript {}: {}", run_id, e);
                self.notifier.notify(Notification::error(format!(
                    "Failed to load history: {}",
                    e.message()
                )));
                Err(e)
            }
        }
    }
}

/// The event channel gave up for good. A running run is failed, since an
/// error event could no longer be observed; otherwise the user is only told.
fn channel_lost(state: &watch::Sender<RunState>, notifier: &dyn Notifier, e: GatewayError) {
    error!("Run events unavailable: {}", e);
    let message = e.message();
    let outcome = apply(
        state,
        notifier,
        RunTransition::ChannelLost {
            message: message.clone(),
            observed_at: Utc::now(),
        },
    );
    if outcome == TransitionOutcome::Ignored {
        notifier.notify(Notification::error(message));
    }
}

fn apply(
    state: &watch::Sender<RunState>,
    notifier: &dyn Notifier,
    transition: RunTransition,
) -> TransitionOutcome {
    let name = transition.name();
    let mut outcome = TransitionOutcome::Ignored;
    state.send_if_modified(|current| {
        outcome = current.apply(transition);
        outcome != TransitionOutcome::Ignored
    });

    match &outcome {
        TransitionOutcome::Applied => debug!("Applied {}", name),
        TransitionOutcome::Notify { message } => {
            warn!("Run entered error state: {}", message);
            notifier.notify(Notification::error(message.clone()));
        }
        TransitionOutcome::Ignored => debug!("Ignored {}", name),
    }
    outcome
}
