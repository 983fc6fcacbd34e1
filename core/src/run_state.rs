//! Run state reducer for the agent runtime pane.
//!
//! Two independent sources update a run: the settlement of the launch call
//! and the event channel. Both are expressed as [`RunTransition`]s applied one
//! at a time to an owned [`RunState`], so any interleaving of the two sources
//! composes into a consistent state.
//!
//! Invariants held by every transition:
//! - `last_error` is `Some` iff `status == RunStatus::Error`
//! - `Reset` empties the timeline before anything of the new run is appended
//! - timeline order is application order, never timestamp order
//! - once `status == Error`, a success settlement cannot move it to `Completed`

use crate::timeline::{payload_text, timeline_id, AgentEvent, EventKind, RunStatus, TimelineEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Snapshot of the current run as seen by consumers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub status: RunStatus,
    pub timeline: Vec<TimelineEvent>,
    pub last_error: Option<String>,
    /// Bumped by every `Reset`; identifies the run a settlement belongs to
    generation: u64,
    /// Never reset, so ids stay unique across runs
    next_sequence: u64,
}

/// A single named step applied to [`RunState`]
#[derive(Debug, Clone, PartialEq)]
pub enum RunTransition {
    /// Start of a new run
    Reset,
    /// An event observed on the channel
    AppendEvent {
        event: AgentEvent,
        observed_at: DateTime<Utc>,
    },
    /// The launch call of run `generation` resolved successfully
    SettleSuccess { generation: u64 },
    /// The launch call of run `generation` failed
    SettleFailure {
        generation: u64,
        message: String,
        observed_at: DateTime<Utc>,
    },
    /// A loaded transcript replaces the timeline; status is untouched
    ReplaceTimeline(Vec<TimelineEvent>),
    /// The event channel gave up; a running run can no longer observe errors
    ChannelLost {
        message: String,
        observed_at: DateTime<Utc>,
    },
}

impl RunTransition {
    pub fn name(&self) -> &'static str {
        match self {
            RunTransition::Reset => "reset",
            RunTransition::AppendEvent { .. } => "append_event",
            RunTransition::SettleSuccess { .. } => "settle_success",
            RunTransition::SettleFailure { .. } => "settle_failure",
            RunTransition::ReplaceTimeline(_) => "replace_timeline",
            RunTransition::ChannelLost { .. } => "channel_lost",
        }
    }
}

/// What applying a transition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// State changed, nothing to surface
    Applied,
    /// State changed and the user must be told about `message`
    Notify { message: String },
    /// Guarded out: stale settlement, or success after an error
    Ignored,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the run currently displayed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn apply(&mut self, transition: RunTransition) -> TransitionOutcome {
        match transition {
            RunTransition::Reset => {
                self.generation += 1;
                self.status = RunStatus::Running;
                self.timeline.clear();
                self.last_error = None;
                TransitionOutcome::Applied
            }
            RunTransition::AppendEvent { event, observed_at } => {
                let entered_error = event.kind == EventKind::Error && self.status != RunStatus::Error;
                if event.kind == EventKind::Error {
                    self.status = RunStatus::Error;
                    self.last_error = Some(payload_text(&event.data));
                }
                let message = self.last_error.clone();
                self.push(event.kind, event.data, observed_at);

                match (entered_error, message) {
                    (true, Some(message)) => TransitionOutcome::Notify { message },
                    _ => TransitionOutcome::Applied,
                }
            }
            RunTransition::SettleSuccess { generation } => {
                // A stale settlement only stops finalizing the newer run; the
                // earlier backend call is still not cancelled.
                if generation != self.generation || self.status == RunStatus::Error {
                    return TransitionOutcome::Ignored;
                }
                self.status = RunStatus::Completed;
                TransitionOutcome::Applied
            }
            RunTransition::SettleFailure {
                generation,
                message,
                observed_at,
            } => {
                // Same as above: the earlier call keeps running in the backend
                if generation != self.generation {
                    return TransitionOutcome::Ignored;
                }
                self.fail(message, observed_at)
            }
            RunTransition::ReplaceTimeline(events) => {
                self.timeline = events;
                TransitionOutcome::Applied
            }
            RunTransition::ChannelLost {
                message,
                observed_at,
            } => {
                if self.status != RunStatus::Running {
                    return TransitionOutcome::Ignored;
                }
                self.fail(message, observed_at)
            }
        }
    }

    /// Synthesize an error entry. Only the step that enters `Error` notifies.
    fn fail(&mut self, message: String, observed_at: DateTime<Utc>) -> TransitionOutcome {
        let entered_error = self.status != RunStatus::Error;
        self.push(EventKind::Error, Value::String(message.clone()), observed_at);
        self.status = RunStatus::Error;
        self.last_error = Some(message.clone());

        if entered_error {
            TransitionOutcome::Notify { message }
        } else {
            TransitionOutcome::Applied
        }
    }

    fn push(&mut self, kind: EventKind, payload: Value, observed_at: DateTime<Utc>) {
        self.next_sequence += 1;
        self.timeline.push(TimelineEvent {
            id: timeline_id(observed_at, self.next_sequence),
            kind,
            payload,
            observed_at,
        });
    }
}
