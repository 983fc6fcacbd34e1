//! Agent runtime pane tests
//!
//! This test suite covers:
//! - Run lifecycle (start, events, settlement) and the error-wins rule
//! - Reset semantics when a run is started again
//! - Launch failures and user notifications
//! - History loading
//! - Subscription lifecycle (activate, re-activate, shutdown)

mod common;

use common::{Harness, LAUNCH};
use cowork_core::{AgentEvent, EventKind, GatewayError, RunStatus, Severity};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

// ============================================================================
// RUN LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_events_then_success_completes_in_order() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());

    assert!(h.backend.emit(AgentEvent::status("queued")));
    assert!(h.backend.emit(AgentEvent::thought("analyzing")));
    assert!(h.backend.emit(AgentEvent::tool_call(json!({
        "name": "read_file",
        "arguments": {"path": "a.txt"}
    }))));
    assert!(h.backend.emit(AgentEvent::tool_result(json!({"id": "t1", "result": "42"}))));
    h.wait_for_len(4).await;

    h.backend.settle_launch(Ok(json!("done"))).await;
    run.settled().await;

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Completed);
    assert!(state.last_error.is_none());
    let kinds: Vec<EventKind> = state.timeline.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Status,
            EventKind::Thought,
            EventKind::ToolCall,
            EventKind::ToolResult
        ]
    );
    assert_eq!(state.timeline[0].payload, json!("queued"));
    assert_eq!(state.timeline[3].payload["result"], "42");
    assert!(h.notifications.pending().is_empty());
}

#[tokio::test]
async fn test_launch_arguments() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());
    h.backend.settle_launch(Ok(json!(null))).await;
    run.settled().await;

    assert_eq!(
        h.backend.launch_calls(),
        vec![json!({
            "prompt": "list files",
            "modelId": "gemini-3-flash-high",
            "workspaceId": "ws-1"
        })]
    );
}

#[tokio::test]
async fn test_launch_failure_before_any_event() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());

    h.backend.fail_launch("network unreachable").await;
    run.settled().await;

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Error);
    assert_eq!(state.last_error.as_deref(), Some("network unreachable"));
    assert_eq!(state.timeline.len(), 1);
    assert_eq!(state.timeline[0].kind, EventKind::Error);
    assert_eq!(state.timeline[0].payload_text(), "network unreachable");

    let pending = h.notifications.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].severity, Severity::Error);
    assert_eq!(pending[0].message, "network unreachable");
}

#[tokio::test]
async fn test_error_event_wins_over_later_success() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());

    h.backend.emit(AgentEvent::thought("step1"));
    h.backend.emit(AgentEvent::error("tool crashed"));
    let state = h.wait_for(|s| s.status == RunStatus::Error).await;
    assert_eq!(state.timeline.len(), 2);

    h.backend.settle_launch(Ok(json!("done"))).await;
    run.settled().await;

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Error);
    assert_eq!(state.last_error.as_deref(), Some("tool crashed"));
    assert_eq!(state.timeline.len(), 2);
    assert_eq!(h.notifications.pending().len(), 1);
}

#[tokio::test]
async fn test_launch_failure_after_error_event_notifies_once() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());

    h.backend.emit(AgentEvent::error("tool crashed"));
    h.wait_for(|s| s.status == RunStatus::Error).await;

    h.backend.fail_launch("network unreachable").await;
    run.settled().await;

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Error);
    assert_eq!(state.last_error.as_deref(), Some("network unreachable"));
    assert_eq!(state.timeline.len(), 2);
    let messages: Vec<String> = h
        .notifications
        .pending()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, vec!["tool crashed".to_string()]);
}

#[tokio::test]
async fn test_start_from_thread_outside_runtime() {
    let h = Harness::active().await;

    let run = std::thread::scope(|s| {
        s.spawn(|| h.runtime.start(common_request()))
            .join()
            .unwrap()
    });
    assert_eq!(h.runtime.snapshot().status, RunStatus::Running);

    h.backend.settle_launch(Ok(json!("done"))).await;
    run.settled().await;
    assert_eq!(h.runtime.snapshot().status, RunStatus::Completed);
}

#[tokio::test]
async fn test_error_event_drives_error_before_settlement() {
    let h = Harness::active().await;
    let _run = h.runtime.start(common_request());

    h.backend.emit(AgentEvent::error(json!({"message": "quota exceeded", "code": 429})));
    let state = h.wait_for(|s| s.status == RunStatus::Error).await;

    assert_eq!(state.last_error.as_deref(), Some("quota exceeded"));
    assert_eq!(h.backend.launch_calls().len(), 1);
}

// ============================================================================
// RESET SEMANTICS
// ============================================================================

#[tokio::test]
async fn test_start_resets_before_returning() {
    let h = Harness::active().await;
    let first = h.runtime.start(common_request());
    h.backend.emit(AgentEvent::thought("old"));
    h.backend.emit(AgentEvent::error("old failure"));
    h.wait_for_len(2).await;

    let second = h.runtime.start(common_request());

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Running);
    assert!(state.timeline.is_empty());
    assert!(state.last_error.is_none());
    assert!(second.generation > first.generation);
}

#[tokio::test]
async fn test_restart_discards_prior_entries() {
    let h = Harness::active().await;
    let _first = h.runtime.start(common_request());
    h.backend.emit(AgentEvent::status("run one"));
    let old = h.wait_for_len(1).await;
    let old_ids: Vec<String> = old.timeline.iter().map(|e| e.id.clone()).collect();

    let _second = h.runtime.start(common_request());
    h.backend.emit(AgentEvent::status("run two"));
    let state = h.wait_for_len(1).await;

    assert_eq!(state.timeline[0].payload, json!("run two"));
    assert!(state.timeline.iter().all(|e| !old_ids.contains(&e.id)));
}

#[tokio::test]
async fn test_stale_settlement_does_not_finalize_new_run() {
    let h = Harness::active().await;
    let first = h.runtime.start(common_request());
    h.backend.wait_for_launches(1).await;
    let second = h.runtime.start(common_request());
    h.backend.wait_for_launches(2).await;

    // First launch call settles after the second run started
    h.backend.settle_launch(Ok(json!("first done"))).await;
    first.settled().await;
    assert_eq!(h.runtime.snapshot().status, RunStatus::Running);

    h.backend.fail_launch("second failed").await;
    second.settled().await;

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Error);
    assert_eq!(state.last_error.as_deref(), Some("second failed"));
    assert_eq!(h.backend.launch_calls().len(), 2);
}

// ============================================================================
// HISTORY
// ============================================================================

#[tokio::test]
async fn test_load_history_keeps_status_and_is_idempotent() {
    let h = Harness::active().await;
    h.backend.set_transcript(Ok(json!([
        {"id": "m1", "role": "user", "content": "list files"},
        {"id": "m2", "role": "assistant", "content": "Plan: list the workspace"},
        {"id": "m3", "role": "tool", "content": "a.txt"},
        {"role": "assistant"}
    ])));

    let before = h.runtime.snapshot().status;
    assert_eq!(h.runtime.load_history("ws-1").await.unwrap(), 3);
    let first = h.runtime.snapshot();
    h.runtime.load_history("ws-1").await.unwrap();
    let second = h.runtime.snapshot();

    assert_eq!(first.status, before);
    assert_eq!(first.timeline, second.timeline);
    assert_eq!(first.timeline[1].kind, EventKind::Thought);
    assert_eq!(first.timeline[2].kind, EventKind::Status);
}

#[tokio::test]
async fn test_load_history_after_completed_run_keeps_completed() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());
    h.backend.settle_launch(Ok(json!("done"))).await;
    run.settled().await;

    h.backend.set_transcript(Ok(json!([{"id": "m1", "role": "assistant", "content": "hi"}])));
    h.runtime.load_history("ws-1").await.unwrap();

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.timeline.len(), 1);
}

#[tokio::test]
async fn test_load_history_failure_only_notifies() {
    let h = Harness::inactive();
    h.backend.set_transcript(Err(GatewayError::Rpc {
        code: -32002,
        message: "chat not found".to_string(),
    }));

    let result = h.runtime.load_history("ghost").await;

    assert!(result.is_err());
    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Idle);
    assert!(state.last_error.is_none());
    let pending = h.notifications.pending();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].message.contains("chat not found"));
}

// ============================================================================
// SUBSCRIPTION LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_shutdown_stops_event_ingestion() {
    let h = Harness::active().await;
    assert!(h.runtime.is_subscribed().await);
    let _run = h.runtime.start(common_request());

    h.runtime.shutdown().await;

    assert!(!h.runtime.is_subscribed().await);
    assert!(!h.backend.emit(AgentEvent::thought("after teardown")));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.runtime.snapshot().timeline.is_empty());
}

#[tokio::test]
async fn test_transport_loss_mid_run_fails_the_run() {
    let h = Harness::active().await;
    let run = h.runtime.start(common_request());
    h.backend.emit(AgentEvent::thought("step1"));
    h.wait_for_len(1).await;

    h.backend.drop_channel();
    let state = h.wait_for(|s| s.status == RunStatus::Error).await;
    assert_eq!(state.timeline.len(), 2);
    assert_eq!(state.timeline[1].kind, EventKind::Error);
    assert_eq!(
        state.last_error.as_deref(),
        Some("Channel closed: agent://event")
    );

    // Events emitted after the loss are not observed; success cannot win
    assert!(!h.backend.emit(AgentEvent::error("tool crashed")));
    h.backend.settle_launch(Ok(json!("done"))).await;
    run.settled().await;

    assert_eq!(h.runtime.snapshot().status, RunStatus::Error);
    assert!(!h.runtime.is_subscribed().await);
    let pending = h.notifications.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].severity, Severity::Error);
    assert!(pending[0].message.contains("agent://event"));
}

#[tokio::test]
async fn test_transport_loss_while_idle_only_notifies() {
    let h = Harness::active().await;

    h.backend.drop_channel();
    tokio::time::timeout(Duration::from_secs(2), async {
        while h.notifications.pending().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let state = h.runtime.snapshot();
    assert_eq!(state.status, RunStatus::Idle);
    assert!(state.timeline.is_empty());
    assert!(state.last_error.is_none());
    assert_eq!(h.notifications.pending().len(), 1);
}

#[tokio::test]
async fn test_reactivate_releases_previous_subscription() {
    let h = Harness::active().await;
    h.runtime.activate().await.unwrap();

    assert_eq!(h.backend.opened.load(Ordering::SeqCst), 2);
    assert!(h.runtime.is_subscribed().await);

    let _run = h.runtime.start(common_request());
    h.backend.emit(AgentEvent::status("via new subscription"));
    let state = h.wait_for_len(1).await;
    assert_eq!(state.timeline[0].payload, json!("via new subscription"));
}

#[tokio::test]
async fn test_drop_releases_subscription() {
    let h = Harness::active().await;
    let backend = h.backend.clone();
    drop(h);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !backend.channel_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert_eq!(backend.calls.lock().iter().filter(|(c, _)| c == LAUNCH).count(), 0);
}

fn common_request() -> cowork_gui::RunRequest {
    cowork_gui::RunRequest::new("list files", "gemini-3-flash-high", "ws-1")
}
