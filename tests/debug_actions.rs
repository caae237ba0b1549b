//! Debugger action dispatch against a mock session server.

mod common;

use common::{wait_for_requests, Harness, MockResponse};
use runstep::debugger::DebugDispatcher;
use runstep::protocol::{DebugAction, Endpoint, LineId};
use runstep::session::SessionError;
use runstep::view::Notice;
use std::time::Duration;

async fn running() -> (Harness, DebugDispatcher) {
    let h = Harness::start().await;
    h.run_session(42).await;
    let dispatcher = DebugDispatcher::new(h.session.clone());
    (h, dispatcher)
}

#[tokio::test]
async fn highlight_follows_reported_line() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line7"))
        .await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line9"))
        .await;

    let line = dispatcher.dispatch(DebugAction::StepOver).await.unwrap();
    assert_eq!(line, Some(LineId::for_line(7)));
    assert_eq!(h.view.highlighted_lines(), vec![7]);
    assert_eq!(h.session.active_line(), Some(LineId::for_line(7)));

    let line = dispatcher.dispatch(DebugAction::Continue).await.unwrap();
    assert_eq!(line, Some(LineId::for_line(9)));
    assert_eq!(h.view.highlighted_lines(), vec![9]);

    let requests = h.server.requests_to("debugger_action").await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].field("session_id").as_deref(), Some("42"));
    assert_eq!(requests[0].field("action").as_deref(), Some("stepover"));
    assert_eq!(requests[1].field("action").as_deref(), Some("continue"));
}

#[tokio::test]
async fn each_action_sends_its_tag() {
    let (h, dispatcher) = running().await;
    for action in DebugAction::ALL {
        h.server
            .enqueue("debugger_action", MockResponse::text("line1"))
            .await;
        dispatcher.dispatch(action).await.unwrap();
    }

    let tags: Vec<_> = h
        .server
        .requests_to("debugger_action")
        .await
        .iter()
        .filter_map(|r| r.field("action"))
        .collect();
    assert_eq!(tags, ["continue", "stepover", "stepinto", "stepout"]);
}

#[tokio::test]
async fn died_clears_highlight() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line3"))
        .await;
    h.server
        .enqueue("debugger_action", MockResponse::text("DIED"))
        .await;

    dispatcher.dispatch(DebugAction::StepInto).await.unwrap();
    let line = dispatcher.dispatch(DebugAction::Continue).await.unwrap();
    assert_eq!(line, None);
    assert!(h.view.highlighted_lines().is_empty());
    assert_eq!(h.session.active_line(), None);
}

#[tokio::test]
async fn fail_clears_highlight() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line3"))
        .await;
    h.server
        .enqueue("debugger_action", MockResponse::text("FAIL"))
        .await;

    dispatcher.dispatch(DebugAction::StepOver).await.unwrap();
    let line = dispatcher.dispatch(DebugAction::StepOut).await.unwrap();
    assert_eq!(line, None);
    assert!(h.view.highlighted_lines().is_empty());
    assert!(h.view.notices().is_empty());
}

#[tokio::test]
async fn unknown_line_is_reported_and_keeps_highlight() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line2"))
        .await;
    h.server
        .enqueue("debugger_action", MockResponse::text("OK"))
        .await;

    dispatcher.dispatch(DebugAction::StepOver).await.unwrap();
    let err = dispatcher.dispatch(DebugAction::StepOver).await.unwrap_err();
    assert!(matches!(err, SessionError::UnknownLine(ref line) if line.as_str() == "OK"));
    assert_eq!(h.view.highlighted_lines(), vec![2]);
    assert_eq!(h.view.notices(), vec![Notice::UnknownLine(LineId::new("OK"))]);
}

#[tokio::test]
async fn line_past_end_of_program_is_unknown() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line99"))
        .await;

    let err = dispatcher.dispatch(DebugAction::Continue).await.unwrap_err();
    assert!(matches!(err, SessionError::UnknownLine(_)));
    assert!(h.view.highlighted_lines().is_empty());
}

#[tokio::test]
async fn transport_error_is_reported() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::error(500, "boom"))
        .await;

    let err = dispatcher.dispatch(DebugAction::StepOver).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(
        h.view.notices(),
        vec![Notice::ConnectionError {
            endpoint: Endpoint::DebuggerAction,
            status: Some(500),
            detail: None,
        }]
    );
}

#[tokio::test]
async fn reply_for_ended_session_is_discarded() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue(
            "debugger_action",
            MockResponse::text("line7").with_delay(150),
        )
        .await;

    let pending = dispatcher.clone();
    let task = tokio::spawn(async move { pending.dispatch(DebugAction::Continue).await });

    assert!(wait_for_requests(&h.server, "debugger_action", 1, Duration::from_secs(1)).await);
    h.session.stop_session().await.unwrap();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(SessionError::Superseded)));
    assert!(h.view.highlighted_lines().is_empty());
    assert_eq!(h.session.active_line(), None);
}

#[tokio::test]
async fn stop_clears_highlight() {
    let (h, dispatcher) = running().await;
    h.server
        .enqueue("debugger_action", MockResponse::text("line5"))
        .await;
    dispatcher.dispatch(DebugAction::StepOver).await.unwrap();
    assert_eq!(h.view.highlighted_lines(), vec![5]);

    h.session.stop_session().await.unwrap();
    assert!(h.view.highlighted_lines().is_empty());
}

#[tokio::test]
async fn dispatch_without_session_sends_nothing() {
    let h = Harness::start().await;
    let dispatcher = DebugDispatcher::new(h.session.clone());

    let err = dispatcher.dispatch(DebugAction::Continue).await.unwrap_err();
    assert!(matches!(err, SessionError::NotRunning));
    assert!(h.server.captured_requests().await.is_empty());
}
