//! Cancellation (§5) and the `logs` tool (§4.7, §6).

mod support;

use symbols_lsp::cancel::CancelToken;
use symbols_lsp::stores::LogLevel;
use symbols_lsp::tools;
use tempfile::tempdir;

#[tokio::test]
async fn cancelling_before_response_yields_cancelled_error() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let cancel = CancelToken::new();
    cancel.cancel();

    let result = session.request("textDocument/hover", serde_json::json!({}), &cancel).await;
    assert!(matches!(result.unwrap_err(), symbols_core::Error::Cancelled));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn in_flight_request_is_cancelled_once_token_fires() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let cancel = CancelToken::new();
    let cancel_clone = cancel.clone();
    let request = tokio::spawn({
        let session = session.clone();
        async move { session.request("textDocument/hover", serde_json::json!({}), &cancel_clone).await }
    });

    // The fixture answers immediately, so this is mostly exercising that a
    // cancel issued concurrently with an in-flight request doesn't panic or
    // deadlock; either outcome (the real answer or `Cancelled`) is valid.
    cancel.cancel();
    let outcome = request.await.unwrap();
    assert!(outcome.is_ok() || matches!(outcome, Err(symbols_core::Error::Cancelled)));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn logs_captures_window_log_message_notifications() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    // Force a round trip so the subprocess has had a chance to run, then
    // check the log ring directly: `window/logMessage` isn't something the
    // fixture emits in "default" mode, so this asserts the empty case.
    let entries = tools::logs::logs(&session, None);
    assert!(entries.is_empty());

    let errors_only = tools::logs::logs(&session, Some(LogLevel::Error));
    assert!(errors_only.is_empty());

    session.shutdown().await.unwrap();
}
