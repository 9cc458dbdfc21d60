//! Session start/shutdown and crash-detection scenarios (§4.3, §8).

mod support;

use tempfile::tempdir;

#[tokio::test]
async fn session_starts_and_becomes_available() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;
    assert!(session.is_available());
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;
    session.shutdown().await.unwrap();
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn preload_set_is_opened_persistently_and_workspace_becomes_ready() {
    let workspace = tempdir().unwrap();
    let file = support::write_file(workspace.path(), "main.rs", "fn main() {}\n");

    let session = support::start_session("default", workspace.path().to_path_buf(), vec![file.clone()]).await;

    assert!(session.stores().workspace.is_ready());
    let uri = symbols_lsp::document::path_to_uri(&file.canonicalize().unwrap());
    assert!(session.stores().documents.has(&uri));
    assert!(session.stores().documents.get(&uri).unwrap().preloaded);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn roslyn_loader_stays_loading_until_project_init_signal() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("roslyn_project_init", workspace.path().to_path_buf(), Vec::new()).await;

    // The fixture sends `workspace/projectInitializationComplete` right
    // after `initialized`; give the reader loop a moment to process it.
    for _ in 0..50 {
        if session.stores().workspace.is_ready() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(session.stores().workspace.is_ready());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn roslyn_loader_becomes_ready_on_vendor_toast() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("roslyn_toast", workspace.path().to_path_buf(), Vec::new()).await;

    for _ in 0..50 {
        if session.stores().workspace.is_ready() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(session.stores().workspace.is_ready());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn unexpected_subprocess_exit_marks_session_unavailable() {
    let workspace = tempdir().unwrap();
    let session = support::start_session("crash_on_second_request", workspace.path().to_path_buf(), Vec::new()).await;
    assert!(session.is_available());

    let cancel = symbols_lsp::CancelToken::new();
    // The fixture exits the process instead of answering this request.
    let outcome = session.request("textDocument/hover", serde_json::json!({}), &cancel).await;
    assert!(outcome.is_err());

    for _ in 0..50 {
        if !session.is_available() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(!session.is_available());

    let subsequent = session.request("textDocument/hover", serde_json::json!({}), &cancel).await;
    assert!(matches!(subsequent.unwrap_err(), symbols_core::Error::ServerUnavailable { .. }));
}
