//! `inspect`, `references`, `completion`, `search`, `outline` against the
//! fixture server's canned responses (§4.7, §8).

mod support;

use symbols_lsp::cancel::CancelToken;
use symbols_lsp::position::OneBasedPosition;
use symbols_lsp::tools;
use tempfile::tempdir;

#[tokio::test]
async fn inspect_fans_out_hover_and_locations() {
    let workspace = tempdir().unwrap();
    let file = support::write_file(workspace.path(), "main.rs", "fn main() {\n    foo();\n}\n");
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let position = OneBasedPosition::new(2, 5).unwrap();
    let cancel = CancelToken::new();
    let result = tools::inspect::inspect(&session, &file, position, &cancel).await.unwrap();

    assert!(result.hover.is_some());
    assert_eq!(result.definition.len(), 1);
    assert!(result.type_definition.is_empty());
    assert!(result.implementation.is_empty());
    assert_eq!(result.cursor_context.unwrap().symbol_name.as_deref(), Some("foo"));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn references_includes_both_fixture_locations() {
    let workspace = tempdir().unwrap();
    let file = support::write_file(workspace.path(), "main.rs", "fn main() {\n    foo();\n}\n");
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let position = OneBasedPosition::new(2, 5).unwrap();
    let cancel = CancelToken::new();
    let results = tools::references::references(&session, &file, position, true, &cancel).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].range.start.line(), 2);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn completion_normalizes_completion_list_shape() {
    let workspace = tempdir().unwrap();
    let file = support::write_file(workspace.path(), "main.rs", "fn main() {\n    f\n}\n");
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let position = OneBasedPosition::new(2, 6).unwrap();
    let cancel = CancelToken::new();
    let items = tools::completion::completion(&session, &file, position, &cancel).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "fixture_completion");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn outline_flattens_nested_document_symbols() {
    let workspace = tempdir().unwrap();
    let file = support::write_file(workspace.path(), "main.rs", "struct Widget;\n");
    let session = support::start_session("default", workspace.path().to_path_buf(), Vec::new()).await;

    let cancel = CancelToken::new();
    let entries = tools::outline::outline(&session, &file, &cancel).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Widget");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn search_is_gated_until_workspace_ready() {
    let workspace = tempdir().unwrap();
    // `roslyn_project_init` never becomes ready until the fixture's
    // `projectInitializationComplete` notification is processed.
    let session = support::start_session("roslyn_project_init", workspace.path().to_path_buf(), Vec::new()).await;

    let cancel = CancelToken::new();
    for _ in 0..50 {
        if session.stores().workspace.is_ready() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let results = tools::search::search(&session, "fixture", &cancel).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "fixture_symbol");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn search_before_ready_returns_workspace_load_in_progress() {
    // A fresh session with no preload and the default loader becomes Ready
    // immediately, so use a loader that stays Loading to observe the gate.
    let workspace = tempdir().unwrap();
    let fixture = std::path::PathBuf::from(env!("CARGO_BIN_EXE_fixture_lsp_server"));
    let mut config = symbols_lsp::config::ServerDescriptor::new(fixture.to_string_lossy().to_string(), Vec::<String>::new())
        .with_workspace_loader("roslyn");
    config.env.insert("FIXTURE_MODE".to_string(), "default".to_string());

    let loaders = symbols_lsp::loader::LoaderRegistry::with_builtins();
    let session = symbols_lsp::session::Session::start(config, workspace.path().to_path_buf(), &loaders).await.unwrap();

    assert!(!session.stores().workspace.is_ready());
    let cancel = CancelToken::new();
    let result = tools::search::search(&session, "anything", &cancel).await;
    assert!(matches!(result.unwrap_err(), symbols_core::Error::WorkspaceLoadInProgress));

    session.shutdown().await.unwrap();
}
