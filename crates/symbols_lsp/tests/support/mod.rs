//! Shared test scaffolding: spin up a [`Session`] against the
//! `fixture_lsp_server` test binary instead of a real language server.

use std::path::PathBuf;
use std::sync::Arc;

use symbols_lsp::config::ServerDescriptor;
use symbols_lsp::loader::LoaderRegistry;
use symbols_lsp::session::Session;

/// Write `contents` to `name` under `dir` and return its path.
pub fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Start a session whose "language server" is the `fixture_lsp_server` test
/// binary running in `mode` (via `FIXTURE_MODE`).
pub async fn start_session(mode: &str, workspace_root: PathBuf, preload: Vec<PathBuf>) -> Arc<Session> {
    let fixture = PathBuf::from(env!("CARGO_BIN_EXE_fixture_lsp_server"));
    let mut config = ServerDescriptor::new(fixture.to_string_lossy().to_string(), Vec::<String>::new())
        .with_extension("rs", "rust");
    config.env.insert("FIXTURE_MODE".to_string(), mode.to_string());
    config.preload = preload;
    if mode == "roslyn_project_init" || mode == "roslyn_toast" {
        config = config.with_workspace_loader("roslyn");
    }

    let loaders = LoaderRegistry::with_builtins();
    Session::start(config, workspace_root, &loaders).await.unwrap()
}
