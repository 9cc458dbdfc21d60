//! Server lifecycle (C3)
//!
//! Spawns the language-server subprocess, drives the `initialize` handshake,
//! and owns everything downstream of that handshake: the transport (C1), the
//! stores (C2), the resolved workspace loader (C4), and the preload set
//! (C5). Mirrors the predecessor `LspClient::start`/`stop` sequence
//! (`ferrum_lsp::client`) but generalized to one subprocess per workspace
//! rather than one per language, and split so the transport and the
//! lifecycle that drives it are separate, independently testable pieces.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use symbols_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::ServerDescriptor;
use crate::document::{self, DocumentNotifier, Strategy};
use crate::loader::{LoaderEvent, LoaderRegistry, WorkspaceLoader};
use crate::stores::{DiagnosticProvider, DocumentSelector, LogLevel, Stores, WorkspaceState};
use crate::transport::Transport;

/// A running LSP session: one subprocess, one workspace, one transport.
/// Singleton per process per the data model; nothing prevents constructing
/// several in tests, but production code is expected to hold exactly one
/// `Arc<Session>` for the process lifetime.
pub struct Session {
    config: ServerDescriptor,
    workspace_root: PathBuf,
    workspace_uri: String,
    transport: Arc<Transport>,
    child: AsyncMutex<Option<Child>>,
    stores: Stores,
    loader: Arc<dyn WorkspaceLoader>,
    shutting_down: AtomicBool,
    failed: AtomicBool,
}

impl Session {
    /// Run the full startup sequence (§4.3): spawn, wire notification
    /// handlers, `initialize`/`initialized`, resolve and run the workspace
    /// loader, dispatch the preload set.
    pub async fn start(
        config: ServerDescriptor,
        workspace_root: PathBuf,
        loaders: &LoaderRegistry,
    ) -> Result<Arc<Self>> {
        let workspace_root = workspace_root
            .canonicalize()
            .map_err(|_| Error::InvalidPath {
                path: workspace_root.clone(),
                reason: "workspace root does not exist".to_string(),
            })?;
        let workspace_uri = document::path_to_uri(&workspace_root);

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| Error::ServerUnavailable {
            reason: format!("failed to spawn '{}': {e}", config.command),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| Error::Internal("child has no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Internal("child has no stdout".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let transport = Transport::spawn(stdin, stdout);
        let loader = loaders.resolve(&config.workspace_loader);

        let session = Arc::new(Self {
            config,
            workspace_root,
            workspace_uri,
            transport,
            child: AsyncMutex::new(Some(child)),
            stores: Stores::default(),
            loader,
            shutting_down: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        });

        session.install_notification_handlers();
        session.install_request_handlers();

        let failed_flag = session.clone();
        session.transport.on_closed(move || {
            if !failed_flag.shutting_down.load(Ordering::SeqCst) {
                failed_flag.failed.store(true, Ordering::SeqCst);
                failed_flag.stores.workspace.transition(WorkspaceState::Failed, chrono::Utc::now());
                error!("LSP subprocess exited unexpectedly; session is now unavailable");
            }
        });

        symbols_core::telemetry::metrics::ACTIVE_SESSIONS.increment();

        session.initialize_handshake().await?;
        session.run_workspace_loader().await;
        session.dispatch_preload().await;

        Ok(session)
    }

    fn install_notification_handlers(&self) {
        let diagnostics = self.stores.diagnostics.clone();
        self.transport.on_notification("textDocument/publishDiagnostics", move |params| {
            let Some(uri) = params.get("uri").and_then(|v| v.as_str()) else { return };
            let items: Vec<lsp_types::Diagnostic> = params
                .get("diagnostics")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            diagnostics.set(uri.to_string(), items);
        });

        let log_ring = self.stores.log_ring.clone();
        self.transport.on_notification("window/logMessage", move |params| {
            append_log(&log_ring, &params);
        });

        let loader = self.loader.clone();
        let workspace = self.stores.workspace.clone();
        self.transport.on_notification("workspace/projectInitializationComplete", move |_params| {
            loader.update_state(&workspace, LoaderEvent::ProjectInitializationComplete);
        });

        // Vendor "solution loaded" toasts arrive as ordinary `window/showMessage`
        // notifications, so the one handler both appends to the log ring and
        // detects the Roslyn-specific phrasing to re-dispatch as a loader event.
        let log_ring = self.stores.log_ring.clone();
        let loader = self.loader.clone();
        let workspace = self.stores.workspace.clone();
        self.transport.on_notification("window/showMessage", move |params| {
            append_log(&log_ring, &params);
            let message = params.get("message").and_then(|v| v.as_str()).unwrap_or_default();
            if message.contains("solution") && message.to_lowercase().contains("loaded") {
                loader.update_state(
                    &workspace,
                    LoaderEvent::VendorLoadSignal {
                        source: "csharp.solutionLoaded".to_string(),
                        payload: params.clone(),
                    },
                );
            }
        });
    }

    fn install_request_handlers(&self) {
        let providers = self.stores.providers.clone();
        self.transport.on_request("client/registerCapability", move |params| {
            if let Some(registrations) = params.get("registrations").and_then(|v| v.as_array()) {
                for registration in registrations {
                    if registration.get("method").and_then(|v| v.as_str()) != Some("textDocument/diagnostic") {
                        continue;
                    }
                    let Some(id) = registration.get("id").and_then(|v| v.as_str()) else { continue };
                    let options = registration.get("registerOptions").cloned().unwrap_or(Value::Null);
                    providers.add(parse_diagnostic_provider(id, &options));
                }
            }
            Value::Null
        });
    }

    async fn initialize_handshake(&self) -> Result<()> {
        let _timing = symbols_core::telemetry::TimingGuard::new("initialize_handshake").with_threshold(2000);
        let cancel = CancelToken::new();
        let capabilities = self.client_capabilities();

        let params = json!({
            "processId": std::process::id(),
            "rootUri": self.workspace_uri,
            "workspaceFolders": [{
                "uri": self.workspace_uri,
                "name": self.workspace_root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "workspace".to_string()),
            }],
            "capabilities": capabilities,
            "clientInfo": { "name": "symbols-bridge", "version": env!("CARGO_PKG_VERSION") },
        });

        let result = self.transport.send_request("initialize", params, &cancel).await?;

        if let Some(provider) = result
            .get("capabilities")
            .and_then(|c| c.get("diagnosticProvider"))
        {
            self.stores.providers.add(parse_diagnostic_provider("static", provider));
        }

        self.transport.send_notification("initialized", json!({})).await?;
        info!(workspace = %self.workspace_uri, "LSP session initialized");
        Ok(())
    }

    fn client_capabilities(&self) -> Value {
        let mut capabilities = json!({
            "textDocument": {
                "synchronization": { "didSave": true },
                "publishDiagnostics": {
                    "relatedInformation": true,
                    "versionSupport": true,
                    "codeDescriptionSupport": true,
                    "dataSupport": true,
                },
                "diagnostic": { "dynamicRegistration": true },
                "hover": { "contentFormat": ["markdown", "plaintext"] },
                "completion": {
                    "completionItem": { "snippetSupport": true, "documentationFormat": ["markdown", "plaintext"] }
                },
                "documentSymbol": { "hierarchicalDocumentSymbolSupport": true },
                "rename": { "dynamicRegistration": false },
            },
            "workspace": {
                "workspaceFolders": true,
                "symbol": { "dynamicRegistration": false },
            },
        });

        if let Some(extra) = &self.config.extra_capabilities {
            merge_json(&mut capabilities, extra);
        }
        capabilities
    }

    async fn run_workspace_loader(&self) {
        let preload_is_empty = self.config.preload.is_empty();
        self.loader.initialize(&self.stores.workspace, preload_is_empty).await;
    }

    async fn dispatch_preload(&self) {
        for path in self.config.preload.clone() {
            let language_id = self.config.language_for_path(&path).unwrap_or_else(|| "plaintext".to_string());
            let result = document::open_with_strategy(
                &self.stores.documents,
                self as &dyn DocumentNotifier,
                &path,
                &language_id,
                Strategy::Persistent,
            )
            .await;
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "failed to preload file");
            }
        }
        self.loader.update_state(&self.stores.workspace, LoaderEvent::PreloadFinished);
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &ServerDescriptor {
        &self.config
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    /// Whether the session can still take tool calls. False once the
    /// subprocess has exited unexpectedly.
    pub fn is_available(&self) -> bool {
        !self.failed.load(Ordering::SeqCst)
    }

    /// Issue an LSP request, short-circuiting with `ServerUnavailable` if the
    /// subprocess already crashed rather than letting the transport return a
    /// less specific `TransportClosed`.
    pub async fn request(&self, method: &str, params: Value, cancel: &CancelToken) -> Result<Value> {
        if !self.is_available() {
            symbols_core::telemetry::metrics::TOOL_CALL_ERRORS.increment();
            return Err(Error::ServerUnavailable { reason: "LSP subprocess is not running".to_string() });
        }
        let result = self.transport.send_request(method, params, cancel).await;
        if result.is_err() {
            symbols_core::telemetry::metrics::TOOL_CALL_ERRORS.increment();
        }
        result
    }

    /// §4.3 shutdown: `shutdown` request, `exit` notification, then wait
    /// briefly for the child to exit before escalating to SIGTERM/SIGKILL.
    /// Idempotent: a second call is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        symbols_core::telemetry::metrics::ACTIVE_SESSIONS.decrement();

        if !self.transport.is_closed() {
            let cancel = CancelToken::new();
            let _ = self.transport.send_request("shutdown", Value::Null, &cancel).await;
            let _ = self.transport.send_notification("exit", Value::Null).await;
        }

        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            match tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await {
                Ok(Ok(status)) => debug!(?status, "LSP subprocess exited"),
                Ok(Err(e)) => warn!(error = %e, "error waiting for LSP subprocess"),
                Err(_) => {
                    warn!("LSP subprocess did not exit within grace period, killing");
                    let _ = child.start_kill();
                    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await;
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentNotifier for Session {
    async fn did_open(&self, uri: &str, language_id: &str, version: i32, text: &str) -> Result<()> {
        self.transport
            .send_notification(
                "textDocument/didOpen",
                json!({
                    "textDocument": {
                        "uri": uri,
                        "languageId": language_id,
                        "version": version,
                        "text": text,
                    }
                }),
            )
            .await
    }

    async fn did_close(&self, uri: &str) -> Result<()> {
        self.transport
            .send_notification("textDocument/didClose", json!({ "textDocument": { "uri": uri } }))
            .await
    }
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!(target: "lsp_stderr", "{line}"),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "error reading LSP subprocess stderr");
                break;
            }
        }
    }
}

fn append_log(log_ring: &crate::stores::LogRing, params: &Value) {
    let level: LogLevel = params
        .get("type")
        .and_then(|v| v.as_i64())
        .map(message_type_from_i64)
        .unwrap_or(LogLevel::Log);
    let message = params.get("message").and_then(|v| v.as_str()).unwrap_or_default();
    log_ring.append(level, message, chrono::Utc::now());
}

fn message_type_from_i64(value: i64) -> LogLevel {
    match value {
        1 => LogLevel::Error,
        2 => LogLevel::Warning,
        3 => LogLevel::Info,
        _ => LogLevel::Log,
    }
}

fn parse_diagnostic_provider(id: &str, options: &Value) -> DiagnosticProvider {
    let document_selector = options.get("documentSelector").and_then(|v| v.as_array()).and_then(|filters| {
        filters.first().map(|f| DocumentSelector {
            language: f.get("language").and_then(|v| v.as_str()).map(String::from),
            scheme: f.get("scheme").and_then(|v| v.as_str()).map(String::from),
            pattern: f.get("pattern").and_then(|v| v.as_str()).map(String::from),
        })
    });

    DiagnosticProvider {
        id: id.to_string(),
        document_selector,
        inter_file_dependencies: options.get("interFileDependencies").and_then(|v| v.as_bool()).unwrap_or(false),
        workspace_diagnostics: options.get("workspaceDiagnostics").and_then(|v| v.as_bool()).unwrap_or(false),
    }
}

/// Shallow merge: `extra`'s object keys override/extend `base`'s at each
/// level; non-object values in `extra` replace `base` wholesale.
fn merge_json(base: &mut Value, extra: &Value) {
    match (base, extra) {
        (Value::Object(base_map), Value::Object(extra_map)) => {
            for (key, value) in extra_map {
                merge_json(base_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base_slot, extra_value) => {
            *base_slot = extra_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_json_overlays_nested_objects() {
        let mut base = json!({ "a": { "x": 1, "y": 2 }, "b": true });
        let extra = json!({ "a": { "y": 99, "z": 3 } });
        merge_json(&mut base, &extra);
        assert_eq!(base, json!({ "a": { "x": 1, "y": 99, "z": 3 }, "b": true }));
    }

    #[test]
    fn parse_diagnostic_provider_reads_flags() {
        let options = json!({
            "documentSelector": [{ "language": "rust" }],
            "interFileDependencies": true,
            "workspaceDiagnostics": false,
        });
        let provider = parse_diagnostic_provider("rust-analyzer", &options);
        assert_eq!(provider.id, "rust-analyzer");
        assert!(provider.inter_file_dependencies);
        assert!(!provider.workspace_diagnostics);
        assert_eq!(provider.document_selector.unwrap().language.as_deref(), Some("rust"));
    }
}
