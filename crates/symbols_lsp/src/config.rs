//! Configuration model (C11, ambient)
//!
//! Loading a descriptor from YAML/CLI arguments is out of scope for this
//! crate; this module only defines the *shape* C3 consumes. The descriptor
//! is always handed to [`crate::session::Session::start`] already
//! constructed and already validated by the caller.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether diagnostics are obtained by waiting for a server-pushed
/// notification or by issuing a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsMode {
    /// Open the document and wait for `textDocument/publishDiagnostics`.
    Push,
    /// Issue `textDocument/diagnostic` and use the response directly.
    Pull,
}

/// Diagnostics acquisition strategy and its settling timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsStrategyConfig {
    pub mode: DiagnosticsMode,
    /// Only meaningful in `Push` mode: how long to wait for a
    /// `publishDiagnostics` notification before giving up and returning
    /// whatever the store currently holds (possibly empty).
    pub wait_timeout_ms: u64,
}

impl Default for DiagnosticsStrategyConfig {
    fn default() -> Self {
        Self {
            mode: DiagnosticsMode::Push,
            wait_timeout_ms: 3000,
        }
    }
}

/// The per-language-server descriptor C3 uses to spawn and initialize the
/// child process and to configure the document and workspace-loader
/// policies that sit on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Executable to spawn, e.g. `typescript-language-server`.
    pub command: String,
    /// Arguments, e.g. `["--stdio"]`.
    pub args: Vec<String>,
    /// File extension (without the dot) -> LSP `languageId`.
    pub extensions: HashMap<String, String>,
    /// Glob-like patterns used elsewhere to detect a workspace root; the
    /// core itself does not walk the filesystem looking for these, it
    /// simply carries the configuration through.
    pub workspace_detection_patterns: Vec<String>,
    /// Files opened eagerly at session start to warm the server's index.
    pub preload: Vec<PathBuf>,
    pub diagnostics: DiagnosticsStrategyConfig,
    /// Extra environment variables merged into the child's environment.
    pub env: HashMap<String, String>,
    /// Name of the registered [`crate::loader::WorkspaceLoader`] variant.
    /// Unknown names fall back to the Default loader (§4.4).
    pub workspace_loader: String,
    /// Additional `ClientCapabilities` JSON merged into the capabilities
    /// this crate advertises at `initialize` time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_capabilities: Option<serde_json::Value>,
}

impl ServerDescriptor {
    /// Build a descriptor for a server that needs no extra configuration
    /// beyond a command line and an extension map.
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            extensions: HashMap::new(),
            workspace_detection_patterns: Vec::new(),
            preload: Vec::new(),
            diagnostics: DiagnosticsStrategyConfig::default(),
            env: HashMap::new(),
            workspace_loader: "default".to_string(),
            extra_capabilities: None,
        }
    }

    /// Builder: register an extension -> language-id mapping.
    pub fn with_extension(mut self, extension: impl Into<String>, language_id: impl Into<String>) -> Self {
        self.extensions.insert(extension.into(), language_id.into());
        self
    }

    /// Builder: add a file to the preload set.
    pub fn with_preload(mut self, path: impl Into<PathBuf>) -> Self {
        self.preload.push(path.into());
        self
    }

    /// Builder: select a workspace-loader variant by name.
    pub fn with_workspace_loader(mut self, name: impl Into<String>) -> Self {
        self.workspace_loader = name.into();
        self
    }

    /// Look up the language id for a file path by its extension.
    pub fn language_for_path(&self, path: &std::path::Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        self.extensions.get(ext).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_lookup_by_extension() {
        let descriptor = ServerDescriptor::new("rust-analyzer", Vec::<String>::new())
            .with_extension("rs", "rust");

        assert_eq!(
            descriptor.language_for_path(std::path::Path::new("src/main.rs")),
            Some("rust".to_string())
        );
        assert_eq!(
            descriptor.language_for_path(std::path::Path::new("src/main.go")),
            None
        );
    }

    #[test]
    fn descriptor_roundtrips_through_json() {
        let descriptor = ServerDescriptor::new("typescript-language-server", vec!["--stdio"])
            .with_extension("ts", "typescript")
            .with_preload("src/index.ts");

        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: ServerDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.command, descriptor.command);
        assert_eq!(parsed.preload, descriptor.preload);
    }
}
