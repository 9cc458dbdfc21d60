//! Process-local, thread-safe in-memory state (C2)
//!
//! Each store protects its own map; no callback runs while a store's lock is
//! held. [`Stores`] bundles them behind `Arc` so [`crate::session::Session`]
//! can hand out cheap clones to concurrently running tool calls.

pub mod diagnostics;
pub mod documents;
pub mod log_ring;
pub mod providers;
pub mod workspace;

pub use diagnostics::DiagnosticsStore;
pub use documents::{OpenDocument, OpenDocumentTable};
pub use log_ring::{LogEntry, LogLevel, LogRing};
pub use providers::{DiagnosticProvider, DocumentSelector, ProviderRegistry};
pub use workspace::{WorkspaceReadinessStore, WorkspaceState};

/// All of a session's stores, grouped for convenient construction and
/// sharing. Cloning is shallow: every field is reference-counted.
#[derive(Clone)]
pub struct Stores {
    pub diagnostics: std::sync::Arc<DiagnosticsStore>,
    pub documents: std::sync::Arc<OpenDocumentTable>,
    pub log_ring: std::sync::Arc<LogRing>,
    pub providers: std::sync::Arc<ProviderRegistry>,
    pub workspace: std::sync::Arc<WorkspaceReadinessStore>,
}

impl Stores {
    pub fn new(log_ring_capacity: usize) -> Self {
        Self {
            diagnostics: std::sync::Arc::new(DiagnosticsStore::new()),
            documents: std::sync::Arc::new(OpenDocumentTable::new()),
            log_ring: std::sync::Arc::new(LogRing::new(log_ring_capacity)),
            providers: std::sync::Arc::new(ProviderRegistry::new()),
            workspace: std::sync::Arc::new(WorkspaceReadinessStore::new()),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new(1000)
    }
}
