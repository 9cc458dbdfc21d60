//! Diagnostic provider registry (C2)
//!
//! Tracks pull-diagnostic capabilities announced either statically in the
//! `initialize` result or dynamically via `client/registerCapability`.
//! Append-only except that re-registration under the same id replaces the
//! prior record, matching the data model's "last wins" rule.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A document selector filter, as carried in LSP's `DocumentFilter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSelector {
    pub language: Option<String>,
    pub scheme: Option<String>,
    pub pattern: Option<String>,
}

/// A server's advertised pull-diagnostic capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticProvider {
    pub id: String,
    pub document_selector: Option<DocumentSelector>,
    pub inter_file_dependencies: bool,
    pub workspace_diagnostics: bool,
}

/// Registry of known diagnostic providers, keyed by registration id.
#[derive(Default)]
pub struct ProviderRegistry {
    by_id: DashMap<String, DiagnosticProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a provider by id.
    pub fn add(&self, provider: DiagnosticProvider) {
        self.by_id.insert(provider.id.clone(), provider);
    }

    /// Every currently registered provider.
    pub fn list(&self) -> Vec<DiagnosticProvider> {
        self.by_id.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Whether any registered provider supports workspace-wide pull diagnostics.
    pub fn supports_workspace_diagnostics(&self) -> bool {
        self.by_id.iter().any(|entry| entry.value().workspace_diagnostics)
    }
}
