//! Diagnostics store (C2)
//!
//! Holds the most recently published diagnostic list per document URI.
//! `publishDiagnostics` always replaces wholesale, never merges, matching
//! LSP semantics: a later publication for a URI supersedes every earlier
//! one.

use dashmap::DashMap;
use lsp_types::Diagnostic;

/// The current diagnostics per document URI.
#[derive(Default)]
pub struct DiagnosticsStore {
    by_uri: DashMap<String, Vec<Diagnostic>>,
}

impl DiagnosticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics for `uri` wholesale.
    pub fn set(&self, uri: impl Into<String>, diagnostics: Vec<Diagnostic>) {
        self.by_uri.insert(uri.into(), diagnostics);
    }

    /// Current diagnostics for `uri`, or an empty list if none have been published.
    pub fn get(&self, uri: &str) -> Vec<Diagnostic> {
        self.by_uri
            .get(uri)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, uri: &str) {
        self.by_uri.remove(uri);
    }

    /// A consistent point-in-time copy of every tracked URI's diagnostics.
    pub fn snapshot(&self) -> Vec<(String, Vec<Diagnostic>)> {
        self.by_uri
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{DiagnosticSeverity, Position, Range};

    fn diag(message: &str) -> Diagnostic {
        Diagnostic {
            range: Range::new(Position::new(0, 0), Position::new(0, 1)),
            severity: Some(DiagnosticSeverity::ERROR),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn later_publish_replaces_earlier() {
        let store = DiagnosticsStore::new();
        store.set("file:///a.rs", vec![diag("first")]);
        store.set("file:///a.rs", vec![diag("second")]);

        let current = store.get("file:///a.rs");
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "second");
    }

    #[test]
    fn missing_uri_returns_empty() {
        let store = DiagnosticsStore::new();
        assert!(store.get("file:///missing.rs").is_empty());
    }
}
