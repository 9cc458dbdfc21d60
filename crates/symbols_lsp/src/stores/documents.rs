//! Open-document table (C2)
//!
//! Keyed by canonical document URI. The Document lifecycle (C5) is the only
//! writer; tool operations (C7) only read through it via `Session`. A
//! per-entry lock (via `DashMap`'s sharded locking) serializes concurrent
//! opens/closes of the same URI so a later caller observes the earlier
//! caller's finished state rather than racing it.

use dashmap::DashMap;

/// A document the server currently has open, mirroring the content the
/// server was last told about.
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub uri: String,
    pub text: String,
    pub version: i32,
    pub language_id: String,
    pub is_open: bool,
    pub preloaded: bool,
}

/// Table of currently-open documents, keyed by canonical URI.
#[derive(Default)]
pub struct OpenDocumentTable {
    by_uri: DashMap<String, OpenDocument>,
    next_version: DashMap<String, i32>,
}

impl OpenDocumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, uri: &str) -> bool {
        self.by_uri.contains_key(uri)
    }

    pub fn get(&self, uri: &str) -> Option<OpenDocument> {
        self.by_uri.get(uri).map(|entry| entry.value().clone())
    }

    pub fn put(&self, document: OpenDocument) {
        symbols_core::telemetry::metrics::OPEN_DOCUMENTS.increment();
        self.by_uri.insert(document.uri.clone(), document);
    }

    pub fn remove(&self, uri: &str) -> Option<OpenDocument> {
        let removed = self.by_uri.remove(uri).map(|(_, doc)| doc);
        if removed.is_some() {
            symbols_core::telemetry::metrics::OPEN_DOCUMENTS.decrement();
        }
        removed
    }

    /// The version to use for the next `didOpen`/`didChange` of `uri`.
    /// Strictly increasing within a session even across repeated
    /// open/close cycles of the same URI (§8: version counters must never
    /// be derived from wall-clock and must never reset).
    pub fn next_version(&self, uri: &str) -> i32 {
        let mut entry = self.next_version.entry(uri.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(uri: &str, version: i32) -> OpenDocument {
        OpenDocument {
            uri: uri.to_string(),
            text: "fn main() {}".to_string(),
            version,
            language_id: "rust".to_string(),
            is_open: true,
            preloaded: false,
        }
    }

    #[test]
    fn put_then_get_roundtrips() {
        let table = OpenDocumentTable::new();
        table.put(doc("file:///a.rs", 1));
        assert!(table.has("file:///a.rs"));
        assert_eq!(table.get("file:///a.rs").unwrap().version, 1);
    }

    #[test]
    fn remove_clears_presence() {
        let table = OpenDocumentTable::new();
        table.put(doc("file:///a.rs", 1));
        table.remove("file:///a.rs");
        assert!(!table.has("file:///a.rs"));
    }

    #[test]
    fn version_strictly_increases_across_reopen_cycles() {
        let table = OpenDocumentTable::new();
        let v1 = table.next_version("file:///a.rs");
        table.remove("file:///a.rs");
        let v2 = table.next_version("file:///a.rs");
        assert!(v2 > v1);
    }
}
