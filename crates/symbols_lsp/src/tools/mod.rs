//! Tool operations (C7)
//!
//! The eight agent-facing operations named in §6. Each follows the same
//! shape: *validate → acquire (C5) → request (C1) → translate (C6) →
//! release → return*. Split one file per operation since together they are
//! the largest component in the spec (~30% share) and each has its own
//! response-shape quirks worth reading in isolation.

pub mod completion;
pub mod diagnostics;
pub mod inspect;
pub mod logs;
pub mod outline;
pub mod references;
pub mod rename;
pub mod search;
pub mod types;

use serde_json::{json, Value};

use crate::position::ZeroBasedPosition;
use crate::tools::types::LocationResult;

/// Build the common `{textDocument: {uri}, position: {...}}` params shape
/// every position-taking LSP request shares.
pub(crate) fn text_document_position_params(uri: &str, position: ZeroBasedPosition) -> Value {
    json!({
        "textDocument": { "uri": uri },
        "position": { "line": position.line(), "character": position.character() },
    })
}

/// Normalize the several shapes a "go to X" response can take
/// (`Location`, `Location[]`, `LocationLink[]`, or `null`) into a flat list
/// of 1-based locations. Mirrors the predecessor's `GotoDefinitionResponse`
/// handling (`ferrum_lsp::client::goto_definition`), generalized to also
/// accept a bare single-location object.
pub(crate) fn locations_from_value(value: &Value) -> Vec<LocationResult> {
    if value.is_null() {
        return Vec::new();
    }

    let entries: Vec<&Value> = match value.as_array() {
        Some(items) => items.iter().collect(),
        None => vec![value],
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            // A `LocationLink` carries `targetUri`/`targetRange`; a plain
            // `Location` carries `uri`/`range`.
            let (uri, range) = if let Some(uri) = entry.get("targetUri").and_then(|v| v.as_str()) {
                (uri, entry.get("targetSelectionRange").or_else(|| entry.get("targetRange"))?)
            } else {
                (entry.get("uri")?.as_str()?, entry.get("range")?)
            };
            let range: lsp_types::Range = serde_json::from_value(range.clone()).ok()?;
            Some(LocationResult { uri: uri.to_string(), range: range.into() })
        })
        .collect()
}
