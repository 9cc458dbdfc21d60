//! `outline`: a flat listing of a document's symbols (§4.7, §6).
//!
//! `textDocument/documentSymbol` replies with either a flat
//! `SymbolInformation[]` or a nested `DocumentSymbol[]` tree; both are
//! flattened into the same `Vec<OutlineEntry>` by depth-first traversal,
//! carrying the parent's name down as `container_name` for nested entries
//! (§9: duck-typed response, one canonical form after the boundary).

use std::path::Path;

use serde_json::Value;
use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::document::{DocumentNotifier, Strategy};
use crate::session::Session;
use crate::tools::types::OutlineEntry;
use crate::validation;

pub async fn outline(session: &Session, path: &Path, cancel: &CancelToken) -> Result<Vec<OutlineEntry>> {
    let absolute = validation::path_valid(path)?;
    let language_id = session.config().language_for_path(&absolute).unwrap_or_else(|| "plaintext".to_string());

    crate::document::execute_with_lifecycle(
        &session.stores().documents,
        session as &dyn DocumentNotifier,
        &absolute,
        &language_id,
        Strategy::RespectExisting,
        |uri| async move {
            let params = serde_json::json!({ "textDocument": { "uri": uri } });
            let value = session.request("textDocument/documentSymbol", params, cancel).await?;
            Ok(entries_from_value(&value))
        },
    )
    .await
}

fn entries_from_value(value: &Value) -> Vec<OutlineEntry> {
    let Some(items) = value.as_array() else { return Vec::new() };
    let mut out = Vec::new();
    for item in items {
        collect(item, None, &mut out);
    }
    out
}

fn collect(item: &Value, container_name: Option<String>, out: &mut Vec<OutlineEntry>) {
    let Some(name) = item.get("name").and_then(|v| v.as_str()) else { return };
    let Some(kind) = item.get("kind").and_then(|v| v.as_u64()) else { return };
    let Some(kind): Option<lsp_types::SymbolKind> = serde_json::from_value(Value::from(kind)).ok() else { return };

    // `DocumentSymbol` has `range`/`selectionRange`/`children`; flat
    // `SymbolInformation` has `location.range` and no children. Prefer the
    // selection range (the symbol's name span) when present.
    let range_value = item
        .get("selectionRange")
        .or_else(|| item.get("range"))
        .or_else(|| item.get("location").and_then(|l| l.get("range")));
    let Some(range_value) = range_value else { return };
    let Ok(range): Result<lsp_types::Range, _> = serde_json::from_value(range_value.clone()) else { return };

    let detail = item.get("detail").and_then(|v| v.as_str()).map(String::from);
    let deprecated = item.get("deprecated").and_then(|v| v.as_bool());

    out.push(OutlineEntry {
        name: name.to_string(),
        kind,
        range: range.into(),
        container_name: container_name.clone().or_else(|| item.get("containerName").and_then(|v| v.as_str()).map(String::from)),
        detail,
        deprecated,
    });

    if let Some(children) = item.get("children").and_then(|v| v.as_array()) {
        for child in children {
            collect(child, Some(name.to_string()), out);
        }
    }
}
