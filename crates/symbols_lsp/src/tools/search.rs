//! `search`: workspace-wide symbol search, gated on workspace readiness
//! (§4.7, §4.8, §6).

use serde_json::Value;
use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::session::Session;
use crate::tools::types::SearchResult;
use crate::validation;

/// Search the workspace index for symbols matching `query`. Requires the
/// workspace to have finished loading (C4); unlike the file-scoped
/// operations this one has no single file to validate.
pub async fn search(session: &Session, query: &str, cancel: &CancelToken) -> Result<Vec<SearchResult>> {
    validation::workspace_ready(&session.stores().workspace)?;

    let params = serde_json::json!({ "query": query });
    let value = session.request("workspace/symbol", params, cancel).await?;
    Ok(results_from_value(&value))
}

/// `workspace/symbol` replies with `SymbolInformation[]` (flat, carrying a
/// plain `Location`) on most servers, or the newer `WorkspaceSymbol[]` shape
/// (whose `location` may itself be a bare URI) on some. Parsed generically
/// off the JSON shape rather than through `lsp_types`'s typed enum, since
/// that enum does not accept the URI-only variant some servers emit.
fn results_from_value(value: &Value) -> Vec<SearchResult> {
    let Some(items) = value.as_array() else { return Vec::new() };

    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            let kind_code = item.get("kind")?.as_u64()?;
            let kind: lsp_types::SymbolKind = serde_json::from_value(Value::from(kind_code)).ok()?;
            let container_name = item.get("containerName").and_then(|v| v.as_str()).map(String::from);

            let location = item.get("location")?;
            let (uri, range) = if let Some(uri) = location.as_str() {
                // URI-only location: no range information, use a zero-width
                // range at the document start.
                (uri.to_string(), lsp_types::Range::default())
            } else {
                let uri = location.get("uri")?.as_str()?.to_string();
                let range: lsp_types::Range = serde_json::from_value(location.get("range")?.clone()).ok()?;
                (uri, range)
            };

            Some(SearchResult { name, kind, uri, range: range.into(), container_name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_symbol_information_shape() {
        let value = json!([{
            "name": "foo",
            "kind": 12,
            "location": { "uri": "file:///a.rs", "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 3} } },
            "containerName": "mod",
        }]);
        let results = results_from_value(&value);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "foo");
        assert_eq!(results[0].container_name.as_deref(), Some("mod"));
    }

    #[test]
    fn skips_entries_missing_required_fields() {
        let value = json!([{ "name": "no-kind" }]);
        assert!(results_from_value(&value).is_empty());
    }
}
