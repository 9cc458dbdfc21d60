//! `diagnostics`: current problems for a file, via push or pull depending on
//! the server's configured strategy (§4.7, C11).

use std::path::Path;
use std::time::Duration;

use lsp_types::{Diagnostic, DiagnosticSeverity};
use serde_json::Value;
use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::config::DiagnosticsMode;
use crate::document::{DocumentNotifier, Strategy};
use crate::session::Session;
use crate::tools::types::DiagnosticResult;
use crate::validation;

/// How often to re-check the diagnostics store while waiting for a push
/// notification in [`DiagnosticsMode::Push`].
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub async fn diagnostics(session: &Session, path: &Path, cancel: &CancelToken) -> Result<Vec<DiagnosticResult>> {
    let absolute = validation::path_valid(path)?;
    let language_id = session.config().language_for_path(&absolute).unwrap_or_else(|| "plaintext".to_string());
    let strategy_config = session.config().diagnostics.clone();

    let items = match strategy_config.mode {
        DiagnosticsMode::Push => {
            // Kept open across calls (not `RespectExisting`): a push server
            // only republishes on change, so closing after the first call
            // would force a re-`didOpen` on every subsequent call within the
            // same session, in violation of the "without re-opening" guarantee.
            crate::document::execute_with_lifecycle(
                &session.stores().documents,
                session as &dyn DocumentNotifier,
                &absolute,
                &language_id,
                Strategy::Persistent,
                |uri| async move { Ok(wait_for_published(session, &uri, strategy_config.wait_timeout_ms).await) },
            )
            .await?
        }
        DiagnosticsMode::Pull => {
            crate::document::execute_with_lifecycle(
                &session.stores().documents,
                session as &dyn DocumentNotifier,
                &absolute,
                &language_id,
                Strategy::RespectExisting,
                |uri| async move {
                    let params = serde_json::json!({ "textDocument": { "uri": uri } });
                    let value = session.request("textDocument/diagnostic", params, cancel).await?;
                    Ok(pull_items_from_value(&value))
                },
            )
            .await?
        }
    };

    Ok(sort_results(items.into_iter().map(to_result).collect()))
}

async fn wait_for_published(session: &Session, uri: &str, timeout_ms: u64) -> Vec<Diagnostic> {
    let _timing = symbols_core::telemetry::TimingGuard::new("diagnostics_push_wait").with_threshold(timeout_ms);
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let current = session.stores().diagnostics.get(uri);
        if !current.is_empty() || tokio::time::Instant::now() >= deadline {
            return current;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn pull_items_from_value(value: &Value) -> Vec<Diagnostic> {
    if value.get("kind").and_then(|v| v.as_str()) != Some("full") {
        return Vec::new();
    }
    value
        .get("items")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn to_result(diagnostic: Diagnostic) -> DiagnosticResult {
    DiagnosticResult {
        severity: diagnostic.severity.map(severity_rank),
        code: diagnostic.code.map(|c| match c {
            lsp_types::NumberOrString::Number(n) => n.to_string(),
            lsp_types::NumberOrString::String(s) => s,
        }),
        source: diagnostic.source,
        message: diagnostic.message,
        range: diagnostic.range.into(),
    }
}

fn severity_rank(severity: DiagnosticSeverity) -> u8 {
    match severity {
        DiagnosticSeverity::ERROR => 1,
        DiagnosticSeverity::WARNING => 2,
        DiagnosticSeverity::INFORMATION => 3,
        DiagnosticSeverity::HINT => 4,
        _ => 4,
    }
}

/// Sort by severity (errors first), then by position, matching §4.7's
/// ordering guarantee so callers get stable, scanning-friendly output.
fn sort_results(mut results: Vec<DiagnosticResult>) -> Vec<DiagnosticResult> {
    results.sort_by(|a, b| {
        a.severity
            .unwrap_or(u8::MAX)
            .cmp(&b.severity.unwrap_or(u8::MAX))
            .then(a.range.start.line().cmp(&b.range.start.line()))
            .then(a.range.start.character().cmp(&b.range.start.character()))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{Position, Range};

    fn diag(severity: DiagnosticSeverity, line: u32, message: &str) -> Diagnostic {
        Diagnostic {
            range: Range::new(Position::new(line, 0), Position::new(line, 1)),
            severity: Some(severity),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn sorts_by_severity_then_position() {
        let results = vec![
            to_result(diag(DiagnosticSeverity::WARNING, 1, "warn-early")),
            to_result(diag(DiagnosticSeverity::ERROR, 5, "err-late")),
            to_result(diag(DiagnosticSeverity::ERROR, 2, "err-early")),
        ];
        let sorted = sort_results(results);
        assert_eq!(sorted[0].message, "err-early");
        assert_eq!(sorted[1].message, "err-late");
        assert_eq!(sorted[2].message, "warn-early");
    }

    #[test]
    fn pull_response_requires_full_kind() {
        let unchanged = serde_json::json!({ "kind": "unchanged" });
        assert!(pull_items_from_value(&unchanged).is_empty());

        let full = serde_json::json!({
            "kind": "full",
            "items": [{ "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 1} }, "message": "m" }],
        });
        assert_eq!(pull_items_from_value(&full).len(), 1);
    }
}
