//! `rename`: compute (and optionally apply) a workspace-wide rename (§4.7, §6).
//!
//! The core returns the edit set unapplied by design (§9 Open Question:
//! rename is a potentially destructive, multi-file write and the agent
//! protocol's own `apply` tool is the place that decides whether and how to
//! write it to disk). [`apply_workspace_edits`] is offered as a utility for
//! callers that do want the core to perform the write directly.

use std::collections::HashMap;
use std::path::Path;

use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::document::{DocumentNotifier, Strategy};
use crate::position::{OneBasedPosition, OneBasedRange};
use crate::session::Session;
use crate::tools::types::{ApplyEditOutcome, RenameResult, TextEditResult};
use crate::tools::text_document_position_params;
use crate::validation;

pub async fn rename(
    session: &Session,
    path: &Path,
    position: OneBasedPosition,
    new_name: &str,
    cancel: &CancelToken,
) -> Result<RenameResult> {
    let (absolute, _text) = validation::validate_file_position(path, position)?;
    let language_id = session.config().language_for_path(&absolute).unwrap_or_else(|| "plaintext".to_string());
    let zero_based = position.to_zero_based();

    crate::document::execute_with_lifecycle(
        &session.stores().documents,
        session as &dyn DocumentNotifier,
        &absolute,
        &language_id,
        Strategy::RespectExisting,
        |uri| async move {
            let mut params = text_document_position_params(&uri, zero_based);
            params["newName"] = serde_json::Value::String(new_name.to_string());

            let value = session.request("textDocument/rename", params, cancel).await?;
            Ok(result_from_value(&value))
        },
    )
    .await
}

fn result_from_value(value: &serde_json::Value) -> RenameResult {
    let mut changes: HashMap<String, Vec<TextEditResult>> = HashMap::new();

    if let Some(map) = value.get("changes").and_then(|v| v.as_object()) {
        for (uri, edits) in map {
            let edits: Vec<lsp_types::TextEdit> = edits
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter_map(|e| serde_json::from_value(e).ok())
                .collect();
            changes.entry(uri.clone()).or_default().extend(edits.into_iter().map(to_result));
        }
    }

    if let Some(document_changes) = value.get("documentChanges").and_then(|v| v.as_array()) {
        for entry in document_changes {
            // `TextDocumentEdit` entries carry `textDocument.uri` + `edits`;
            // resource operations (`create`/`rename`/`delete`) have no
            // per-line edits to surface and are skipped.
            let Some(uri) = entry.get("textDocument").and_then(|d| d.get("uri")).and_then(|v| v.as_str()) else { continue };
            let Some(edits) = entry.get("edits").and_then(|v| v.as_array()) else { continue };
            let edits: Vec<lsp_types::TextEdit> = edits.iter().filter_map(|e| serde_json::from_value(e.clone()).ok()).collect();
            changes.entry(uri.to_string()).or_default().extend(edits.into_iter().map(to_result));
        }
    }

    let change_count = changes.values().map(|v| v.len()).sum();
    RenameResult { changes, change_count }
}

fn to_result(edit: lsp_types::TextEdit) -> TextEditResult {
    TextEditResult {
        range: edit.range.into(),
        new_text: edit.new_text,
    }
}

/// Apply every edit in `result` to disk, one file at a time. Edits within a
/// file are applied from the bottom up so earlier offsets in the same file
/// are never invalidated by a preceding edit. A file whose on-disk content
/// cannot be read is skipped and reported with `written: false` rather than
/// failing the whole batch.
pub async fn apply_workspace_edits(result: &RenameResult, document_notifier: &dyn DocumentNotifier) -> Vec<ApplyEditOutcome> {
    let mut outcomes = Vec::with_capacity(result.changes.len());

    for (uri, edits) in &result.changes {
        let Some(path) = uri_to_path(uri) else {
            outcomes.push(ApplyEditOutcome { uri: uri.clone(), applied: 0, skipped: edits.len(), written: false });
            continue;
        };

        let Ok(original) = std::fs::read_to_string(&path) else {
            outcomes.push(ApplyEditOutcome { uri: uri.clone(), applied: 0, skipped: edits.len(), written: false });
            continue;
        };

        let mut sorted = edits.clone();
        sorted.sort_by(|a, b| b.range.end.cmp(&a.range.end));

        let mut lines: Vec<String> = original.split('\n').map(String::from).collect();
        let mut applied = 0usize;
        let mut skipped = 0usize;

        for edit in &sorted {
            if apply_single_edit(&mut lines, edit) {
                applied += 1;
            } else {
                skipped += 1;
            }
        }

        let written = if applied > 0 {
            let new_content = lines.join("\n");
            let ok = std::fs::write(&path, &new_content).is_ok();
            if ok {
                let _ = document_notifier.did_close(uri).await;
            }
            ok
        } else {
            false
        };

        outcomes.push(ApplyEditOutcome { uri: uri.clone(), applied, skipped, written });
    }

    outcomes
}

fn apply_single_edit(lines: &mut Vec<String>, edit: &TextEditResult) -> bool {
    apply_single_edit_range(lines, edit.range, &edit.new_text)
}

fn apply_single_edit_range(lines: &mut Vec<String>, range: OneBasedRange, new_text: &str) -> bool {
    let start_line = range.start.line() - 1;
    let end_line = range.end.line() - 1;
    if start_line >= lines.len() || end_line >= lines.len() {
        return false;
    }

    if start_line == end_line {
        let line = &lines[start_line];
        let chars: Vec<char> = line.chars().collect();
        let start = (range.start.character() - 1).min(chars.len());
        let end = (range.end.character() - 1).min(chars.len());
        if start > end {
            return false;
        }
        let mut replaced: String = chars[..start].iter().collect();
        replaced.push_str(new_text);
        replaced.extend(chars[end..].iter());
        lines[start_line] = replaced;
        true
    } else {
        // Multi-line replacement: splice the affected lines into one,
        // keeping the prefix of the first and the suffix of the last.
        let first_chars: Vec<char> = lines[start_line].chars().collect();
        let last_chars: Vec<char> = lines[end_line].chars().collect();
        let start = (range.start.character() - 1).min(first_chars.len());
        let end = (range.end.character() - 1).min(last_chars.len());

        let prefix: String = first_chars[..start].iter().collect();
        let suffix: String = last_chars[end..].iter().collect();
        let replacement = format!("{prefix}{new_text}{suffix}");

        lines[start_line] = replacement;
        lines.drain(start_line + 1..=end_line);
        true
    }
}

fn uri_to_path(uri: &str) -> Option<std::path::PathBuf> {
    uri.strip_prefix("file://").map(|p| std::path::PathBuf::from(percent_encoding::percent_decode_str(p).decode_utf8_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_count_sums_across_files() {
        let mut changes = HashMap::new();
        changes.insert(
            "file:///a.rs".to_string(),
            vec![TextEditResult { range: range(1, 1, 1, 2), new_text: "x".into() }],
        );
        changes.insert(
            "file:///b.rs".to_string(),
            vec![
                TextEditResult { range: range(1, 1, 1, 2), new_text: "y".into() },
                TextEditResult { range: range(2, 1, 2, 2), new_text: "z".into() },
            ],
        );
        let result = RenameResult { changes, change_count: 3 };
        assert_eq!(result.changes.values().map(|v| v.len()).sum::<usize>(), result.change_count);
    }

    #[test]
    fn single_line_replace_preserves_surrounding_text() {
        let mut lines = vec!["let old_name = 1;".to_string()];
        let ok = apply_single_edit_range(&mut lines, range(1, 5, 1, 13), "new_name");
        assert!(ok);
        assert_eq!(lines[0], "let new_name = 1;");
    }

    #[test]
    fn uri_to_path_decodes_percent_escapes() {
        let path = uri_to_path("file:///tmp/my%20file.rs").unwrap();
        assert_eq!(path, std::path::PathBuf::from("/tmp/my file.rs"));
    }

    fn range(sl: usize, sc: usize, el: usize, ec: usize) -> OneBasedRange {
        OneBasedRange {
            start: OneBasedPosition::new(sl, sc).unwrap(),
            end: OneBasedPosition::new(el, ec).unwrap(),
        }
    }
}
