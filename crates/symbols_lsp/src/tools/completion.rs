//! `completion`: candidates at a position (§4.7, §6).
//!
//! The response is duck-typed: a bare `CompletionItem[]` or a
//! `CompletionList { isIncomplete, items }`. Both are normalized to the
//! same flat `Vec<CompletionItemResult>` (§9).

use std::path::Path;

use lsp_types::{CompletionItem, CompletionResponse, Documentation};
use serde_json::Value;
use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::document::{DocumentNotifier, Strategy};
use crate::position::OneBasedPosition;
use crate::session::Session;
use crate::tools::types::{CompletionItemResult, TextEditResult};
use crate::tools::text_document_position_params;
use crate::validation;

pub async fn completion(
    session: &Session,
    path: &Path,
    position: OneBasedPosition,
    cancel: &CancelToken,
) -> Result<Vec<CompletionItemResult>> {
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
            let params = text_document_position_params(&uri, zero_based);
            let value = session.request("textDocument/completion", params, cancel).await?;
            Ok(items_from_value(value))
        },
    )
    .await
}

fn items_from_value(value: Value) -> Vec<CompletionItemResult> {
    let response: Option<CompletionResponse> = serde_json::from_value(value).ok();
    let items = match response {
        Some(CompletionResponse::Array(items)) => items,
        Some(CompletionResponse::List(list)) => list.items,
        None => Vec::new(),
    };
    items.into_iter().map(normalize_item).collect()
}

fn normalize_item(item: CompletionItem) -> CompletionItemResult {
    let text_edit = item.text_edit.and_then(|edit| match edit {
        lsp_types::CompletionTextEdit::Edit(edit) => Some(TextEditResult {
            range: edit.range.into(),
            new_text: edit.new_text,
        }),
        lsp_types::CompletionTextEdit::InsertAndReplace(edit) => Some(TextEditResult {
            range: edit.insert.into(),
            new_text: edit.new_text,
        }),
    });

    CompletionItemResult {
        label: item.label,
        kind: item.kind,
        detail: item.detail,
        documentation: item.documentation.map(documentation_to_string),
        insert_text: item.insert_text,
        text_edit,
    }
}

fn documentation_to_string(doc: Documentation) -> String {
    match doc {
        Documentation::String(s) => s,
        Documentation::MarkupContent(markup) => markup.value,
    }
}
