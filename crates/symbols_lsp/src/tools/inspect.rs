//! `inspect`: hover plus the three "go to X" requests, fanned out in
//! parallel, plus best-effort cursor context (§4.7, §6).

use std::path::Path;

use serde_json::Value;
use symbols_core::{Error, Result};

use crate::cancel::CancelToken;
use crate::context;
use crate::document::Strategy;
use crate::position::OneBasedPosition;
use crate::session::Session;
use crate::tools::types::InspectResult;
use crate::tools::{locations_from_value, text_document_position_params};
use crate::validation;

/// Hover, definition, type-definition and implementation at `position`,
/// each requested independently: a failure on one (a server that doesn't
/// implement `typeDefinition`, say) produces an empty slot rather than
/// failing the whole operation.
pub async fn inspect(
    session: &Session,
    path: &Path,
    position: OneBasedPosition,
    cancel: &CancelToken,
) -> Result<InspectResult> {
    let (absolute, text) = validation::validate_file_position(path, position)?;
    let language_id = session.config().language_for_path(&absolute).unwrap_or_else(|| "plaintext".to_string());
    let zero_based = position.to_zero_based();

    let result = crate::document::execute_with_lifecycle(
        &session.stores().documents,
        session as &dyn crate::document::DocumentNotifier,
        &absolute,
        &language_id,
        Strategy::RespectExisting,
        |uri| async move {
            let params = text_document_position_params(&uri, zero_based);

            let (hover, definition, type_definition, implementation) = tokio::join!(
                session.request("textDocument/hover", params.clone(), cancel),
                session.request("textDocument/definition", params.clone(), cancel),
                session.request("textDocument/typeDefinition", params.clone(), cancel),
                session.request("textDocument/implementation", params.clone(), cancel),
            );

            // A sibling returning `Cancelled` means the token fired mid-fan-out;
            // that must propagate as `Cancelled` rather than collapse into an
            // empty slot the way an ordinary sibling failure does (§5).
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            Ok(InspectResult {
                hover: hover.ok().and_then(parse_hover),
                definition: definition.ok().as_ref().map(locations_from_value).unwrap_or_default(),
                type_definition: type_definition.ok().as_ref().map(locations_from_value).unwrap_or_default(),
                implementation: implementation.ok().as_ref().map(locations_from_value).unwrap_or_default(),
                cursor_context: context::build_context(&text, position),
            })
        },
    )
    .await?;

    Ok(result)
}

fn parse_hover(value: Value) -> Option<lsp_types::Hover> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value).ok()
}
