//! `references`: every known reference to the symbol at a position (§4.7, §6).

use std::path::Path;

use symbols_core::Result;

use crate::cancel::CancelToken;
use crate::document::{DocumentNotifier, Strategy};
use crate::position::OneBasedPosition;
use crate::session::Session;
use crate::tools::types::LocationResult;
use crate::tools::{locations_from_value, text_document_position_params};
use crate::validation;

/// Whether the declaration site itself should be included alongside the
/// reference sites.
pub async fn references(
    session: &Session,
    path: &Path,
    position: OneBasedPosition,
    include_declaration: bool,
    cancel: &CancelToken,
) -> Result<Vec<LocationResult>> {
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
            params["context"] = serde_json::json!({ "includeDeclaration": include_declaration });

            let value = session.request("textDocument/references", params, cancel).await?;
            Ok(locations_from_value(&value))
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_flag_is_embedded_in_params() {
        let mut params = text_document_position_params("file:///a.rs", crate::position::ZeroBasedPosition::new(0, 0));
        params["context"] = json!({ "includeDeclaration": true });
        assert_eq!(params["context"]["includeDeclaration"], json!(true));
    }
}
