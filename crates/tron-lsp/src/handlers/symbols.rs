use crate::conversion::symbol_to_document_symbol;
use crate::state::GlobalState;
use std::sync::Arc;
use tower_lsp::lsp_types::*;
use tron_core::model::Artifact;

/// Cached outline for `uri`, computed off the async runtime on a miss.
pub async fn outline(state: &GlobalState, uri: Url) -> Option<Arc<Artifact>> {
    let workspace = Arc::clone(&state.workspace);
    match tokio::task::spawn_blocking(move || workspace.outline(&uri)).await {
        Ok(artifact) => artifact,
        Err(err) => {
            log::error!("outline task failed: {}", err);
            None
        }
    }
}

/// Handle "textDocument/documentSymbol" request
///
/// Unknown, excluded and unparsable documents all answer an empty outline.
pub async fn handle_document_symbol(
    state: &GlobalState,
    params: DocumentSymbolParams,
) -> Option<DocumentSymbolResponse> {
    let symbols = outline(state, params.text_document.uri)
        .await
        .map(|artifact| {
            artifact
                .symbols
                .iter()
                .map(symbol_to_document_symbol)
                .collect()
        })
        .unwrap_or_default();
    Some(DocumentSymbolResponse::Nested(symbols))
}
