use crate::client::LspClient;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::GlobalState;
use std::sync::Arc;
use tower_lsp::lsp_types::*;
use tron_core::{StoreError, SyncOutcome};

fn after_sync<C: LspClient>(
    publisher: &Arc<DiagnosticsPublisher<C>>,
    outcome: SyncOutcome,
) {
    if outcome.analyze {
        publisher.schedule(outcome.snapshot);
    } else {
        log::debug!("{} is excluded from analysis", outcome.snapshot.uri);
    }
}

/// Handle "textDocument/didOpen" notification
pub async fn handle_did_open<C: LspClient>(
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: DidOpenTextDocumentParams,
) {
    let document = params.text_document;
    log::debug!("open {} (version {})", document.uri, document.version);
    match state
        .workspace
        .open(document.uri, document.text, Some(document.version))
    {
        Ok(outcome) => after_sync(publisher, outcome),
        Err(err) => log::warn!("{}", err),
    }
}

/// Handle "textDocument/didChange" notification
///
/// Sync is full-text, so only the last content change matters.
pub async fn handle_did_change<C: LspClient>(
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: DidChangeTextDocumentParams,
) {
    let uri = params.text_document.uri;
    let version = params.text_document.version;
    let Some(change) = params.content_changes.into_iter().last() else {
        return;
    };
    if change.range.is_some() {
        log::warn!("ignoring ranged change for {}: only full sync is supported", uri);
        return;
    }

    match state.workspace.change(uri, change.text, Some(version)) {
        Ok(outcome) => after_sync(publisher, outcome),
        Err(err @ StoreError::NotFound(_)) => log::debug!("dropping change: {}", err),
        Err(err) => log::warn!("{}", err),
    }
}

/// Handle "textDocument/didClose" notification
pub async fn handle_did_close<C: LspClient>(
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: DidCloseTextDocumentParams,
) {
    let uri = params.text_document.uri;
    let last = state.workspace.close(&uri);
    log::debug!("close {}", uri);
    if state.workspace.is_excluded(&uri) {
        return;
    }
    publisher.clear(&uri, last).await;
}

/// Handle "textDocument/willSave" notification
pub async fn handle_will_save(params: WillSaveTextDocumentParams) {
    log::trace!("will save {} ({:?})", params.text_document.uri, params.reason);
}

/// Handle "textDocument/didSave" notification
pub async fn handle_did_save(params: DidSaveTextDocumentParams) {
    log::trace!("saved {}", params.text_document.uri);
}
