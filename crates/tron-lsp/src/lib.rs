//! Tron LSP Library
//!
//! LSP protocol layer: session lifecycle, configuration negotiation and the document
//! pipeline on top of `tron-core`.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::request::{
    GotoDeclarationParams, GotoDeclarationResponse, GotoImplementationParams,
    GotoImplementationResponse, GotoTypeDefinitionParams, GotoTypeDefinitionResponse,
};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, ClientSocket, LanguageServer, LspService};

use crate::client::LspClient;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::GlobalState;

pub mod client;
pub mod config;
mod conversion;
pub mod diagnostics;
mod handlers;
mod heartbeat;
pub mod lifecycle;
pub mod state;

#[cfg(test)]
mod tests;

/// LSP backend implementation
pub struct Backend<C = Client> {
    client: C,
    state: GlobalState,
    publisher: Arc<DiagnosticsPublisher<C>>,
}

impl Backend<Client> {
    pub fn new(client: Client, state: GlobalState) -> Self {
        Self::with_client(client, state)
    }
}

impl<C: LspClient> Backend<C> {
    pub fn with_client(client: C, state: GlobalState) -> Self {
        let publisher = Arc::new(DiagnosticsPublisher::new(
            client.clone(),
            Arc::clone(&state.workspace),
        ));
        Self {
            client,
            state,
            publisher,
        }
    }

    pub fn state(&self) -> &GlobalState {
        &self.state
    }

    pub fn publisher(&self) -> &Arc<DiagnosticsPublisher<C>> {
        &self.publisher
    }

    /// Document and workspace notifications are dropped outside `Initialized`.
    fn accepts(&self, method: &str) -> bool {
        if self.state.lifecycle.is_initialized() {
            true
        } else {
            log::warn!(
                "dropping {} received in phase {:?}",
                method,
                self.state.lifecycle.phase()
            );
            false
        }
    }
}

/// Run one request on its own task. A panic is logged and turns into `None` for this
/// request only; the session and other in-flight requests are unaffected.
async fn isolated<T, F>(method: &str, task: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(value) => Some(value),
        Err(err) if err.is_panic() => {
            log::error!("{} handler panicked: {}", method, err);
            None
        }
        Err(err) => {
            log::warn!("{} handler cancelled: {}", method, err);
            None
        }
    }
}

#[tower_lsp::async_trait]
impl<C: LspClient> LanguageServer for Backend<C> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::handle_initialize(&self.client, &self.state, params).await
    }

    async fn initialized(&self, _: InitializedParams) {
        handlers::handle_initialized(&self.client, &self.state, &self.publisher).await
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::handle_shutdown(&self.state, &self.publisher).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if self.accepts("textDocument/didOpen") {
            handlers::handle_did_open(&self.state, &self.publisher, params).await
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if self.accepts("textDocument/didChange") {
            handlers::handle_did_change(&self.state, &self.publisher, params).await
        }
    }

    async fn will_save(&self, params: WillSaveTextDocumentParams) {
        if self.accepts("textDocument/willSave") {
            handlers::handle_will_save(params).await
        }
    }

    async fn will_save_wait_until(
        &self,
        _: WillSaveTextDocumentParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if self.accepts("textDocument/didSave") {
            handlers::handle_did_save(params).await
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if self.accepts("textDocument/didClose") {
            handlers::handle_did_close(&self.state, &self.publisher, params).await
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.accepts("workspace/didChangeConfiguration") {
            handlers::handle_did_change_configuration(
                &self.client,
                &self.state,
                &self.publisher,
                params,
            )
            .await
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        if self.accepts("workspace/didChangeWorkspaceFolders") {
            handlers::handle_did_change_workspace_folders(
                &self.client,
                &self.state,
                &self.publisher,
                params,
            )
            .await
        }
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        self.state.lifecycle.guard()?;
        let state = self.state.clone();
        let response = isolated("textDocument/documentSymbol", async move {
            handlers::handle_document_symbol(&state, params).await
        })
        .await
        .flatten()
        .unwrap_or(DocumentSymbolResponse::Nested(Vec::new()));
        Ok(Some(response))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        self.state.lifecycle.guard()?;
        let state = self.state.clone();
        let response = isolated("textDocument/completion", async move {
            handlers::handle_completion(&state, params).await
        })
        .await
        .flatten();
        Ok(response)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        self.state.lifecycle.guard()?;
        let state = self.state.clone();
        let publisher = Arc::clone(&self.publisher);
        isolated("workspace/executeCommand", async move {
            handlers::handle_execute_command(&state, &publisher, params).await
        })
        .await
        .unwrap_or(Ok(None))
    }

    // Advertised but not backed by any analysis: empty answers once initialized.

    async fn hover(&self, _: HoverParams) -> Result<Option<Hover>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn signature_help(&self, _: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn goto_declaration(
        &self,
        _: GotoDeclarationParams,
    ) -> Result<Option<GotoDeclarationResponse>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn goto_definition(
        &self,
        _: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn goto_type_definition(
        &self,
        _: GotoTypeDefinitionParams,
    ) -> Result<Option<GotoTypeDefinitionResponse>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn goto_implementation(
        &self,
        _: GotoImplementationParams,
    ) -> Result<Option<GotoImplementationResponse>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn references(&self, _: ReferenceParams) -> Result<Option<Vec<Location>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn document_highlight(
        &self,
        _: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn symbol(
        &self,
        _: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn code_action(&self, _: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn code_lens(&self, _: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn document_link(&self, _: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn document_color(&self, _: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        self.state.lifecycle.guard()?;
        Ok(Vec::new())
    }

    async fn formatting(&self, _: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn range_formatting(
        &self,
        _: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn on_type_formatting(
        &self,
        _: DocumentOnTypeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn rename(&self, _: RenameParams) -> Result<Option<WorkspaceEdit>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }

    async fn folding_range(&self, _: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        self.state.lifecycle.guard()?;
        Ok(None)
    }
}

/// Build the service around `state`. The caller keeps a clone of `state` to read the
/// final lifecycle phase once the connection ends.
pub fn create_lsp_service(state: GlobalState) -> (LspService<Backend>, ClientSocket) {
    LspService::new(move |client| Backend::new(client, state))
}
