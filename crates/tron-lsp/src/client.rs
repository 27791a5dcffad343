//! Server-to-client calls the session depends on
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{ConfigurationItem, Diagnostic, MessageType, Url, WorkspaceFolder};
use tower_lsp::Client;

/// Callbacks into the editor. Implemented by the real [`Client`]; tests substitute a
/// recording double.
#[tower_lsp::async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn workspace_folders(&self) -> Result<Option<Vec<WorkspaceFolder>>>;

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>>;

    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);

    async fn show_message(&self, typ: MessageType, message: String);

    async fn log_message(&self, typ: MessageType, message: String);
}

#[tower_lsp::async_trait]
impl LspClient for Client {
    async fn workspace_folders(&self) -> Result<Option<Vec<WorkspaceFolder>>> {
        Client::workspace_folders(self).await
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>> {
        Client::configuration(self, items).await
    }

    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        Client::publish_diagnostics(self, uri, diagnostics, version).await
    }

    async fn show_message(&self, typ: MessageType, message: String) {
        Client::show_message(self, typ, message).await
    }

    async fn log_message(&self, typ: MessageType, message: String) {
        Client::log_message(self, typ, message).await
    }
}
