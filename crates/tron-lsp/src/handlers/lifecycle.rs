use crate::client::LspClient;
use crate::diagnostics::DiagnosticsPublisher;
use crate::handlers::{commands, configuration};
use crate::state::GlobalState;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

pub const SERVER_NAME: &str = "tron-lsp";

/// Fixed feature set advertised at `initialize`. Only document symbols, completion and
/// the two commands do real work; the other providers answer empty results.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(true),
                will_save_wait_until: Some(true),
                save: Some(TextDocumentSyncSaveOptions::Supported(true)),
            },
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            retrigger_characters: None,
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        type_definition_provider: Some(TypeDefinitionProviderCapability::Simple(true)),
        implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
        declaration_provider: Some(DeclarationCapability::Simple(true)),
        references_provider: Some(OneOf::Left(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
        code_lens_provider: Some(CodeLensOptions {
            resolve_provider: Some(false),
        }),
        document_link_provider: Some(DocumentLinkOptions {
            resolve_provider: Some(false),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        color_provider: Some(ColorProviderCapability::Simple(true)),
        document_formatting_provider: Some(OneOf::Left(true)),
        document_range_formatting_provider: Some(OneOf::Left(true)),
        document_on_type_formatting_provider: Some(DocumentOnTypeFormattingOptions {
            first_trigger_character: "}".to_string(),
            more_trigger_character: None,
        }),
        rename_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: commands::COMMANDS.iter().map(|c| c.to_string()).collect(),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        workspace: Some(WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        }),
        ..Default::default()
    }
}

/// Handle "initialize" request
pub async fn handle_initialize<C: LspClient>(
    client: &C,
    state: &GlobalState,
    params: InitializeParams,
) -> Result<InitializeResult> {
    state.lifecycle.begin_initialize()?;

    let workspace_capabilities = params.capabilities.workspace.as_ref();
    let supports_configuration = workspace_capabilities
        .and_then(|w| w.configuration)
        .unwrap_or(false);
    let supports_workspace_folders = workspace_capabilities
        .and_then(|w| w.workspace_folders)
        .unwrap_or(false);
    #[allow(deprecated)]
    let root_uri = params.root_uri;

    if let Some(info) = &params.client_info {
        log::info!(
            "client: {} {}",
            info.name,
            info.version.as_deref().unwrap_or("")
        );
    }
    log::info!(
        "initialize: root {:?}, workspace/configuration {}, workspace/workspaceFolders {}",
        root_uri.as_ref().map(Url::as_str),
        supports_configuration,
        supports_workspace_folders
    );

    {
        let mut session = state.session.write().await;
        session.root_uri = root_uri;
        session.folders = params.workspace_folders.unwrap_or_default();
        session.supports_configuration = supports_configuration;
        session.supports_workspace_folders = supports_workspace_folders;
    }

    match tempfile::Builder::new().prefix("tron-lsp-").tempdir() {
        Ok(dir) => {
            log::debug!("scratch directory {}", dir.path().display());
            *state.scratch.lock() = Some(dir);
        }
        Err(err) => log::warn!("no scratch directory: {}", err),
    }

    client
        .log_message(
            MessageType::INFO,
            format!("{} {} initializing", SERVER_NAME, env!("CARGO_PKG_VERSION")),
        )
        .await;

    Ok(InitializeResult {
        capabilities: server_capabilities(),
        server_info: Some(ServerInfo {
            name: SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

/// Handle "initialized" notification
///
/// The phase flips first so document sync arriving during the configuration round-trips
/// is accepted; readiness is only announced once negotiation has finished.
pub async fn handle_initialized<C: LspClient>(
    client: &C,
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
) {
    if !state.lifecycle.finish_initialize() {
        log::warn!(
            "ignoring initialized notification in phase {:?}",
            state.lifecycle.phase()
        );
        return;
    }

    configuration::negotiate(client, state, publisher).await;

    let message = format!("{} ready", SERVER_NAME);
    log::info!("{}", message);
    client.log_message(MessageType::INFO, message.clone()).await;
    client.show_message(MessageType::INFO, message).await;
}

/// Handle "shutdown" request
///
/// Cancels background work and releases the scratch directory. The process keeps running
/// until the exit notification.
pub async fn handle_shutdown<C: LspClient>(
    state: &GlobalState,
    publisher: &DiagnosticsPublisher<C>,
) -> Result<()> {
    state.lifecycle.begin_shutdown()?;
    log::info!("shutdown requested");

    state.cancel.send_replace(true);
    publisher.cancel();
    // The heartbeat observes the cancel signal on its own
    drop(state.heartbeat.lock().take());

    let scratch = state.scratch.lock().take();
    if let Some(dir) = scratch {
        let path = dir.path().to_path_buf();
        if let Err(err) = dir.close() {
            log::warn!("failed to remove {}: {}", path.display(), err);
        }
    }
    Ok(())
}
