//! Configuration negotiation
//!
//! Runs once when the session becomes initialized and again whenever the client reports a
//! configuration or workspace-folder change. Every failure here is logged and the session
//! carries on with the settings it already has.
use crate::client::LspClient;
use crate::config::{Settings, LANGUAGE_SECTION, SECTION};
use crate::diagnostics::DiagnosticsPublisher;
use crate::handlers::commands;
use crate::heartbeat;
use crate::state::GlobalState;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_lsp::lsp_types::*;

pub async fn negotiate<C: LspClient>(
    client: &C,
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
) {
    let folders = discover_folders(client, state).await;
    if folders.is_empty() {
        log::info!("no workspace folder and no root, single-file mode");
        client
            .log_message(
                MessageType::INFO,
                "no workspace folder: single-file mode with default settings".to_string(),
            )
            .await;
    }

    let settings = match pull_configuration(client, state).await {
        Some(settings) => settings,
        None => state.session.read().await.settings.clone(),
    };
    apply_settings(client, state, publisher, settings).await;
}

/// Steps 1-3 of the handshake: client folders, else one synthesized from the root, else
/// nothing.
async fn discover_folders<C: LspClient>(client: &C, state: &GlobalState) -> Vec<WorkspaceFolder> {
    let (supported, root, known) = {
        let session = state.session.read().await;
        (
            session.supports_workspace_folders,
            session.root_uri.clone(),
            session.folders.clone(),
        )
    };

    let mut folders = Vec::new();
    if supported {
        match client.workspace_folders().await {
            Ok(Some(reported)) => folders = reported,
            Ok(None) => {}
            Err(err) => log::warn!("workspace/workspaceFolders failed: {}", err),
        }
    }
    if folders.is_empty() {
        folders = known;
    }
    if folders.is_empty() {
        if let Some(root) = root {
            folders.push(folder_from_root(root));
        }
    }

    log::info!(
        "workspace folders: {:?}",
        folders.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
    );
    state.session.write().await.folders = folders.clone();
    folders
}

/// Folder for a bare root location, named after its last path segment.
pub fn folder_from_root(uri: Url) -> WorkspaceFolder {
    let name = uri
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| uri.to_string());
    WorkspaceFolder { uri, name }
}

/// Ask for the `tron` and `[tron]` sections of every folder and merge the answers in
/// request order. `None` when there is nothing to ask or the request failed.
pub async fn pull_configuration<C: LspClient>(
    client: &C,
    state: &GlobalState,
) -> Option<Settings> {
    let (supported, folders) = {
        let session = state.session.read().await;
        (session.supports_configuration, session.folders.clone())
    };
    if !supported {
        log::info!("client does not support workspace/configuration, keeping current settings");
        return None;
    }
    if folders.is_empty() {
        return None;
    }

    let items: Vec<ConfigurationItem> = folders
        .iter()
        .flat_map(|folder| {
            [SECTION, LANGUAGE_SECTION].map(|section| ConfigurationItem {
                scope_uri: Some(folder.uri.clone()),
                section: Some(section.to_string()),
            })
        })
        .collect();

    match client.configuration(items).await {
        Ok(fragments) => {
            log::debug!("received {} configuration fragment(s)", fragments.len());
            Some(Settings::default().merge(fragments))
        }
        Err(err) => {
            log::warn!("workspace/configuration failed: {}", err);
            client
                .log_message(
                    MessageType::WARNING,
                    format!("could not read configuration, keeping current settings: {}", err),
                )
                .await;
            None
        }
    }
}

/// Install `settings`: analysis options, heartbeat, and a fresh diagnostics pass when the
/// analysis options changed.
pub async fn apply_settings<C: LspClient>(
    client: &C,
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    mut settings: Settings,
) {
    let analysis = settings.analysis();
    let changed = analysis != state.workspace.config();
    let applied = match state.workspace.configure(analysis) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("{}", err);
            client
                .log_message(MessageType::WARNING, format!("tron: {}", err))
                .await;
            false
        }
    };

    {
        let mut running = state.heartbeat.lock();
        if let Some(handle) = running.take() {
            handle.abort();
        }
        if settings.heartbeat.enabled && !state.is_cancelled() {
            let period = Duration::from_secs(settings.heartbeat.interval_secs.max(1));
            *running = Some(heartbeat::spawn(client.clone(), period, state.cancel.subscribe()));
        }
    }

    if !applied {
        // Later merges build on the session copy, so it must match what is in force
        settings.set_analysis(state.workspace.config());
    }
    log::debug!("settings: {:?}", settings);
    state.session.write().await.settings = settings;

    if changed && applied {
        let scheduled = commands::recheck_open_documents(state, publisher).await;
        log::debug!("analysis options changed, rechecking {} document(s)", scheduled);
    }
}

/// Handle "workspace/didChangeConfiguration" notification
///
/// Pulls again when the client supports it; otherwise uses the pushed `tron` / `[tron]`
/// sections.
pub async fn handle_did_change_configuration<C: LspClient>(
    client: &C,
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: DidChangeConfigurationParams,
) {
    log::info!("configuration changed");
    let settings = match pull_configuration(client, state).await {
        Some(settings) => settings,
        None => {
            let current = state.session.read().await.settings.clone();
            current.merge(pushed_fragments(params.settings))
        }
    };
    apply_settings(client, state, publisher, settings).await;
}

fn pushed_fragments(settings: Value) -> Vec<Value> {
    match settings {
        Value::Object(mut map) => [SECTION, LANGUAGE_SECTION]
            .iter()
            .filter_map(|section| map.remove(*section))
            .collect(),
        _ => Vec::new(),
    }
}

/// Handle "workspace/didChangeWorkspaceFolders" notification
pub async fn handle_did_change_workspace_folders<C: LspClient>(
    client: &C,
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: DidChangeWorkspaceFoldersParams,
) {
    {
        let mut session = state.session.write().await;
        let removed = params.event.removed;
        session
            .folders
            .retain(|folder| !removed.iter().any(|r| r.uri == folder.uri));
        for added in params.event.added {
            if !session.folders.iter().any(|f| f.uri == added.uri) {
                session.folders.push(added);
            }
        }
        log::info!("workspace folders now {}", session.folders.len());
    }

    if let Some(settings) = pull_configuration(client, state).await {
        apply_settings(client, state, publisher, settings).await;
    }
}
