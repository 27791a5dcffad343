use crate::client::LspClient;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::GlobalState;
use serde_json::Value;
use std::sync::Arc;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;

/// Re-run diagnostics for every open document
pub const COMPILE: &str = "tron.compile";
/// Accepted for editor integrations; nothing to do server side
pub const BROWSE: &str = "tron.browse";

pub const COMMANDS: [&str; 2] = [COMPILE, BROWSE];

/// Schedule diagnostics for every open, non-excluded document. Returns how many were
/// scheduled.
pub async fn recheck_open_documents<C: LspClient>(
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
) -> usize {
    let mut scheduled = 0;
    for uri in state.workspace.open_documents() {
        if state.workspace.is_excluded(&uri) {
            continue;
        }
        // Closed in the meantime
        let Ok(snapshot) = state.workspace.snapshot(&uri) else {
            continue;
        };
        publisher.schedule(snapshot);
        scheduled += 1;
    }
    scheduled
}

/// Handle "workspace/executeCommand" request
pub async fn handle_execute_command<C: LspClient>(
    state: &GlobalState,
    publisher: &Arc<DiagnosticsPublisher<C>>,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    match params.command.as_str() {
        COMPILE => {
            let scheduled = recheck_open_documents(state, publisher).await;
            log::info!("{}: rechecking {} document(s)", COMPILE, scheduled);
            Ok(Some(Value::from(scheduled)))
        }
        BROWSE => {
            log::info!("{} with arguments {:?}", BROWSE, params.arguments);
            Ok(None)
        }
        other => Err(Error::invalid_params(format!("unknown command `{}`", other))),
    }
}
