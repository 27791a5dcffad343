use crate::config::Settings;
use crate::lifecycle::Lifecycle;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::{Url, WorkspaceFolder};
use tron_core::Workspace;

/// What the handshake learned about the client and its workspace
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub root_uri: Option<Url>,
    pub folders: Vec<WorkspaceFolder>,
    /// Client answers `workspace/configuration`
    pub supports_configuration: bool,
    /// Client answers `workspace/workspaceFolders`
    pub supports_workspace_folders: bool,
    pub settings: Settings,
}

/// Global state for LSP server
/// Must be Send + Sync
#[derive(Clone)]
pub struct GlobalState {
    pub lifecycle: Arc<Lifecycle>,

    /// Documents, artifacts and analysis; locks per document internally
    pub workspace: Arc<Workspace>,

    /// Written during the handshake and on configuration changes only
    pub session: Arc<RwLock<Session>>,

    /// Session cancellation, flipped to `true` once at shutdown
    pub cancel: Arc<watch::Sender<bool>>,

    /// Ephemeral directory for the external toolchain, alive between initialize and shutdown
    pub scratch: Arc<Mutex<Option<TempDir>>>,

    pub heartbeat: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::with_workspace(Workspace::default())
    }

    pub fn with_workspace(workspace: Workspace) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            lifecycle: Arc::new(Lifecycle::default()),
            workspace: Arc::new(workspace),
            session: Arc::new(RwLock::new(Session::default())),
            cancel: Arc::new(cancel),
            scratch: Arc::new(Mutex::new(None)),
            heartbeat: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self::new()
    }
}
