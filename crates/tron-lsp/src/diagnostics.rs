//! Diagnostics Publisher
//!
//! Each sync event schedules a background analysis; the edit itself is acknowledged right
//! away. Results pass through a per-document lane that only lets a revision through if it
//! is not older than the last one published and still current in the store, so a slow result
//! for an old edit can never overwrite the markers of a newer one.
use crate::client::LspClient;
use crate::conversion::core_diagnostic_to_lsp_diagnostic;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;
use tower_lsp::lsp_types::Url;
use tron_core::model::{DocumentSnapshot, Revision};
use tron_core::Workspace;

#[derive(Default)]
struct Lane {
    published: Option<Revision>,
}

pub struct DiagnosticsPublisher<C> {
    client: C,
    workspace: Arc<Workspace>,
    lanes: DashMap<Url, Arc<tokio::sync::Mutex<Lane>>>,
    tasks: Mutex<JoinSet<()>>,
}

impl<C: LspClient> DiagnosticsPublisher<C> {
    pub fn new(client: C, workspace: Arc<Workspace>) -> Self {
        Self {
            client,
            workspace,
            lanes: DashMap::new(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    fn lane(&self, uri: &Url) -> Arc<tokio::sync::Mutex<Lane>> {
        self.lanes.entry(uri.clone()).or_default().clone()
    }

    /// Analyze `snapshot` in the background and publish the result if it is still wanted.
    pub fn schedule(self: &Arc<Self>, snapshot: DocumentSnapshot) {
        let publisher = Arc::clone(self);
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { publisher.run(snapshot).await });
    }

    async fn run(&self, snapshot: DocumentSnapshot) {
        let workspace = Arc::clone(&self.workspace);
        let uri = snapshot.uri.clone();
        let revision = snapshot.revision;
        let version = snapshot.version;

        let diagnostics =
            match tokio::task::spawn_blocking(move || workspace.diagnose(&snapshot)).await {
                Ok(Some(diagnostics)) => diagnostics,
                Ok(None) => return,
                Err(err) => {
                    log::error!("diagnostics task for {} failed: {}", uri, err);
                    return;
                }
            };

        // Closed meanwhile: do not bring its lane back
        if self.workspace.revision(&uri) != Some(revision) {
            log::trace!("dropping diagnostics for {}: document moved on", uri);
            return;
        }
        let lane = self.lane(&uri);
        let mut lane = lane.lock().await;
        // Equal revisions may republish: options can change without an edit
        if lane.published.is_some_and(|published| published > revision) {
            log::trace!("dropping diagnostics for {}: newer set already published", uri);
            return;
        }
        if self.workspace.revision(&uri) != Some(revision) {
            log::trace!("dropping diagnostics for {}: document moved on", uri);
            return;
        }

        log::debug!(
            "publishing {} diagnostic(s) for {} at revision {}",
            diagnostics.len(),
            uri,
            revision.number()
        );
        let diagnostics = diagnostics
            .into_iter()
            .map(core_diagnostic_to_lsp_diagnostic)
            .collect();
        self.client.publish_diagnostics(uri, diagnostics, version).await;
        lane.published = Some(revision);
    }

    /// Publish the empty set for a closed document and block every pending result of the
    /// closed incarnation. The lane is dropped once no analysis still holds it.
    pub async fn clear(&self, uri: &Url, last: Option<Revision>) {
        {
            let lane = self.lane(uri);
            let mut lane = lane.lock().await;
            self.client
                .publish_diagnostics(uri.clone(), Vec::new(), None)
                .await;
            if let Some(last) = last {
                lane.published = Some(Revision::closed(last.epoch()));
            }
        }
        // Only the map's own reference left: nobody can be waiting on this lane
        self.lanes
            .remove_if(uri, |_, lane| Arc::strong_count(lane) == 1);
    }

    /// Number of documents with a publishing lane.
    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Wait for every scheduled analysis to finish.
    pub async fn flush(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tasks.lock());
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(err) = result {
                    if err.is_panic() {
                        log::error!("diagnostics task panicked: {}", err);
                    }
                }
            }
        }
    }

    /// Drop all pending analyses. Called once at shutdown.
    pub fn cancel(&self) {
        self.tasks.lock().abort_all();
    }
}
