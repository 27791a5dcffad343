//! Document-level facade over store, cache, extractor and diagnostics
//!
//! Every document action of the session goes through [`Workspace`]: it keeps the artifact
//! cache coherent with the store and decides which documents take part in analysis.
use crate::cache::ArtifactCache;
use crate::config::{AnalysisConfig, ConfigError, ExclusionFilter};
use crate::diagnostics;
use crate::extractor::{isolate, SymbolExtractor};
use crate::model::{Artifact, Diagnostic, DocumentSnapshot, Revision};
use crate::store::{DocumentStore, StoreError};
use crate::syntax::{AdlFrontend, Frontend};
use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// Result of recording an open or a change.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub snapshot: DocumentSnapshot,
    /// False for excluded documents: they are tracked but never analyzed
    pub analyze: bool,
}

struct Settings {
    config: AnalysisConfig,
    filter: ExclusionFilter,
}

pub struct Workspace {
    store: DocumentStore,
    cache: ArtifactCache,
    frontend: Arc<dyn Frontend>,
    extractor: SymbolExtractor,
    settings: RwLock<Settings>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Arc::new(AdlFrontend))
    }
}

impl Workspace {
    pub fn new(frontend: Arc<dyn Frontend>) -> Self {
        let config = AnalysisConfig::default();
        // The default patterns are constants; an empty filter is only a fallback.
        let filter = ExclusionFilter::new(&config.exclude).unwrap_or_default();
        Self {
            store: DocumentStore::new(),
            cache: ArtifactCache::new(),
            extractor: SymbolExtractor::new(frontend.clone()),
            frontend,
            settings: RwLock::new(Settings { config, filter }),
        }
    }

    pub fn open(
        &self,
        uri: Url,
        text: String,
        version: Option<i32>,
    ) -> Result<SyncOutcome, StoreError> {
        if self.store.contains(&uri) {
            log::debug!("{} opened again without a close, replacing its text", uri);
        }
        let text: Arc<str> = text.into();
        let revision = match version {
            Some(version) => self.store.put_versioned(uri.clone(), text.clone(), version)?,
            None => self.store.put(uri.clone(), text.clone()),
        };
        Ok(self.synced(uri, text, revision, version))
    }

    /// Full-text change of an open document. `NotFound` once the document is closed.
    pub fn change(
        &self,
        uri: Url,
        text: String,
        version: Option<i32>,
    ) -> Result<SyncOutcome, StoreError> {
        let text: Arc<str> = text.into();
        let revision = self.store.update(uri.clone(), text.clone(), version)?;
        Ok(self.synced(uri, text, revision, version))
    }

    /// Forget the document. Returns the revision it had, `None` if it was not open.
    pub fn close(&self, uri: &Url) -> Option<Revision> {
        let revision = self.store.delete(uri);
        self.cache.invalidate(uri);
        revision
    }

    fn synced(
        &self,
        uri: Url,
        text: Arc<str>,
        revision: Revision,
        version: Option<i32>,
    ) -> SyncOutcome {
        self.cache.invalidate(&uri);
        let analyze = !self.is_excluded(&uri);
        SyncOutcome {
            snapshot: DocumentSnapshot {
                uri,
                text,
                revision,
                version,
            },
            analyze,
        }
    }

    pub fn snapshot(&self, uri: &Url) -> Result<DocumentSnapshot, StoreError> {
        self.store.get(uri)
    }

    pub fn revision(&self, uri: &Url) -> Option<Revision> {
        self.store.revision(uri)
    }

    /// Outline of the current revision, computed at most once per revision.
    /// `None` for documents that are not open or are excluded from analysis.
    pub fn outline(&self, uri: &Url) -> Option<Arc<Artifact>> {
        if self.is_excluded(uri) {
            return None;
        }
        match self.cache.get_or_compute(uri, &self.store, |snapshot| {
            self.extractor.extract(&snapshot.uri, &snapshot.text)
        }) {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                log::debug!("no outline: {}", err);
                None
            }
        }
    }

    /// Diagnostics for one snapshot. `None` when the front end faulted: there is nothing
    /// trustworthy to publish and the previous set stays up.
    pub fn diagnose(&self, snapshot: &DocumentSnapshot) -> Option<Vec<Diagnostic>> {
        let (enabled, max_problems) = {
            let settings = self.settings.read();
            (
                settings.config.diagnostics_enabled,
                settings.config.max_problems,
            )
        };
        if !enabled {
            return Some(Vec::new());
        }

        let context = format!("diagnostics of {}", snapshot.uri);
        let mut found = isolate(&context, || {
            diagnostics::check(self.frontend.as_ref(), &snapshot.text)
        })?;
        if found.len() > max_problems {
            log::debug!(
                "{}: reporting {} of {} problems",
                snapshot.uri,
                max_problems,
                found.len()
            );
            found.truncate(max_problems);
        }
        Some(found)
    }

    /// Apply new options. An invalid exclude pattern rejects the whole update and the
    /// previous options stay in force.
    pub fn configure(&self, config: AnalysisConfig) -> Result<(), ConfigError> {
        let filter = ExclusionFilter::new(&config.exclude)?;
        let mut settings = self.settings.write();
        settings.config = config;
        settings.filter = filter;
        Ok(())
    }

    pub fn config(&self) -> AnalysisConfig {
        self.settings.read().config.clone()
    }

    pub fn is_excluded(&self, uri: &Url) -> bool {
        self.settings.read().filter.is_excluded(uri)
    }

    pub fn open_documents(&self) -> Vec<Url> {
        self.store.uris()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }
}
