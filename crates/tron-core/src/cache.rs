use crate::model::{Artifact, DocumentSnapshot, Symbol};
use crate::store::{DocumentStore, StoreError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

type Slot = Arc<Mutex<Option<Arc<Artifact>>>>;

/// Last computed outline per document, tagged with the revision it was built from.
///
/// Each URI has its own slot lock: concurrent requests for one document wait for a single
/// computation, requests for other documents never wait.
#[derive(Default)]
pub struct ArtifactCache {
    slots: DashMap<Url, Slot>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached artifact if it was built from the document's current revision,
    /// otherwise run `compute` on the current snapshot and cache the result.
    pub fn get_or_compute<F>(
        &self,
        uri: &Url,
        store: &DocumentStore,
        compute: F,
    ) -> Result<Arc<Artifact>, StoreError>
    where
        F: FnOnce(&DocumentSnapshot) -> Vec<Symbol>,
    {
        if !store.contains(uri) {
            return Err(StoreError::NotFound(uri.clone()));
        }

        let slot = self.slots.entry(uri.clone()).or_default().clone();
        let mut cached = slot.lock();
        let snapshot = store.get(uri)?;

        if let Some(artifact) = cached.as_ref() {
            if artifact.revision == snapshot.revision {
                return Ok(artifact.clone());
            }
        }

        let artifact = Arc::new(Artifact {
            revision: snapshot.revision,
            symbols: compute(&snapshot),
        });
        *cached = Some(artifact.clone());
        Ok(artifact)
    }

    pub fn invalidate(&self, uri: &Url) {
        self.slots.remove(uri);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
