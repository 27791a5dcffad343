use crate::model::{DocumentSnapshot, Revision};
use dashmap::mapref::entry::{Entry, OccupiedEntry};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document is not open: {0}")]
    NotFound(Url),
    #[error("stale edit for {uri}: version {received} is older than {current}")]
    StaleVersion {
        uri: Url,
        received: i32,
        current: i32,
    },
}

struct Document {
    text: Arc<str>,
    revision: Revision,
    version: Option<i32>,
}

/// In-memory text of every open document.
///
/// Writes to one URI are serialized by the map's per-key locking; reads and writes of
/// different URIs do not wait on each other.
#[derive(Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
    epochs: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or wholesale replace the text of `uri`.
    pub fn put(&self, uri: Url, text: impl Into<Arc<str>>) -> Revision {
        match self.documents.entry(uri) {
            Entry::Occupied(mut entry) => {
                let document = entry.get_mut();
                document.text = text.into();
                document.revision = document.revision.next();
                document.revision
            }
            Entry::Vacant(entry) => {
                let revision = self.first_revision();
                entry.insert(Document {
                    text: text.into(),
                    revision,
                    version: None,
                });
                revision
            }
        }
    }

    /// Like [`put`](Self::put), but refuses an edit whose client version is older than the
    /// one already applied.
    pub fn put_versioned(
        &self,
        uri: Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> Result<Revision, StoreError> {
        match self.documents.entry(uri) {
            Entry::Occupied(mut entry) => Self::apply(&mut entry, text.into(), Some(version)),
            Entry::Vacant(entry) => {
                let revision = self.first_revision();
                entry.insert(Document {
                    text: text.into(),
                    revision,
                    version: Some(version),
                });
                Ok(revision)
            }
        }
    }

    /// Replace the text of a document that is already open. Never inserts: an edit that
    /// lands after the close of its document fails with `NotFound`.
    pub fn update(
        &self,
        uri: Url,
        text: impl Into<Arc<str>>,
        version: Option<i32>,
    ) -> Result<Revision, StoreError> {
        match self.documents.entry(uri) {
            Entry::Occupied(mut entry) => Self::apply(&mut entry, text.into(), version),
            Entry::Vacant(entry) => Err(StoreError::NotFound(entry.into_key())),
        }
    }

    fn apply(
        entry: &mut OccupiedEntry<'_, Url, Document>,
        text: Arc<str>,
        version: Option<i32>,
    ) -> Result<Revision, StoreError> {
        if let (Some(received), Some(current)) = (version, entry.get().version) {
            if received < current {
                return Err(StoreError::StaleVersion {
                    uri: entry.key().clone(),
                    received,
                    current,
                });
            }
        }
        let document = entry.get_mut();
        document.text = text;
        document.revision = document.revision.next();
        if version.is_some() {
            document.version = version;
        }
        Ok(document.revision)
    }

    pub fn get(&self, uri: &Url) -> Result<DocumentSnapshot, StoreError> {
        self.documents
            .get(uri)
            .map(|document| DocumentSnapshot {
                uri: uri.clone(),
                text: document.text.clone(),
                revision: document.revision,
                version: document.version,
            })
            .ok_or_else(|| StoreError::NotFound(uri.clone()))
    }

    pub fn revision(&self, uri: &Url) -> Option<Revision> {
        self.documents.get(uri).map(|document| document.revision)
    }

    /// Remove `uri` and its history. Returns the last revision if the document was open;
    /// removing an unknown URI is not an error.
    pub fn delete(&self, uri: &Url) -> Option<Revision> {
        self.documents
            .remove(uri)
            .map(|(_, document)| document.revision)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn first_revision(&self) -> Revision {
        let epoch = self.epochs.fetch_add(1, Ordering::Relaxed) + 1;
        Revision::new(epoch, 1)
    }
}
