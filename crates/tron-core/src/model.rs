use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Core internal coordinate system (0-based, UTF-16 columns)
/// Does not directly use LSP Position to avoid coupling
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Point {
    pub line: u32,
    pub col: u32,
}

impl Point {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Point,
    pub end: Point,
}

impl TextRange {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Position of a document in its edit history.
///
/// `seq` counts sync events for one open incarnation of a document (1 on open).
/// `epoch` is assigned by the store on every open, so a document that is closed and
/// reopened never compares equal to anything derived from its previous incarnation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision {
    pub(crate) epoch: u64,
    pub(crate) seq: u64,
}

impl Revision {
    pub fn new(epoch: u64, seq: u64) -> Self {
        Self { epoch, seq }
    }

    /// Per-document revision number, 1 right after open.
    pub fn number(&self) -> u64 {
        self.seq
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn next(self) -> Self {
        Self {
            epoch: self.epoch,
            seq: self.seq + 1,
        }
    }

    /// Sorts after every revision of the same incarnation.
    pub fn closed(epoch: u64) -> Self {
        Self {
            epoch,
            seq: u64::MAX,
        }
    }
}

/// Immutable view of a document at one revision.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: Arc<str>,
    pub revision: Revision,
    /// Version number reported by the client, if any
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Module,
    Struct,
    Union,
    TypeAlias,
    Newtype,
    Field,
    Branch,
}

/// Outline entry produced by a front end visitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    /// Whole declaration
    pub range: TextRange,
    /// Declared identifier only
    pub selection_range: TextRange,
    pub children: Vec<Symbol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: TextRange,
    pub severity: Severity,
    pub message: String,
}

/// Outline derived from one revision of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub revision: Revision,
    pub symbols: Vec<Symbol>,
}
