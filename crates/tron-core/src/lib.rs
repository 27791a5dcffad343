//! Tron Core Library
//!
//! Document store, artifact cache, the ADL front end and the analysis built on them.
//! No protocol types and no IO, pure logic only.
//!

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod extractor;
pub mod line_map;
pub mod model;
pub mod store;
pub mod syntax;
pub mod workspace;

pub use cache::ArtifactCache;
pub use config::{AnalysisConfig, ConfigError, ExclusionFilter};
pub use extractor::{isolate, SymbolExtractor};
pub use line_map::LineMap;
pub use store::{DocumentStore, StoreError};
pub use syntax::{AdlFrontend, Frontend, ParseError, ParseFailure};
pub use workspace::{SyncOutcome, Workspace};
