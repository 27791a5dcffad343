use globset::{Glob, GlobSet, GlobSetBuilder};
use url::Url;

/// Analysis options the core acts on. The protocol layer owns the wire format and hands
/// over the resolved values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub diagnostics_enabled: bool,
    /// Cap on diagnostics reported per document
    pub max_problems: usize,
    /// Glob patterns matched against the URI path; matching documents skip analysis
    pub exclude: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            diagnostics_enabled: true,
            max_problems: 100,
            exclude: vec!["*.manifest.adl".to_string()],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    set: GlobSet,
}

impl ExclusionFilter {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    pub fn is_excluded(&self, uri: &Url) -> bool {
        self.set.is_match(uri.path())
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }
}
