use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tron_core::AnalysisConfig;

/// Extension section name; the language-scoped alias is `[tron]`.
pub const SECTION: &str = "tron";
pub const LANGUAGE_SECTION: &str = "[tron]";

/// Session settings resolved from the client's `tron` and `[tron]` configuration sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub diagnostics: DiagnosticsSettings,

    /// Glob patterns for documents that are tracked but never analyzed
    pub exclude: Vec<String>,

    pub heartbeat: HeartbeatSettings,

    pub completion: CompletionSettings,

    pub trace: TraceSettings,

    /// Only meaningful in the language-scoped section
    pub editor: EditorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsSettings {
    pub enabled: bool,
    pub max_problems: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionSettings {
    pub keywords: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceSettings {
    pub server: TraceLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraceLevel {
    #[default]
    Off,
    Messages,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub tab_size: u32,
    pub insert_spaces: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            diagnostics: DiagnosticsSettings::default(),
            exclude: analysis.exclude,
            heartbeat: HeartbeatSettings::default(),
            completion: CompletionSettings::default(),
            trace: TraceSettings::default(),
            editor: EditorSettings::default(),
        }
    }
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            enabled: analysis.diagnostics_enabled,
            max_problems: analysis.max_problems,
        }
    }
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self { keywords: true }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tab_size: 2,
            insert_spaces: true,
        }
    }
}

impl Settings {
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            diagnostics_enabled: self.diagnostics.enabled,
            max_problems: self.diagnostics.max_problems,
            exclude: self.exclude.clone(),
        }
    }

    /// Overwrite the analysis keys with the options actually in force.
    pub fn set_analysis(&mut self, analysis: AnalysisConfig) {
        self.diagnostics.enabled = analysis.diagnostics_enabled;
        self.diagnostics.max_problems = analysis.max_problems;
        self.exclude = analysis.exclude;
    }

    /// Overlay configuration fragments in order. Every key a fragment carries replaces the
    /// current value, so the last fragment mentioning a key wins. `null` fragments are
    /// skipped; a fragment that does not fit the schema is logged and skipped on its own.
    pub fn merge<I>(&self, fragments: I) -> Settings
    where
        I: IntoIterator<Item = Value>,
    {
        let mut merged = self.clone();
        for fragment in fragments {
            let fragment = match fragment {
                Value::Null => continue,
                Value::Object(map) => expand_dotted(map),
                other => {
                    log::warn!("ignoring configuration fragment that is not an object: {}", other);
                    continue;
                }
            };

            let mut current = match serde_json::to_value(&merged) {
                Ok(value) => value,
                Err(err) => {
                    log::error!("cannot serialize settings: {}", err);
                    return merged;
                }
            };
            overlay(&mut current, fragment);
            match serde_json::from_value::<Settings>(current) {
                Ok(settings) => merged = settings,
                Err(err) => log::warn!("ignoring malformed configuration fragment: {}", err),
            }
        }
        merged
    }
}

/// `{"diagnostics.enabled": false}` -> `{"diagnostics": {"enabled": false}}`, the shape
/// editors use for language-scoped sections.
fn expand_dotted(map: Map<String, Value>) -> Value {
    let mut out = Value::Object(Map::new());
    for (key, value) in map {
        let value = match value {
            Value::Object(inner) => expand_dotted(inner),
            other => other,
        };
        let mut nested = value;
        for part in key.rsplit('.') {
            let mut wrapper = Map::new();
            wrapper.insert(part.to_string(), nested);
            nested = Value::Object(wrapper);
        }
        overlay(&mut out, nested);
    }
    out
}

fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                let nested = value.is_object() && base.get(&key).is_some_and(Value::is_object);
                if let Some(slot) = base.get_mut(&key).filter(|_| nested) {
                    overlay(slot, value);
                } else {
                    base.insert(key, value);
                }
            }
        }
        (base, patch) => *base = patch,
    }
}
