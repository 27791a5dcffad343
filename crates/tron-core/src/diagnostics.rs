use crate::model::{Diagnostic, Severity};
use crate::syntax::{Frontend, ParseFailure};

/// Parse `text` and report every syntax error as a diagnostic. A clean parse yields an
/// empty set, which clears whatever the client showed before.
pub fn check(frontend: &dyn Frontend, text: &str) -> Vec<Diagnostic> {
    match frontend.parse(text) {
        Ok(_) => Vec::new(),
        Err(failure) => from_failure(&failure),
    }
}

pub fn from_failure(failure: &ParseFailure) -> Vec<Diagnostic> {
    failure
        .errors
        .iter()
        .map(|error| Diagnostic {
            range: error.range,
            severity: Severity::Error,
            message: error.message.clone(),
        })
        .collect()
}
