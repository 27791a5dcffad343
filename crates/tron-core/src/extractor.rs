//! Fault boundary around front end calls and the outline extractor built on it
use crate::line_map::LineMap;
use crate::model::Symbol;
use crate::syntax::Frontend;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use url::Url;

thread_local! {
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Chain a hook that records the stack of the panicking thread, so the boundary can log
/// where the fault happened rather than where it was caught.
fn install_trace_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

/// Run `f`; a panic inside it is logged with its stack and turned into `None`.
pub fn isolate<T>(context: &str, f: impl FnOnce() -> T) -> Option<T> {
    install_trace_hook();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let trace = PANIC_TRACE
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(Backtrace::force_capture);
            log::error!(
                "{} failed: {}\nstack backtrace:\n{}",
                context,
                panic_message(payload.as_ref()),
                trace
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Produces document outlines, degrading every failure to an empty outline.
pub struct SymbolExtractor {
    frontend: Arc<dyn Frontend>,
}

impl SymbolExtractor {
    pub fn new(frontend: Arc<dyn Frontend>) -> Self {
        Self { frontend }
    }

    pub fn extract(&self, uri: &Url, text: &str) -> Vec<Symbol> {
        let context = format!("outline of {}", uri);
        isolate(&context, || match self.frontend.parse(text) {
            Ok(module) => {
                let map = LineMap::new(text);
                self.frontend.symbols(&module, &map)
            }
            Err(failure) => {
                log::debug!("no outline for {}: {}", uri, failure);
                Vec::new()
            }
        })
        .unwrap_or_default()
    }
}
