//! Compiler front end seam
//!
//! The session only needs two things from a front end: text to tree (or position-tagged
//! errors), and tree to outline. `AdlFrontend` is the built-in implementation; tests and
//! embedders can swap in their own.
use crate::line_map::LineMap;
use crate::model::{Symbol, TextRange};

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod visitor;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub range: TextRange,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} syntax error(s)", errors.len())]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

/// Parser and tree visitor for one language.
///
/// Implementations are treated as pure functions that may still panic on inputs they do
/// not expect; callers run them behind [`crate::extractor::isolate`].
pub trait Frontend: Send + Sync {
    fn parse(&self, text: &str) -> Result<ast::Module, ParseFailure>;

    fn symbols(&self, module: &ast::Module, map: &LineMap) -> Vec<Symbol>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AdlFrontend;

impl Frontend for AdlFrontend {
    fn parse(&self, text: &str) -> Result<ast::Module, ParseFailure> {
        parser::parse(text)
    }

    fn symbols(&self, module: &ast::Module, map: &LineMap) -> Vec<Symbol> {
        visitor::outline(module, map)
    }
}
