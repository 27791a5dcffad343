//! Conversion utilities between Core types and LSP types
//!
//! Both sides use 0-based lines and UTF-16 columns, so positions map field by field.

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, DocumentSymbol, Position, Range, SymbolKind,
};
use tron_core::model::{
    Diagnostic as CoreDiagnostic, Point, Severity, Symbol, SymbolKind as CoreSymbolKind,
    TextRange,
};

/// Value of the `source` field on every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "tron";

pub fn point_to_lsp_position(point: Point) -> Position {
    Position {
        line: point.line,
        character: point.col,
    }
}

pub fn text_range_to_lsp_range(range: TextRange) -> Range {
    Range {
        start: point_to_lsp_position(range.start),
        end: point_to_lsp_position(range.end),
    }
}

pub fn core_diagnostic_to_lsp_diagnostic(diagnostic: CoreDiagnostic) -> Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    };

    Diagnostic {
        range: text_range_to_lsp_range(diagnostic.range),
        severity: Some(severity),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diagnostic.message,
        ..Default::default()
    }
}

fn symbol_kind_to_lsp(kind: CoreSymbolKind) -> SymbolKind {
    match kind {
        CoreSymbolKind::Module => SymbolKind::MODULE,
        CoreSymbolKind::Struct => SymbolKind::STRUCT,
        CoreSymbolKind::Union => SymbolKind::ENUM,
        CoreSymbolKind::TypeAlias => SymbolKind::TYPE_PARAMETER,
        CoreSymbolKind::Newtype => SymbolKind::CLASS,
        CoreSymbolKind::Field => SymbolKind::FIELD,
        CoreSymbolKind::Branch => SymbolKind::ENUM_MEMBER,
    }
}

#[allow(deprecated)]
pub fn symbol_to_document_symbol(symbol: &Symbol) -> DocumentSymbol {
    let children: Vec<DocumentSymbol> = symbol
        .children
        .iter()
        .map(symbol_to_document_symbol)
        .collect();

    DocumentSymbol {
        name: symbol.name.clone(),
        detail: symbol.detail.clone(),
        kind: symbol_kind_to_lsp(symbol.kind),
        tags: None,
        deprecated: None,
        range: text_range_to_lsp_range(symbol.range),
        selection_range: text_range_to_lsp_range(symbol.selection_range),
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}
