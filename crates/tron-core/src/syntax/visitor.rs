use super::ast::{Decl, DeclKind, Field, Ident, Module};
use crate::line_map::LineMap;
use crate::model::{Symbol, SymbolKind};

/// Build the outline of a module: the module itself, its declarations, and their
/// fields or branches, in source order.
pub fn outline(module: &Module, map: &LineMap) -> Vec<Symbol> {
    let mut decls: Vec<&Decl> = module.decls.iter().collect();
    decls.sort_by_key(|decl| decl.span.start);

    vec![Symbol {
        name: module.name.to_string(),
        detail: None,
        kind: SymbolKind::Module,
        range: map.span_to_range(module.span.clone()),
        selection_range: map.span_to_range(module.name.span.clone()),
        children: decls.into_iter().map(|decl| decl_symbol(decl, map)).collect(),
    }]
}

fn decl_symbol(decl: &Decl, map: &LineMap) -> Symbol {
    let (kind, detail, children) = match &decl.kind {
        DeclKind::Struct { fields } => (
            SymbolKind::Struct,
            None,
            member_symbols(fields, SymbolKind::Field, map),
        ),
        DeclKind::Union { branches } => (
            SymbolKind::Union,
            None,
            member_symbols(branches, SymbolKind::Branch, map),
        ),
        DeclKind::Type { ty } => (SymbolKind::TypeAlias, Some(format!("= {}", ty)), Vec::new()),
        DeclKind::Newtype { ty, .. } => {
            (SymbolKind::Newtype, Some(format!("= {}", ty)), Vec::new())
        }
    };

    Symbol {
        name: display_name(&decl.name, &decl.type_params),
        detail,
        kind,
        range: map.span_to_range(decl.span.clone()),
        selection_range: map.span_to_range(decl.name.span.clone()),
        children,
    }
}

fn member_symbols(fields: &[Field], kind: SymbolKind, map: &LineMap) -> Vec<Symbol> {
    let mut fields: Vec<&Field> = fields.iter().collect();
    fields.sort_by_key(|field| field.span.start);
    fields
        .into_iter()
        .map(|field| Symbol {
            name: field.name.name.clone(),
            detail: Some(field.ty.to_string()),
            kind,
            range: map.span_to_range(field.span.clone()),
            selection_range: map.span_to_range(field.name.span.clone()),
            children: Vec::new(),
        })
        .collect()
}

/// `Pair<A, B>` for generic declarations, the bare name otherwise
fn display_name(name: &Ident, params: &[Ident]) -> String {
    if params.is_empty() {
        return name.name.clone();
    }
    let params: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    format!("{}<{}>", name.name, params.join(", "))
}
