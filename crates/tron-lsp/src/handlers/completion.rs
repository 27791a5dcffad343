use crate::handlers::symbols::outline;
use crate::state::GlobalState;
use tower_lsp::lsp_types::*;
use tron_core::model::{Symbol, SymbolKind as CoreSymbolKind};

const KEYWORDS: &[&str] = &["module", "import", "struct", "union", "type", "newtype"];

const PRIMITIVES: &[&str] = &[
    "Void",
    "Bool",
    "Int8",
    "Int16",
    "Int32",
    "Int64",
    "Word8",
    "Word16",
    "Word32",
    "Word64",
    "Float",
    "Double",
    "String",
    "ByteVector",
    "Json",
    "Vector",
    "StringMap",
    "Nullable",
    "TypeToken",
];

/// Handle "textDocument/completion" request
///
/// Keywords, primitive types and the types declared in the document's last outline.
pub async fn handle_completion(
    state: &GlobalState,
    params: CompletionParams,
) -> Option<CompletionResponse> {
    let uri = params.text_document_position.text_document.uri;
    let keywords = state.session.read().await.settings.completion.keywords;

    let mut items = Vec::new();
    if keywords {
        items.extend(KEYWORDS.iter().map(|keyword| CompletionItem {
            label: keyword.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..Default::default()
        }));
    }
    items.extend(PRIMITIVES.iter().map(|primitive| CompletionItem {
        label: primitive.to_string(),
        kind: Some(CompletionItemKind::CLASS),
        detail: Some("primitive".to_string()),
        ..Default::default()
    }));

    if let Some(artifact) = outline(state, uri).await {
        for module in &artifact.symbols {
            items.extend(module.children.iter().filter_map(|symbol| declared(module, symbol)));
        }
    }

    Some(CompletionResponse::Array(items))
}

fn declared(module: &Symbol, symbol: &Symbol) -> Option<CompletionItem> {
    let kind = match symbol.kind {
        CoreSymbolKind::Struct => CompletionItemKind::STRUCT,
        CoreSymbolKind::Union => CompletionItemKind::ENUM,
        CoreSymbolKind::TypeAlias | CoreSymbolKind::Newtype => CompletionItemKind::CLASS,
        _ => return None,
    };
    // `Pair<A, B>` completes as `Pair`
    let label = symbol
        .name
        .split('<')
        .next()
        .unwrap_or(&symbol.name)
        .to_string();
    Some(CompletionItem {
        label,
        kind: Some(kind),
        detail: Some(format!("{}.{}", module.name, symbol.name)),
        ..Default::default()
    })
}
