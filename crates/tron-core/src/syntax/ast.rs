//! ADL syntax tree
//!
//! Spans are byte ranges into the parsed text; they become line/column ranges only when a
//! visitor renders them.
use std::fmt;
use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Dotted name such as `sys.types.Pair`
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedName {
    pub parts: Vec<Ident>,
    pub span: Span,
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&part.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: ScopedName,
    pub value: Option<serde_json::Value>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: ScopedName,
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub annotations: Vec<Annotation>,
    pub ty: TypeExpr,
    pub name: Ident,
    pub default: Option<serde_json::Value>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Struct { fields: Vec<Field> },
    Union { branches: Vec<Field> },
    Type { ty: TypeExpr },
    Newtype {
        ty: TypeExpr,
        default: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub annotations: Vec<Annotation>,
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: ScopedName,
    /// `import a.b.*;`
    pub wildcard: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub annotations: Vec<Annotation>,
    pub name: ScopedName,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}
