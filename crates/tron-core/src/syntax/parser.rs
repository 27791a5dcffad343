//! Recursive descent parser for ADL with statement-level error recovery
//!
//! Every error is recorded with its position and parsing resumes at the next `;` or `}` of
//! the current nesting level, so one typo does not hide the problems after it.
use super::ast::{
    Annotation, Decl, DeclKind, Field, Ident, Import, Module, ScopedName, Span, TypeExpr,
};
use super::lexer::{tokenize, Token};
use super::{ParseError, ParseFailure};
use crate::line_map::LineMap;
use serde_json::Value;

/// Type arguments and JSON literals deeper than this are rejected instead of recursed into.
const MAX_NESTING: usize = 64;

/// Marker for "error already recorded, resynchronize"
struct Recover;

type PResult<T> = Result<T, Recover>;

pub fn parse(text: &str) -> Result<Module, ParseFailure> {
    let map = LineMap::new(text);
    let (tokens, invalid) = tokenize(text);
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: text.len(),
        map: &map,
        errors: Vec::new(),
    };

    for span in invalid {
        let message = format!("unexpected character `{}`", &text[span.clone()]);
        parser.error(span, message);
    }

    let module = parser.module();
    let mut errors = parser.errors;
    errors.sort_by_key(|e| e.range.start);

    match module {
        Some(module) if errors.is_empty() => Ok(module),
        _ => Err(ParseFailure { errors }),
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    depth: usize,
    end: usize,
    map: &'a LineMap<'a>,
    errors: Vec<ParseError>,
}

impl Parser<'_> {
    // ------------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or(self.end..self.end)
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(0)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        let found = self.at(token);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, token: &Token, context: &str) -> PResult<Span> {
        if self.at(token) {
            let span = self.span();
            self.pos += 1;
            Ok(span)
        } else {
            self.unexpected(&format!("{} {}", token.describe(), context));
            Err(Recover)
        }
    }

    fn unexpected(&mut self, expected: &str) {
        let found = self
            .peek()
            .map(Token::describe)
            .unwrap_or_else(|| "end of file".to_string());
        let span = self.span();
        self.error(span, format!("expected {}, found {}", expected, found));
    }

    fn error(&mut self, span: Span, message: String) {
        self.errors.push(ParseError {
            range: self.map.span_to_range(span),
            message,
        });
    }

    /// Skip to the end of the current statement: past the next `;` or up to (not past) the
    /// `}` closing the enclosing block.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some((token, _)) = self.tokens.get(self.pos) {
            match token {
                Token::LBrace => depth += 1,
                Token::RBrace if depth == 0 => return,
                Token::RBrace => depth -= 1,
                Token::Semi if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            let span = self.span();
            self.error(span, format!("nesting deeper than {} levels", MAX_NESTING));
            return Err(Recover);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ------------------------------------------------------------------------
    // Grammar
    // ------------------------------------------------------------------------

    fn module(&mut self) -> Option<Module> {
        let start = self.span().start;
        let annotations = self.annotations().ok()?;
        self.expect(&Token::Module, "at start of file").ok()?;
        let name = self.scoped_name("module name").ok()?;
        self.expect(&Token::LBrace, "after module name").ok()?;

        let mut imports = Vec::new();
        let mut decls = Vec::new();
        while self.peek().is_some() && !self.at(&Token::RBrace) {
            if self.at(&Token::Import) {
                match self.import() {
                    Ok(import) => imports.push(import),
                    Err(Recover) => self.synchronize(),
                }
            } else {
                match self.decl() {
                    Ok(decl) => decls.push(decl),
                    Err(Recover) => self.synchronize(),
                }
            }
        }

        // A missing `}` is reported but the declarations seen so far still form a tree.
        let _ = self.expect(&Token::RBrace, "to close module");
        self.eat(&Token::Semi);
        if self.peek().is_some() {
            let span = self.span().start..self.end;
            self.error(span, "unexpected content after module".to_string());
        }

        Some(Module {
            annotations,
            name,
            imports,
            decls,
            span: start..self.prev_end(),
        })
    }

    fn import(&mut self) -> PResult<Import> {
        let start = self.span().start;
        self.expect(&Token::Import, "")?;
        let path = self.scoped_name("module path after `import`")?;
        let mut wildcard = false;
        if self.eat(&Token::Dot) {
            self.expect(&Token::Star, "or identifier after `.`")?;
            wildcard = true;
        }
        let end = self.expect(&Token::Semi, "after import")?.end;
        Ok(Import {
            path,
            wildcard,
            span: start..end,
        })
    }

    fn decl(&mut self) -> PResult<Decl> {
        let start = self.span().start;
        let annotations = self.annotations()?;
        let keyword = match self.peek() {
            Some(token @ (Token::Struct | Token::Union | Token::Type | Token::Newtype)) => {
                token.clone()
            }
            _ => {
                self.unexpected("declaration (`struct`, `union`, `type` or `newtype`)");
                return Err(Recover);
            }
        };
        self.pos += 1;

        let name = self.ident("declaration name")?;
        let type_params = self.type_params()?;
        let kind = match keyword {
            Token::Struct => DeclKind::Struct {
                fields: self.fields()?,
            },
            Token::Union => DeclKind::Union {
                branches: self.fields()?,
            },
            Token::Type => {
                self.expect(&Token::Eq, "after type name")?;
                DeclKind::Type {
                    ty: self.type_expr()?,
                }
            }
            _ => {
                self.expect(&Token::Eq, "after newtype name")?;
                let ty = self.type_expr()?;
                let default = if self.eat(&Token::Eq) {
                    Some(self.value()?)
                } else {
                    None
                };
                DeclKind::Newtype { ty, default }
            }
        };
        self.expect(&Token::Semi, "after declaration")?;

        Ok(Decl {
            annotations,
            name,
            type_params,
            kind,
            span: start..self.prev_end(),
        })
    }

    fn fields(&mut self) -> PResult<Vec<Field>> {
        self.expect(&Token::LBrace, "to open declaration body")?;
        let mut fields = Vec::new();
        while self.peek().is_some() && !self.at(&Token::RBrace) {
            match self.field() {
                Ok(field) => fields.push(field),
                Err(Recover) => self.synchronize(),
            }
        }
        self.expect(&Token::RBrace, "to close declaration body")?;
        Ok(fields)
    }

    fn field(&mut self) -> PResult<Field> {
        let start = self.span().start;
        let annotations = self.annotations()?;
        let ty = self.type_expr()?;
        let name = self.ident("field name")?;
        let default = if self.eat(&Token::Eq) {
            Some(self.value()?)
        } else {
            None
        };
        self.expect(&Token::Semi, "after field")?;
        Ok(Field {
            annotations,
            ty,
            name,
            default,
            span: start..self.prev_end(),
        })
    }

    fn annotations(&mut self) -> PResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.at(&Token::At) {
            let start = self.span().start;
            self.pos += 1;
            let name = self.scoped_name("annotation name after `@`")?;
            let value = if self.peek().is_some_and(|token| token.starts_value()) {
                Some(self.value()?)
            } else {
                None
            };
            annotations.push(Annotation {
                name,
                value,
                span: start..self.prev_end(),
            });
        }
        Ok(annotations)
    }

    fn type_params(&mut self) -> PResult<Vec<Ident>> {
        let mut params = Vec::new();
        if self.eat(&Token::LAngle) {
            loop {
                params.push(self.ident("type parameter")?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RAngle, "to close type parameters")?;
                break;
            }
        }
        Ok(params)
    }

    fn type_expr(&mut self) -> PResult<TypeExpr> {
        let name = self.scoped_name("type name")?;
        let start = name.span.start;
        let mut args = Vec::new();
        if self.eat(&Token::LAngle) {
            loop {
                args.push(self.nested(Self::type_expr)?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RAngle, "to close type arguments")?;
                break;
            }
        }
        Ok(TypeExpr {
            name,
            args,
            span: start..self.prev_end(),
        })
    }

    fn ident(&mut self, what: &str) -> PResult<Ident> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                let span = self.span();
                self.pos += 1;
                Ok(Ident { name, span })
            }
            _ => {
                self.unexpected(what);
                Err(Recover)
            }
        }
    }

    fn scoped_name(&mut self, what: &str) -> PResult<ScopedName> {
        let first = self.ident(what)?;
        let start = first.span.start;
        let mut end = first.span.end;
        let mut parts = vec![first];
        // `a.b.*` stops before the `.` so the import rule can see the wildcard
        while self.at(&Token::Dot)
            && matches!(self.tokens.get(self.pos + 1), Some((Token::Ident(_), _)))
        {
            self.pos += 1;
            let part = self.ident(what)?;
            end = part.span.end;
            parts.push(part);
        }
        Ok(ScopedName {
            parts,
            span: start..end,
        })
    }

    // ------------------------------------------------------------------------
    // JSON literals (defaults and annotation values)
    // ------------------------------------------------------------------------

    fn value(&mut self) -> PResult<Value> {
        let span = self.span();
        let value = match self.peek() {
            Some(Token::Str(raw)) => {
                let raw = raw.clone();
                self.pos += 1;
                Value::String(self.string_literal(&raw, span)?)
            }
            Some(Token::Number(raw)) => {
                let raw = raw.clone();
                self.pos += 1;
                match serde_json::from_str::<Value>(&raw) {
                    Ok(number) => number,
                    Err(_) => {
                        self.error(span, format!("invalid number literal `{}`", raw));
                        return Err(Recover);
                    }
                }
            }
            Some(Token::True) => {
                self.pos += 1;
                Value::Bool(true)
            }
            Some(Token::False) => {
                self.pos += 1;
                Value::Bool(false)
            }
            Some(Token::Null) => {
                self.pos += 1;
                Value::Null
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                self.nested(Self::array)?
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                self.nested(Self::object)?
            }
            _ => {
                self.unexpected("a JSON value");
                return Err(Recover);
            }
        };
        Ok(value)
    }

    fn array(&mut self) -> PResult<Value> {
        let mut items = Vec::new();
        if !self.eat(&Token::RBracket) {
            loop {
                items.push(self.value()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RBracket, "to close array")?;
                break;
            }
        }
        Ok(Value::Array(items))
    }

    fn object(&mut self) -> PResult<Value> {
        let mut map = serde_json::Map::new();
        if !self.eat(&Token::RBrace) {
            loop {
                let span = self.span();
                let key = match self.peek() {
                    Some(Token::Str(raw)) => {
                        let raw = raw.clone();
                        self.pos += 1;
                        self.string_literal(&raw, span)?
                    }
                    _ => {
                        self.unexpected("string key");
                        return Err(Recover);
                    }
                };
                self.expect(&Token::Colon, "after object key")?;
                let value = self.value()?;
                map.insert(key, value);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RBrace, "to close object")?;
                break;
            }
        }
        Ok(Value::Object(map))
    }

    fn string_literal(&mut self, raw: &str, span: Span) -> PResult<String> {
        serde_json::from_str::<String>(raw).map_err(|_| {
            self.error(span, "invalid escape in string literal".to_string());
            Recover
        })
    }
}
