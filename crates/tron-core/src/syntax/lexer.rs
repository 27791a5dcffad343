//! Tokens for ADL source
//!
//! Whitespace and comments (including `///` doc comments) are dropped here; the outline and
//! diagnostics never look at them.
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
pub enum Token {
    #[token("module")]
    Module,
    #[token("import")]
    Import,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("type")]
    Type,
    #[token("newtype")]
    Newtype,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex("[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
    /// Raw literal including quotes and escapes
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_owned())]
    Str(String),
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_owned())]
    Number(String),

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token("@")]
    At,
    #[token(":")]
    Colon,
    #[token("*")]
    Star,
}

impl Token {
    /// Human readable form used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{}`", name),
            Token::Str(_) => "string literal".to_string(),
            Token::Number(raw) => format!("number `{}`", raw),
            other => format!("`{}`", other.text()),
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Token::Module => "module",
            Token::Import => "import",
            Token::Struct => "struct",
            Token::Union => "union",
            Token::Type => "type",
            Token::Newtype => "newtype",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LAngle => "<",
            Token::RAngle => ">",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semi => ";",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Eq => "=",
            Token::At => "@",
            Token::Colon => ":",
            Token::Star => "*",
            Token::Ident(_) | Token::Str(_) | Token::Number(_) => "",
        }
    }

    /// Tokens that can open a JSON literal
    pub fn starts_value(&self) -> bool {
        matches!(
            self,
            Token::Str(_)
                | Token::Number(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::LBrace
                | Token::LBracket
        )
    }
}

/// Tokenize source, returning tokens with byte spans plus the spans logos could not match.
pub fn tokenize(source: &str) -> (Vec<(Token, Range<usize>)>, Vec<Range<usize>>) {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut invalid = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => invalid.push(lexer.span()),
        }
    }

    (tokens, invalid)
}
