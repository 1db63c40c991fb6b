//! Token definitions for Pico

use std::fmt;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token ("EOF" for end of input)
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: "EOF".to_string(),
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }

    /// Lexical error carried by this token, if any
    pub fn lex_error(&self) -> Option<LexErrorKind> {
        match self.kind {
            TokenKind::Error(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Lexical error tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    InvalidChar,
    InvalidNumber,
    ConsecutiveOperators,
    InvalidIdentifier,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LexErrorKind::InvalidChar => "Invalid character",
            LexErrorKind::InvalidNumber => "Invalid number format",
            LexErrorKind::ConsecutiveOperators => "Consecutive operators not allowed",
            LexErrorKind::InvalidIdentifier => "Invalid identifier",
        };
        f.write_str(text)
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// if
    If,
    /// while
    While,
    /// int
    Int,
    /// print
    Print,
    /// factorial
    Factorial,
    /// repeat
    Repeat,
    /// until
    Until,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name)
    Ident(String),
    /// Integer literal
    Number(i64),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// ;
    Semicolon,

    // ============ Special ============
    /// End of input
    Eof,
    /// Malformed input, see the tag
    Error(LexErrorKind),
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "if" => Some(TokenKind::If),
            "while" => Some(TokenKind::While),
            "int" => Some(TokenKind::Int),
            "print" => Some(TokenKind::Print),
            "factorial" => Some(TokenKind::Factorial),
            "repeat" => Some(TokenKind::Repeat),
            "until" => Some(TokenKind::Until),
            _ => None,
        }
    }

    /// `+ - * /`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash
        )
    }

    /// `== != < > <= >=`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        )
    }

    /// Get the precedence of a binary operator (for precedence climbing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Comparison (lowest)
            TokenKind::EqEq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => Some(1),

            // Additive
            TokenKind::Plus | TokenKind::Minus => Some(2),

            // Multiplicative (highest)
            TokenKind::Star | TokenKind::Slash => Some(3),

            _ => None,
        }
    }

    /// Category name used by the token dump
    pub fn category(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "NUMBER",
            TokenKind::Ident(_) => "IDENTIFIER",
            k if k.is_arithmetic() => "OPERATOR",
            k if k.is_comparison() => "COMPARE",
            TokenKind::Eq => "EQUALS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::If => "IF",
            TokenKind::While => "WHILE",
            TokenKind::Int => "INT",
            TokenKind::Print => "PRINT",
            TokenKind::Factorial => "FACTORIAL",
            TokenKind::Repeat => "REPEAT",
            TokenKind::Until => "UNTIL",
            TokenKind::Eof => "EOF",
            _ => "ERROR",
        }
    }
}
