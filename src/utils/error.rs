//! Error handling for Pico

use std::fmt;

use crate::frontend::token::LexErrorKind;
use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
    Io,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lexical => "Lexical",
            Phase::Syntax => "Parse",
            Phase::Semantic => "Semantic",
            Phase::Io => "IO",
        };
        f.write_str(name)
    }
}

/// Compiler diagnostic
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexical Errors ====================

    #[error("{kind} '{lexeme}'")]
    Lexical {
        kind: LexErrorKind,
        lexeme: String,
        span: Span,
    },

    // ==================== Parser Errors ====================

    #[error("Unexpected token '{lexeme}'")]
    UnexpectedToken { lexeme: String, span: Span },

    #[error("Expected ';' but found '{lexeme}'")]
    MissingSemicolon { lexeme: String, span: Span },

    #[error("Expected identifier but found '{lexeme}'")]
    MissingIdentifier { lexeme: String, span: Span },

    #[error("Expected '=' but found '{lexeme}'")]
    MissingEquals { lexeme: String, span: Span },

    #[error("Invalid expression at '{lexeme}'")]
    InvalidExpression { lexeme: String, span: Span },

    #[error("Expected ')' but found '{lexeme}'")]
    MissingParenthesis { lexeme: String, span: Span },

    #[error("Mismatched parenthesis '{lexeme}'")]
    MismatchedParenthesis { lexeme: String, span: Span },

    #[error("Missing condition near '{lexeme}'")]
    MissingCondition { lexeme: String, span: Span },

    #[error("Missing block brace '{brace}' near '{lexeme}'")]
    MissingBlock {
        brace: char,
        lexeme: String,
        span: Span,
    },

    #[error("Invalid operator '{lexeme}'")]
    InvalidOperator { lexeme: String, span: Span },

    #[error("Expected '(' after factorial but found '{lexeme}'")]
    FactorialCall { lexeme: String, span: Span },

    #[error("Expected 'until' after repeat block but found '{lexeme}'")]
    MissingUntil { lexeme: String, span: Span },

    // ==================== Semantic Errors ====================

    #[error("Undeclared variable '{name}'")]
    UndeclaredVariable { name: String, span: Span },

    #[error("Variable '{name}' already declared in this scope (first declared on line {previous_line})")]
    RedeclaredVariable {
        name: String,
        previous_line: usize,
        span: Span,
    },

    #[error("Type mismatch involving '{lexeme}': expected {expected}, got {got}")]
    TypeMismatch {
        lexeme: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Variable '{name}' may be used uninitialized")]
    UninitializedVariable { name: String, span: Span },

    #[error("Invalid operation involving '{lexeme}': {reason}")]
    InvalidOperation {
        lexeme: String,
        reason: String,
        span: Span,
    },

    #[error("{0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexical { span, .. }
            | Self::UnexpectedToken { span, .. }
            | Self::MissingSemicolon { span, .. }
            | Self::MissingIdentifier { span, .. }
            | Self::MissingEquals { span, .. }
            | Self::InvalidExpression { span, .. }
            | Self::MissingParenthesis { span, .. }
            | Self::MismatchedParenthesis { span, .. }
            | Self::MissingCondition { span, .. }
            | Self::MissingBlock { span, .. }
            | Self::InvalidOperator { span, .. }
            | Self::FactorialCall { span, .. }
            | Self::MissingUntil { span, .. }
            | Self::UndeclaredVariable { span, .. }
            | Self::RedeclaredVariable { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::UninitializedVariable { span, .. }
            | Self::InvalidOperation { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }

    /// The offending lexeme (or variable name)
    pub fn lexeme(&self) -> Option<&str> {
        match self {
            Self::Lexical { lexeme, .. }
            | Self::UnexpectedToken { lexeme, .. }
            | Self::MissingSemicolon { lexeme, .. }
            | Self::MissingIdentifier { lexeme, .. }
            | Self::MissingEquals { lexeme, .. }
            | Self::InvalidExpression { lexeme, .. }
            | Self::MissingParenthesis { lexeme, .. }
            | Self::MismatchedParenthesis { lexeme, .. }
            | Self::MissingCondition { lexeme, .. }
            | Self::MissingBlock { lexeme, .. }
            | Self::InvalidOperator { lexeme, .. }
            | Self::FactorialCall { lexeme, .. }
            | Self::MissingUntil { lexeme, .. }
            | Self::TypeMismatch { lexeme, .. }
            | Self::InvalidOperation { lexeme, .. } => Some(lexeme),
            Self::UndeclaredVariable { name, .. }
            | Self::RedeclaredVariable { name, .. }
            | Self::UninitializedVariable { name, .. } => Some(name),
            Self::Io(_) => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Lexical { .. } => Phase::Lexical,
            Self::UnexpectedToken { .. }
            | Self::MissingSemicolon { .. }
            | Self::MissingIdentifier { .. }
            | Self::MissingEquals { .. }
            | Self::InvalidExpression { .. }
            | Self::MissingParenthesis { .. }
            | Self::MismatchedParenthesis { .. }
            | Self::MissingCondition { .. }
            | Self::MissingBlock { .. }
            | Self::InvalidOperator { .. }
            | Self::FactorialCall { .. }
            | Self::MissingUntil { .. } => Phase::Syntax,
            Self::UndeclaredVariable { .. }
            | Self::RedeclaredVariable { .. }
            | Self::TypeMismatch { .. }
            | Self::UninitializedVariable { .. }
            | Self::InvalidOperation { .. } => Phase::Semantic,
            Self::Io(_) => Phase::Io,
        }
    }

    /// Stable error code, grouped by phase
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lexical { .. } => "E0001",
            Self::UnexpectedToken { .. } => "E0101",
            Self::MissingSemicolon { .. } => "E0102",
            Self::MissingIdentifier { .. } => "E0103",
            Self::MissingEquals { .. } => "E0104",
            Self::InvalidExpression { .. } => "E0105",
            Self::MissingParenthesis { .. } => "E0106",
            Self::MismatchedParenthesis { .. } => "E0107",
            Self::MissingCondition { .. } => "E0108",
            Self::MissingBlock { .. } => "E0109",
            Self::InvalidOperator { .. } => "E0110",
            Self::FactorialCall { .. } => "E0111",
            Self::MissingUntil { .. } => "E0112",
            Self::UndeclaredVariable { .. } => "E0201",
            Self::RedeclaredVariable { .. } => "E0202",
            Self::TypeMismatch { .. } => "E0203",
            Self::UninitializedVariable { .. } => "E0204",
            Self::InvalidOperation { .. } => "E0205",
            Self::Io(_) => "E0900",
        }
    }

    /// One-line human readable form, prefixed with phase and position
    pub fn render(&self) -> String {
        match self.span() {
            Some(span) => format!("{} error at {}: {}", self.phase(), span, self),
            None => format!("{} error: {}", self.phase(), self),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_position() {
        let err = Error::MissingSemicolon {
            lexeme: "y".to_string(),
            span: Span::new(7, 8, 2, 1),
        };
        assert_eq!(
            err.render(),
            "Parse error at line 2, column 1: Expected ';' but found 'y'"
        );
        assert_eq!(err.phase(), Phase::Syntax);
        assert_eq!(err.lexeme(), Some("y"));
    }

    #[test]
    fn test_semantic_codes() {
        let err = Error::UndeclaredVariable {
            name: "x".to_string(),
            span: Span::dummy(),
        };
        assert_eq!(err.code(), "E0201");
        assert_eq!(err.phase(), Phase::Semantic);
        assert_eq!(err.to_string(), "Undeclared variable 'x'");
    }

    #[test]
    fn test_io_has_no_span() {
        let err = Error::Io("missing".to_string());
        assert!(err.span().is_none());
        assert_eq!(err.render(), "IO error: missing");
    }
}
