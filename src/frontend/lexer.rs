//! Lexer for Pico
//!
//! Converts source code into a stream of tokens, one token per pull.
//! Malformed input never aborts: it yields `TokenKind::Error` tokens that
//! the parser turns into diagnostics.

use std::collections::VecDeque;

use log::trace;

use crate::frontend::token::{LexErrorKind, Token, TokenKind};
use crate::utils::Span;

/// Anything the parser can pull tokens from
pub trait TokenSource {
    /// Produce the next token. Once the input is exhausted this keeps
    /// returning an `Eof` token.
    fn next_token(&mut self) -> Token;
}

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    line: usize,
    column: usize,
    start_line: usize,
    start_column: usize,
    /// Previous token was `+ - * /`
    after_operator: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            after_operator: false,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character, keeping line/column in step
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark_start(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.start_line, self.start_column)
    }

    fn text(&self) -> String {
        self.source[self.start..self.pos].iter().collect()
    }

    /// Create a token with the current span and text
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.text(), self.make_span())
    }

    /// Skip whitespace and line comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn consume_word(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        self.consume_word();
        let text = self.text();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a decimal integer literal
    fn read_number(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // `5y` is neither a number nor an identifier
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_') {
            self.consume_word();
            return self.make_token(TokenKind::Error(LexErrorKind::InvalidIdentifier));
        }

        match self.text().parse::<i64>() {
            Ok(value) => self.make_token(TokenKind::Number(value)),
            Err(_) => self.make_token(TokenKind::Error(LexErrorKind::InvalidNumber)),
        }
    }

    /// Read `c` or `c=` as one of two token kinds
    fn one_or_two(&mut self, single: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            single
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_whitespace();
        self.mark_start();

        let Some(c) = self.advance() else {
            return Token::eof(self.make_span());
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return self.read_identifier();
        }

        if c.is_ascii_digit() {
            return self.read_number();
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => self.one_or_two(TokenKind::Eq, TokenKind::EqEq),
            '<' => self.one_or_two(TokenKind::Lt, TokenKind::Le),
            '>' => self.one_or_two(TokenKind::Gt, TokenKind::Ge),
            '!' => self.one_or_two(TokenKind::Error(LexErrorKind::InvalidChar), TokenKind::Ne),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semicolon,
            _ => TokenKind::Error(LexErrorKind::InvalidChar),
        };

        if kind.is_arithmetic() && self.after_operator {
            return self.make_token(TokenKind::Error(LexErrorKind::ConsecutiveOperators));
        }
        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens, `Eof` included
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Token {
        let token = self.scan();
        match &token.kind {
            TokenKind::Error(LexErrorKind::ConsecutiveOperators) => {}
            kind => self.after_operator = kind.is_arithmetic(),
        }
        trace!("token {:?} '{}' at {}", token.kind, token.lexeme, token.span);
        token
    }
}

/// Pre-tokenized input, e.g. from `Lexer::tokenize`
pub struct TokenStream {
    tokens: VecDeque<Token>,
    eof: Token,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = match tokens.iter().rev().find(|t| t.kind == TokenKind::Eof) {
            Some(token) => token.clone(),
            None => {
                let span = tokens.last().map_or_else(Span::dummy, |t| t.span);
                Token::eof(Span::new(span.end, span.end, span.line, span.column))
            }
        };
        Self {
            tokens: tokens.into(),
            eof,
        }
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Token {
        match self.tokens.pop_front() {
            Some(token) if token.kind == TokenKind::Eof => {
                self.tokens.clear();
                token
            }
            Some(token) => token,
            None => self.eof.clone(),
        }
    }
}
