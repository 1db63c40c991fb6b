//! Parser for Pico
//!
//! Recursive descent parser with precedence climbing for expressions.
//!
//! Errors never abort the parse. A failed statement is reported and the
//! parser resynchronises at the next statement boundary (`;`, `}` or end
//! of input), so a single pass surfaces every independent syntax error.
//!
//! Recursion depth follows the nesting depth of the input (parentheses and
//! blocks); pathologically deep input can exhaust the thread stack.

use std::mem;

use log::{debug, trace};

use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, TokenSource, TokenStream};
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// Result of a parse: the (possibly partial) tree and every diagnostic
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<Error>,
}

impl ParseOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The parser
pub struct Parser<S: TokenSource> {
    source: S,
    current: Token,
    /// Span of the last consumed token
    prev_span: Span,
    /// A lexical error token was skipped right before `current`
    after_lex_error: bool,
    errors: Vec<Error>,
}

impl Parser<Lexer> {
    /// Create a parser that lexes `source` on demand
    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source))
    }
}

impl Parser<TokenStream> {
    /// Create a parser from pre-tokenized input
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self::new(TokenStream::new(tokens))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        let mut parser = Self {
            source,
            current: Token::eof(Span::dummy()),
            prev_span: Span::dummy(),
            after_lex_error: false,
            errors: Vec::new(),
        };
        parser.current = parser.pull();
        parser.prev_span = parser.current.span;
        parser
    }

    /// Parse the whole input
    pub fn parse(mut self) -> ParseOutput {
        let program = self.parse_program();
        ParseOutput {
            program,
            errors: self.errors,
        }
    }

    // ==================== Helper Methods ====================

    /// Fetch the next well-formed token, reporting lexical errors on the way.
    /// An expression left incomplete by a skipped error token is not
    /// reported a second time (see `report`).
    fn pull(&mut self) -> Token {
        self.after_lex_error = false;
        loop {
            let token = self.source.next_token();
            match token.lex_error() {
                Some(kind) => {
                    self.after_lex_error = true;
                    self.errors.push(Error::Lexical {
                        kind,
                        lexeme: token.lexeme,
                        span: token.span,
                    });
                }
                None => return token,
            }
        }
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current.kind
    }

    fn advance(&mut self) -> Token {
        let next = if self.is_at_end() {
            self.current.clone()
        } else {
            self.pull()
        };
        let token = mem::replace(&mut self.current, next);
        self.prev_span = token.span;
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(self.current_kind()) == mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.current.lexeme.clone()
    }

    fn span(&self) -> Span {
        self.current.span
    }

    fn report(&mut self, error: Error) {
        if self.after_lex_error && matches!(error, Error::InvalidExpression { .. }) {
            debug!("suppressed follow-up error: {}", error.render());
            return;
        }
        debug!("syntax error: {}", error.render());
        self.errors.push(error);
    }

    /// Skip to the next statement boundary. A `;` is consumed, a `}` is
    /// left for the enclosing block.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace => break,
                _ => {
                    self.advance();
                }
            }
        }
        debug!("resynchronised before '{}' at {}", self.current.lexeme, self.current.span);
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Program {
        let start = self.span();
        let stmts = self.parse_stmts(false);
        Program {
            stmts,
            span: start.merge(&self.prev_span),
        }
    }

    /// Statement list up to end of input, or up to `}` inside a block
    fn parse_stmts(&mut self, in_block: bool) -> Vec<Stmt> {
        let mut stmts = Vec::new();

        while !self.is_at_end() && !(in_block && self.check(&TokenKind::RBrace)) {
            match self.parse_stmt() {
                Ok(Some(stmt)) => {
                    trace!("parsed statement at {}", stmt.span());
                    stmts.push(stmt);
                }
                Ok(None) => {}
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }

        stmts
    }

    /// `Ok(None)` means the statement was dropped after its diagnostics
    /// were reported and its tokens consumed.
    fn parse_stmt(&mut self) -> Result<Option<Stmt>> {
        match self.current_kind() {
            TokenKind::Int => self.parse_declaration().map(Some),
            TokenKind::Ident(_) => self.parse_assignment().map(Some),
            TokenKind::Print => self.parse_print().map(Some),
            TokenKind::If | TokenKind::While => self.parse_conditional(),
            TokenKind::Repeat => self.parse_repeat().map(Some),
            TokenKind::Factorial => {
                let expr = self.parse_factorial()?;
                Ok(Some(self.finish_simple(Stmt::Expr(expr))))
            }
            _ => {
                let token = self.advance();
                self.report(Error::UnexpectedToken {
                    lexeme: token.lexeme,
                    span: token.span,
                });
                Ok(None)
            }
        }
    }

    /// Require the `;` closing a simple statement. A missing one is
    /// reported, the rest of the statement skipped, and the node kept.
    fn finish_simple(&mut self, stmt: Stmt) -> Stmt {
        if self.consume(&TokenKind::Semicolon) {
            return stmt;
        }

        let error = if self.check(&TokenKind::RParen) {
            Error::MismatchedParenthesis {
                lexeme: self.lexeme(),
                span: self.span(),
            }
        } else {
            Error::MissingSemicolon {
                lexeme: self.lexeme(),
                span: self.span(),
            }
        };
        self.report(error);
        self.synchronize();
        stmt
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok(Ident {
                    name,
                    span: token.span,
                })
            }
            _ => Err(Error::MissingIdentifier {
                lexeme: self.lexeme(),
                span: self.span(),
            }),
        }
    }

    /// `int x;`
    fn parse_declaration(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let name = self.parse_ident()?;
        let span = start.merge(&name.span);

        Ok(self.finish_simple(Stmt::VarDecl {
            name,
            ty: Type::Int,
            span,
        }))
    }

    /// `x = expr;`
    fn parse_assignment(&mut self) -> Result<Stmt> {
        let target = self.parse_ident()?;

        if !self.consume(&TokenKind::Eq) {
            return Err(Error::MissingEquals {
                lexeme: self.lexeme(),
                span: self.span(),
            });
        }

        let value = self.parse_expr()?;
        let span = target.span.merge(&self.prev_span);
        Ok(self.finish_simple(Stmt::Assign { target, value, span }))
    }

    /// `print expr;`
    fn parse_print(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let value = self.parse_expr()?;
        let span = start.merge(&self.prev_span);
        Ok(self.finish_simple(Stmt::Print { value, span }))
    }

    /// `if cond { ... }` and `while cond { ... }`
    fn parse_conditional(&mut self) -> Result<Option<Stmt>> {
        let keyword = self.advance();

        let condition = match self.parse_condition() {
            Ok(expr) => Some(expr),
            Err(err) => {
                self.report(err);
                // Still consume the body so its statements don't leak out
                while !matches!(
                    self.current_kind(),
                    TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
                ) {
                    self.advance();
                }
                if !self.check(&TokenKind::LBrace) {
                    self.synchronize();
                    return Ok(None);
                }
                None
            }
        };

        let body = self.parse_block();
        let Some(condition) = condition else {
            return Ok(None);
        };

        let span = keyword.span.merge(&self.prev_span);
        let stmt = if keyword.kind == TokenKind::If {
            Stmt::If {
                condition,
                body,
                span,
            }
        } else {
            Stmt::While {
                condition,
                body,
                span,
            }
        };
        Ok(Some(stmt))
    }

    /// `repeat { ... } until cond`, with an optional trailing `;`
    fn parse_repeat(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let body = self.parse_block();

        if !self.consume(&TokenKind::Until) {
            return Err(Error::MissingUntil {
                lexeme: self.lexeme(),
                span: self.span(),
            });
        }

        let condition = self.parse_condition()?;
        let span = start.merge(&self.prev_span);
        self.consume(&TokenKind::Semicolon);

        Ok(Stmt::Repeat {
            body,
            condition,
            span,
        })
    }

    fn parse_condition(&mut self) -> Result<Expr> {
        if matches!(
            self.current_kind(),
            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
        ) {
            return Err(Error::MissingCondition {
                lexeme: self.lexeme(),
                span: self.span(),
            });
        }
        self.parse_expr()
    }

    /// `{ stmt* }`. Missing braces are reported and an empty (or partial)
    /// block is returned so the enclosing statement survives.
    fn parse_block(&mut self) -> Block {
        let start = self.span();

        if !self.consume(&TokenKind::LBrace) {
            self.report(Error::MissingBlock {
                brace: '{',
                lexeme: self.lexeme(),
                span: self.span(),
            });
            return Block::empty(Span::new(start.start, start.start, start.line, start.column));
        }

        let stmts = self.parse_stmts(true);

        if !self.consume(&TokenKind::RBrace) {
            self.report(Error::MissingBlock {
                brace: '}',
                lexeme: self.lexeme(),
                span: self.span(),
            });
        }

        Block {
            stmts,
            span: start.merge(&self.prev_span),
        }
    }

    // ==================== Expression Parsing (precedence climbing) ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse a primary, then fold in every operator binding at least as
    /// tightly as `min_bp`. The right operand is parsed with `bp + 1`, which
    /// makes all operators left-associative.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Eq) {
                return Err(Error::InvalidOperator {
                    lexeme: self.lexeme(),
                    span: self.span(),
                });
            }

            let Some(bp) = self.current_kind().binary_precedence() else {
                break;
            };

            if bp < min_bp {
                break;
            }

            let op_token = self.advance();
            let op = Self::token_to_binop(&op_token)?;
            let right = self.parse_expr_bp(bp + 1)?;

            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span: op_token.span,
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.current_kind().clone() {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr_bp(0)?;
                self.expect_closing_paren()?;
                Ok(expr)
            }
            TokenKind::Number(n) => {
                let token = self.advance();
                Ok(Expr::Number(n, token.span))
            }
            TokenKind::Ident(_) => Ok(Expr::Ident(self.parse_ident()?)),
            TokenKind::Factorial => self.parse_factorial(),
            TokenKind::RParen => Err(Error::MismatchedParenthesis {
                lexeme: self.lexeme(),
                span: self.span(),
            }),
            _ => Err(Error::InvalidExpression {
                lexeme: self.lexeme(),
                span: self.span(),
            }),
        }
    }

    /// `factorial ( expr )`
    fn parse_factorial(&mut self) -> Result<Expr> {
        let start = self.advance().span;

        if !self.consume(&TokenKind::LParen) {
            return Err(Error::FactorialCall {
                lexeme: self.lexeme(),
                span: self.span(),
            });
        }

        let argument = self.parse_expr_bp(0)?;
        self.expect_closing_paren()?;

        Ok(Expr::Factorial {
            argument: Box::new(argument),
            span: start.merge(&self.prev_span),
        })
    }

    fn expect_closing_paren(&mut self) -> Result<()> {
        if self.consume(&TokenKind::RParen) {
            return Ok(());
        }
        let lexeme = self.lexeme();
        let span = self.span();
        if self.check(&TokenKind::RBrace) {
            Err(Error::MismatchedParenthesis { lexeme, span })
        } else {
            Err(Error::MissingParenthesis { lexeme, span })
        }
    }

    fn token_to_binop(token: &Token) -> Result<BinOp> {
        match token.kind {
            TokenKind::Plus => Ok(BinOp::Add),
            TokenKind::Minus => Ok(BinOp::Sub),
            TokenKind::Star => Ok(BinOp::Mul),
            TokenKind::Slash => Ok(BinOp::Div),
            TokenKind::EqEq => Ok(BinOp::Eq),
            TokenKind::Ne => Ok(BinOp::Ne),
            TokenKind::Lt => Ok(BinOp::Lt),
            TokenKind::Le => Ok(BinOp::Le),
            TokenKind::Gt => Ok(BinOp::Gt),
            TokenKind::Ge => Ok(BinOp::Ge),
            _ => Err(Error::InvalidOperator {
                lexeme: token.lexeme.clone(),
                span: token.span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::LexErrorKind;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParseOutput {
        Parser::from_source(source).parse()
    }

    /// Right-hand side of the first statement, which must be an assignment
    fn assigned(source: &str) -> String {
        let output = parse(source);
        assert!(output.is_ok(), "unexpected errors: {:?}", output.errors);
        match &output.program.stmts[0] {
            Stmt::Assign { value, .. } => value.to_string(),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    fn codes(output: &ParseOutput) -> Vec<&'static str> {
        output.errors.iter().map(|e| e.code()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(assigned("x = 1 + 2 * 3;"), "+(1, *(2, 3))");
        assert_eq!(assigned("x = 1 * 2 + 3;"), "+(*(1, 2), 3)");
        assert_eq!(assigned("x = (1 + 2) * 3;"), "*(+(1, 2), 3)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(assigned("x = 1 - 2 - 3;"), "-(-(1, 2), 3)");
        assert_eq!(assigned("x = 8 / 4 / 2;"), "/(/(8, 4), 2)");
    }

    #[test]
    fn test_comparison_is_lowest() {
        assert_eq!(assigned("x = a + 1 <= b * 2;"), "<=(+(a, 1), *(b, 2))");
        assert_eq!(assigned("x = 1 == 2 != 3;"), "!=(==(1, 2), 3)");
    }

    #[test]
    fn test_factorial_in_expression() {
        assert_eq!(
            assigned("x = factorial(n - 1) * 2;"),
            "*(factorial(-(n, 1)), 2)"
        );
    }

    #[test]
    fn test_program_statements() {
        let output = parse("int x; x = 42; if (x > 0) { int y; y = x + 10; }");
        assert!(output.is_ok());
        let stmts = &output.program.stmts;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0], Stmt::VarDecl { ref name, .. } if name.name == "x"));
        assert!(matches!(stmts[1], Stmt::Assign { .. }));
        match &stmts[2] {
            Stmt::If { condition, body, .. } => {
                assert_eq!(condition.to_string(), ">(x, 0)");
                assert_eq!(body.stmts.len(), 2);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_and_repeat() {
        let output = parse(
            "while (y == 5) { y = 6; }\n\
             repeat { y = y + 2; } until (x > 10);\n\
             repeat { print y; } until y < 0",
        );
        assert!(output.is_ok(), "{:?}", output.errors);
        let stmts = &output.program.stmts;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0], Stmt::While { .. }));
        match &stmts[1] {
            Stmt::Repeat { body, condition, .. } => {
                assert_eq!(body.stmts.len(), 1);
                assert_eq!(condition.to_string(), ">(x, 10)");
            }
            other => panic!("expected repeat, got {:?}", other),
        }
        assert!(matches!(stmts[2], Stmt::Repeat { .. }));
    }

    #[test]
    fn test_print_and_factorial_statements() {
        let output = parse("print x + 1; factorial(3);");
        assert!(output.is_ok());
        assert!(matches!(output.program.stmts[0], Stmt::Print { .. }));
        assert!(matches!(output.program.stmts[1], Stmt::Expr(Expr::Factorial { .. })));
    }

    #[test]
    fn test_empty_block() {
        let output = parse("if x { }");
        assert!(output.is_ok());
        assert!(matches!(&output.program.stmts[0], Stmt::If { body, .. } if body.stmts.is_empty()));
    }

    #[test]
    fn test_recovery_reports_every_error() {
        let output = parse("int ; int y; x 5; y = 1;");
        assert_eq!(codes(&output), vec!["E0103", "E0104"]);
        assert_eq!(output.program.stmts.len(), 2);
    }

    #[test]
    fn test_missing_semicolon_keeps_declaration() {
        let output = parse("int x\nx = 1;");
        assert_eq!(codes(&output), vec!["E0102"]);
        let span = output.errors[0].span().unwrap();
        assert_eq!((span.line, span.column), (2, 1));
        assert_eq!(output.program.stmts.len(), 1);
        assert!(matches!(output.program.stmts[0], Stmt::VarDecl { .. }));
    }

    #[test]
    fn test_missing_open_brace_synthesizes_block() {
        let output = parse("if x > 0 y = 1; print y;");
        assert_eq!(codes(&output), vec!["E0109"]);
        let stmts = &output.program.stmts;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], Stmt::If { body, .. } if body.stmts.is_empty()));
    }

    #[test]
    fn test_missing_close_brace_keeps_body() {
        let output = parse("while x { x = 1;");
        assert!(matches!(output.errors[..], [Error::MissingBlock { brace: '}', .. }]));
        assert!(matches!(&output.program.stmts[0], Stmt::While { body, .. } if body.stmts.len() == 1));
    }

    #[test]
    fn test_missing_until() {
        let output = parse("repeat { x = 1; } x > 1; int z;");
        assert_eq!(codes(&output), vec!["E0112"]);
        assert_eq!(output.program.stmts.len(), 1);
        assert!(matches!(output.program.stmts[0], Stmt::VarDecl { .. }));
    }

    #[test]
    fn test_missing_condition() {
        let output = parse("if { int y; } int z;");
        assert_eq!(codes(&output), vec!["E0108"]);
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_until_without_condition() {
        let output = parse("repeat { } until ; int z;");
        assert_eq!(codes(&output), vec!["E0108"]);
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_bad_condition_resyncs_at_semicolon() {
        let output = parse("if ; int z;");
        assert_eq!(codes(&output), vec!["E0108"]);
        assert!(matches!(&output.program.stmts[..], [Stmt::VarDecl { name, .. }] if name.name == "z"));

        let output = parse("while x + ; int z;");
        assert_eq!(codes(&output), vec!["E0105"]);
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_unexpected_token_is_skipped() {
        let output = parse("} int x;");
        assert_eq!(codes(&output), vec!["E0101"]);
        assert_eq!(output.errors[0].lexeme(), Some("}"));
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_assignment_inside_expression() {
        let output = parse("x = 1 = 2; int y;");
        assert_eq!(codes(&output), vec!["E0110"]);
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_parenthesis_errors() {
        assert_eq!(codes(&parse("x = (1 + 2;")), vec!["E0106"]);
        assert_eq!(codes(&parse("int x; x = 1 + 2);")), vec!["E0107"]);
        assert_eq!(codes(&parse("x = );")), vec!["E0107"]);
    }

    #[test]
    fn test_invalid_expression() {
        let output = parse("x = ; int y;");
        assert_eq!(codes(&output), vec!["E0105"]);
        assert_eq!(output.program.stmts.len(), 1);
    }

    #[test]
    fn test_factorial_without_parenthesis() {
        let output = parse("x = factorial 3;");
        assert_eq!(codes(&output), vec!["E0111"]);
        assert!(output.program.stmts.is_empty());
    }

    #[test]
    fn test_lexical_errors_are_reported_and_skipped() {
        let output = parse("int x; x = 5 @;");
        assert!(matches!(
            output.errors[..],
            [Error::Lexical { kind: LexErrorKind::InvalidChar, .. }]
        ));
        assert_eq!(output.program.stmts.len(), 2);
    }

    #[test]
    fn test_lexical_error_is_not_reported_twice() {
        let output = parse("int x; x = 5y; int y;");
        assert_eq!(codes(&output), vec!["E0001"]);
        assert_eq!(output.errors[0].lexeme(), Some("5y"));
        assert_eq!(output.program.stmts.len(), 2);
    }

    #[test]
    fn test_from_tokens() {
        let tokens = Lexer::new("int a; a = 1;").tokenize();
        let output = Parser::from_tokens(tokens).parse();
        assert!(output.is_ok());
        assert_eq!(output.program.stmts.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let output = parse("   ");
        assert!(output.is_ok());
        assert!(output.program.stmts.is_empty());
    }
}
