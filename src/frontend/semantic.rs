//! Semantic Analysis for Pico
//!
//! Performs:
//! - Declaration checks (undeclared / redeclared names)
//! - Initialization tracking
//! - Type checking of expressions and conditions
//!
//! Errors never stop the walk; every statement is checked and all
//! diagnostics are collected.

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::symbol_table::{Symbol, SymbolTable};
use crate::utils::{Error, Result};

/// Outcome of a semantic analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub errors: Vec<Error>,
    /// Global symbols in declaration order
    pub globals: Vec<Symbol>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Semantic analyzer
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    errors: Vec<Error>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            errors: Vec::new(),
        }
    }

    /// Analyze a program. Consumes the analyzer, so every run starts from
    /// an empty symbol table.
    pub fn analyze(mut self, program: &Program) -> Analysis {
        for stmt in &program.stmts {
            if let Err(e) = self.check_stmt(stmt) {
                self.report(e);
            }
        }
        debug!("semantic analysis finished with {} errors", self.errors.len());

        Analysis {
            errors: self.errors,
            globals: self.symbols.globals().to_vec(),
        }
    }

    fn report(&mut self, error: Error) {
        debug!("semantic error: {}", error.render());
        self.errors.push(error);
    }

    // ==================== Statements ====================

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::VarDecl { name, ty, .. } => {
                self.symbols.declare(&name.name, *ty, name.span)?;
                Ok(())
            }

            Stmt::Assign { target, value, .. } => {
                if self.symbols.lookup(&target.name).is_none() {
                    return Err(Error::UndeclaredVariable {
                        name: target.name.clone(),
                        span: target.span,
                    });
                }

                let value_ty = self.check_expr(value)?;
                if let Some(symbol) = self.symbols.lookup_mut(&target.name) {
                    if symbol.ty != value_ty {
                        return Err(Error::TypeMismatch {
                            lexeme: target.name.clone(),
                            expected: symbol.ty.to_string(),
                            got: value_ty.to_string(),
                            span: target.span,
                        });
                    }
                    symbol.is_initialized = true;
                }
                Ok(())
            }

            Stmt::Print { value, .. } | Stmt::Expr(value) => {
                self.check_expr(value)?;
                Ok(())
            }

            Stmt::If { condition, body, .. } | Stmt::While { condition, body, .. } => {
                // The body is checked even when the condition is bad
                if let Err(e) = self.check_condition(condition) {
                    self.report(e);
                }
                self.check_block(body);
                Ok(())
            }

            Stmt::Repeat { body, condition, .. } => {
                self.check_block(body);
                self.check_condition(condition)
            }
        }
    }

    /// Check a block in its own scope
    fn check_block(&mut self, block: &Block) {
        self.symbols.enter_scope();
        for stmt in &block.stmts {
            if let Err(e) = self.check_stmt(stmt) {
                self.report(e);
            }
        }
        self.symbols.exit_scope();
    }

    /// Conditions are plain integer expressions
    fn check_condition(&mut self, condition: &Expr) -> Result<()> {
        let ty = self.check_expr(condition)?;
        if ty != Type::Int {
            return Err(Error::TypeMismatch {
                lexeme: condition.to_string(),
                expected: Type::Int.to_string(),
                got: ty.to_string(),
                span: condition.span(),
            });
        }
        Ok(())
    }

    // ==================== Expressions ====================

    fn check_expr(&mut self, expr: &Expr) -> Result<Type> {
        match expr {
            Expr::Number(_, _) => Ok(Type::Int),

            Expr::Ident(ident) => {
                let symbol = self.symbols.lookup(&ident.name).ok_or_else(|| {
                    Error::UndeclaredVariable {
                        name: ident.name.clone(),
                        span: ident.span,
                    }
                })?;
                if !symbol.is_initialized {
                    return Err(Error::UninitializedVariable {
                        name: ident.name.clone(),
                        span: ident.span,
                    });
                }
                Ok(symbol.ty)
            }

            Expr::Binary { left, op, right, span } => {
                let (left_ty, right_ty) = match (self.check_expr(left), self.check_expr(right)) {
                    (Ok(l), Ok(r)) => (l, r),
                    (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
                    (Err(first), Err(second)) => {
                        self.report(first);
                        return Err(second);
                    }
                };

                if left_ty != right_ty {
                    return Err(Error::TypeMismatch {
                        lexeme: op.to_string(),
                        expected: left_ty.to_string(),
                        got: right_ty.to_string(),
                        span: *span,
                    });
                }

                if *op == BinOp::Div && matches!(**right, Expr::Number(0, _)) {
                    return Err(Error::InvalidOperation {
                        lexeme: op.to_string(),
                        reason: "division by zero".to_string(),
                        span: *span,
                    });
                }

                // Comparisons yield 0 or 1, so every operator produces an int
                Ok(left_ty)
            }

            Expr::Factorial { argument, span } => {
                let ty = self.check_expr(argument)?;
                if ty != Type::Int {
                    return Err(Error::TypeMismatch {
                        lexeme: "factorial".to_string(),
                        expected: Type::Int.to_string(),
                        got: ty.to_string(),
                        span: *span,
                    });
                }
                Ok(Type::Int)
            }
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
