//! Abstract Syntax Tree definitions for Pico
//!
//! The tree is owned top-down: every node owns its children and nothing
//! points back up, so dropping the `Program` frees the whole tree.

use std::fmt;

use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// `{ ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    /// Placeholder used when the braces are missing
    pub fn empty(span: Span) -> Self {
        Self { stmts: Vec::new(), span }
    }
}

/// Identifier with location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Declared type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `int x;`
    VarDecl { name: Ident, ty: Type, span: Span },
    /// `x = expr;`
    Assign { target: Ident, value: Expr, span: Span },
    /// `print expr;`
    Print { value: Expr, span: Span },
    /// `if cond { ... }`
    If {
        condition: Expr,
        body: Block,
        span: Span,
    },
    /// `while cond { ... }`
    While {
        condition: Expr,
        body: Block,
        span: Span,
    },
    /// `repeat { ... } until cond`
    Repeat {
        body: Block,
        condition: Expr,
        span: Span,
    },
    /// Expression statement, only `factorial(...)` is accepted here
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. } => *span,
            Stmt::Expr(expr) => expr.span(),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64, Span),
    Ident(Ident),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        /// Location of the operator token
        span: Span,
    },
    /// `factorial(arg)`; the multiplication chain is implied, not expanded
    Factorial { argument: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span) => *span,
            Expr::Ident(ident) => ident.span,
            Expr::Binary { span, .. } => *span,
            Expr::Factorial { span, .. } => *span,
        }
    }
}

/// Prefix rendering: `1 + 2 * 3` is `+(1, *(2, 3))`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n, _) => write!(f, "{}", n),
            Expr::Ident(ident) => f.write_str(&ident.name),
            Expr::Binary { left, op, right, .. } => write!(f, "{}({}, {})", op, left, right),
            Expr::Factorial { argument, .. } => write!(f, "factorial({})", argument),
        }
    }
}

// ==================== Tree Printer ====================

/// Indented dump of a program, one node per line
pub fn dump(program: &Program) -> String {
    let mut printer = AstPrinter::new();
    printer.program(program);
    printer.output
}

struct AstPrinter {
    output: String,
    indent: usize,
}

impl AstPrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn program(&mut self, program: &Program) {
        self.line("Program");
        self.nested(|p| {
            for stmt in &program.stmts {
                p.stmt(stmt);
            }
        });
    }

    fn block(&mut self, block: &Block) {
        self.line("Block");
        self.nested(|p| {
            for stmt in &block.stmts {
                p.stmt(stmt);
            }
        });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, .. } => self.line(&format!("VarDecl: {}", name.name)),
            Stmt::Assign { target, value, .. } => {
                self.line("Assign");
                self.nested(|p| {
                    p.line(&format!("Identifier: {}", target.name));
                    p.expr(value);
                });
            }
            Stmt::Print { value, .. } => {
                self.line("Print");
                self.nested(|p| p.expr(value));
            }
            Stmt::If { condition, body, .. } => {
                self.line("If");
                self.nested(|p| {
                    p.expr(condition);
                    p.block(body);
                });
            }
            Stmt::While { condition, body, .. } => {
                self.line("While");
                self.nested(|p| {
                    p.expr(condition);
                    p.block(body);
                });
            }
            Stmt::Repeat { body, condition, .. } => {
                self.line("Repeat-Until");
                self.nested(|p| {
                    p.block(body);
                    p.expr(condition);
                });
            }
            Stmt::Expr(expr) => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n, _) => self.line(&format!("Number: {}", n)),
            Expr::Ident(ident) => self.line(&format!("Identifier: {}", ident.name)),
            Expr::Binary { left, op, right, .. } => {
                self.line(&format!("BinaryOp: {}", op));
                self.nested(|p| {
                    p.expr(left);
                    p.expr(right);
                });
            }
            Expr::Factorial { argument, .. } => {
                self.line("Factorial of:");
                self.nested(|p| p.expr(argument));
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dump(self))
    }
}

/// Count every statement in the tree, nested ones included
pub fn count_statements(stmts: &[Stmt]) -> usize {
    stmts
        .iter()
        .map(|stmt| {
            1 + match stmt {
                Stmt::If { body, .. } | Stmt::While { body, .. } | Stmt::Repeat { body, .. } => {
                    count_statements(&body.stmts)
                }
                _ => 0,
            }
        })
        .sum()
}
