//! Pico
//!
//! Parser and static checker for a minimal imperative language with
//! integer variables, `if`/`while`/`repeat ... until` control flow,
//! `print` and a built-in `factorial`.
//!
//! The pipeline is `parse` (tokens to AST) followed by `analyze`
//! (declarations, initialization, types). Neither stage stops at the first
//! problem; both return every diagnostic they find.

pub mod feedback;
pub mod frontend;
pub mod utils;

use frontend::ast::Program;
use frontend::parser::{ParseOutput, Parser};
use frontend::semantic::{Analysis, SemanticAnalyzer};
use frontend::symbol_table::Symbol;
use utils::Error;

/// Parse source text into a program plus syntax diagnostics
pub fn parse(source: &str) -> ParseOutput {
    Parser::from_source(source).parse()
}

/// Run semantic analysis with a fresh symbol table
pub fn analyze(program: &Program) -> Analysis {
    SemanticAnalyzer::new().analyze(program)
}

/// Result of running the whole pipeline over a source text
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub program: Program,
    /// Lexical and syntax diagnostics
    pub parse_errors: Vec<Error>,
    pub semantic_errors: Vec<Error>,
    pub globals: Vec<Symbol>,
}

impl CheckOutput {
    pub fn is_ok(&self) -> bool {
        self.parse_errors.is_empty() && self.semantic_errors.is_empty()
    }

    /// Every diagnostic, syntax first
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.parse_errors.iter().chain(&self.semantic_errors)
    }
}

/// Parse and analyze. The analyzer also runs over a partially recovered
/// tree, so semantic problems surface alongside syntax errors.
pub fn check(source: &str) -> CheckOutput {
    let ParseOutput { program, errors } = parse(source);
    let analysis = analyze(&program);
    CheckOutput {
        program,
        parse_errors: errors,
        semantic_errors: analysis.errors,
        globals: analysis.globals,
    }
}
