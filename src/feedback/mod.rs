//! Structured Feedback Module
//!
//! Machine-readable output of a check run:
//! - JSON diagnostic reports
//! - Program statistics

use serde::{Deserialize, Serialize};

use crate::frontend::ast::count_statements;
use crate::utils::Error;
use crate::CheckOutput;

// ==================== Diagnostic Report ====================

/// One diagnostic in serializable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Error code (e.g., "E0201")
    pub code: String,

    /// "Lexical", "Parse", "Semantic" or "IO"
    pub phase: String,

    /// Human-readable message
    pub message: String,

    /// 1-based position, absent for I/O errors
    pub line: Option<usize>,
    pub column: Option<usize>,

    /// Offending lexeme or variable name
    pub lexeme: Option<String>,
}

impl DiagnosticReport {
    pub fn from_error(error: &Error) -> Self {
        let span = error.span();
        Self {
            code: error.code().to_string(),
            phase: error.phase().to_string(),
            message: error.to_string(),
            line: span.map(|s| s.line),
            column: span.map(|s| s.column),
            lexeme: error.lexeme().map(str::to_string),
        }
    }
}

// ==================== Check Report ====================

/// Complete result of checking one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub success: bool,
    pub source_file: String,
    pub diagnostics: Vec<DiagnosticReport>,
    pub stats: CheckStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckStats {
    /// Statements in the recovered tree, nested ones included
    pub statements: usize,
    /// Variables declared at the top level
    pub globals: usize,
    /// Lines of source
    pub lines: usize,
}

impl CheckReport {
    pub fn new(source_file: &str, source: &str, output: &CheckOutput) -> Self {
        let diagnostics: Vec<_> = output.errors().map(DiagnosticReport::from_error).collect();
        Self {
            success: diagnostics.is_empty(),
            source_file: source_file.to_string(),
            diagnostics,
            stats: CheckStats {
                statements: count_statements(&output.program.stmts),
                globals: output.globals.len(),
                lines: source.lines().count(),
            },
        }
    }

    /// Report for a file that could not be read
    pub fn io_failure(source_file: &str, error: &Error) -> Self {
        Self {
            success: false,
            source_file: source_file.to_string(),
            diagnostics: vec![DiagnosticReport::from_error(error)],
            stats: CheckStats::default(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
