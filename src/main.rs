//! Pico checker
//!
//! Command line driver: parses and checks a source file and reports every
//! diagnostic it finds.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pico_lang::feedback::CheckReport;
use pico_lang::frontend::ast;
use pico_lang::frontend::lexer::Lexer;
use pico_lang::utils::Error;

/// Pico checker
#[derive(Parser, Debug)]
#[command(name = "picoc")]
#[command(version = "0.1.0")]
#[command(about = "Parser and static checker for the Pico language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file, checked when no subcommand is given
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a source file for syntax and semantic errors
    Check {
        /// Input source file
        input: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the syntax tree of a source file
    Parse {
        /// Input source file
        input: PathBuf,
    },
    /// Print the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Check { input, json }) => check_file(input, *json),
        Some(Commands::Parse { input }) => parse_file(input),
        Some(Commands::Tokens { input }) => dump_tokens(input),
        Some(Commands::Version) => {
            println!("picoc 0.1.0");
            println!("Pico parser and checker");
            Ok(true)
        }
        None => match &cli.input {
            Some(input) => check_file(input, false),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: picoc <FILE> or picoc check <FILE>");
                process::exit(1);
            }
        },
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))
}

/// Check a file. Returns whether it was free of diagnostics.
fn check_file(input: &Path, json: bool) -> Result<bool> {
    let name = input.display().to_string();

    if json {
        let report = match fs::read_to_string(input) {
            Ok(source) => CheckReport::new(&name, &source, &pico_lang::check(&source)),
            Err(e) => CheckReport::io_failure(&name, &Error::from(e)),
        };
        println!("{}", report.to_json());
        return Ok(report.success);
    }

    let source = read_source(input)?;
    println!("Checking: {}", name);

    let output = pico_lang::check(&source);
    for error in output.errors() {
        eprintln!("{}", error.render());
    }

    let count = output.errors().count();
    if count == 0 {
        println!("No errors found");
    } else {
        eprintln!("{} error(s) found", count);
    }
    Ok(count == 0)
}

fn parse_file(input: &Path) -> Result<bool> {
    let source = read_source(input)?;
    let output = pico_lang::parse(&source);

    print!("{}", ast::dump(&output.program));
    for error in &output.errors {
        eprintln!("{}", error.render());
    }
    Ok(output.is_ok())
}

fn dump_tokens(input: &Path) -> Result<bool> {
    let source = read_source(input)?;
    let mut clean = true;

    for token in Lexer::new(&source).tokenize() {
        match token.lex_error() {
            Some(kind) => {
                clean = false;
                println!(
                    "{:>4}:{:<4} {:<12} '{}' ({})",
                    token.line(),
                    token.column(),
                    token.kind.category(),
                    token.lexeme,
                    kind
                );
            }
            None => println!(
                "{:>4}:{:<4} {:<12} '{}'",
                token.line(),
                token.column(),
                token.kind.category(),
                token.lexeme
            ),
        }
    }
    Ok(clean)
}
