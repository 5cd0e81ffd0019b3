//! Toolchain for a small statically typed imperative language.
//!
//! Source text flows through [`lexer`], [`parser`] and [`analyzer`] before
//! reaching one of the [`backend`]s. The functions below chain the phases and
//! attach context to whichever phase fails.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

pub mod analyzer;
pub mod ast;
pub mod backend;
pub mod environment;
pub mod lexer;
pub mod parser;

use analyzer::{Analyzer, Annotations};
use ast::Source;
use backend::generator::Generator;
use backend::interpreter::Interpreter;
use environment::PlcObject;
use lexer::Token;

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let tokens = lexer::tokenize(input).context("Lexing failed")?;
    debug!(tokens = tokens.len(), "lexed input");
    Ok(tokens)
}

pub fn parse(input: &str) -> Result<Source> {
    let tokens = tokenize(input)?;
    let source = parser::parse_tokens(tokens).context("Parsing failed")?;
    debug!(
        globals = source.globals.len(),
        functions = source.functions.len(),
        "parsed source"
    );
    Ok(source)
}

pub fn analyze(source: &Source) -> Result<Annotations> {
    let annotations = Analyzer::new()
        .analyze(source)
        .context("Analysis failed")?;
    debug!(
        types = annotations.type_count(),
        bindings = annotations.binding_count(),
        "analyzed source"
    );
    Ok(annotations)
}

/// Runs `main()` with `print` writing to `output`.
pub fn interpret<W: Write>(source: &Source, output: W) -> Result<PlcObject> {
    let mut interpreter = Interpreter::with_output(output);
    let result = interpreter.run(source).context("Evaluation failed")?;
    interpreter
        .into_output()
        .flush()
        .context("Flushing program output")?;
    Ok(result)
}

/// Analyzes `source` and emits its Java translation.
pub fn generate(source: &Source) -> Result<String> {
    let annotations = analyze(source)?;
    let output = Generator::new(&annotations)
        .generate(source)
        .context("Generation failed")?;
    Ok(output)
}
