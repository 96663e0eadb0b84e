//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream,
//!   skipping (and reporting) anything it cannot classify.
//! - `parser` owns all syntactic knowledge and returns a single-function AST.
//! - `codegen` lowers the AST into x86-64 AT&T assembly.
//! - `pretty` renders the AST as an indented tree for debugging.
//! - `error` centralises the error type shared by the other modules.

pub mod error;
pub mod parser;
pub mod pretty;
pub mod tokenizer;

mod codegen;

use std::fs;
use std::path::Path;

use log::debug;
use snafu::ResultExt;

pub use error::{CompileError, CompileResult};
pub use parser::Program;
pub use tokenizer::Tokens;

/// Tokenize and parse a source string into a program AST.
pub fn parse_source(source: &str) -> CompileResult<Program> {
  parse_tokens(tokenizer::tokenize(source), source)
}

/// Parse an already tokenized source.
pub fn parse_tokens(lexed: Tokens, source: &str) -> CompileResult<Program> {
  debug!(
    "lexed {} tokens, {} warnings",
    lexed.tokens.len(),
    lexed.warnings.len()
  );
  let program = parser::parse(lexed.tokens, source)?;
  debug!("parsed function `{}`", program.function.name);
  Ok(program)
}

/// Lower an already parsed program into assembly text.
pub fn generate(program: &Program) -> String {
  codegen::generate(program)
}

/// Compile a source string into AT&T assembly.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let program = parse_source(source)?;
  Ok(codegen::generate(&program))
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> CompileResult<String> {
  fs::read_to_string(path).context(error::ReadSourceSnafu { path })
}

/// Read a source file and compile it into AT&T assembly.
pub fn compile_file(path: &Path) -> CompileResult<String> {
  generate_assembly(&read_source(path)?)
}
