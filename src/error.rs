//! Shared error utilities used across the compilation pipeline.
//!
//! Syntax diagnostics point at the offending byte with a caret under the
//! source line that contains it, in the spirit of chibicc. I/O failures keep
//! the path that could not be read or written.

use std::io;
use std::path::PathBuf;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display("{line}:{column}: {message}\n{source_line}\n{marker}"))]
  Syntax {
    line: usize,
    column: usize,
    source_line: String,
    marker: String,
    message: String,
  },

  #[snafu(display("could not read {}: {source}", path.display()))]
  ReadSource { path: PathBuf, source: io::Error },

  #[snafu(display("could not write {}: {source}", path.display()))]
  WriteOutput { path: PathBuf, source: io::Error },
}

impl CompileError {
  /// Construct a syntax error anchored at a specific byte offset in the source.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let loc = clamp_to_boundary(source, loc);
    let line_start = source[..loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[loc..]
      .find('\n')
      .map_or(source.len(), |i| loc + i);

    let line = source[..line_start].matches('\n').count() + 1;
    let column = source[line_start..loc].chars().count() + 1;
    let source_line = source[line_start..line_end].trim_end_matches('\r').to_string();
    let marker = format!("{}^", " ".repeat(column - 1));

    Self::Syntax {
      line,
      column,
      source_line,
      marker,
      message: message.into(),
    }
  }

  /// Line and column of a syntax error, if this is one.
  pub fn location(&self) -> Option<(usize, usize)> {
    match self {
      Self::Syntax { line, column, .. } => Some((*line, *column)),
      _ => None,
    }
  }

  pub fn is_syntax(&self) -> bool {
    matches!(self, Self::Syntax { .. })
  }
}

fn clamp_to_boundary(source: &str, loc: usize) -> usize {
  let mut loc = loc.min(source.len());
  while !source.is_char_boundary(loc) {
    loc -= 1;
  }
  loc
}
