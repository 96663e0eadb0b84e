//! Indented tree dump of a parsed program, one node per line.

use std::fmt::Write;

use crate::parser::{AstNode, Function, Program, Stmt};

const INDENT: &str = "  ";

pub trait PrettyPrint {
  fn pretty_print(&self, depth: usize, out: &mut String);
}

impl Program {
  /// Render the whole tree, starting at depth zero.
  pub fn pretty_print(&self) -> String {
    let mut out = String::new();
    PrettyPrint::pretty_print(self, 0, &mut out);
    out
  }
}

fn line(out: &mut String, depth: usize, text: std::fmt::Arguments) {
  // Writing into a String cannot fail.
  let _ = writeln!(out, "{}{}", INDENT.repeat(depth), text);
}

impl PrettyPrint for Program {
  fn pretty_print(&self, depth: usize, out: &mut String) {
    line(out, depth, format_args!("Program"));
    self.function.pretty_print(depth + 1, out);
  }
}

impl PrettyPrint for Function {
  fn pretty_print(&self, depth: usize, out: &mut String) {
    line(out, depth, format_args!("Function {}", self.name));
    self.body.pretty_print(depth + 1, out);
  }
}

impl PrettyPrint for Stmt {
  fn pretty_print(&self, depth: usize, out: &mut String) {
    match self {
      Stmt::Return(expr) => {
        line(out, depth, format_args!("Return"));
        expr.pretty_print(depth + 1, out);
      }
    }
  }
}

impl PrettyPrint for AstNode {
  fn pretty_print(&self, depth: usize, out: &mut String) {
    match self {
      AstNode::Num { value } => line(out, depth, format_args!("Num {value}")),
      AstNode::Unary { op, operand } => {
        line(out, depth, format_args!("Unary {}", op.symbol()));
        operand.pretty_print(depth + 1, out);
      }
      AstNode::Binary { op, lhs, rhs } => {
        line(out, depth, format_args!("Binary {}", op.symbol()));
        lhs.pretty_print(depth + 1, out);
        rhs.pretty_print(depth + 1, out);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::parse_source;

  #[test]
  fn dumps_nested_tree() {
    let program = parse_source("int main() { return -(1 + 2) * 3; }").unwrap();
    assert_eq!(
      program.pretty_print(),
      "Program\n\
       \x20 Function main\n\
       \x20   Return\n\
       \x20     Binary *\n\
       \x20       Unary -\n\
       \x20         Binary +\n\
       \x20           Num 1\n\
       \x20           Num 2\n\
       \x20       Num 3\n"
    );
  }
}
