//! Code generation: lower the parsed AST into AT&T x86-64 assembly.
//!
//! Every expression leaves its value in `%rax`. A binary node saves its left
//! operand on the machine stack while the right one is evaluated, then pops
//! it into `%rdi`, so `%rdi` holds the left value and `%rax` the right value
//! when the operator is applied.
//!
//! Generation is a post-order walk: each helper returns the text for its
//! subtree and the parent splices it in. The only state is the label counter,
//! owned by one `CodeGen` per `generate` call.

use log::{debug, trace};

use crate::parser::{AstNode, BinaryOp, Function, Program, Stmt, UnaryOp};

/// Emit assembly for a whole program.
pub fn generate(program: &Program) -> String {
  let mut codegen = CodeGen::default();
  let asm = codegen.emit_program(program);
  debug!(
    "generated {} lines, {} short-circuit labels",
    asm.lines().count(),
    codegen.label_count * 2
  );
  asm
}

#[derive(Debug, Default)]
struct CodeGen {
  label_count: usize,
}

impl CodeGen {
  /// Hand out a fresh pair of labels for one `&&`/`||` node.
  fn new_labels(&mut self, prefix: &str) -> (String, String) {
    let n = self.label_count;
    self.label_count += 1;
    (format!(".L.{prefix}_rhs.{n}"), format!(".L.{prefix}_end.{n}"))
  }

  fn emit_program(&mut self, program: &Program) -> String {
    let mut asm = format!(".global {}\n", program.function.name);
    asm.push_str(&self.emit_function(&program.function));
    asm.push_str(NOEXEC_STACK);
    asm
  }

  fn emit_function(&mut self, func: &Function) -> String {
    let mut asm = format!("{}:\n", func.name);
    asm.push_str(&self.emit_stmt(&func.body));
    asm.push_str("    ret\n");
    asm
  }

  fn emit_stmt(&mut self, stmt: &Stmt) -> String {
    match stmt {
      Stmt::Return(expr) => self.emit_expr(expr),
    }
  }

  fn emit_expr(&mut self, node: &AstNode) -> String {
    trace!("emit {node:?}");
    match node {
      AstNode::Num { value } => format!("    mov ${value}, %rax\n"),
      AstNode::Unary { op, operand } => {
        let mut asm = self.emit_expr(operand);
        match op {
          UnaryOp::Neg => asm.push_str("    neg %rax\n"),
          UnaryOp::BitNot => asm.push_str("    not %rax\n"),
          UnaryOp::LogicalNot => {
            asm.push_str("    cmp $0, %rax\n");
            asm.push_str("    sete %al\n");
            asm.push_str("    movzbl %al, %eax\n");
          }
        }
        asm
      }
      AstNode::Binary { op, lhs, rhs } => self.emit_binary(*op, lhs, rhs),
    }
  }

  fn emit_binary(&mut self, op: BinaryOp, lhs: &AstNode, rhs: &AstNode) -> String {
    let combine = match op {
      BinaryOp::LogAnd => return self.emit_logical_and(lhs, rhs),
      BinaryOp::LogOr => return self.emit_logical_or(lhs, rhs),
      BinaryOp::Add => "    add %rdi, %rax\n",
      BinaryOp::Sub => "    sub %rax, %rdi\n    mov %rdi, %rax\n",
      BinaryOp::Mul => "    imul %rdi, %rax\n",
      BinaryOp::Div => "    xchg %rdi, %rax\n    cqo\n    idiv %rdi\n",
      BinaryOp::Eq => "    cmp %rax, %rdi\n    sete %al\n    movzbl %al, %eax\n",
      BinaryOp::Ne => "    cmp %rax, %rdi\n    setne %al\n    movzbl %al, %eax\n",
      BinaryOp::Lt => "    cmp %rax, %rdi\n    setl %al\n    movzbl %al, %eax\n",
      BinaryOp::Le => "    cmp %rax, %rdi\n    setle %al\n    movzbl %al, %eax\n",
      BinaryOp::Gt => "    cmp %rax, %rdi\n    setg %al\n    movzbl %al, %eax\n",
      BinaryOp::Ge => "    cmp %rax, %rdi\n    setge %al\n    movzbl %al, %eax\n",
    };

    let mut asm = self.emit_expr(lhs);
    asm.push_str("    push %rax\n");
    asm.push_str(&self.emit_expr(rhs));
    asm.push_str("    pop %rdi\n");
    asm.push_str(combine);
    asm
  }

  /// `lhs && rhs`: a zero left operand jumps straight to the exit with
  /// `%rax` already 0.
  fn emit_logical_and(&mut self, lhs: &AstNode, rhs: &AstNode) -> String {
    let (rhs_label, end_label) = self.new_labels("and");
    let mut asm = self.emit_expr(lhs);
    asm.push_str("    cmp $0, %rax\n");
    asm.push_str(&format!("    jne {rhs_label}\n"));
    asm.push_str(&format!("    jmp {end_label}\n"));
    asm.push_str(&format!("{rhs_label}:\n"));
    asm.push_str(&self.emit_expr(rhs));
    asm.push_str(NORMALIZE);
    asm.push_str(&format!("{end_label}:\n"));
    asm
  }

  /// `lhs || rhs`: a nonzero left operand loads 1 and jumps to the exit.
  fn emit_logical_or(&mut self, lhs: &AstNode, rhs: &AstNode) -> String {
    let (rhs_label, end_label) = self.new_labels("or");
    let mut asm = self.emit_expr(lhs);
    asm.push_str("    cmp $0, %rax\n");
    asm.push_str(&format!("    je {rhs_label}\n"));
    asm.push_str("    mov $1, %rax\n");
    asm.push_str(&format!("    jmp {end_label}\n"));
    asm.push_str(&format!("{rhs_label}:\n"));
    asm.push_str(&self.emit_expr(rhs));
    asm.push_str(NORMALIZE);
    asm.push_str(&format!("{end_label}:\n"));
    asm
  }
}

/// Marks the object as not needing an executable stack.
const NOEXEC_STACK: &str = ".section .note.GNU-stack,\"\",@progbits\n";

/// Collapse `%rax` to 0 or 1.
const NORMALIZE: &str = "    cmp $0, %rax\n    setne %al\n    movzbl %al, %eax\n";

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_source;

  fn compile(source: &str) -> String {
    generate(&parse_source(source).unwrap())
  }

  fn labels(asm: &str) -> Vec<&str> {
    asm
      .lines()
      .filter_map(|line| line.strip_suffix(':'))
      .filter(|label| label.starts_with(".L."))
      .collect()
  }

  #[test]
  fn return_constant() {
    assert_eq!(
      compile("int main() { return 2; }"),
      ".global main\nmain:\n    mov $2, %rax\n    ret\n\
       .section .note.GNU-stack,\"\",@progbits\n"
    );
  }

  #[test]
  fn stack_note_follows_function() {
    let asm = compile("int main() { return 0 || 1; }");
    assert!(asm.ends_with("    ret\n.section .note.GNU-stack,\"\",@progbits\n"));
    assert_eq!(asm.matches(".section").count(), 1);
  }

  #[test]
  fn function_name_is_exported() {
    let asm = compile("int answer() { return 42; }");
    assert!(asm.starts_with(".global answer\nanswer:\n"));
  }

  #[test]
  fn unary_operators() {
    assert!(compile("int main() { return -5; }").contains("    mov $5, %rax\n    neg %rax\n"));
    assert!(compile("int main() { return ~0; }").contains("    mov $0, %rax\n    not %rax\n"));
    assert!(
      compile("int main() { return !5; }")
        .contains("    mov $5, %rax\n    cmp $0, %rax\n    sete %al\n    movzbl %al, %eax\n")
    );
  }

  #[test]
  fn binary_saves_left_operand_on_stack() {
    assert_eq!(
      compile("int main() { return 8 - 4; }"),
      ".global main\nmain:\n\
       \x20   mov $8, %rax\n\
       \x20   push %rax\n\
       \x20   mov $4, %rax\n\
       \x20   pop %rdi\n\
       \x20   sub %rax, %rdi\n\
       \x20   mov %rdi, %rax\n\
       \x20   ret\n\
       .section .note.GNU-stack,\"\",@progbits\n"
    );
  }

  #[test]
  fn division_restores_operand_order() {
    let asm = compile("int main() { return 9 / 3; }");
    assert!(asm.contains("    pop %rdi\n    xchg %rdi, %rax\n    cqo\n    idiv %rdi\n"));
  }

  #[test]
  fn comparisons_use_matching_condition() {
    for (op, set) in [
      ("==", "sete"),
      ("!=", "setne"),
      ("<", "setl"),
      ("<=", "setle"),
      (">", "setg"),
      (">=", "setge"),
    ] {
      let asm = compile(&format!("int main() {{ return 1 {op} 2; }}"));
      assert!(
        asm.contains(&format!("    cmp %rax, %rdi\n    {set} %al\n")),
        "{op}: {asm}"
      );
    }
  }

  #[test]
  fn or_bypasses_right_operand() {
    let asm = compile("int main() { return 1 || 2; }");
    let jump = asm.find("    jmp .L.or_end.0").unwrap();
    let rhs = asm.find("    mov $2, %rax").unwrap();
    let end = asm.find(".L.or_end.0:").unwrap();
    assert!(jump < rhs && rhs < end);
    assert!(asm.contains("    je .L.or_rhs.0\n    mov $1, %rax\n"));
  }

  #[test]
  fn and_bypasses_right_operand() {
    let asm = compile("int main() { return 0 && 2; }");
    let jump = asm.find("    jmp .L.and_end.0").unwrap();
    let rhs = asm.find("    mov $2, %rax").unwrap();
    let end = asm.find(".L.and_end.0:").unwrap();
    assert!(jump < rhs && rhs < end);
  }

  #[test]
  fn nested_logical_labels_are_distinct() {
    let asm = compile("int main() { return (1 || 0) && (0 || 1) && !(2 && 3); }");
    let found = labels(&asm);
    assert_eq!(found.len(), 10);
    let mut unique = found.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), found.len());
  }

  #[test]
  fn output_is_reproducible() {
    let source = "int main() { return 1 && 2 || 3; }";
    let first = compile(source);
    let second = compile(source);
    assert_eq!(first, second);
    assert_eq!(
      labels(&first),
      vec![".L.and_rhs.1", ".L.and_end.1", ".L.or_rhs.0", ".L.or_end.0"]
    );
  }
}
