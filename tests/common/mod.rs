use exprcc::Program;
use exprcc::parser::{AstNode, BinaryOp, Stmt, UnaryOp};

/// Evaluate the returned expression of a parsed program with C semantics on
/// 64-bit integers.
pub fn evaluate(program: &Program) -> i64 {
  let Stmt::Return(expr) = &program.function.body;
  eval(expr)
}

fn eval(node: &AstNode) -> i64 {
  match node {
    AstNode::Num { value } => *value,
    AstNode::Unary { op, operand } => {
      let v = eval(operand);
      match op {
        UnaryOp::Neg => v.wrapping_neg(),
        UnaryOp::BitNot => !v,
        UnaryOp::LogicalNot => (v == 0) as i64,
      }
    }
    AstNode::Binary {
      op: BinaryOp::LogAnd,
      lhs,
      rhs,
    } => (eval(lhs) != 0 && eval(rhs) != 0) as i64,
    AstNode::Binary {
      op: BinaryOp::LogOr,
      lhs,
      rhs,
    } => (eval(lhs) != 0 || eval(rhs) != 0) as i64,
    AstNode::Binary { op, lhs, rhs } => {
      let (l, r) = (eval(lhs), eval(rhs));
      match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => l / r,
        BinaryOp::Eq => (l == r) as i64,
        BinaryOp::Ne => (l != r) as i64,
        BinaryOp::Lt => (l < r) as i64,
        BinaryOp::Le => (l <= r) as i64,
        BinaryOp::Gt => (l > r) as i64,
        BinaryOp::Ge => (l >= r) as i64,
        BinaryOp::LogAnd | BinaryOp::LogOr => unreachable!(),
      }
    }
  }
}

/// Smoke programs and the value `main` returns.
pub const SMOKE: &[(&str, i64)] = &[
  ("int main(){return 2;}", 2),
  ("int main(){return -5;}", -5),
  ("int main(){return ~0;}", -1),
  ("int main(){return !5;}", 0),
  ("int main(){return 1+2*3;}", 7),
  ("int main(){return (1+2)*3;}", 9),
  ("int main(){return 8 - 4 - 2;}", 2),
  ("int main(){return !!0;}", 0),
  ("int main(){return 20 / 3 / 2;}", 3),
  ("int main(){return -7 / 2;}", -3),
  ("int main(){return 1 < 2 == 3 > 2;}", 1),
  ("int main(){return 2 >= 3 != 4 <= 4;}", 1),
  ("int main(){return 0 || 3 && 4;}", 1),
  ("int main(){return 0 && 1 || 0;}", 0),
  ("int main(){return 5 && (0 || 0);}", 0),
];
