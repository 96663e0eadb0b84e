//! Recursive-descent parser producing a single-function program AST.
//!
//! Each precedence level owns one helper and delegates tighter-binding
//! operators to the next one down, chibicc style. Binary levels fold to the
//! left; unary operators recurse and therefore nest to the right. The first
//! unexpected token aborts the parse: there is no recovery and no partial tree.
//!
//! Nesting is capped at `MAX_NESTING`, which bounds tree height so the
//! recursive walks that follow (code generation, pretty printing, drop) stay
//! within the stack.

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Unary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  BitNot,
  LogicalNot,
}

impl UnaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      UnaryOp::Neg => "-",
      UnaryOp::BitNot => "~",
      UnaryOp::LogicalNot => "!",
    }
  }
}

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
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
  LogAnd,
  LogOr,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Eq => "==",
      BinaryOp::Ne => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::Le => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::Ge => ">=",
      BinaryOp::LogAnd => "&&",
      BinaryOp::LogOr => "||",
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Unary {
    op: UnaryOp,
    operand: Box<AstNode>,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn unary(op: UnaryOp, operand: AstNode) -> Self {
    Self::Unary {
      op,
      operand: Box::new(operand),
    }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

/// The only statement form: `return <expr>;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  Return(AstNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
  pub name: String,
  pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
  pub function: Function,
}

/// Parse a whole program from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);

  let function = parse_function(&mut stream)?;

  if !stream.is_eof() {
    let (loc, got) = stream.describe_current();
    return Err(CompileError::at(
      source,
      loc,
      format!("unexpected token \"{got}\" after function body"),
    ));
  }

  Ok(Program { function })
}

fn parse_function(stream: &mut TokenStream) -> CompileResult<Function> {
  stream.expect_keyword("int")?;
  let name = stream.get_ident()?;
  stream.skip("(")?;
  stream.skip(")")?;
  stream.skip("{")?;
  let body = parse_stmt(stream)?;
  stream.skip("}")?;
  Ok(Function { name, body })
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.expect_keyword("return")?;
  let expr = parse_expr(stream)?;
  stream.skip(";")?;
  Ok(Stmt::Return(expr))
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_logical_or(stream)
}

/// One left-folding binary precedence level: `next ( op next )*`.
fn parse_binary_level(
  stream: &mut TokenStream,
  ops: &[(&str, BinaryOp)],
  next: fn(&mut TokenStream) -> CompileResult<AstNode>,
) -> CompileResult<AstNode> {
  let mut node = next(stream)?;
  // Every fold puts the tree built so far one level deeper.
  let mut folds = 0;

  loop {
    let Some(op) = ops
      .iter()
      .find(|(symbol, _)| stream.equal(symbol))
      .map(|(_, op)| *op)
    else {
      break;
    };

    stream.enter()?;
    folds += 1;
    let rhs = next(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  stream.leave(folds);
  Ok(node)
}

fn parse_logical_or(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(stream, &[("||", BinaryOp::LogOr)], parse_logical_and)
}

fn parse_logical_and(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(stream, &[("&&", BinaryOp::LogAnd)], parse_equality)
}

fn parse_equality(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(
    stream,
    &[("==", BinaryOp::Eq), ("!=", BinaryOp::Ne)],
    parse_relational,
  )
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(
    stream,
    &[
      ("<", BinaryOp::Lt),
      ("<=", BinaryOp::Le),
      (">", BinaryOp::Gt),
      (">=", BinaryOp::Ge),
    ],
    parse_add,
  )
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(
    stream,
    &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
    parse_mul,
  )
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_binary_level(
    stream,
    &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)],
    parse_unary,
  )
}

fn parse_unary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  // `-9223372036854775808` is only spelled through negation of its literal.
  if stream.equal("-") {
    stream.enter()?;
    let operand = if stream.at_number() {
      AstNode::number(stream.get_number(true)?)
    } else {
      parse_unary(stream)?
    };
    stream.leave(1);
    return Ok(AstNode::unary(UnaryOp::Neg, operand));
  }

  for (symbol, op) in [
    ("~", UnaryOp::BitNot),
    ("!", UnaryOp::LogicalNot),
  ] {
    if stream.equal(symbol) {
      stream.enter()?;
      let operand = parse_unary(stream)?;
      stream.leave(1);
      return Ok(AstNode::unary(op, operand));
    }
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal("(") {
    stream.enter()?;
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    stream.leave(1);
    return Ok(node);
  }

  let value = stream.get_number(false)?;
  Ok(AstNode::number(value))
}

/// Deepest nesting of parentheses, unary operators and operator chains.
pub const MAX_NESTING: usize = 128;

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
  depth: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      depth: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Location and printable text of the current token, `EOF` past the end.
  fn describe_current(&self) -> (usize, String) {
    match self.peek() {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    }
  }

  fn expected(&self, what: &str) -> CompileError {
    let (loc, got) = self.describe_current();
    CompileError::at(
      self.source,
      loc,
      format!("expected {what}, but got \"{got}\""),
    )
  }

  /// Descend one level, failing once `MAX_NESTING` is reached.
  fn enter(&mut self) -> CompileResult<()> {
    if self.depth >= MAX_NESTING {
      let (loc, _) = self.describe_current();
      return Err(CompileError::at(
        self.source,
        loc,
        format!("expression nested too deeply (limit {MAX_NESTING})"),
      ));
    }
    self.depth += 1;
    Ok(())
  }

  fn leave(&mut self, levels: usize) {
    self.depth -= levels;
  }

  fn consume_if(&mut self, kind: TokenKind, text: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == kind
      && token_text(token, self.source) == text
    {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume the current token if it matches the provided punctuator.
  fn equal(&mut self, op: &str) -> bool {
    self.consume_if(TokenKind::Punctuator, op)
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      Err(self.expected(&format!("\"{s}\"")))
    }
  }

  fn expect_keyword(&mut self, keyword: &str) -> CompileResult<()> {
    if self.consume_if(TokenKind::Keyword, keyword) {
      Ok(())
    } else {
      Err(self.expected(&format!("\"{keyword}\"")))
    }
  }

  fn at_number(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Num))
  }

  /// Parse the current token as an integer literal. `negated` admits the one
  /// literal whose magnitude only fits as `i64::MIN`.
  fn get_number(&mut self, negated: bool) -> CompileResult<i64> {
    let Some(token) = self.peek() else {
      return Err(self.expected("an expression"));
    };
    if token.kind != TokenKind::Num {
      return Err(self.expected("an expression"));
    }

    let loc = token.loc;
    let text = token_text(token, self.source);
    let value = match text.parse::<u64>() {
      Ok(v) if v <= i64::MAX as u64 => v as i64,
      Ok(v) if negated && v == i64::MIN.unsigned_abs() => i64::MIN,
      _ => {
        return Err(CompileError::at(
          self.source,
          loc,
          format!("invalid integer literal \"{text}\": does not fit in 64 bits"),
        ));
      }
    };
    self.pos += 1;
    Ok(value)
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> CompileResult<String> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let name = token_text(token, self.source).to_string();
      self.pos += 1;
      return Ok(name);
    }
    Err(self.expected("a function name"))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof) | None)
  }
}
