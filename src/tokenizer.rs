//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer never fails. Runs it cannot classify are recorded as
//! warnings and skipped, and any other stray character is dropped silently.
//! Any of `& | = ! < >` followed by `& | =` is scanned as one two-character token.

use log::warn;

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Punctuator,
  Keyword,
  Ident,
  Num,
  Eof,
}

/// A token refers back into the source by byte offset and length.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

/// A non-fatal lexical problem: the offending text was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexWarning {
  pub loc: usize,
  pub text: String,
  pub message: String,
}

/// Result of a scan: the token stream (always `Eof`-terminated) and any warnings.
#[derive(Debug, Clone)]
pub struct Tokens {
  pub tokens: Vec<Token>,
  pub warnings: Vec<LexWarning>,
}

const KEYWORDS: [&str; 2] = ["int", "return"];

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> Tokens {
  let mut tokens = Vec::new();
  let mut warnings = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];

    if is_word_byte(c) {
      let start = i;
      while i < bytes.len() && is_word_byte(bytes[i]) {
        i += 1;
      }
      let word = &input[start..i];
      match classify_word(word) {
        Some(kind) => tokens.push(Token::new(kind, start, i - start)),
        None => report(&mut warnings, start, word, "unknown identifier"),
      }
      continue;
    }

    if matches!(c, b'&' | b'|' | b'=' | b'!' | b'<' | b'>') {
      // Any pair ending in `&`, `|` or `=` is one token. Pairs that are not
      // operators (`>|`, `!&`, ...) are left for the parser to reject.
      if matches!(bytes.get(i + 1), Some(b'&' | b'|' | b'=')) {
        tokens.push(Token::new(TokenKind::Punctuator, i, 2));
        i += 2;
        continue;
      }

      // `&` and `|` only exist as halves of a pair.
      if matches!(c, b'&' | b'|') {
        report(&mut warnings, i, &input[i..i + 1], "unknown token");
      } else {
        tokens.push(Token::new(TokenKind::Punctuator, i, 1));
      }
      i += 1;
      continue;
    }

    if matches!(
      c,
      b'{' | b'}' | b'(' | b')' | b';' | b'-' | b'~' | b'+' | b'*' | b'/'
    ) {
      tokens.push(Token::new(TokenKind::Punctuator, i, 1));
      i += 1;
      continue;
    }

    // Whitespace and anything else unrecognised. Step over a whole UTF-8
    // sequence so later slicing stays on char boundaries.
    i += input[i..].chars().next().map_or(1, char::len_utf8);
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  Tokens { tokens, warnings }
}

fn is_word_byte(c: u8) -> bool {
  c.is_ascii_alphanumeric() || c == b'_'
}

fn classify_word(word: &str) -> Option<TokenKind> {
  if KEYWORDS.contains(&word) {
    return Some(TokenKind::Keyword);
  }
  let first = word.as_bytes().first()?;
  if first.is_ascii_digit() {
    word
      .bytes()
      .all(|b| b.is_ascii_digit())
      .then_some(TokenKind::Num)
  } else {
    Some(TokenKind::Ident)
  }
}

fn report(warnings: &mut Vec<LexWarning>, loc: usize, text: &str, message: &str) {
  warn!("{message} at byte {loc}: {text:?}, skipping");
  warnings.push(LexWarning {
    loc,
    text: text.to_string(),
    message: message.to_string(),
  });
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
