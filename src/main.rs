use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use exprcc::error::WriteOutputSnafu;
use exprcc::tokenizer::{self, Token, TokenKind, token_text};
use exprcc::CompileResult;
use log::{LevelFilter, info};
use snafu::ResultExt;

/// Compile a single `int name() { return <expr>; }` function to x86-64 assembly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Source file to compile
  input: PathBuf,

  /// Write the assembly here instead of standard output
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Print the parsed syntax tree to standard error
  #[arg(short, long)]
  pretty: bool,

  /// Print the token stream to standard error
  #[arg(short, long)]
  tokens: bool,
}

fn run(args: &Args) -> CompileResult<()> {
  let source = exprcc::read_source(&args.input)?;

  let lexed = tokenizer::tokenize(&source);
  if args.tokens {
    dump_tokens(&lexed.tokens, &source);
  }

  let program = exprcc::parse_tokens(lexed, &source)?;
  if args.pretty {
    eprint!("{}", program.pretty_print());
  }

  let asm = exprcc::generate(&program);

  match &args.output {
    Some(path) => {
      fs::write(path, &asm).context(WriteOutputSnafu { path })?;
      info!("wrote {}", path.display());
    }
    None => print!("{asm}"),
  }

  Ok(())
}

fn dump_tokens(tokens: &[Token], source: &str) {
  for token in tokens {
    match token.kind {
      TokenKind::Eof => eprintln!("{:6} {:?}", token.loc, token.kind),
      kind => eprintln!(
        "{:6} {:<12} \"{}\"",
        token.loc,
        format!("{kind:?}"),
        token_text(token, source)
      ),
    }
  }
}

fn main() {
  if let Err(err) = simple_logger::SimpleLogger::new()
    .with_level(LevelFilter::Warn)
    .env()
    .init()
  {
    eprintln!("failed to initialise logger: {err}");
  }

  let args = Args::parse();

  if let Err(err) = run(&args) {
    if err.is_syntax() {
      eprintln!("{}:{err}", args.input.display());
    } else {
      eprintln!("error: {err}");
    }
    process::exit(1);
  }
}
