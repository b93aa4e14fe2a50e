use ast::stmt::Stmt;
use ast::Node;
use error::SyntaxResult;
use lex::Lexer;
use parse::ParseEnv;
use parse::Parser;

pub mod ast;
pub mod char;
pub mod error;
pub mod lex;
pub mod loc;
pub mod num;
pub mod parse;
pub mod token;

/// A parsed program: the toplevel statement list.
#[derive(Debug)]
pub struct Program {
  pub body: Vec<Node<Stmt>>,
  /// Whether the toplevel code is strict (via directive or the environment).
  pub strict: bool,
}

/// Parse `source` as a program with default environment settings.
pub fn parse(source: &str) -> SyntaxResult<Program> {
  parse_with_env(source, ParseEnv::default())
}

/// Parse `source` as a program under the given environment (language gates,
/// strict default).
pub fn parse_with_env(source: &str, env: ParseEnv) -> SyntaxResult<Program> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer, env);
  parser.parse_program()
}
