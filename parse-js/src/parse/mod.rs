use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;

pub mod expr;
pub mod func;
pub mod stmt;
pub mod toplevel;

/// Host-controlled syntax gates, snapshotted from the embedding's compiler
/// environment before parsing begins.
#[derive(Clone, Copy, Default)]
pub struct ParseEnv {
  /// Treat future reserved words (`class`, `enum`, ...) as ordinary
  /// identifiers, as legacy dialects permit.
  pub reserved_keywords_as_identifiers: bool,
  /// Allow `function a.b.c() {}` as sugar for `a.b.c = function() {}`.
  pub member_expr_as_function_name: bool,
  /// Parse toplevel code as strict from the outset (as if a `"use strict"`
  /// directive were present).
  pub strict: bool,
}

// Almost every parse_* function receives these values. Instead of threading
// them as individual parameters, a small copyable struct is passed around.
// It should be received by value; altered copies (via the with_* methods) are
// passed to callees when a nested region changes the rules.
#[derive(Clone, Copy)]
pub struct ParseCtx {
  /// Whether the enclosing code is strict.
  pub strict: bool,
  /// Whether the `in` operator is currently allowed (off inside `for` header
  /// init clauses).
  pub allow_in: bool,
}

impl ParseCtx {
  pub fn with_strict(&self, strict: bool) -> ParseCtx {
    ParseCtx { strict, ..*self }
  }

  pub fn with_allow_in(&self, allow_in: bool) -> ParseCtx {
    ParseCtx { allow_in, ..*self }
  }
}

#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn loc(&self) -> Loc {
    self.loc
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }
}

pub struct ParserCheckpoint {
  next_tok_i: usize,
}

/// To get the lexer's position after this token was lexed, use `token.loc.1`.
struct BufferedToken {
  token: Token,
  lex_mode: LexMode,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  buf: Vec<BufferedToken>,
  next_tok_i: usize,
  env: ParseEnv,
}

// Parsing is implemented as methods extended across the submodules, instead
// of free functions taking `&mut Parser`, for lifetime elision and so call
// sites read as `self.parse_*`.
impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>, env: ParseEnv) -> Parser<'a> {
    Parser {
      lexer,
      buf: Vec::new(),
      next_tok_i: 0,
      env,
    }
  }

  pub fn env(&self) -> ParseEnv {
    self.env
  }

  pub fn str(&self, loc: Loc) -> &str {
    &self.lexer[loc]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
    }
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
  }

  fn reset_to(&mut self, n: usize) {
    self.next_tok_i = n;
    self.buf.truncate(n);
    match self.buf.last() {
      Some(t) => self.lexer.set_next(t.token.loc.1),
      None => self.lexer.set_next(0),
    };
  }

  fn forward<K: FnOnce(&Token) -> bool>(&mut self, mode: LexMode, keep: K) -> (bool, Token) {
    // A token lexed under a different mode must be re-lexed (e.g. `/` as a
    // division operator vs. the start of a regex literal).
    if self
      .buf
      .get(self.next_tok_i)
      .is_some_and(|t| t.lex_mode != mode)
    {
      self.reset_to(self.next_tok_i);
    }
    debug_assert!(self.next_tok_i <= self.buf.len());
    if self.buf.len() == self.next_tok_i {
      let token = lex_next(&mut self.lexer, mode);
      self.buf.push(BufferedToken {
        token,
        lex_mode: mode,
      });
    }
    let t = self.buf[self.next_tok_i].token.clone();
    let k = keep(&t);
    if k {
      self.next_tok_i += 1;
    };
    (k, t)
  }

  pub fn consume_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| true).1
  }

  pub fn consume(&mut self) -> Token {
    self.consume_with_mode(LexMode::Standard)
  }

  pub fn peek_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| false).1
  }

  pub fn peek(&mut self) -> Token {
    self.peek_with_mode(LexMode::Standard)
  }

  pub fn peek_nth(&mut self, n: usize) -> Token {
    let cp = self.checkpoint();
    let mut token = self.consume();
    for _ in 0..n {
      token = self.consume();
    }
    self.restore_checkpoint(cp);
    token
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    let (matched, t) = self.forward(LexMode::Standard, |t| t.typ == typ);
    MaybeToken {
      typ,
      matched,
      loc: t.loc,
    }
  }

  pub fn require_with_mode(&mut self, typ: TT, mode: LexMode) -> SyntaxResult<Token> {
    let t = self.consume_with_mode(mode);
    if t.typ != typ {
      Err(t.error(if t.typ == TT::EOF {
        SyntaxErrorType::UnexpectedEnd
      } else {
        SyntaxErrorType::RequiredTokenNotFound(typ)
      }))
    } else {
      Ok(t)
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    self.require_with_mode(typ, LexMode::Standard)
  }

  /// Consume a statement terminator, applying automatic semicolon insertion.
  pub fn require_semicolon(&mut self) -> SyntaxResult<()> {
    let t = self.peek();
    match t.typ {
      TT::Semicolon => {
        self.consume();
        Ok(())
      }
      TT::BraceClose | TT::EOF => Ok(()),
      _ if t.preceded_by_line_terminator => Ok(()),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("semicolon"))),
    }
  }
}
