use super::ParseCtx;
use super::Parser;
use crate::ast::func::Func;
use crate::ast::stmt::Stmt;
use crate::ast::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;

const USE_STRICT: &str = "use strict";

impl<'a> Parser<'a> {
  /// Parse a function definition after the `function` keyword has been
  /// consumed.
  pub fn parse_func_tail(&mut self, ctx: ParseCtx, require_name: bool) -> SyntaxResult<Node<Func>> {
    let start = self.peek().loc;
    let name_tok = self.peek();
    let name = if self.token_is_identifier(&name_tok) {
      self.consume();
      Some(self.string(name_tok.loc))
    } else {
      if require_name {
        return Err(name_tok.error(if name_tok.typ == TT::EOF {
          SyntaxErrorType::UnexpectedEnd
        } else {
          SyntaxErrorType::ExpectedSyntax("function name")
        }));
      }
      None
    };

    let params = self.parse_func_params(ctx)?;
    self.require(TT::BraceOpen)?;
    let (body, strict) = self.parse_directive_body(ctx, &params)?;
    let close = self.require(TT::BraceClose)?;

    let mut loc = start;
    loc.extend(close.loc);
    Ok(Node::new(
      loc,
      Func {
        name,
        params,
        body,
        strict,
      },
    ))
  }

  pub fn parse_func_params(&mut self, _ctx: ParseCtx) -> SyntaxResult<Vec<String>> {
    self.require(TT::ParenthesisOpen)?;
    let mut params = Vec::<String>::new();
    loop {
      let t = self.peek();
      if t.typ == TT::ParenthesisClose {
        self.consume();
        break;
      }
      if !params.is_empty() {
        self.require(TT::Comma)?;
      }
      let t = self.peek();
      if !self.token_is_identifier(&t) {
        return Err(t.error(if t.typ == TT::EOF {
          SyntaxErrorType::UnexpectedEnd
        } else {
          SyntaxErrorType::ExpectedSyntax("parameter name")
        }));
      }
      self.consume();
      params.push(self.string(t.loc));
    }
    Ok(params)
  }

  /// Parse a statement list with a directive prologue, up to (not including)
  /// the terminator (`}` or EOF).
  ///
  /// Returns the statements and whether the body is strict code. Strictness
  /// takes effect for the remainder of the body as soon as the directive is
  /// seen, which matters for e.g. octal literals.
  pub fn parse_directive_body(
    &mut self,
    ctx: ParseCtx,
    params: &[String],
  ) -> SyntaxResult<(Vec<Node<Stmt>>, bool)> {
    let mut body = Vec::new();
    let mut strict = ctx.strict;
    let mut in_prologue = true;
    loop {
      let t = self.peek();
      if matches!(t.typ, TT::BraceClose | TT::EOF) {
        break;
      }
      let stmt = self.parse_statement(ctx.with_strict(strict))?;
      if in_prologue {
        match directive_value(&stmt, t.loc) {
          Some(value) => {
            if value.iter().copied().eq(USE_STRICT.encode_utf16()) {
              strict = true;
              if has_duplicate(params) {
                return Err(
                  t.loc
                    .error(SyntaxErrorType::DuplicateParameter, Some(TT::Identifier)),
                );
              }
            }
          }
          None => in_prologue = false,
        }
      }
      body.push(stmt);
    }
    Ok((body, strict))
  }
}

/// If `stmt` is a lone string-literal expression statement starting at
/// `start`, returns the literal's code units.
fn directive_value(stmt: &Node<Stmt>, start: crate::loc::Loc) -> Option<&[u16]> {
  let Stmt::Expr { expression } = &*stmt.stx else {
    return None;
  };
  match &*expression.stx {
    // A directive is exactly one string literal token, nothing more.
    crate::ast::expr::Expr::LiteralString { value } if expression.loc == start => Some(value),
    _ => None,
  }
}

fn has_duplicate(params: &[String]) -> bool {
  params
    .iter()
    .enumerate()
    .any(|(i, p)| params[..i].contains(p))
}
