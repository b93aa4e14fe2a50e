use super::ParseCtx;
use super::Parser;
use crate::ast::expr::AssignOp;
use crate::ast::expr::BinaryOp;
use crate::ast::expr::Expr;
use crate::ast::expr::ObjectProperty;
use crate::ast::expr::PropertyName;
use crate::ast::expr::UnaryOp;
use crate::ast::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::decode_string_literal;
use crate::lex::split_regex_literal;
use crate::lex::LexMode;
use crate::lex::KEYWORDS_MAPPING;
use crate::loc::Loc;
use crate::num::is_legacy_octal_literal;
use crate::num::parse_number_literal;
use crate::token::Token;
use crate::token::TT;

/// Binding strength for binary operators; higher binds tighter.
fn binary_precedence(typ: TT) -> Option<(BinaryOp, u8)> {
  Some(match typ {
    TT::BarBar => (BinaryOp::LogicalOr, 1),
    TT::AmpersandAmpersand => (BinaryOp::LogicalAnd, 2),
    TT::Bar => (BinaryOp::BitOr, 3),
    TT::Caret => (BinaryOp::BitXor, 4),
    TT::Ampersand => (BinaryOp::BitAnd, 5),
    TT::EqualsEquals => (BinaryOp::LooseEq, 6),
    TT::ExclamationEquals => (BinaryOp::LooseNeq, 6),
    TT::EqualsEqualsEquals => (BinaryOp::StrictEq, 6),
    TT::ExclamationEqualsEquals => (BinaryOp::StrictNeq, 6),
    TT::ChevronLeft => (BinaryOp::Lt, 7),
    TT::ChevronRight => (BinaryOp::Gt, 7),
    TT::ChevronLeftEquals => (BinaryOp::Le, 7),
    TT::ChevronRightEquals => (BinaryOp::Ge, 7),
    TT::KeywordIn => (BinaryOp::In, 7),
    TT::KeywordInstanceof => (BinaryOp::Instanceof, 7),
    TT::ChevronLeftChevronLeft => (BinaryOp::ShiftLeft, 8),
    TT::ChevronRightChevronRight => (BinaryOp::ShiftRight, 8),
    TT::ChevronRightChevronRightChevronRight => (BinaryOp::ShiftRightUnsigned, 8),
    TT::Plus => (BinaryOp::Add, 9),
    TT::Hyphen => (BinaryOp::Sub, 9),
    TT::Asterisk => (BinaryOp::Mul, 10),
    TT::Slash => (BinaryOp::Div, 10),
    TT::Percent => (BinaryOp::Mod, 10),
    _ => return None,
  })
}

fn assignment_operator(typ: TT) -> Option<Option<AssignOp>> {
  Some(match typ {
    TT::Equals => None,
    TT::PlusEquals => Some(AssignOp::Add),
    TT::HyphenEquals => Some(AssignOp::Sub),
    TT::AsteriskEquals => Some(AssignOp::Mul),
    TT::SlashEquals => Some(AssignOp::Div),
    TT::PercentEquals => Some(AssignOp::Mod),
    TT::ChevronLeftChevronLeftEquals => Some(AssignOp::ShiftLeft),
    TT::ChevronRightChevronRightEquals => Some(AssignOp::ShiftRight),
    TT::ChevronRightChevronRightChevronRightEquals => Some(AssignOp::ShiftRightUnsigned),
    TT::AmpersandEquals => Some(AssignOp::BitAnd),
    TT::CaretEquals => Some(AssignOp::BitXor),
    TT::BarEquals => Some(AssignOp::BitOr),
    _ => return None,
  })
}

impl<'a> Parser<'a> {
  /// Whether a token can serve as an identifier under the active environment.
  pub fn token_is_identifier(&self, t: &Token) -> bool {
    t.typ == TT::Identifier
      || (t.typ.is_future_reserved() && self.env().reserved_keywords_as_identifiers)
  }

  fn token_identifier_name(&self, t: &Token) -> String {
    if t.typ == TT::Identifier {
      self.string(t.loc)
    } else {
      KEYWORDS_MAPPING[&t.typ].to_string()
    }
  }

  /// Full expression, including the comma operator.
  pub fn parse_expression(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let first = self.parse_assignment(ctx)?;
    if !matches!(self.peek().typ, TT::Comma) {
      return Ok(first);
    }
    let mut loc = first.loc;
    let mut expressions = vec![first];
    while self.consume_if(TT::Comma).is_match() {
      let next = self.parse_assignment(ctx)?;
      loc.extend(next.loc);
      expressions.push(next);
    }
    Ok(Node::new(loc, Expr::Sequence { expressions }))
  }

  pub fn parse_assignment(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let target = self.parse_conditional(ctx)?;
    let t = self.peek();
    let Some(operator) = assignment_operator(t.typ) else {
      return Ok(target);
    };
    if !target.stx.is_assignment_target() {
      return Err(
        target
          .loc
          .error(SyntaxErrorType::InvalidAssignmentTarget, Some(t.typ)),
      );
    }
    self.consume();
    let value = self.parse_assignment(ctx)?;
    let mut loc = target.loc;
    loc.extend(value.loc);
    Ok(Node::new(
      loc,
      Expr::Assignment {
        operator,
        target,
        value,
      },
    ))
  }

  fn parse_conditional(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let test = self.parse_binary(ctx, 0)?;
    if !self.consume_if(TT::Question).is_match() {
      return Ok(test);
    }
    // Both branch expressions permit `in` even inside a `for` header.
    let consequent = self.parse_assignment(ctx.with_allow_in(true))?;
    self.require(TT::Colon)?;
    let alternate = self.parse_assignment(ctx)?;
    let mut loc = test.loc;
    loc.extend(alternate.loc);
    Ok(Node::new(
      loc,
      Expr::Conditional {
        test,
        consequent,
        alternate,
      },
    ))
  }

  fn parse_binary(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<Node<Expr>> {
    let mut left = self.parse_unary(ctx)?;
    loop {
      let t = self.peek();
      let Some((operator, prec)) = binary_precedence(t.typ) else {
        break;
      };
      if prec < min_prec {
        break;
      }
      if operator == BinaryOp::In && !ctx.allow_in {
        break;
      }
      self.consume();
      let right = self.parse_binary(ctx, prec + 1)?;
      let mut loc = left.loc;
      loc.extend(right.loc);
      left = Node::new(
        loc,
        Expr::Binary {
          operator,
          left,
          right,
        },
      );
    }
    Ok(left)
  }

  fn parse_unary(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let t = self.peek();
    let operator = match t.typ {
      TT::Exclamation => Some(UnaryOp::Not),
      TT::Tilde => Some(UnaryOp::BitNot),
      TT::Plus => Some(UnaryOp::Plus),
      TT::Hyphen => Some(UnaryOp::Minus),
      TT::KeywordTypeof => Some(UnaryOp::Typeof),
      TT::KeywordVoid => Some(UnaryOp::Void),
      TT::KeywordDelete => Some(UnaryOp::Delete),
      _ => None,
    };
    if let Some(operator) = operator {
      self.consume();
      let operand = self.parse_unary(ctx)?;
      let mut loc = t.loc;
      loc.extend(operand.loc);
      return Ok(Node::new(loc, Expr::Unary { operator, operand }));
    }
    if matches!(t.typ, TT::PlusPlus | TT::HyphenHyphen) {
      self.consume();
      let operand = self.parse_unary(ctx)?;
      if !operand.stx.is_assignment_target() {
        return Err(
          operand
            .loc
            .error(SyntaxErrorType::InvalidAssignmentTarget, Some(t.typ)),
        );
      }
      let mut loc = t.loc;
      loc.extend(operand.loc);
      return Ok(Node::new(
        loc,
        Expr::Update {
          prefix: true,
          increment: t.typ == TT::PlusPlus,
          operand,
        },
      ));
    }
    self.parse_postfix(ctx)
  }

  fn parse_postfix(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let operand = self.parse_left_hand_side(ctx)?;
    let t = self.peek();
    // The postfix operators are restricted productions: a line terminator
    // before them terminates the expression instead.
    if matches!(t.typ, TT::PlusPlus | TT::HyphenHyphen)
      && !t.preceded_by_line_terminator
      && operand.stx.is_assignment_target()
    {
      self.consume();
      let mut loc = operand.loc;
      loc.extend(t.loc);
      return Ok(Node::new(
        loc,
        Expr::Update {
          prefix: false,
          increment: t.typ == TT::PlusPlus,
          operand,
        },
      ));
    }
    Ok(operand)
  }

  fn parse_left_hand_side(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let base = if self.peek().typ == TT::KeywordNew {
      self.parse_new(ctx)?
    } else {
      self.parse_primary(ctx)?
    };
    self.parse_member_chain(ctx, base, true)
  }

  fn parse_new(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let new_tok = self.require(TT::KeywordNew)?;
    let callee = if self.peek().typ == TT::KeywordNew {
      self.parse_new(ctx)?
    } else {
      let primary = self.parse_primary(ctx)?;
      // Member accesses bind to the constructor; the argument list (if any)
      // belongs to `new`.
      self.parse_member_chain(ctx, primary, false)?
    };
    let mut loc = new_tok.loc;
    loc.extend(callee.loc);
    let arguments = if self.peek().typ == TT::ParenthesisOpen {
      let (arguments, args_loc) = self.parse_arguments(ctx)?;
      loc.extend(args_loc);
      arguments
    } else {
      Vec::new()
    };
    Ok(Node::new(loc, Expr::New { callee, arguments }))
  }

  fn parse_member_chain(
    &mut self,
    ctx: ParseCtx,
    mut base: Node<Expr>,
    allow_call: bool,
  ) -> SyntaxResult<Node<Expr>> {
    loop {
      let t = self.peek();
      match t.typ {
        TT::Dot => {
          self.consume();
          let name_tok = self.consume();
          if name_tok.typ != TT::Identifier && !name_tok.typ.is_keyword() {
            return Err(name_tok.error(if name_tok.typ == TT::EOF {
              SyntaxErrorType::UnexpectedEnd
            } else {
              SyntaxErrorType::ExpectedSyntax("property name")
            }));
          }
          let property = self.string(name_tok.loc);
          let mut loc = base.loc;
          loc.extend(name_tok.loc);
          base = Node::new(
            loc,
            Expr::Member {
              object: base,
              property,
            },
          );
        }
        TT::BracketOpen => {
          self.consume();
          let index = self.parse_expression(ctx.with_allow_in(true))?;
          let close = self.require(TT::BracketClose)?;
          let mut loc = base.loc;
          loc.extend(close.loc);
          base = Node::new(
            loc,
            Expr::Index {
              object: base,
              index,
            },
          );
        }
        TT::ParenthesisOpen if allow_call => {
          let (arguments, args_loc) = self.parse_arguments(ctx)?;
          let mut loc = base.loc;
          loc.extend(args_loc);
          base = Node::new(
            loc,
            Expr::Call {
              callee: base,
              arguments,
            },
          );
        }
        _ => break,
      }
    }
    Ok(base)
  }

  fn parse_arguments(&mut self, ctx: ParseCtx) -> SyntaxResult<(Vec<Node<Expr>>, Loc)> {
    let open = self.require(TT::ParenthesisOpen)?;
    let ctx = ctx.with_allow_in(true);
    let mut arguments = Vec::new();
    let mut loc = open.loc;
    loop {
      let t = self.peek();
      if t.typ == TT::ParenthesisClose {
        self.consume();
        loc.extend(t.loc);
        break;
      }
      if !arguments.is_empty() {
        self.require(TT::Comma)?;
      }
      arguments.push(self.parse_assignment(ctx)?);
    }
    Ok((arguments, loc))
  }

  fn parse_primary(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    // Lex in regex mode: a slash at an expression start begins a regex
    // literal, not a division.
    let t = self.consume_with_mode(LexMode::SlashIsRegex);
    let expr = match t.typ {
      TT::LiteralNumber => {
        let raw = self.string(t.loc);
        if ctx.strict && is_legacy_octal_literal(&raw) {
          return Err(t.error(SyntaxErrorType::OctalInStrictMode));
        }
        let value = parse_number_literal(&raw)
          .ok_or_else(|| t.error(SyntaxErrorType::MalformedLiteralNumber))?;
        Expr::LiteralNumber { value }
      }
      TT::LiteralString => {
        let raw = self.string(t.loc);
        let value = decode_string_literal(&raw)
          .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?;
        Expr::LiteralString { value }
      }
      TT::LiteralRegex => {
        let raw = self.string(t.loc);
        let (pattern, flags) = split_regex_literal(&raw);
        Expr::LiteralRegex {
          pattern: pattern.to_string(),
          flags: flags.to_string(),
        }
      }
      TT::LiteralTrue => Expr::LiteralBool { value: true },
      TT::LiteralFalse => Expr::LiteralBool { value: false },
      TT::LiteralNull => Expr::LiteralNull,
      TT::KeywordThis => Expr::This,
      TT::KeywordFunction => {
        let func = self.parse_func_tail(ctx, false)?;
        let mut loc = t.loc;
        loc.extend(func.loc);
        return Ok(Node::new(loc, Expr::Function { func }));
      }
      TT::ParenthesisOpen => {
        let expr = self.parse_expression(ctx.with_allow_in(true))?;
        let close = self.require(TT::ParenthesisClose)?;
        let mut loc = t.loc;
        loc.extend(close.loc);
        return Ok(Node {
          loc,
          stx: expr.stx,
        });
      }
      TT::BracketOpen => return self.parse_array_literal(ctx, t.loc),
      TT::BraceOpen => return self.parse_object_literal(ctx, t.loc),
      TT::EOF => return Err(t.error(SyntaxErrorType::UnexpectedEnd)),
      typ if typ == TT::Identifier || self.token_is_identifier(&t) => Expr::Identifier {
        name: self.token_identifier_name(&t),
      },
      _ => return Err(t.error(SyntaxErrorType::UnexpectedToken)),
    };
    Ok(Node::new(t.loc, expr))
  }

  fn parse_array_literal(&mut self, ctx: ParseCtx, open: Loc) -> SyntaxResult<Node<Expr>> {
    let ctx = ctx.with_allow_in(true);
    let mut elements = Vec::new();
    let mut loc = open;
    loop {
      let t = self.peek();
      match t.typ {
        TT::BracketClose => {
          self.consume();
          loc.extend(t.loc);
          break;
        }
        TT::Comma => {
          // Elision.
          self.consume();
          elements.push(None);
        }
        _ => {
          elements.push(Some(self.parse_assignment(ctx)?));
          let next = self.peek();
          match next.typ {
            TT::Comma => {
              self.consume();
            }
            TT::BracketClose => {}
            _ => {
              return Err(next.error(if next.typ == TT::EOF {
                SyntaxErrorType::UnexpectedEnd
              } else {
                SyntaxErrorType::RequiredTokenNotFound(TT::BracketClose)
              }))
            }
          }
        }
      }
    }
    Ok(Node::new(loc, Expr::Array { elements }))
  }

  fn parse_object_literal(&mut self, ctx: ParseCtx, open: Loc) -> SyntaxResult<Node<Expr>> {
    let ctx = ctx.with_allow_in(true);
    let mut properties = Vec::new();
    let mut loc = open;
    loop {
      let t = self.peek();
      if t.typ == TT::BraceClose {
        self.consume();
        loc.extend(t.loc);
        break;
      }
      if !properties.is_empty() {
        self.require(TT::Comma)?;
        // Trailing comma.
        let t = self.peek();
        if t.typ == TT::BraceClose {
          self.consume();
          loc.extend(t.loc);
          break;
        }
      }
      let key_tok = self.consume();
      let key = match key_tok.typ {
        TT::Identifier => PropertyName::Identifier(self.string(key_tok.loc)),
        TT::LiteralString => {
          let raw = self.string(key_tok.loc);
          PropertyName::String(
            decode_string_literal(&raw)
              .ok_or_else(|| key_tok.error(SyntaxErrorType::InvalidCharacterEscape))?,
          )
        }
        TT::LiteralNumber => {
          let raw = self.string(key_tok.loc);
          PropertyName::Number(
            parse_number_literal(&raw)
              .ok_or_else(|| key_tok.error(SyntaxErrorType::MalformedLiteralNumber))?,
          )
        }
        TT::EOF => return Err(key_tok.error(SyntaxErrorType::UnexpectedEnd)),
        typ if typ.is_keyword() => PropertyName::Identifier(self.string(key_tok.loc)),
        _ => return Err(key_tok.error(SyntaxErrorType::ExpectedSyntax("property name"))),
      };
      self.require(TT::Colon)?;
      let value = self.parse_assignment(ctx)?;
      properties.push(ObjectProperty { key, value });
    }
    Ok(Node::new(loc, Expr::Object { properties }))
  }
}
