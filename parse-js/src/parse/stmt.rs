use super::ParseCtx;
use super::Parser;
use crate::ast::expr::Expr;
use crate::ast::stmt::CatchClause;
use crate::ast::stmt::ForInLeft;
use crate::ast::stmt::ForInit;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::SwitchCase;
use crate::ast::stmt::VarDeclMode;
use crate::ast::stmt::VarDeclarator;
use crate::ast::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::token::TT;

impl<'a> Parser<'a> {
  pub fn parse_statement(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let t = self.peek();
    match t.typ {
      TT::BraceOpen => self.parse_block(ctx),
      TT::KeywordBreak => self.parse_break_or_continue(ctx, true),
      TT::KeywordContinue => self.parse_break_or_continue(ctx, false),
      TT::KeywordConst => self.parse_var_stmt(ctx, VarDeclMode::Const),
      TT::KeywordDebugger => {
        self.consume();
        self.require_semicolon()?;
        Ok(Node::new(t.loc, Stmt::Debugger))
      }
      TT::KeywordDo => self.parse_do_while(ctx),
      TT::KeywordFor => self.parse_for(ctx),
      TT::KeywordFunction => self.parse_function_decl(ctx),
      TT::KeywordIf => self.parse_if(ctx),
      TT::KeywordLet => self.parse_var_stmt(ctx, VarDeclMode::Let),
      TT::KeywordReturn => self.parse_return(ctx),
      TT::KeywordSwitch => self.parse_switch(ctx),
      TT::KeywordThrow => self.parse_throw(ctx),
      TT::KeywordTry => self.parse_try(ctx),
      TT::KeywordVar => self.parse_var_stmt(ctx, VarDeclMode::Var),
      TT::KeywordWhile => self.parse_while(ctx),
      TT::KeywordWith => self.parse_with(ctx),
      TT::Semicolon => {
        self.consume();
        Ok(Node::new(t.loc, Stmt::Empty))
      }
      TT::Identifier if self.peek_nth(1).typ == TT::Colon => {
        self.consume();
        let label = self.string(t.loc);
        self.consume();
        let body = self.parse_statement(ctx)?;
        let mut loc = t.loc;
        loc.extend(body.loc);
        Ok(Node::new(loc, Stmt::Labeled { label, body }))
      }
      _ => {
        let expression = self.parse_expression(ctx.with_allow_in(true))?;
        self.require_semicolon()?;
        let loc = expression.loc;
        Ok(Node::new(loc, Stmt::Expr { expression }))
      }
    }
  }

  fn parse_block(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let open = self.require(TT::BraceOpen)?;
    let mut body = Vec::new();
    loop {
      let t = self.peek();
      if t.typ == TT::BraceClose {
        break;
      }
      if t.typ == TT::EOF {
        return Err(t.error(SyntaxErrorType::UnexpectedEnd));
      }
      body.push(self.parse_statement(ctx)?);
    }
    let close = self.require(TT::BraceClose)?;
    let mut loc = open.loc;
    loc.extend(close.loc);
    Ok(Node::new(loc, Stmt::Block { body }))
  }

  fn parse_break_or_continue(&mut self, _ctx: ParseCtx, is_break: bool) -> SyntaxResult<Node<Stmt>> {
    let kw = self.consume();
    let mut loc = kw.loc;
    // Label is a restricted production: it must be on the same line.
    let t = self.peek();
    let label = if t.typ == TT::Identifier && !t.preceded_by_line_terminator {
      self.consume();
      loc.extend(t.loc);
      Some(self.string(t.loc))
    } else {
      None
    };
    self.require_semicolon()?;
    Ok(Node::new(loc, if is_break {
      Stmt::Break { label }
    } else {
      Stmt::Continue { label }
    }))
  }

  fn parse_var_stmt(&mut self, ctx: ParseCtx, mode: VarDeclMode) -> SyntaxResult<Node<Stmt>> {
    let decl = self.parse_var_decl(ctx.with_allow_in(true), mode)?;
    self.require_semicolon()?;
    Ok(decl)
  }

  /// Parse a `var`/`let`/`const` declaration without the trailing semicolon
  /// (shared by statements and `for` headers).
  fn parse_var_decl(&mut self, ctx: ParseCtx, mode: VarDeclMode) -> SyntaxResult<Node<Stmt>> {
    let kw = self.consume();
    let mut loc = kw.loc;
    let mut declarators = Vec::new();
    loop {
      let t = self.peek();
      if !self.token_is_identifier(&t) {
        return Err(t.error(if t.typ == TT::EOF {
          SyntaxErrorType::UnexpectedEnd
        } else {
          SyntaxErrorType::ExpectedSyntax("variable name")
        }));
      }
      self.consume();
      loc.extend(t.loc);
      let name = self.string(t.loc);
      let initializer = if self.consume_if(TT::Equals).is_match() {
        let value = self.parse_assignment(ctx)?;
        loc.extend(value.loc);
        Some(value)
      } else {
        None
      };
      declarators.push(VarDeclarator { name, initializer });
      if !self.consume_if(TT::Comma).is_match() {
        break;
      }
    }
    Ok(Node::new(loc, Stmt::VarDecl { mode, declarators }))
  }

  fn parse_do_while(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordDo)?;
    let body = self.parse_statement(ctx)?;
    self.require(TT::KeywordWhile)?;
    self.require(TT::ParenthesisOpen)?;
    let test = self.parse_expression(ctx.with_allow_in(true))?;
    let close = self.require(TT::ParenthesisClose)?;
    // The semicolon after `do..while(..)` is always optional.
    let _ = self.consume_if(TT::Semicolon);
    let mut loc = kw.loc;
    loc.extend(close.loc);
    Ok(Node::new(loc, Stmt::DoWhile { body, test }))
  }

  fn parse_for(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordFor)?;
    self.require(TT::ParenthesisOpen)?;
    let no_in = ctx.with_allow_in(false);

    let t = self.peek();
    let init = match t.typ {
      TT::Semicolon => ForInit::None,
      TT::KeywordVar | TT::KeywordLet | TT::KeywordConst => {
        let mode = match t.typ {
          TT::KeywordVar => VarDeclMode::Var,
          TT::KeywordLet => VarDeclMode::Let,
          _ => VarDeclMode::Const,
        };
        let decl = self.parse_var_decl(no_in, mode)?;
        if self.peek().typ == TT::KeywordIn {
          // `for (var x in obj)`: exactly one declarator, no initializer.
          let Stmt::VarDecl { declarators, .. } = &*decl.stx else {
            unreachable!();
          };
          if declarators.len() != 1 || declarators[0].initializer.is_some() {
            return Err(decl.loc.error(SyntaxErrorType::ForHeaderMalformed, None));
          }
          let name = declarators[0].name.clone();
          return self.parse_for_in_tail(ctx, kw.loc, ForInLeft::Decl { mode, name });
        }
        ForInit::Decl(decl)
      }
      _ => {
        let expr = self.parse_expression(no_in)?;
        if self.peek().typ == TT::KeywordIn {
          if !expr.stx.is_assignment_target() {
            return Err(
              expr
                .loc
                .error(SyntaxErrorType::InvalidAssignmentTarget, Some(TT::KeywordIn)),
            );
          }
          return self.parse_for_in_tail(ctx, kw.loc, ForInLeft::Target(expr));
        }
        ForInit::Expr(expr)
      }
    };

    self.require(TT::Semicolon)?;
    let test = if self.peek().typ == TT::Semicolon {
      None
    } else {
      Some(self.parse_expression(ctx.with_allow_in(true))?)
    };
    self.require(TT::Semicolon)?;
    let update = if self.peek().typ == TT::ParenthesisClose {
      None
    } else {
      Some(self.parse_expression(ctx.with_allow_in(true))?)
    };
    self.require(TT::ParenthesisClose)?;
    let body = self.parse_statement(ctx)?;
    let mut loc = kw.loc;
    loc.extend(body.loc);
    Ok(Node::new(
      loc,
      Stmt::For {
        init,
        test,
        update,
        body,
      },
    ))
  }

  fn parse_for_in_tail(
    &mut self,
    ctx: ParseCtx,
    start: Loc,
    left: ForInLeft,
  ) -> SyntaxResult<Node<Stmt>> {
    self.require(TT::KeywordIn)?;
    let right = self.parse_expression(ctx.with_allow_in(true))?;
    self.require(TT::ParenthesisClose)?;
    let body = self.parse_statement(ctx)?;
    let mut loc = start;
    loc.extend(body.loc);
    Ok(Node::new(loc, Stmt::ForIn { left, right, body }))
  }

  fn parse_function_decl(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordFunction)?;

    // `function a.b.c() {}` as sugar for `a.b.c = function() {}` when the
    // member-expression-name extension is on.
    if self.env().member_expr_as_function_name {
      let name = self.peek();
      if name.typ == TT::Identifier && self.peek_nth(1).typ == TT::Dot {
        self.consume();
        let mut target = Node::new(name.loc, Expr::Identifier {
          name: self.string(name.loc),
        });
        while self.consume_if(TT::Dot).is_match() {
          let prop = self.consume();
          if prop.typ != TT::Identifier && !prop.typ.is_keyword() {
            return Err(prop.error(SyntaxErrorType::ExpectedSyntax("property name")));
          }
          let mut loc = target.loc;
          loc.extend(prop.loc);
          target = Node::new(loc, Expr::Member {
            object: target,
            property: self.string(prop.loc),
          });
        }
        let func = self.parse_func_tail(ctx, false)?;
        let mut loc = kw.loc;
        loc.extend(func.loc);
        let func_loc = func.loc;
        let value = Node::new(func_loc, Expr::Function { func });
        let expression = Node::new(loc, Expr::Assignment {
          operator: None,
          target,
          value,
        });
        return Ok(Node::new(loc, Stmt::Expr { expression }));
      }
    }

    let func = self.parse_func_tail(ctx, true)?;
    let mut loc = kw.loc;
    loc.extend(func.loc);
    Ok(Node::new(loc, Stmt::FunctionDecl { func }))
  }

  fn parse_if(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordIf)?;
    self.require(TT::ParenthesisOpen)?;
    let test = self.parse_expression(ctx.with_allow_in(true))?;
    self.require(TT::ParenthesisClose)?;
    let consequent = self.parse_statement(ctx)?;
    let mut loc = kw.loc;
    loc.extend(consequent.loc);
    let alternate = if self.consume_if(TT::KeywordElse).is_match() {
      let alt = self.parse_statement(ctx)?;
      loc.extend(alt.loc);
      Some(alt)
    } else {
      None
    };
    Ok(Node::new(
      loc,
      Stmt::If {
        test,
        consequent,
        alternate,
      },
    ))
  }

  fn parse_return(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordReturn)?;
    let mut loc = kw.loc;
    let t = self.peek();
    let value = if matches!(t.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
      || t.preceded_by_line_terminator
    {
      None
    } else {
      let value = self.parse_expression(ctx.with_allow_in(true))?;
      loc.extend(value.loc);
      Some(value)
    };
    self.require_semicolon()?;
    Ok(Node::new(loc, Stmt::Return { value }))
  }

  fn parse_switch(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordSwitch)?;
    self.require(TT::ParenthesisOpen)?;
    let discriminant = self.parse_expression(ctx.with_allow_in(true))?;
    self.require(TT::ParenthesisClose)?;
    self.require(TT::BraceOpen)?;
    let mut cases = Vec::<SwitchCase>::new();
    loop {
      let t = self.peek();
      match t.typ {
        TT::BraceClose => break,
        TT::KeywordCase => {
          self.consume();
          let test = self.parse_expression(ctx.with_allow_in(true))?;
          self.require(TT::Colon)?;
          cases.push(SwitchCase {
            test: Some(test),
            body: Vec::new(),
          });
        }
        TT::KeywordDefault => {
          self.consume();
          self.require(TT::Colon)?;
          cases.push(SwitchCase {
            test: None,
            body: Vec::new(),
          });
        }
        TT::EOF => return Err(t.error(SyntaxErrorType::UnexpectedEnd)),
        _ => {
          let stmt = self.parse_statement(ctx)?;
          match cases.last_mut() {
            Some(case) => case.body.push(stmt),
            None => return Err(t.error(SyntaxErrorType::ExpectedSyntax("case clause"))),
          }
        }
      }
    }
    let close = self.require(TT::BraceClose)?;
    let mut loc = kw.loc;
    loc.extend(close.loc);
    Ok(Node::new(
      loc,
      Stmt::Switch {
        discriminant,
        cases,
      },
    ))
  }

  fn parse_throw(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordThrow)?;
    let t = self.peek();
    if t.preceded_by_line_terminator {
      return Err(t.error(SyntaxErrorType::LineTerminatorAfterRestrictedKeyword("throw")));
    }
    let value = self.parse_expression(ctx.with_allow_in(true))?;
    self.require_semicolon()?;
    let mut loc = kw.loc;
    loc.extend(value.loc);
    Ok(Node::new(loc, Stmt::Throw { value }))
  }

  fn parse_try(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordTry)?;
    let block = self.parse_block(ctx)?;
    let mut loc = kw.loc;
    loc.extend(block.loc);

    let catch = if self.consume_if(TT::KeywordCatch).is_match() {
      self.require(TT::ParenthesisOpen)?;
      let param_tok = self.peek();
      if !self.token_is_identifier(&param_tok) {
        return Err(param_tok.error(if param_tok.typ == TT::EOF {
          SyntaxErrorType::UnexpectedEnd
        } else {
          SyntaxErrorType::ExpectedSyntax("catch parameter")
        }));
      }
      self.consume();
      let param = self.string(param_tok.loc);
      self.require(TT::ParenthesisClose)?;
      let body = self.parse_block(ctx)?;
      loc.extend(body.loc);
      Some(CatchClause { param, body })
    } else {
      None
    };

    let finally = if self.consume_if(TT::KeywordFinally).is_match() {
      let body = self.parse_block(ctx)?;
      loc.extend(body.loc);
      Some(body)
    } else {
      None
    };

    if catch.is_none() && finally.is_none() {
      return Err(loc.error(
        SyntaxErrorType::TryStatementHasNoCatchOrFinally,
        Some(self.peek().typ),
      ));
    }
    Ok(Node::new(
      loc,
      Stmt::Try {
        block,
        catch,
        finally,
      },
    ))
  }

  fn parse_while(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordWhile)?;
    self.require(TT::ParenthesisOpen)?;
    let test = self.parse_expression(ctx.with_allow_in(true))?;
    self.require(TT::ParenthesisClose)?;
    let body = self.parse_statement(ctx)?;
    let mut loc = kw.loc;
    loc.extend(body.loc);
    Ok(Node::new(loc, Stmt::While { test, body }))
  }

  fn parse_with(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let kw = self.require(TT::KeywordWith)?;
    if ctx.strict {
      return Err(kw.error(SyntaxErrorType::WithInStrictMode));
    }
    self.require(TT::ParenthesisOpen)?;
    let object = self.parse_expression(ctx.with_allow_in(true))?;
    self.require(TT::ParenthesisClose)?;
    let body = self.parse_statement(ctx)?;
    let mut loc = kw.loc;
    loc.extend(body.loc);
    Ok(Node::new(loc, Stmt::With { object, body }))
  }
}
