use crate::error::EvalError;
use crate::error::SourcePosition;
use crate::icode::Icode;
use crate::icode::Op;
use crate::ir::transform_function;
use crate::ir::IrFunction;
use crate::string::JsString;
use crate::value::number_to_string;
use parse_js::ast::expr::AssignOp;
use parse_js::ast::expr::BinaryOp;
use parse_js::ast::expr::Expr;
use parse_js::ast::expr::PropertyName;
use parse_js::ast::expr::UnaryOp;
use parse_js::ast::func::Func;
use parse_js::ast::stmt::ForInLeft;
use parse_js::ast::stmt::ForInit;
use parse_js::ast::stmt::Stmt;
use parse_js::ast::Node;
use parse_js::loc::Loc;
use std::rc::Rc;

/// Compilation inputs shared by every function of one compilation unit.
pub struct CompileMeta {
  pub source_name: Rc<str>,
  pub base_lineno: u32,
  pub raw_source: Option<Rc<str>>,
  /// Byte offsets of line starts in the source, for mapping AST locations to
  /// line numbers.
  pub line_starts: Rc<Vec<usize>>,
}

impl CompileMeta {
  pub fn new(source: &str, source_name: Rc<str>, base_lineno: u32, retain_source: bool) -> Self {
    let mut line_starts = vec![0usize];
    for (i, b) in source.bytes().enumerate() {
      if b == b'\n' {
        line_starts.push(i + 1);
      }
    }
    Self {
      source_name,
      base_lineno,
      raw_source: retain_source.then(|| Rc::from(source)),
      line_starts: Rc::new(line_starts),
    }
  }

  fn line_of(&self, loc: Loc) -> u32 {
    let offset = loc.0;
    let idx = match self.line_starts.binary_search(&offset) {
      Ok(i) => i,
      Err(0) => 0,
      Err(i) => i - 1,
    };
    self.base_lineno + idx as u32
  }
}

fn compiler_limit(what: &str) -> EvalError {
  EvalError::Evaluator {
    message: format!("compiler limit exceeded: {}", what),
    position: SourcePosition::default(),
  }
}

pub fn is_compiler_limit(error: &EvalError) -> bool {
  matches!(error, EvalError::Evaluator { message, .. } if message.starts_with("compiler limit"))
}

/// Compile one lowered function (and, recursively, its nested functions)
/// into icode.
pub fn compile_ir(ir: &IrFunction<'_>, meta: &CompileMeta) -> Result<Rc<Icode>, EvalError> {
  let mut emitter = Emitter::new(ir, meta);
  emitter.emit_prologue()?;
  for stmt in ir.body {
    emitter.emit_stmt(stmt)?;
  }
  emitter.emit_epilogue();
  emitter.finish()
}

#[derive(Copy, Clone)]
enum Cleanup<'a> {
  Handler,
  Finally(&'a Node<Stmt>),
  Scope,
  Enum,
}

struct LoopCtx {
  label: Option<String>,
  allow_continue: bool,
  /// Cleanup depth a `break` unwinds to. For `for..in` this is below the
  /// loop's own enumeration state, so breaking disposes it.
  cleanup_depth_break: usize,
  /// Cleanup depth a `continue` unwinds to (the enumeration state survives).
  cleanup_depth_continue: usize,
  break_jumps: Vec<usize>,
  continue_jumps: Vec<usize>,
}

struct Emitter<'a> {
  ir: &'a IrFunction<'a>,
  meta: &'a CompileMeta,
  ops: Vec<Op>,
  lines: Vec<u32>,
  names: Vec<Rc<str>>,
  string_consts: Vec<JsString>,
  regexps: Vec<Rc<regexp_js::RECompiled>>,
  functions: Vec<Rc<Icode>>,
  decl_function_ids: Vec<u16>,
  loops: Vec<LoopCtx>,
  cleanups: Vec<Cleanup<'a>>,
  pending_label: Option<String>,
  current_line: u32,
}

impl<'a> Emitter<'a> {
  fn new(ir: &'a IrFunction<'a>, meta: &'a CompileMeta) -> Self {
    Self {
      ir,
      meta,
      ops: Vec::new(),
      lines: Vec::new(),
      names: Vec::new(),
      string_consts: Vec::new(),
      regexps: Vec::new(),
      functions: Vec::new(),
      decl_function_ids: Vec::new(),
      loops: Vec::new(),
      cleanups: Vec::new(),
      pending_label: None,
      current_line: meta.base_lineno,
    }
  }

  fn emit_prologue(&mut self) -> Result<(), EvalError> {
    // Function declarations are compiled up front; the interpreter binds
    // them at activation entry.
    for func in &self.ir.decl_functions {
      let id = self.compile_function(func)?;
      self.decl_function_ids.push(id);
    }
    Ok(())
  }

  fn emit_epilogue(&mut self) {
    if self.ir.is_function {
      self.push(Op::ReturnUndefined);
    } else {
      self.push(Op::PushResult);
      self.push(Op::Return);
    }
  }

  fn finish(self) -> Result<Rc<Icode>, EvalError> {
    Ok(Rc::new(Icode {
      ops: self.ops,
      lines: self.lines,
      names: self.names,
      string_consts: self.string_consts,
      regexps: self.regexps,
      functions: self.functions,
      fn_name: self.ir.name.as_deref().map(Rc::from),
      params: self.ir.params.iter().map(|p| Rc::from(p.as_str())).collect(),
      var_names: self
        .ir
        .var_names
        .iter()
        .map(|v| Rc::from(v.as_str()))
        .collect(),
      decl_functions: self.decl_function_ids,
      is_function: self.ir.is_function,
      strict: self.ir.strict,
      source_name: self.meta.source_name.clone(),
      base_lineno: self.meta.base_lineno,
      raw_source: self.meta.raw_source.clone(),
    }))
  }

  // --- Emission helpers ---------------------------------------------------

  fn push(&mut self, op: Op) -> usize {
    self.ops.push(op);
    self.lines.push(self.current_line);
    self.ops.len() - 1
  }

  fn here(&self) -> u32 {
    self.ops.len() as u32
  }

  fn mark_line(&mut self, loc: Loc) {
    self.current_line = self.meta.line_of(loc);
  }

  fn patch_jump(&mut self, at: usize) {
    let target = self.here();
    match &mut self.ops[at] {
      Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) | Op::EnumNext(t) | Op::PushHandler(t) => {
        *t = target
      }
      other => unreachable!("patching non-jump op {:?}", other),
    }
  }

  fn name_idx(&mut self, name: &str) -> Result<u16, EvalError> {
    if let Some(i) = self.names.iter().position(|n| &**n == name) {
      return Ok(i as u16);
    }
    if self.names.len() > u16::MAX as usize {
      return Err(compiler_limit("too many names"));
    }
    self.names.push(name.into());
    Ok((self.names.len() - 1) as u16)
  }

  fn string_idx(&mut self, value: JsString) -> Result<u16, EvalError> {
    if let Some(i) = self.string_consts.iter().position(|s| *s == value) {
      return Ok(i as u16);
    }
    if self.string_consts.len() > u16::MAX as usize {
      return Err(compiler_limit("too many string constants"));
    }
    self.string_consts.push(value);
    Ok((self.string_consts.len() - 1) as u16)
  }

  fn compile_function(&mut self, func: &'a Node<Func>) -> Result<u16, EvalError> {
    let ir = transform_function(func, self.ir.strict);
    let icode = compile_ir(&ir, self.meta)?;
    if self.functions.len() > u16::MAX as usize {
      return Err(compiler_limit("too many nested functions"));
    }
    self.functions.push(icode);
    Ok((self.functions.len() - 1) as u16)
  }

  /// Emit the cleanup actions for exiting abruptly down to `target_depth`
  /// (innermost first).
  fn emit_cleanups_to(&mut self, target_depth: usize) -> Result<(), EvalError> {
    let actions: Vec<Cleanup<'a>> = self.cleanups[target_depth..].to_vec();
    for action in actions.into_iter().rev() {
      match action {
        Cleanup::Handler => {
          self.push(Op::PopHandler);
        }
        Cleanup::Finally(body) => {
          self.push(Op::PopHandler);
          self.emit_stmt(body)?;
        }
        Cleanup::Scope => {
          self.push(Op::LeaveWith);
        }
        Cleanup::Enum => {
          self.push(Op::EnumDone);
        }
      }
    }
    Ok(())
  }

  fn find_loop(&self, label: Option<&str>, for_continue: bool) -> Option<usize> {
    for (i, ctx) in self.loops.iter().enumerate().rev() {
      if for_continue && !ctx.allow_continue {
        continue;
      }
      match label {
        Some(label) => {
          if ctx.label.as_deref() == Some(label) {
            return Some(i);
          }
        }
        None => return Some(i),
      }
    }
    None
  }

  // --- Statements ---------------------------------------------------------

  fn emit_stmt(&mut self, stmt: &'a Node<Stmt>) -> Result<(), EvalError> {
    self.mark_line(stmt.loc);
    match &*stmt.stx {
      Stmt::Block { body } => {
        for stmt in body {
          self.emit_stmt(stmt)?;
        }
      }
      Stmt::Empty => {}
      Stmt::Debugger => {
        self.push(Op::Debugger);
      }
      Stmt::Expr { expression } => {
        self.emit_expr(expression)?;
        if self.ir.is_function {
          self.push(Op::Pop);
        } else {
          self.push(Op::StoreResult);
        }
      }
      Stmt::VarDecl { declarators, .. } => {
        for declarator in declarators {
          if let Some(init) = &declarator.initializer {
            self.emit_expr(init)?;
            let idx = self.name_idx(&declarator.name)?;
            self.push(Op::BindName(idx));
          }
        }
      }
      Stmt::FunctionDecl { .. } => {
        // Bound at activation entry via the prologue table.
      }
      Stmt::If {
        test,
        consequent,
        alternate,
      } => {
        self.emit_expr(test)?;
        let to_else = self.push(Op::JumpIfFalse(0));
        self.emit_stmt(consequent)?;
        match alternate {
          Some(alternate) => {
            let to_end = self.push(Op::Jump(0));
            self.patch_jump(to_else);
            self.emit_stmt(alternate)?;
            self.patch_jump(to_end);
          }
          None => self.patch_jump(to_else),
        }
      }
      Stmt::While { test, body } => {
        let label = self.pending_label.take();
        let top = self.here();
        self.emit_expr(test)?;
        let to_end = self.push(Op::JumpIfFalse(0));
        self.begin_loop(label, true);
        self.emit_stmt(body)?;
        let ctx = self.end_loop();
        for jump in &ctx.continue_jumps {
          let at = *jump;
          let target = top;
          self.patch_jump_to(at, target);
        }
        self.push(Op::Jump(top));
        self.patch_jump(to_end);
        self.patch_breaks(ctx);
      }
      Stmt::DoWhile { body, test } => {
        let label = self.pending_label.take();
        let top = self.here();
        self.begin_loop(label, true);
        self.emit_stmt(body)?;
        let ctx = self.end_loop();
        let cont = self.here();
        for jump in &ctx.continue_jumps {
          self.patch_jump_to(*jump, cont);
        }
        self.emit_expr(test)?;
        self.push(Op::JumpIfTrue(top));
        self.patch_breaks(ctx);
      }
      Stmt::For {
        init,
        test,
        update,
        body,
      } => {
        let label = self.pending_label.take();
        match init {
          ForInit::Decl(decl) => self.emit_stmt(decl)?,
          ForInit::Expr(expr) => {
            self.emit_expr(expr)?;
            self.push(Op::Pop);
          }
          ForInit::None => {}
        }
        let top = self.here();
        let to_end = match test {
          Some(test) => {
            self.emit_expr(test)?;
            Some(self.push(Op::JumpIfFalse(0)))
          }
          None => None,
        };
        self.begin_loop(label, true);
        self.emit_stmt(body)?;
        let ctx = self.end_loop();
        let cont = self.here();
        for jump in &ctx.continue_jumps {
          self.patch_jump_to(*jump, cont);
        }
        if let Some(update) = update {
          self.emit_expr(update)?;
          self.push(Op::Pop);
        }
        self.push(Op::Jump(top));
        if let Some(to_end) = to_end {
          self.patch_jump(to_end);
        }
        self.patch_breaks(ctx);
      }
      Stmt::ForIn { left, right, body } => {
        let label = self.pending_label.take();
        self.emit_expr(right)?;
        self.push(Op::EnumInit);
        let depth_break = self.cleanups.len();
        self.cleanups.push(Cleanup::Enum);
        let depth_continue = self.cleanups.len();
        let top = self.here();
        let to_exhausted = self.push(Op::EnumNext(0));
        self.emit_for_in_binding(left)?;
        self.begin_loop_with_depths(label, true, depth_break, depth_continue);
        self.emit_stmt(body)?;
        let ctx = self.end_loop();
        for jump in &ctx.continue_jumps {
          self.patch_jump_to(*jump, top);
        }
        self.push(Op::Jump(top));
        self.patch_jump(to_exhausted);
        self.cleanups.pop();
        self.push(Op::EnumDone);
        self.patch_breaks(ctx);
      }
      Stmt::Labeled { label, body } => {
        if stmt_is_loop(body) {
          self.pending_label = Some(label.clone());
          self.emit_stmt(body)?;
        } else {
          self.begin_loop(Some(label.clone()), false);
          self.emit_stmt(body)?;
          let ctx = self.end_loop();
          self.patch_breaks(ctx);
        }
      }
      Stmt::Break { label } => {
        let Some(target) = self.find_loop(label.as_deref(), false) else {
          return Err(EvalError::syntax_error(
            match label {
              Some(label) => format!("undefined label \"{}\"", label),
              None => "break outside of loop or switch".to_string(),
            },
            self.position_here(),
          ));
        };
        let depth = self.loops[target].cleanup_depth_break;
        self.emit_cleanups_to(depth)?;
        let jump = self.push(Op::Jump(0));
        self.loops[target].break_jumps.push(jump);
      }
      Stmt::Continue { label } => {
        let Some(target) = self.find_loop(label.as_deref(), true) else {
          return Err(EvalError::syntax_error(
            match label {
              Some(label) => format!("undefined label \"{}\"", label),
              None => "continue outside of loop".to_string(),
            },
            self.position_here(),
          ));
        };
        let depth = self.loops[target].cleanup_depth_continue;
        self.emit_cleanups_to(depth)?;
        let jump = self.push(Op::Jump(0));
        self.loops[target].continue_jumps.push(jump);
      }
      Stmt::Return { value } => {
        match value {
          Some(value) => self.emit_expr(value)?,
          None => {
            self.push(Op::PushUndefined);
          }
        }
        self.emit_cleanups_to(0)?;
        self.push(Op::Return);
      }
      Stmt::Throw { value } => {
        self.emit_expr(value)?;
        self.push(Op::Throw);
      }
      Stmt::Switch {
        discriminant,
        cases,
      } => {
        let label = self.pending_label.take();
        self.emit_expr(discriminant)?;
        self.begin_loop(label, false);
        let mut test_jumps = Vec::new();
        let mut default_idx = None;
        for (i, case) in cases.iter().enumerate() {
          match &case.test {
            Some(test) => {
              self.push(Op::Dup);
              self.emit_expr(test)?;
              self.push(Op::StrictEq);
              test_jumps.push((i, self.push(Op::JumpIfTrue(0))));
            }
            None => default_idx = Some(i),
          }
        }
        self.push(Op::Pop);
        let to_default = self.push(Op::Jump(0));
        // Pre-thunks drop the discriminant before entering a body.
        let mut body_entries: Vec<(usize, usize)> = Vec::new();
        for (i, jump) in test_jumps {
          self.patch_jump(jump);
          self.push(Op::Pop);
          body_entries.push((i, self.push(Op::Jump(0))));
        }
        let mut body_starts = vec![0u32; cases.len()];
        for (i, case) in cases.iter().enumerate() {
          body_starts[i] = self.here();
          for stmt in &case.body {
            self.emit_stmt(stmt)?;
          }
        }
        let end_without_default = self.here();
        for (i, jump) in body_entries {
          self.patch_jump_to(jump, body_starts[i]);
        }
        match default_idx {
          Some(i) => self.patch_jump_to(to_default, body_starts[i]),
          None => self.patch_jump_to(to_default, end_without_default),
        }
        let ctx = self.end_loop();
        self.patch_breaks(ctx);
      }
      Stmt::Try {
        block,
        catch,
        finally,
      } => {
        let finally_handler = finally.as_ref().map(|f| {
          let at = self.push(Op::PushHandler(0));
          self.cleanups.push(Cleanup::Finally(f));
          at
        });

        let catch_handler = catch.as_ref().map(|_| {
          let at = self.push(Op::PushHandler(0));
          self.cleanups.push(Cleanup::Handler);
          at
        });

        self.emit_stmt(block)?;

        let mut end_jumps = Vec::new();
        if let Some(catch_at) = catch_handler {
          self.cleanups.pop();
          self.push(Op::PopHandler);
          end_jumps.push(self.push(Op::Jump(0)));
          self.patch_jump(catch_at);
          let catch = catch.as_ref().unwrap();
          let name = self.name_idx(&catch.param)?;
          self.push(Op::EnterCatch(name));
          self.cleanups.push(Cleanup::Scope);
          self.emit_stmt(&catch.body)?;
          self.cleanups.pop();
          self.push(Op::LeaveWith);
        }
        for jump in end_jumps {
          self.patch_jump(jump);
        }

        if let Some(finally_at) = finally_handler {
          let finally = finally.as_ref().unwrap();
          self.cleanups.pop();
          self.push(Op::PopHandler);
          // Normal path: run the finalizer inline.
          self.emit_stmt(finally)?;
          let to_end = self.push(Op::Jump(0));
          // Abrupt path: the handler runs the finalizer with the pending
          // exception on the stack, then rethrows it.
          self.patch_jump(finally_at);
          self.emit_stmt(finally)?;
          self.push(Op::Rethrow);
          self.patch_jump(to_end);
        }
      }
      Stmt::With { object, body } => {
        if self.ir.strict {
          return Err(EvalError::syntax_error(
            "with statements are not allowed in strict code",
            self.position_here(),
          ));
        }
        self.emit_expr(object)?;
        self.push(Op::EnterWith);
        self.cleanups.push(Cleanup::Scope);
        self.emit_stmt(body)?;
        self.cleanups.pop();
        self.push(Op::LeaveWith);
      }
    }
    Ok(())
  }

  fn position_here(&self) -> SourcePosition {
    SourcePosition {
      source_name: Some(self.meta.source_name.to_string()),
      line_number: self.current_line,
      line_source: None,
      line_offset: 0,
    }
  }

  fn begin_loop(&mut self, label: Option<String>, allow_continue: bool) {
    let depth = self.cleanups.len();
    self.begin_loop_with_depths(label, allow_continue, depth, depth);
  }

  fn begin_loop_with_depths(
    &mut self,
    label: Option<String>,
    allow_continue: bool,
    cleanup_depth_break: usize,
    cleanup_depth_continue: usize,
  ) {
    self.loops.push(LoopCtx {
      label,
      allow_continue,
      cleanup_depth_break,
      cleanup_depth_continue,
      break_jumps: Vec::new(),
      continue_jumps: Vec::new(),
    });
  }

  fn end_loop(&mut self) -> LoopCtx {
    self.loops.pop().expect("loop context imbalance")
  }

  fn patch_breaks(&mut self, ctx: LoopCtx) {
    let target = self.here();
    for jump in ctx.break_jumps {
      self.patch_jump_to(jump, target);
    }
  }

  fn patch_jump_to(&mut self, at: usize, target: u32) {
    match &mut self.ops[at] {
      Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) | Op::EnumNext(t) | Op::PushHandler(t) => {
        *t = target
      }
      other => unreachable!("patching non-jump op {:?}", other),
    }
  }

  fn emit_for_in_binding(&mut self, left: &'a ForInLeft) -> Result<(), EvalError> {
    match left {
      ForInLeft::Decl { name, .. } => {
        let idx = self.name_idx(name)?;
        self.push(Op::BindName(idx));
      }
      ForInLeft::Target(target) => match &*target.stx {
        Expr::Identifier { name } => {
          let idx = self.name_idx(name)?;
          self.push(Op::SetName(idx));
          self.push(Op::Pop);
        }
        Expr::Member { object, property } => {
          self.emit_expr(object)?;
          self.push(Op::Swap);
          let idx = self.name_idx(property)?;
          self.push(Op::SetProp(idx));
          self.push(Op::Pop);
        }
        Expr::Index { object, index } => {
          self.emit_expr(object)?;
          self.emit_expr(index)?;
          self.push(Op::Rot3);
          self.push(Op::SetElem);
          self.push(Op::Pop);
        }
        _ => {
          return Err(EvalError::syntax_error(
            "invalid for..in assignment target",
            self.position_here(),
          ))
        }
      },
    }
    Ok(())
  }

  // --- Expressions --------------------------------------------------------

  fn emit_expr(&mut self, expr: &'a Node<Expr>) -> Result<(), EvalError> {
    self.mark_line(expr.loc);
    match &*expr.stx {
      Expr::LiteralNumber { value } => {
        self.push(Op::PushNumber(*value));
      }
      Expr::LiteralString { value } => {
        let idx = self.string_idx(JsString::from_code_units(value))?;
        self.push(Op::PushString(idx));
      }
      Expr::LiteralBool { value } => {
        self.push(Op::PushBool(*value));
      }
      Expr::LiteralNull => {
        self.push(Op::PushNull);
      }
      Expr::LiteralRegex { pattern, flags } => {
        let compiled = regexp_js::compile_str(pattern, flags).map_err(|err| {
          EvalError::syntax_error(
            format!("invalid regular expression: {}", err),
            self.position_here(),
          )
        })?;
        if self.regexps.len() > u16::MAX as usize {
          return Err(compiler_limit("too many regex literals"));
        }
        self.regexps.push(Rc::new(compiled));
        self.push(Op::NewRegExp((self.regexps.len() - 1) as u16));
      }
      Expr::This => {
        self.push(Op::PushThis);
      }
      Expr::Identifier { name } => {
        let idx = self.name_idx(name)?;
        self.push(Op::GetName(idx));
      }
      Expr::Array { elements } => {
        for element in elements {
          match element {
            Some(element) => self.emit_expr(element)?,
            None => {
              self.push(Op::PushHole);
            }
          }
        }
        if elements.len() > u16::MAX as usize {
          return Err(compiler_limit("array literal too large"));
        }
        self.push(Op::NewArray(elements.len() as u16));
      }
      Expr::Object { properties } => {
        for property in properties {
          let key = match &property.key {
            PropertyName::Identifier(name) => JsString::from_str(name),
            PropertyName::String(units) => JsString::from_code_units(units),
            PropertyName::Number(n) => number_to_string(*n),
          };
          let idx = self.string_idx(key)?;
          self.push(Op::PushString(idx));
          self.emit_expr(&property.value)?;
        }
        if properties.len() > u16::MAX as usize {
          return Err(compiler_limit("object literal too large"));
        }
        self.push(Op::NewObject(properties.len() as u16));
      }
      Expr::Function { func } => {
        let id = self.compile_function(func)?;
        self.push(Op::MakeClosure(id));
      }
      Expr::Member { object, property } => {
        self.emit_expr(object)?;
        let idx = self.name_idx(property)?;
        self.push(Op::GetProp(idx));
      }
      Expr::Index { object, index } => {
        self.emit_expr(object)?;
        self.emit_expr(index)?;
        self.push(Op::GetElem);
      }
      Expr::Call { callee, arguments } => {
        if arguments.len() > u16::MAX as usize {
          return Err(compiler_limit("too many call arguments"));
        }
        match &*callee.stx {
          Expr::Member { object, property } => {
            self.emit_expr(object)?;
            self.push(Op::Dup);
            let idx = self.name_idx(property)?;
            self.push(Op::GetProp(idx));
            for argument in arguments {
              self.emit_expr(argument)?;
            }
            self.push(Op::CallWithThis(arguments.len() as u16));
          }
          Expr::Index { object, index } => {
            self.emit_expr(object)?;
            self.push(Op::Dup);
            self.emit_expr(index)?;
            self.push(Op::GetElem);
            for argument in arguments {
              self.emit_expr(argument)?;
            }
            self.push(Op::CallWithThis(arguments.len() as u16));
          }
          _ => {
            self.emit_expr(callee)?;
            for argument in arguments {
              self.emit_expr(argument)?;
            }
            self.push(Op::Call(arguments.len() as u16));
          }
        }
      }
      Expr::New { callee, arguments } => {
        if arguments.len() > u16::MAX as usize {
          return Err(compiler_limit("too many constructor arguments"));
        }
        self.emit_expr(callee)?;
        for argument in arguments {
          self.emit_expr(argument)?;
        }
        self.push(Op::New(arguments.len() as u16));
      }
      Expr::Unary { operator, operand } => self.emit_unary(*operator, operand)?,
      Expr::Update {
        prefix,
        increment,
        operand,
      } => self.emit_update(*prefix, *increment, operand)?,
      Expr::Binary {
        operator,
        left,
        right,
      } => match operator {
        BinaryOp::LogicalAnd => {
          self.emit_expr(left)?;
          self.push(Op::Dup);
          let to_end = self.push(Op::JumpIfFalse(0));
          self.push(Op::Pop);
          self.emit_expr(right)?;
          self.patch_jump(to_end);
        }
        BinaryOp::LogicalOr => {
          self.emit_expr(left)?;
          self.push(Op::Dup);
          let to_end = self.push(Op::JumpIfTrue(0));
          self.push(Op::Pop);
          self.emit_expr(right)?;
          self.patch_jump(to_end);
        }
        _ => {
          self.emit_expr(left)?;
          self.emit_expr(right)?;
          self.push(binary_op(*operator));
        }
      },
      Expr::Conditional {
        test,
        consequent,
        alternate,
      } => {
        self.emit_expr(test)?;
        let to_else = self.push(Op::JumpIfFalse(0));
        self.emit_expr(consequent)?;
        let to_end = self.push(Op::Jump(0));
        self.patch_jump(to_else);
        self.emit_expr(alternate)?;
        self.patch_jump(to_end);
      }
      Expr::Assignment {
        operator,
        target,
        value,
      } => self.emit_assignment(operator, target, value)?,
      Expr::Sequence { expressions } => {
        for (i, expression) in expressions.iter().enumerate() {
          self.emit_expr(expression)?;
          if i + 1 < expressions.len() {
            self.push(Op::Pop);
          }
        }
      }
    }
    Ok(())
  }

  fn emit_unary(&mut self, operator: UnaryOp, operand: &'a Node<Expr>) -> Result<(), EvalError> {
    match operator {
      UnaryOp::Typeof => {
        if let Expr::Identifier { name } = &*operand.stx {
          let idx = self.name_idx(name)?;
          self.push(Op::TypeofName(idx));
          return Ok(());
        }
        self.emit_expr(operand)?;
        self.push(Op::TypeofValue);
      }
      UnaryOp::Delete => match &*operand.stx {
        Expr::Identifier { name } => {
          if self.ir.strict {
            return Err(EvalError::syntax_error(
              "cannot delete a variable name in strict code",
              self.position_here(),
            ));
          }
          let idx = self.name_idx(name)?;
          self.push(Op::DeleteName(idx));
        }
        Expr::Member { object, property } => {
          self.emit_expr(object)?;
          let idx = self.name_idx(property)?;
          self.push(Op::DeleteProp(idx));
        }
        Expr::Index { object, index } => {
          self.emit_expr(object)?;
          self.emit_expr(index)?;
          self.push(Op::DeleteElem);
        }
        _ => {
          self.emit_expr(operand)?;
          self.push(Op::Pop);
          self.push(Op::PushBool(true));
        }
      },
      UnaryOp::Void => {
        self.emit_expr(operand)?;
        self.push(Op::Pop);
        self.push(Op::PushUndefined);
      }
      UnaryOp::Not => {
        self.emit_expr(operand)?;
        self.push(Op::Not);
      }
      UnaryOp::BitNot => {
        self.emit_expr(operand)?;
        self.push(Op::BitNot);
      }
      UnaryOp::Minus => {
        self.emit_expr(operand)?;
        self.push(Op::Neg);
      }
      UnaryOp::Plus => {
        self.emit_expr(operand)?;
        self.push(Op::Pos);
      }
    }
    Ok(())
  }

  fn emit_update(
    &mut self,
    prefix: bool,
    increment: bool,
    operand: &'a Node<Expr>,
  ) -> Result<(), EvalError> {
    let delta = if increment { Op::Add } else { Op::Sub };
    match &*operand.stx {
      Expr::Identifier { name } => {
        let idx = self.name_idx(name)?;
        self.push(Op::GetName(idx));
        self.push(Op::Pos);
        if !prefix {
          self.push(Op::Dup);
        }
        self.push(Op::PushNumber(1.0));
        self.push(delta);
        self.push(Op::SetName(idx));
        if !prefix {
          self.push(Op::Pop);
        }
      }
      Expr::Member { object, property } => {
        self.emit_expr(object)?;
        self.push(Op::Dup);
        let idx = self.name_idx(property)?;
        self.push(Op::GetProp(idx));
        self.push(Op::Pos);
        self.push(Op::PushNumber(1.0));
        self.push(delta);
        self.push(Op::SetProp(idx));
        if !prefix {
          // Recover the pre-update value from the stored result.
          self.push(Op::PushNumber(1.0));
          self.push(if increment { Op::Sub } else { Op::Add });
        }
      }
      Expr::Index { object, index } => {
        self.emit_expr(object)?;
        self.emit_expr(index)?;
        self.push(Op::Dup2);
        self.push(Op::GetElem);
        self.push(Op::Pos);
        self.push(Op::PushNumber(1.0));
        self.push(delta);
        self.push(Op::SetElem);
        if !prefix {
          self.push(Op::PushNumber(1.0));
          self.push(if increment { Op::Sub } else { Op::Add });
        }
      }
      _ => {
        return Err(EvalError::syntax_error(
          "invalid increment/decrement target",
          self.position_here(),
        ))
      }
    }
    Ok(())
  }

  fn emit_assignment(
    &mut self,
    operator: &Option<AssignOp>,
    target: &'a Node<Expr>,
    value: &'a Node<Expr>,
  ) -> Result<(), EvalError> {
    match &*target.stx {
      Expr::Identifier { name } => {
        let idx = self.name_idx(name)?;
        match operator {
          None => self.emit_expr(value)?,
          Some(op) => {
            self.push(Op::GetName(idx));
            self.emit_expr(value)?;
            self.push(binary_op(op.binary_op()));
          }
        }
        self.push(Op::SetName(idx));
      }
      Expr::Member { object, property } => {
        let idx = self.name_idx(property)?;
        self.emit_expr(object)?;
        match operator {
          None => self.emit_expr(value)?,
          Some(op) => {
            self.push(Op::Dup);
            self.push(Op::GetProp(idx));
            self.emit_expr(value)?;
            self.push(binary_op(op.binary_op()));
          }
        }
        self.push(Op::SetProp(idx));
      }
      Expr::Index { object, index } => {
        self.emit_expr(object)?;
        self.emit_expr(index)?;
        match operator {
          None => self.emit_expr(value)?,
          Some(op) => {
            self.push(Op::Dup2);
            self.push(Op::GetElem);
            self.emit_expr(value)?;
            self.push(binary_op(op.binary_op()));
          }
        }
        self.push(Op::SetElem);
      }
      _ => {
        return Err(EvalError::syntax_error(
          "invalid assignment target",
          self.position_here(),
        ))
      }
    }
    Ok(())
  }
}

fn binary_op(operator: BinaryOp) -> Op {
  match operator {
    BinaryOp::Add => Op::Add,
    BinaryOp::Sub => Op::Sub,
    BinaryOp::Mul => Op::Mul,
    BinaryOp::Div => Op::Div,
    BinaryOp::Mod => Op::Mod,
    BinaryOp::BitAnd => Op::BitAnd,
    BinaryOp::BitOr => Op::BitOr,
    BinaryOp::BitXor => Op::BitXor,
    BinaryOp::ShiftLeft => Op::Shl,
    BinaryOp::ShiftRight => Op::Shr,
    BinaryOp::ShiftRightUnsigned => Op::Ushr,
    BinaryOp::LooseEq => Op::Eq,
    BinaryOp::LooseNeq => Op::Ne,
    BinaryOp::StrictEq => Op::StrictEq,
    BinaryOp::StrictNeq => Op::StrictNe,
    BinaryOp::Lt => Op::Lt,
    BinaryOp::Gt => Op::Gt,
    BinaryOp::Le => Op::Le,
    BinaryOp::Ge => Op::Ge,
    BinaryOp::In => Op::In,
    BinaryOp::Instanceof => Op::Instanceof,
    BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
      unreachable!("logical operators are emitted as jumps")
    }
  }
}

fn stmt_is_loop(stmt: &Node<Stmt>) -> bool {
  matches!(
    &*stmt.stx,
    Stmt::While { .. } | Stmt::DoWhile { .. } | Stmt::For { .. } | Stmt::ForIn { .. }
  )
}
