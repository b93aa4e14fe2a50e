use crate::codegen::compile_ir;
use crate::codegen::is_compiler_limit;
use crate::codegen::CompileMeta;
use crate::context::Context;
use crate::context::Feature;
use crate::context::LanguageVersion;
use crate::debug::DebuggableScript;
use crate::error::EvalError;
use crate::error::SourcePosition;
use crate::heap::JsObject;
use crate::icode::Icode;
use crate::ir::transform_function;
use crate::ir::transform_toplevel;
use crate::ir::IrFunction;
use crate::value::Value;
use diagnostics::line_position;
use parse_js::ast::stmt::Stmt;
use parse_js::parse::ParseEnv;
use parse_js::parse_with_env;
use parse_js::Program;
use std::rc::Rc;

/// A snapshot of the context's compiler-relevant configuration, taken at the
/// start of a compilation (stage 1 of the pipeline).
#[derive(Clone, Debug)]
pub struct CompilerEnv {
  pub language_version: LanguageVersion,
  pub strict_mode: bool,
  pub reserved_keywords_as_identifiers: bool,
  pub member_expr_as_function_name: bool,
  pub generating_source: bool,
  pub generating_debug: bool,
  pub xml_available: bool,
}

impl CompilerEnv {
  pub fn from_context(cx: &Context) -> CompilerEnv {
    CompilerEnv {
      language_version: cx.language_version(),
      strict_mode: cx.has_feature(Feature::StrictMode),
      reserved_keywords_as_identifiers: cx.has_feature(Feature::ReservedKeywordAsIdentifier),
      member_expr_as_function_name: cx.has_feature(Feature::MemberExprAsFunctionName),
      generating_source: cx.is_generating_source(),
      generating_debug: cx.is_generating_debug(),
      xml_available: cx.has_feature(Feature::E4x),
    }
  }

  fn parse_env(&self) -> ParseEnv {
    ParseEnv {
      reserved_keywords_as_identifiers: self.reserved_keywords_as_identifiers,
      member_expr_as_function_name: self.member_expr_as_function_name,
      strict: self.strict_mode,
    }
  }
}

/// A compiled toplevel script, executable against a scope.
#[derive(Debug)]
pub struct Script {
  icode: Rc<Icode>,
}

impl Script {
  pub(crate) fn icode(&self) -> Rc<Icode> {
    self.icode.clone()
  }

  /// Execute against `scope`. Microtasks are drained before control returns
  /// to the host.
  pub fn exec(&self, cx: &mut Context, scope: JsObject) -> Result<Value, EvalError> {
    cx.exec_script_icode(self.icode.clone(), scope)
  }
}

/// A compilation backend. The interpreter backend is always available; a
/// native-code backend, when linked, is preferred unless interpreted mode is
/// forced, and falls back to the interpreter on compiler-limit errors.
pub trait Evaluator {
  fn compile(
    &self,
    env: &CompilerEnv,
    ir: &IrFunction<'_>,
    meta: &CompileMeta,
  ) -> Result<Rc<Icode>, EvalError>;
}

/// The interpreter backend: lowers IR straight to icode.
pub struct InterpreterCompiler;

impl Evaluator for InterpreterCompiler {
  fn compile(
    &self,
    _env: &CompilerEnv,
    ir: &IrFunction<'_>,
    meta: &CompileMeta,
  ) -> Result<Rc<Icode>, EvalError> {
    compile_ir(ir, meta)
  }
}

impl Context {
  /// The backend for the current mode. With no code generator linked this is
  /// always the interpreter, exactly as when the optimizer class is absent
  /// at runtime.
  fn create_compiler(&self) -> Box<dyn Evaluator> {
    Box::new(InterpreterCompiler)
  }

  /// Evaluate a source string against `scope` and return its value.
  pub fn evaluate_string(
    &mut self,
    scope: JsObject,
    source: &str,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
  ) -> Result<Value, EvalError> {
    let script = self.compile_string(source, source_name, lineno, security_tag)?;
    script.exec(self, scope)
  }

  /// Evaluate JavaScript source from a reader, consuming it fully.
  pub fn evaluate_reader(
    &mut self,
    scope: JsObject,
    reader: &mut dyn std::io::Read,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
  ) -> Result<Value, EvalError> {
    let script = self.compile_reader(reader, source_name, lineno, security_tag)?;
    script.exec(self, scope)
  }

  /// Compile JavaScript source from a reader, consuming it fully.
  pub fn compile_reader(
    &mut self,
    reader: &mut dyn std::io::Read,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
  ) -> Result<Script, EvalError> {
    let mut source = String::new();
    reader
      .read_to_string(&mut source)
      .map_err(|err| EvalError::evaluator(format!("failed to read source: {}", err)))?;
    self.compile_string(&source, source_name, lineno, security_tag)
  }

  /// Compile a source string into a [`Script`].
  pub fn compile_string(
    &mut self,
    source: &str,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
  ) -> Result<Script, EvalError> {
    let icode = self.compile_impl(source, source_name, lineno, security_tag, false)?;
    Ok(Script { icode })
  }

  /// Compile a single function definition and return the function object
  /// closed over `scope`.
  pub fn compile_function(
    &mut self,
    scope: JsObject,
    source: &str,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
  ) -> Result<JsObject, EvalError> {
    let icode = self.compile_impl(source, source_name, lineno, security_tag, true)?;
    Ok(self.make_interpreted_function(icode, scope))
  }

  fn compile_impl(
    &mut self,
    source: &str,
    source_name: &str,
    lineno: i32,
    security_tag: Option<&str>,
    return_function: bool,
  ) -> Result<Rc<Icode>, EvalError> {
    let source_name: Rc<str> = if source_name.is_empty() {
      "unnamed script".into()
    } else {
      source_name.into()
    };
    // Negative line numbers are coerced to 0 for compatibility.
    let base_lineno = lineno.max(0) as u32;

    if let Some(tag) = security_tag {
      let Some(controller) = self.security_controller() else {
        return Err(EvalError::evaluator(
          "security tag should be absent if no SecurityController was installed",
        ));
      };
      if let Err(message) = controller.check_security_tag(tag) {
        return Err(EvalError::evaluator(format!(
          "security controller rejected the compilation: {}",
          message
        )));
      }
    }

    let env = CompilerEnv::from_context(self);
    let program = self.parse_stage(source, &source_name, base_lineno, &env)?;

    if return_function && !program_is_single_function(&program) {
      return Err(EvalError::evaluator(
        "compile_function only accepts source with a single function",
      ));
    }

    let meta = CompileMeta::new(source, source_name, base_lineno, env.generating_source);

    let compiler = self.create_compiler();
    let icode = match self.lower_and_compile(&*compiler, &env, &program, &meta, return_function) {
      Ok(icode) => icode,
      Err(err) if is_compiler_limit(&err) => {
        // A backend limit: re-parse (lowering may have mutated the tree) and
        // retry on the interpreter backend.
        let program = self.parse_stage(source, &meta.source_name, base_lineno, &env)?;
        self.lower_and_compile(&InterpreterCompiler, &env, &program, &meta, return_function)?
      }
      Err(err) => return Err(err),
    };

    self.notify_debugger(&icode, source);
    Ok(icode)
  }

  fn parse_stage(
    &mut self,
    source: &str,
    source_name: &str,
    base_lineno: u32,
    env: &CompilerEnv,
  ) -> Result<Program, EvalError> {
    parse_with_env(source, env.parse_env()).map_err(|err| {
      let pos = line_position(source, err.loc.0);
      let message = err.typ.message(err.actual_token);
      let position = SourcePosition {
        source_name: Some(source_name.to_string()),
        line_number: base_lineno + (pos.line as u32 - 1),
        line_source: Some(pos.line_text.to_string()),
        line_offset: pos.offset_in_line as u32,
      };
      self.report_error(
        &message,
        source_name,
        position.line_number,
        position.line_source.as_deref(),
        position.line_offset,
      );
      EvalError::syntax_error(message, position)
    })
  }

  fn lower_and_compile(
    &mut self,
    compiler: &dyn Evaluator,
    env: &CompilerEnv,
    program: &Program,
    meta: &CompileMeta,
    return_function: bool,
  ) -> Result<Rc<Icode>, EvalError> {
    if return_function {
      let Some(Stmt::FunctionDecl { func }) = program.body.first().map(|n| &*n.stx) else {
        return Err(EvalError::evaluator(
          "compile_function only accepts source with a single function",
        ));
      };
      let ir = transform_function(func, program.strict || env.strict_mode);
      compiler.compile(env, &ir, meta)
    } else {
      let ir = transform_toplevel(&program.body, program.strict || env.strict_mode);
      compiler.compile(env, &ir, meta)
    }
  }

  fn notify_debugger(&mut self, icode: &Rc<Icode>, source: &str) {
    if !self.has_debugger() {
      return;
    }
    let view = DebuggableScript::from_icode(icode);
    let mut debugger = self.take_debugger();
    if let Some(debugger) = &mut debugger {
      notify_recursively(debugger.as_mut(), self, &view, source);
    }
    self.restore_debugger(debugger);
  }

  /// Whether a source string is a complete compilable unit: false only when
  /// parsing failed because the input ended prematurely, so appending more
  /// source could fix it. Intended for interactive read loops.
  pub fn string_is_compilable_unit(&self, source: &str) -> bool {
    let env = CompilerEnv::from_context(self);
    match parse_with_env(source, env.parse_env()) {
      Ok(_) => true,
      Err(err) => !err.is_unexpected_end(),
    }
  }

  /// Return the retained source of a script, re-indented. Scripts compiled
  /// without source generation yield the `[native code]` sentinel.
  pub fn decompile_script(&self, script: &Script, indent: usize) -> String {
    decompile_icode_indented(&script.icode, indent)
  }

  /// Return the retained source of a compiled function, re-indented.
  pub fn decompile_function(&self, function: JsObject, indent: usize) -> String {
    use crate::function::FunctionData;
    use crate::object::ObjectKind;
    match &self.heap.get(function).kind {
      ObjectKind::Function(FunctionData::Interpreted { icode, .. }) => {
        decompile_icode_indented(icode, indent)
      }
      ObjectKind::Function(data) => {
        format!("function {}() {{\n\t[native code]\n}}\n", data.name())
      }
      _ => String::new(),
    }
  }
}

fn notify_recursively(
  debugger: &mut dyn crate::hooks::Debugger,
  cx: &Context,
  view: &DebuggableScript,
  source: &str,
) {
  debugger.handle_compilation_done(cx, view, source);
  for child in &view.functions {
    notify_recursively(debugger, cx, child, source);
  }
}

/// The function-compilation precondition: a single function definition,
/// tolerating stray empty statements after it.
fn program_is_single_function(program: &Program) -> bool {
  let mut stmts = program.body.iter();
  let Some(first) = stmts.next() else {
    return false;
  };
  if !matches!(&*first.stx, Stmt::FunctionDecl { .. }) {
    return false;
  }
  stmts.all(|stmt| matches!(&*stmt.stx, Stmt::Empty))
}

pub(crate) fn decompile_icode(icode: &Icode, indent: usize) -> String {
  decompile_icode_indented(icode, indent)
}

fn decompile_icode_indented(icode: &Icode, indent: usize) -> String {
  match &icode.raw_source {
    Some(source) => {
      let pad = " ".repeat(indent);
      source
        .lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
    }
    None => {
      let name = icode.fn_name.as_deref().unwrap_or("");
      format!("function {}() {{\n\t[native code]\n}}\n", name)
    }
  }
}
