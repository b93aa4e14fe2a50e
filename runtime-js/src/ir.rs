use parse_js::ast::func::Func;
use parse_js::ast::stmt::ForInLeft;
use parse_js::ast::stmt::ForInit;
use parse_js::ast::stmt::Stmt;
use parse_js::ast::Node;

/// The intermediate form of one function (or the toplevel script): the
/// statement body plus the binding structure the code generator needs.
///
/// Lowering does not rewrite statements; it resolves the function's binding
/// set up front (hoisted `var`s, declared functions, parameters) and carries
/// strictness.
pub struct IrFunction<'a> {
  pub name: Option<String>,
  pub params: Vec<String>,
  /// Hoisted variable names, in declaration order, excluding parameters.
  /// `let`/`const` hoist with function granularity here (block scoping is a
  /// later refinement; see DESIGN notes).
  pub var_names: Vec<String>,
  /// Function declarations, bound at activation entry.
  pub decl_functions: Vec<&'a Node<Func>>,
  pub body: &'a [Node<Stmt>],
  pub strict: bool,
  pub is_function: bool,
}

/// Lower a parsed function body into its IR.
pub fn transform_function(func: &Node<Func>, inherited_strict: bool) -> IrFunction<'_> {
  let f = &func.stx;
  let mut ir = IrFunction {
    name: f.name.clone(),
    params: f.params.clone(),
    var_names: Vec::new(),
    decl_functions: Vec::new(),
    body: &f.body,
    strict: f.strict || inherited_strict,
    is_function: true,
  };
  collect_bindings(&f.body, &mut ir);
  ir
}

/// Lower a toplevel statement list into its IR.
pub fn transform_toplevel(body: &[Node<Stmt>], strict: bool) -> IrFunction<'_> {
  let mut ir = IrFunction {
    name: None,
    params: Vec::new(),
    var_names: Vec::new(),
    decl_functions: Vec::new(),
    body,
    strict,
    is_function: false,
  };
  collect_bindings(body, &mut ir);
  ir
}

/// Hoist `var` declarations and function declarations to the function head.
/// Nested function bodies are not entered (their bindings are their own).
fn collect_bindings<'a>(stmts: &'a [Node<Stmt>], ir: &mut IrFunction<'a>) {
  for stmt in stmts {
    collect_stmt(stmt, ir);
  }
}

fn record_var(ir: &mut IrFunction<'_>, name: &str) {
  if ir.params.iter().any(|p| p == name) {
    return;
  }
  if ir.var_names.iter().any(|v| v == name) {
    return;
  }
  ir.var_names.push(name.to_string());
}

fn collect_stmt<'a>(stmt: &'a Node<Stmt>, ir: &mut IrFunction<'a>) {
  match &*stmt.stx {
    Stmt::VarDecl { declarators, .. } => {
      for declarator in declarators {
        record_var(ir, &declarator.name);
      }
    }
    Stmt::FunctionDecl { func } => {
      if let Some(name) = &func.stx.name {
        record_var(ir, name);
      }
      ir.decl_functions.push(func);
    }
    Stmt::Block { body } => collect_bindings(body, ir),
    Stmt::If {
      consequent,
      alternate,
      ..
    } => {
      collect_stmt(consequent, ir);
      if let Some(alternate) = alternate {
        collect_stmt(alternate, ir);
      }
    }
    Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::With { body, .. } => {
      collect_stmt(body, ir)
    }
    Stmt::For { init, body, .. } => {
      if let ForInit::Decl(decl) = init {
        collect_stmt(decl, ir);
      }
      collect_stmt(body, ir);
    }
    Stmt::ForIn { left, body, .. } => {
      if let ForInLeft::Decl { name, .. } = left {
        record_var(ir, name);
      }
      collect_stmt(body, ir);
    }
    Stmt::Labeled { body, .. } => collect_stmt(body, ir),
    Stmt::Switch { cases, .. } => {
      for case in cases {
        collect_bindings(&case.body, ir);
      }
    }
    Stmt::Try {
      block,
      catch,
      finally,
    } => {
      collect_stmt(block, ir);
      if let Some(catch) = catch {
        collect_stmt(&catch.body, ir);
      }
      if let Some(finally) = finally {
        collect_stmt(finally, ir);
      }
    }
    Stmt::Break { .. }
    | Stmt::Continue { .. }
    | Stmt::Debugger
    | Stmt::Empty
    | Stmt::Expr { .. }
    | Stmt::Return { .. }
    | Stmt::Throw { .. } => {}
  }
}
