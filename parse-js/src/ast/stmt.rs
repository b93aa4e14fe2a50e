use super::expr::Expr;
use super::func::Func;
use super::Node;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VarDeclMode {
  Const,
  Let,
  Var,
}

#[derive(Debug)]
pub struct VarDeclarator {
  pub name: String,
  pub initializer: Option<Node<Expr>>,
}

#[derive(Debug)]
pub struct SwitchCase {
  /// `None` for the `default` clause.
  pub test: Option<Node<Expr>>,
  pub body: Vec<Node<Stmt>>,
}

#[derive(Debug)]
pub struct CatchClause {
  pub param: String,
  pub body: Node<Stmt>,
}

/// The header of a `for (... in ...)` statement.
#[derive(Debug)]
pub enum ForInLeft {
  Decl { mode: VarDeclMode, name: String },
  Target(Node<Expr>),
}

/// The init clause of a classic `for (;;)` statement.
#[derive(Debug)]
pub enum ForInit {
  Decl(Node<Stmt>),
  Expr(Node<Expr>),
  None,
}

#[derive(Debug)]
pub enum Stmt {
  Block {
    body: Vec<Node<Stmt>>,
  },
  Break {
    label: Option<String>,
  },
  Continue {
    label: Option<String>,
  },
  Debugger,
  DoWhile {
    body: Node<Stmt>,
    test: Node<Expr>,
  },
  Empty,
  Expr {
    expression: Node<Expr>,
  },
  For {
    init: ForInit,
    test: Option<Node<Expr>>,
    update: Option<Node<Expr>>,
    body: Node<Stmt>,
  },
  ForIn {
    left: ForInLeft,
    right: Node<Expr>,
    body: Node<Stmt>,
  },
  FunctionDecl {
    func: Node<Func>,
  },
  If {
    test: Node<Expr>,
    consequent: Node<Stmt>,
    alternate: Option<Node<Stmt>>,
  },
  Labeled {
    label: String,
    body: Node<Stmt>,
  },
  Return {
    value: Option<Node<Expr>>,
  },
  Switch {
    discriminant: Node<Expr>,
    cases: Vec<SwitchCase>,
  },
  Throw {
    value: Node<Expr>,
  },
  Try {
    block: Node<Stmt>,
    catch: Option<CatchClause>,
    finally: Option<Node<Stmt>>,
  },
  VarDecl {
    mode: VarDeclMode,
    declarators: Vec<VarDeclarator>,
  },
  While {
    test: Node<Expr>,
    body: Node<Stmt>,
  },
  With {
    object: Node<Expr>,
    body: Node<Stmt>,
  },
}
