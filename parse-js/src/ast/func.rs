use super::stmt::Stmt;
use super::Node;

/// A function definition (declaration or expression).
#[derive(Debug)]
pub struct Func {
  pub name: Option<String>,
  pub params: Vec<String>,
  pub body: Vec<Node<Stmt>>,
  /// Whether the function body is strict code, either via its own
  /// `"use strict"` directive or inherited from the enclosing code.
  pub strict: bool,
}
