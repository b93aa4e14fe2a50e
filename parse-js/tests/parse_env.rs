use parse_js::ast::expr::Expr;
use parse_js::ast::stmt::Stmt;
use parse_js::parse;
use parse_js::parse_with_env;
use parse_js::parse::ParseEnv;

#[test]
fn reserved_keywords_as_identifiers_gate() {
  assert!(parse("var enum = 1;").is_err());
  let env = ParseEnv {
    reserved_keywords_as_identifiers: true,
    ..ParseEnv::default()
  };
  assert!(parse_with_env("var enum = 1;", env).is_ok());
  assert!(parse_with_env("class = 2;", env).is_ok());
}

#[test]
fn member_expr_as_function_name_gate() {
  assert!(parse("function a.b() {}").is_err());
  let env = ParseEnv {
    member_expr_as_function_name: true,
    ..ParseEnv::default()
  };
  let program = parse_with_env("function a.b.c() {}", env).unwrap();
  let Stmt::Expr { expression } = &*program.body[0].stx else {
    panic!("expected desugared assignment statement");
  };
  let Expr::Assignment { target, value, .. } = &*expression.stx else {
    panic!("expected assignment");
  };
  assert!(matches!(&*target.stx, Expr::Member { .. }));
  assert!(matches!(&*value.stx, Expr::Function { .. }));
}

#[test]
fn strict_env_applies_from_the_outset() {
  let env = ParseEnv {
    strict: true,
    ..ParseEnv::default()
  };
  assert!(parse_with_env("with (o) {}", env).is_err());
  assert!(parse_with_env("var x = 010;", env).is_err());
  assert!(parse("var x = 010;").is_ok());
}

#[test]
fn use_strict_directive_applies_to_rest_of_body() {
  assert!(parse("'use strict'; with (o) {}").is_err());
  assert!(parse("function f() { 'use strict'; var x = 010; }").is_err());
  assert!(parse("function f() { var x = 010; }").is_ok());
}

#[test]
fn strict_duplicate_params_rejected() {
  assert!(parse("function f(a, a) { 'use strict'; }").is_err());
  assert!(parse("function f(a, a) {}").is_ok());
}
