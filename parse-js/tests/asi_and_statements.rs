use parse_js::ast::stmt::Stmt;
use parse_js::parse;

#[test]
fn asi_inserts_at_line_breaks() {
  let program = parse("a = 1\nb = 2").unwrap();
  assert_eq!(program.body.len(), 2);
}

#[test]
fn asi_does_not_split_continuable_expressions() {
  let program = parse("a = 1 +\n2").unwrap();
  assert_eq!(program.body.len(), 1);
}

#[test]
fn return_value_is_restricted() {
  let program = parse("function f() { return\n1; }").unwrap();
  let Stmt::FunctionDecl { func } = &*program.body[0].stx else {
    panic!("expected function declaration");
  };
  let Stmt::Return { value } = &*func.stx.body[0].stx else {
    panic!("expected return statement");
  };
  assert!(value.is_none(), "ASI must terminate the bare return");
}

#[test]
fn postfix_update_is_restricted() {
  // `a\n++\nb` is `a; ++b;`, not `a++; b;`.
  let program = parse("a\n++\nb").unwrap();
  assert_eq!(program.body.len(), 2);
}

#[test]
fn throw_requires_same_line_operand() {
  assert!(parse("throw new Error('x')").is_ok());
  assert!(parse("throw\n1").is_err());
}

#[test]
fn try_requires_catch_or_finally() {
  assert!(parse("try {} catch (e) {}").is_ok());
  assert!(parse("try {} finally {}").is_ok());
  assert!(parse("try {}").is_err());
}

#[test]
fn for_in_header_forms() {
  assert!(parse("for (var k in o) {}").is_ok());
  assert!(parse("for (k in o) {}").is_ok());
  assert!(parse("for (var a = 1, b = 2 in o) {}").is_err());
  assert!(parse("for (var i = 0; i < 10; i++) {}").is_ok());
}

#[test]
fn labeled_break_and_continue() {
  assert!(parse("outer: for (;;) { break outer; }").is_ok());
  assert!(parse("outer: for (;;) { continue outer; }").is_ok());
}

#[test]
fn switch_statements_parse() {
  let program = parse("switch (x) { case 1: a(); break; default: b(); }").unwrap();
  let Stmt::Switch { cases, .. } = &*program.body[0].stx else {
    panic!("expected switch");
  };
  assert_eq!(cases.len(), 2);
  assert!(cases[0].test.is_some());
  assert!(cases[1].test.is_none());
}
