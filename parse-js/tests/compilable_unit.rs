use parse_js::parse;

/// Whether a parse failure could be fixed by appending more source. This is
/// the contract interactive hosts build their read loops on.
fn fails_at_eof(source: &str) -> bool {
  match parse(source) {
    Ok(_) => false,
    Err(err) => err.is_unexpected_end(),
  }
}

#[test]
fn complete_sources_parse() {
  assert!(parse("function f(){}").is_ok());
  assert!(parse("1 + 2").is_ok());
  assert!(parse("var x = 1; x").is_ok());
}

#[test]
fn truncated_sources_fail_at_eof() {
  assert!(fails_at_eof("function f(){"));
  assert!(fails_at_eof("1 +"));
  assert!(fails_at_eof("var x = "));
  assert!(fails_at_eof("if (a) {"));
  assert!(fails_at_eof("a("));
  assert!(fails_at_eof("[1, 2"));
}

#[test]
fn broken_sources_fail_but_not_at_eof() {
  let err = parse("var = 5;").unwrap_err();
  assert!(!err.is_unexpected_end());
  let err = parse("a b;").unwrap_err();
  assert!(!err.is_unexpected_end());
}
