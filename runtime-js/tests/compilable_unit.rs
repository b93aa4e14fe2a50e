use runtime_js::Context;

#[test]
fn complete_sources_are_compilable_units() {
  let cx = Context::new();
  assert!(cx.string_is_compilable_unit("function f(){}"));
  assert!(cx.string_is_compilable_unit("var x = 1;"));
  assert!(cx.string_is_compilable_unit("if (a) { b(); } else { c(); }"));
}

#[test]
fn prematurely_ended_sources_are_not() {
  let cx = Context::new();
  assert!(!cx.string_is_compilable_unit("function f(){"));
  assert!(!cx.string_is_compilable_unit("1 +"));
  assert!(!cx.string_is_compilable_unit("var x = "));
  assert!(!cx.string_is_compilable_unit("while (true) {"));
}

#[test]
fn outright_broken_sources_are_still_units() {
  // Errors that more input cannot fix report true so the host surfaces the
  // syntax error instead of reading forever.
  let cx = Context::new();
  assert!(cx.string_is_compilable_unit("var = 5;"));
  assert!(cx.string_is_compilable_unit("a b c"));
}
