use runtime_js::Context;
use runtime_js::EcmaErrorKind;
use runtime_js::EvalError;
use runtime_js::JsObject;
use runtime_js::Value;

fn with_global(f: impl FnOnce(&mut Context, JsObject)) {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();
  f(&mut cx, global);
  cx.exit().unwrap();
}

fn eval(cx: &mut Context, global: JsObject, source: &str) -> Value {
  cx.evaluate_string(global, source, "test.js", 1, None)
    .unwrap_or_else(|err| panic!("eval failed for {:?}: {}", source, err))
}

fn eval_number(cx: &mut Context, global: JsObject, source: &str) -> f64 {
  match eval(cx, global, source) {
    Value::Number(n) => n,
    other => panic!("expected number from {:?}, got {:?}", source, other),
  }
}

fn eval_string(cx: &mut Context, global: JsObject, source: &str) -> String {
  match eval(cx, global, source) {
    Value::String(s) => s.to_utf8_lossy(),
    other => panic!("expected string from {:?}, got {:?}", source, other),
  }
}

#[test]
fn scripts_evaluate_to_their_last_expression() {
  with_global(|cx, global| {
    assert_eq!(eval_number(cx, global, "1 + 2"), 3.0);
    assert_eq!(eval_number(cx, global, "var x = 4; x * x"), 16.0);
    assert!(matches!(eval(cx, global, "var y = 1;"), Value::Undefined));
  });
}

#[test]
fn functions_closures_and_recursion() {
  with_global(|cx, global| {
    assert_eq!(
      eval_number(cx, global, "function f(a) { return a + 1; } f(41)"),
      42.0
    );
    assert_eq!(
      eval_number(
        cx,
        global,
        "function make() { var n = 0; return function() { n = n + 1; return n; }; }\n\
         var c = make(); c(); c()"
      ),
      2.0
    );
    assert_eq!(
      eval_number(
        cx,
        global,
        "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(10)"
      ),
      55.0
    );
  });
}

#[test]
fn control_flow_statements() {
  with_global(|cx, global| {
    assert_eq!(
      eval_number(cx, global, "var s = 0; for (var i = 0; i < 5; i++) s = s + i; s"),
      10.0
    );
    assert_eq!(
      eval_number(cx, global, "var n = 0; while (n < 3) n++; n"),
      3.0
    );
    assert_eq!(
      eval_number(cx, global, "var n = 10; do { n--; } while (false); n"),
      9.0
    );
    assert_eq!(
      eval_string(
        cx,
        global,
        "switch (2) { case 1: 'one'; break; case 2: 'two'; break; default: 'other'; }\n'done'"
      ),
      "done"
    );
    assert_eq!(
      eval_number(
        cx,
        global,
        "var s = 0;\n\
         outer: for (var i = 0; i < 3; i++) {\n\
           for (var j = 0; j < 3; j++) { if (j == 1) continue outer; s = s + 1; }\n\
         }\n\
         s"
      ),
      3.0
    );
  });
}

#[test]
fn try_catch_finally() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(cx, global, "try { throw 'boom'; } catch (e) { e }"),
      "boom"
    );
    assert_eq!(
      eval_number(
        cx,
        global,
        "var order = 0;\n\
         function f() { try { return 1; } finally { order = 7; } }\n\
         f() + order"
      ),
      8.0
    );
    assert_eq!(
      eval_string(
        cx,
        global,
        "var log = '';\n\
         try { try { throw 'x'; } finally { log = log + 'f'; } } catch (e) { log = log + e; }\n\
         log"
      ),
      "fx"
    );
  });
}

#[test]
fn uncaught_script_throw_leaves_the_entry_point() {
  with_global(|cx, global| {
    let err = cx
      .evaluate_string(global, "throw 'untouched';", "boom.js", 3, None)
      .unwrap_err();
    match err {
      EvalError::Thrown { value, position } => {
        assert_eq!(value, Value::string("untouched"));
        assert_eq!(position.source_name.as_deref(), Some("boom.js"));
        assert_eq!(position.line_number, 3);
      }
      other => panic!("expected thrown value, got {}", other),
    }
  });
}

#[test]
fn native_errors_are_catchable_as_error_objects() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var got = '';\n\
         var u;\n\
         try { u(); } catch (e) { got = e.name; }\n\
         got"
      ),
      "TypeError"
    );
    assert_eq!(
      eval_string(cx, global, "try { nope; } catch (e) { e.name }"),
      "ReferenceError"
    );
  });
}

#[test]
fn objects_arrays_and_for_in() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var o = { a: 1, b: 2 }; var keys = ''; for (var k in o) keys = keys + k; keys"
      ),
      "ab"
    );
    assert_eq!(
      eval_string(cx, global, "[3, 4, 5].join('-')"),
      "3-4-5"
    );
    assert_eq!(eval_number(cx, global, "var a = [1]; a.push(9); a[1]"), 9.0);
    assert_eq!(eval_number(cx, global, "[0, 1, 2].length"), 3.0);
    assert_eq!(
      eval_number(cx, global, "var a = []; a[4] = 1; a.length"),
      5.0
    );
  });
}

#[test]
fn array_length_is_bidirectional() {
  with_global(|cx, global| {
    // Shrinking length deletes the own index properties above it.
    assert_eq!(
      eval_string(
        cx,
        global,
        "var a = [1, 2, 3];\n\
         a.length = 1;\n\
         [a.length, 1 in a, 2 in a, a[1] === undefined].join(',')"
      ),
      "1,false,false,true"
    );
    // Growing again after a shrink starts from the truncated state.
    assert_eq!(
      eval_string(
        cx,
        global,
        "var a = [1, 2, 3]; a.length = 1; a.push(9); [a.length, a[1]].join(',')"
      ),
      "2,9"
    );
    // Growth via length is sparse: no elements appear.
    assert_eq!(
      eval_string(cx, global, "var a = [1]; a.length = 5; [a.length, 1 in a].join(',')"),
      "5,false"
    );
    let err = cx
      .evaluate_string(global, "var a = []; a.length = -1;", "len.js", 1, None)
      .unwrap_err();
    match err {
      EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::RangeError),
      other => panic!("expected a range error, got {}", other),
    }
  });
}

#[test]
fn operators_and_conversions() {
  with_global(|cx, global| {
    assert_eq!(eval_string(cx, global, "1 + '2'"), "12");
    assert_eq!(eval_number(cx, global, "'3' * '4'"), 12.0);
    assert_eq!(eval(cx, global, "0.1 + 0.2 == 0.3"), Value::Bool(false));
    assert_eq!(eval(cx, global, "'1' == 1"), Value::Bool(true));
    assert_eq!(eval(cx, global, "'1' === 1"), Value::Bool(false));
    assert_eq!(eval_string(cx, global, "typeof {}"), "object");
    assert_eq!(eval_string(cx, global, "typeof typeof 1"), "string");
    assert_eq!(eval_string(cx, global, "typeof missing"), "undefined");
    assert_eq!(eval(cx, global, "'a' in { a: 1 }"), Value::Bool(true));
    assert_eq!(eval(cx, global, "[] instanceof Array"), Value::Bool(true));
    assert_eq!(eval_number(cx, global, "-2147483648 >>> 0"), 2147483648.0);
    assert_eq!(eval_number(cx, global, "7 & 3"), 3.0);
  });
}

#[test]
fn constructors_and_prototypes() {
  with_global(|cx, global| {
    assert_eq!(
      eval_number(
        cx,
        global,
        "function Point(x) { this.x = x; }\n\
         Point.prototype.double = function() { return this.x * 2; };\n\
         new Point(21).double()"
      ),
      42.0
    );
    assert_eq!(
      eval(cx, global, "new Boolean(true) instanceof Boolean"),
      Value::Bool(true)
    );
  });
}

#[test]
fn with_statement_scopes() {
  with_global(|cx, global| {
    assert_eq!(
      eval_number(cx, global, "var o = { v: 5 }; var r; with (o) { r = v + 1; } r"),
      6.0
    );
    assert_eq!(
      eval_number(cx, global, "var o = { v: 5 }; with (o) { v = 9; } o.v"),
      9.0
    );
  });
}

#[test]
fn syntax_errors_carry_positions() {
  with_global(|cx, global| {
    let err = cx
      .evaluate_string(global, "var x = ;", "bad.js", 10, None)
      .unwrap_err();
    match err {
      EvalError::Ecma {
        kind, position, ..
      } => {
        assert_eq!(kind, EcmaErrorKind::SyntaxError);
        assert_eq!(position.source_name.as_deref(), Some("bad.js"));
        assert_eq!(position.line_number, 10);
      }
      other => panic!("expected a syntax error, got {}", other),
    }
  });
}

#[test]
fn interpreter_stack_depth_is_bounded() {
  with_global(|cx, global| {
    cx.set_maximum_interpreter_stack_depth(64).unwrap();
    let err = cx
      .evaluate_string(global, "function f() { return f(); } f()", "deep.js", 1, None)
      .unwrap_err();
    match err {
      EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::RangeError),
      other => panic!("expected a range error, got {}", other),
    }
  });
}
