use runtime_js::Context;
use runtime_js::EcmaErrorKind;
use runtime_js::EvalError;
use runtime_js::JsObject;
use runtime_js::LanguageVersion;
use runtime_js::PropertyKey;
use runtime_js::Value;
use runtime_js::DONTENUM;
use runtime_js::PERMANENT;
use runtime_js::READONLY;

fn with_global(f: impl FnOnce(&mut Context, JsObject)) {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();
  f(&mut cx, global);
  cx.exit().unwrap();
}

fn eval(cx: &mut Context, global: JsObject, source: &str) -> Value {
  cx.evaluate_string(global, source, "regexp.js", 1, None)
    .unwrap_or_else(|err| panic!("eval failed for {:?}: {}", source, err))
}

fn eval_string(cx: &mut Context, global: JsObject, source: &str) -> String {
  match eval(cx, global, source) {
    Value::String(s) => s.to_utf8_lossy(),
    other => panic!("expected string from {:?}, got {:?}", source, other),
  }
}

#[test]
fn source_and_flags_round_trip() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(cx, global, "new RegExp('a(b)c', 'gi').source"),
      "a(b)c"
    );
    // Flags render in canonical gimsuy order regardless of input order.
    assert_eq!(
      eval_string(cx, global, "new RegExp('x', 'ysimg').flags"),
      "gimsy"
    );
    assert_eq!(eval_string(cx, global, "/a[/]b/gi.source"), "a[/]b");
    // A naked slash in a string-built source is escaped.
    assert_eq!(
      eval_string(cx, global, "new RegExp('a/b').source"),
      "a\\/b"
    );
    assert_eq!(
      eval(cx, global, "/abc/gi.global"),
      Value::Bool(true)
    );
    assert_eq!(eval(cx, global, "/abc/gi.sticky"), Value::Bool(false));
    assert_eq!(eval(cx, global, "/abc/s.dotAll"), Value::Bool(true));
  });
}

#[test]
fn to_string_canonical_form() {
  with_global(|cx, global| {
    assert_eq!(eval_string(cx, global, "/ab/gi.toString()"), "/ab/gi");
    // An empty source renders as (?:) so the literal stays parseable.
    assert_eq!(
      eval_string(cx, global, "new RegExp('').toString()"),
      "/(?:)/"
    );
    // The observed contract for foreign receivers: format from own
    // source/flags properties, substituting "undefined".
    assert_eq!(
      eval_string(
        cx,
        global,
        "/x/.toString.call({ source: 'q', flags: 'g' })"
      ),
      "/q/g"
    );
    assert_eq!(
      eval_string(cx, global, "/x/.toString.call({})"),
      "/undefined/undefined"
    );
  });
}

#[test]
fn global_iteration_updates_last_index() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var re = /a/g;\n\
         var out = [];\n\
         out.push(re.exec('aaa').index);\n\
         out.push(re.exec('aaa').index);\n\
         out.push(re.exec('aaa').index);\n\
         out.push(re.exec('aaa'));\n\
         out.push(re.lastIndex);\n\
         out.join(',')"
      ),
      "0,1,2,,0"
    );
  });
}

#[test]
fn sticky_anchors_to_last_index() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var re = /a/y;\n\
         var out = [];\n\
         out.push(re.exec('ba'));\n\
         re.lastIndex = 1;\n\
         var m = re.exec('ba');\n\
         out.push(m.index);\n\
         out.push(re.exec('ba'));\n\
         out.push(re.lastIndex);\n\
         out.join(',')"
      ),
      ",1,,0"
    );
  });
}

#[test]
fn exec_result_shape() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var m = /(\\d+)-(\\d+)?/.exec('ab 12- cd');\n\
         [m[0], m[1], m[2], m.index, m.input].join('|')"
      ),
      "12-|12||3|ab 12- cd"
    );
    // Numbered slots enumerate before index/input.
    assert_eq!(
      eval_string(
        cx,
        global,
        "var m = /(a)/.exec('a'); var keys = ''; for (var k in m) keys = keys + k + ';'; keys"
      ),
      "0;1;index;input;"
    );
  });
}

#[test]
fn test_and_prefix_match_types() {
  with_global(|cx, global| {
    assert_eq!(eval(cx, global, "/ab/.test('xxabxx')"), Value::Bool(true));
    assert_eq!(eval(cx, global, "/ab/.test('xxx')"), Value::Bool(false));
    // A failed prefix match reports undefined rather than null.
    assert_eq!(
      eval_string(cx, global, "typeof /zz/.prefix('abc')"),
      "undefined"
    );
  });
}

#[test]
fn compile_replaces_the_program_and_resets_last_index() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var re = /a/g;\n\
         re.exec('aa');\n\
         re.compile('b', 'g');\n\
         [re.source, re.lastIndex, re.exec('xb').index].join(',')"
      ),
      "b,0,1"
    );
  });
}

#[test]
fn regexp_ctor_reuses_programs_and_gates_two_arg_form() {
  with_global(|cx, global| {
    // Passing an existing RegExp without flags reuses the program.
    assert_eq!(
      eval_string(cx, global, "new RegExp(/ab/gi).flags"),
      "gi"
    );
    // RegExp(regexp) as a plain call returns the argument itself.
    assert_eq!(
      eval(cx, global, "var re = /a/; RegExp(re) === re"),
      Value::Bool(true)
    );
    // ES6 permits regexp + flags.
    assert_eq!(
      eval_string(cx, global, "new RegExp(/ab/i, 'g').flags"),
      "g"
    );
  });

  // Below ES6 the two-argument form is a type error.
  let mut cx = Context::new();
  cx.enter().unwrap();
  cx.set_language_version(LanguageVersion::V1_8).unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();
  let err = cx
    .evaluate_string(global, "new RegExp(/ab/i, 'g')", "regexp.js", 1, None)
    .unwrap_err();
  match err {
    EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::TypeError),
    other => panic!("expected type error, got {}", other),
  }
  cx.exit().unwrap();
}

#[test]
fn invalid_patterns_and_flags_are_syntax_errors() {
  with_global(|cx, global| {
    for source in [
      "new RegExp('(')",
      "new RegExp('a', 'gg')",
      "new RegExp('a', 'q')",
    ] {
      let err = cx
        .evaluate_string(global, source, "regexp.js", 1, None)
        .unwrap_err();
      match err {
        EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::SyntaxError),
        other => panic!("expected syntax error from {:?}, got {}", source, other),
      }
    }
  });
}

#[test]
fn computed_instance_properties_reject_writes() {
  with_global(|cx, global| {
    // Sloppy code: the readonly write is silently dropped.
    assert_eq!(
      eval_string(cx, global, "var r = /x/gi; r.source = 'y'; r.source"),
      "x"
    );
    assert_eq!(
      eval_string(cx, global, "var r = /x/gi; r.flags = ''; r.flags"),
      "gi"
    );
    // Strict code: the same write is a type error, like `lastIndex`.
    let err = cx
      .evaluate_string(
        global,
        "'use strict'; /x/.source = 'y';",
        "regexp.js",
        1,
        None,
      )
      .unwrap_err();
    match err {
      EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::TypeError),
      other => panic!("expected type error, got {}", other),
    }
  });
}

#[test]
fn readonly_last_index_makes_global_exec_fail() {
  with_global(|cx, global| {
    let re = eval(cx, global, "/a/g");
    let Value::Object(re) = re else {
      panic!("expected a RegExp object");
    };
    cx.set_property_attributes(
      re,
      &PropertyKey::String("lastIndex".into()),
      READONLY | PERMANENT | DONTENUM,
    )
    .unwrap();

    let exec = cx.get_property_str(re, "exec").unwrap();
    let err = cx
      .call_function(exec, Value::Object(re), &[Value::string("aaa")])
      .unwrap_err();
    match err {
      EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::TypeError),
      other => panic!("expected type error, got {}", other),
    }
  });
}
