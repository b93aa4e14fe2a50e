use runtime_js::Context;
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
  cx.evaluate_string(global, source, "protocols.js", 1, None)
    .unwrap_or_else(|err| panic!("eval failed for {:?}: {}", source, err))
}

fn eval_string(cx: &mut Context, global: JsObject, source: &str) -> String {
  match eval(cx, global, source) {
    Value::String(s) => s.to_utf8_lossy(),
    other => panic!("expected string from {:?}, got {:?}", source, other),
  }
}

fn eval_number(cx: &mut Context, global: JsObject, source: &str) -> f64 {
  match eval(cx, global, source) {
    Value::Number(n) => n,
    other => panic!("expected number from {:?}, got {:?}", source, other),
  }
}

#[test]
fn non_global_match_delegates_to_exec() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var m = 'a1b2'.match(/(\\d)/); [m[0], m[1], m.index].join(',')"
      ),
      "1,1,1"
    );
    assert_eq!(
      eval(cx, global, "'xyz'.match(/q/)"),
      Value::Null
    );
  });
}

#[test]
fn global_match_collects_all_matches() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(cx, global, "'cat hat bat'.match(/[chb]at/g).join(',')"),
      "cat,hat,bat"
    );
    assert_eq!(
      eval(cx, global, "'xyz'.match(/q/g)"),
      Value::Null
    );
  });
}

#[test]
fn empty_match_advance() {
  with_global(|cx, global| {
    // "".match(/a*/g) yields [""].
    assert_eq!(eval_number(cx, global, "''.match(/a*/g).length"), 1.0);
    assert_eq!(eval_string(cx, global, "''.match(/a*/g)[0]"), "");
    // "ab".match(/a*/g) yields ["a", "", ""].
    assert_eq!(
      eval_string(cx, global, "'ab'.match(/a*/g).join('|')"),
      "a||"
    );
    assert_eq!(eval_number(cx, global, "'ab'.match(/a*/g).length"), 3.0);
  });
}

#[test]
fn unicode_empty_match_advance_is_surrogate_aware() {
  with_global(|cx, global| {
    // One code point (a surrogate pair) plus "b": boundaries 0, 2, 3.
    assert_eq!(
      eval_number(cx, global, "'\\uD83D\\uDE00b'.match(/(?:)/gu).length"),
      3.0
    );
    // Without the u flag the lone-surrogate boundary at 1 is visited too.
    assert_eq!(
      eval_number(cx, global, "'\\uD83D\\uDE00b'.match(/(?:)/g).length"),
      4.0
    );
  });
}

#[test]
fn match_all_yields_successive_results() {
  with_global(|cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "var it = 'a1b2'.matchAll(/(\\d)/g);\n\
         var out = [];\n\
         var r = it.next();\n\
         while (!r.done) { out.push(r.value[0] + '@' + r.value.index); r = it.next(); }\n\
         out.join(',')"
      ),
      "1@1,2@3"
    );
    // The iterator is lazy: the receiver's lastIndex is copied to a fresh
    // matcher, leaving the receiver untouched.
    assert_eq!(
      eval_number(
        cx,
        global,
        "var re = /x/g; 'xx'.matchAll(re).next(); re.lastIndex"
      ),
      0.0
    );
    // Exhausted iterators keep reporting done.
    assert_eq!(
      eval(
        cx,
        global,
        "var it = 'q'.matchAll(/q/g); it.next(); it.next(); it.next().done"
      ),
      Value::Bool(true)
    );
  });
}

#[test]
fn search_reports_index_or_minus_one() {
  with_global(|cx, global| {
    assert_eq!(eval_number(cx, global, "'hello'.search(/l+/)"), 2.0);
    assert_eq!(eval_number(cx, global, "'hello'.search(/zz/)"), -1.0);
  });
}

#[test]
fn replaced_exec_is_honored_by_the_protocols() {
  with_global(|cx, global| {
    // The dynamic protocol reads `exec` from the receiver.
    assert_eq!(
      eval_string(
        cx,
        global,
        "var re = /q/;\n\
         re.exec = function (s) { var r = ['fake']; r.index = 7; return r; };\n\
         var m = 'zzz'.match(re);\n\
         m[0] + '@' + m.index"
      ),
      "fake@7"
    );
  });
}
