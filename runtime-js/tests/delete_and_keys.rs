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
  cx.evaluate_string(global, source, "keys.js", 1, None)
    .unwrap_or_else(|err| panic!("eval failed for {:?}: {}", source, err))
}

#[test]
fn delete_of_enumerated_prototype_entries_is_a_noop() {
  // Deleting an inherited key through the instance must not disturb the
  // prototype, and calling through the prototype afterwards still works.
  with_global(|cx, global| {
    let result = eval(
      cx,
      global,
      "Array.prototype.foo = function () { return 42; };\n\
       var t = [];\n\
       for (var i in t) delete t[i];\n\
       [].foo()",
    );
    assert_eq!(result, Value::Number(42.0));
  });
}

#[test]
fn delete_removes_own_properties_only() {
  with_global(|cx, global| {
    let result = eval(
      cx,
      global,
      "var proto = { p: 1 };\n\
       function C() { this.own = 2; }\n\
       C.prototype = proto;\n\
       var o = new C();\n\
       delete o.p;\n\
       delete o.own;\n\
       [o.p, o.own, delete o.absent].join(',')",
    );
    assert_eq!(result, Value::string("1,,true"));
  });
}

#[test]
fn get_own_property_names_is_ordered_and_own_only() {
  with_global(|cx, global| {
    let result = eval(
      cx,
      global,
      "var proto = { inherited: 1 };\n\
       function C() {}\n\
       C.prototype = proto;\n\
       var o = new C();\n\
       o.b = 1;\n\
       o[2] = 2;\n\
       o[0] = 3;\n\
       o.a = 4;\n\
       Object.getOwnPropertyNames(o).join(',')",
    );
    // Integer keys numerically first, then strings in insertion order;
    // prototype keys excluded.
    assert_eq!(result, Value::string("0,2,b,a"));
  });
}

#[test]
fn get_own_property_names_includes_non_enumerable_keys() {
  with_global(|cx, global| {
    let result = eval(cx, global, "Object.getOwnPropertyNames([7]).join(',')");
    assert_eq!(result, Value::string("0,length"));
  });
}

#[test]
fn get_own_property_names_rejects_non_objects() {
  with_global(|cx, global| {
    for source in [
      "Object.getOwnPropertyNames(undefined)",
      "Object.getOwnPropertyNames(null)",
      "Object.getOwnPropertyNames(5)",
    ] {
      let err = cx
        .evaluate_string(global, source, "keys.js", 1, None)
        .unwrap_err();
      match err {
        EvalError::Ecma { kind, .. } => assert_eq!(kind, EcmaErrorKind::TypeError),
        other => panic!("expected type error from {:?}, got {}", source, other),
      }
    }
  });
}

#[test]
fn permanent_properties_resist_delete() {
  with_global(|cx, global| {
    // `var` bindings at toplevel are permanent.
    let result = eval(cx, global, "var keep = 1; delete keep");
    assert_eq!(result, Value::Bool(false));
    let still = eval(cx, global, "keep");
    assert_eq!(still, Value::Number(1.0));
  });
}
