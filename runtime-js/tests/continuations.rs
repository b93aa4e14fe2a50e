use runtime_js::Context;
use runtime_js::EvalError;
use runtime_js::JsObject;
use runtime_js::PropertyKey;
use runtime_js::Value;
use runtime_js::DONTENUM;

fn with_global(f: impl FnOnce(&mut Context, JsObject)) {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();
  f(&mut cx, global);
  cx.exit().unwrap();
}

/// A host function that suspends the running script.
fn native_pause(
  cx: &mut Context,
  _this: Value,
  _args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  let pending = cx.capture_continuation()?;
  Err(EvalError::ContinuationPending(pending))
}

/// A host function that calls back into script, creating a host frame
/// between two script frames.
fn native_call_through(
  cx: &mut Context,
  this: Value,
  args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  let callee = args.first().cloned().unwrap_or(Value::Undefined);
  cx.call_function(callee, this, &[])
}

fn install(cx: &mut Context, global: JsObject, name: &str, func: runtime_js::NativeFn) {
  let f = cx.new_native_function(name, 1, func, false);
  cx.define_property(global, PropertyKey::from_str(name), Value::Object(f), DONTENUM);
}

#[test]
fn capture_and_resume_delivers_the_value() {
  with_global(|cx, global| {
    install(cx, global, "pause", native_pause);
    let func = cx
      .compile_function(
        global,
        "function f(base) { return base + pause() + 1; }",
        "cont.js",
        1,
        None,
      )
      .unwrap();

    let err = cx
      .call_function_with_continuations(Value::Object(func), global, &[Value::Number(100.0)])
      .unwrap_err();
    let EvalError::ContinuationPending(pending) = err else {
      panic!("expected a pending continuation, got {}", err);
    };

    let continuation = pending.into_continuation();
    let result = cx
      .resume_continuation(&continuation, global, Value::Number(41.0))
      .unwrap();
    // The supplied value becomes the result of the suspending call.
    assert_eq!(result, Value::Number(142.0));
  });
}

#[test]
fn capture_works_through_nested_script_frames() {
  with_global(|cx, global| {
    install(cx, global, "pause", native_pause);
    cx.evaluate_string(
      global,
      "function inner() { return pause() * 2; }\n\
       function outer() { return inner() + 1; }",
      "cont.js",
      1,
      None,
    )
    .unwrap();
    let outer = cx.get_property_str(global, "outer").unwrap();

    let err = cx
      .call_function_with_continuations(outer, global, &[])
      .unwrap_err();
    let EvalError::ContinuationPending(pending) = err else {
      panic!("expected a pending continuation, got {}", err);
    };

    let result = cx
      .resume_continuation(&pending.into_continuation(), global, Value::Number(10.0))
      .unwrap();
    assert_eq!(result, Value::Number(21.0));
  });
}

#[test]
fn capture_through_a_host_frame_is_an_evaluator_error() {
  with_global(|cx, global| {
    install(cx, global, "pause", native_pause);
    install(cx, global, "callThrough", native_call_through);
    cx.evaluate_string(
      global,
      "function g() { return pause(); }\n\
       function h() { return callThrough(g); }",
      "cont.js",
      1,
      None,
    )
    .unwrap();
    let h = cx.get_property_str(global, "h").unwrap();

    let err = cx
      .call_function_with_continuations(h, global, &[])
      .unwrap_err();
    assert!(
      matches!(err, EvalError::Evaluator { .. }),
      "expected an evaluator error, got {}",
      err
    );
  });
}

#[test]
fn capture_outside_a_continuations_top_call_fails() {
  with_global(|cx, global| {
    install(cx, global, "pause", native_pause);
    // A plain evaluate entry point does not arm continuation capture.
    let err = cx
      .evaluate_string(global, "pause()", "cont.js", 1, None)
      .unwrap_err();
    assert!(
      matches!(err, EvalError::Evaluator { .. }),
      "expected an evaluator error, got {}",
      err
    );
  });
}

#[test]
fn only_interpreted_functions_may_run_with_continuations() {
  with_global(|cx, global| {
    let native = cx.new_native_function("n", 0, native_pause, false);
    let err = cx
      .call_function_with_continuations(Value::Object(native), global, &[])
      .unwrap_err();
    assert!(matches!(err, EvalError::Evaluator { .. }));
  });
}
