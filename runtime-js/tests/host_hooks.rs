use runtime_js::Context;
use runtime_js::ContextFactory;
use runtime_js::DebuggableScript;
use runtime_js::Debugger;
use runtime_js::EvalError;
use runtime_js::FactoryHooks;
use runtime_js::Feature;
use runtime_js::LanguageVersion;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

struct CountingHooks {
  observed: AtomicU32,
  terminate: bool,
}

impl FactoryHooks for CountingHooks {
  fn observe_instruction_count(&self, _cx: &mut Context, _count: u32) -> Result<(), EvalError> {
    self.observed.fetch_add(1, Ordering::SeqCst);
    if self.terminate {
      return Err(EvalError::evaluator("script took too long"));
    }
    Ok(())
  }
}

#[test]
fn instruction_observer_fires_and_can_terminate() {
  let factory = Arc::new(ContextFactory::new());
  let hooks = Arc::new(CountingHooks {
    observed: AtomicU32::new(0),
    terminate: true,
  });
  factory.set_hooks(hooks.clone());

  let mut cx = factory.make_context();
  cx.enter().unwrap();
  cx.set_instruction_observer_threshold(1000).unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();

  let err = cx
    .evaluate_string(global, "var i = 0; while (true) i = i + 1;", "spin.js", 1, None)
    .unwrap_err();
  assert!(matches!(err, EvalError::Evaluator { .. }));
  assert!(hooks.observed.load(Ordering::SeqCst) >= 1);
  cx.exit().unwrap();
}

struct FeatureOverride;

impl FactoryHooks for FeatureOverride {
  fn has_feature(&self, _cx: &Context, feature: Feature) -> Option<bool> {
    match feature {
      Feature::MemberExprAsFunctionName => Some(true),
      _ => None,
    }
  }
}

#[test]
fn factory_hook_overrides_feature_defaults() {
  let factory = Arc::new(ContextFactory::new());
  factory.set_hooks(Arc::new(FeatureOverride));
  let cx = factory.make_context();
  assert!(cx.has_feature(Feature::MemberExprAsFunctionName));
  // Unrelated features keep their defaults.
  assert!(!cx.has_feature(Feature::StrictMode));
}

#[test]
fn feature_defaults_follow_the_language_version() {
  let mut cx = Context::new();
  // ES6 defaults.
  assert!(cx.has_feature(Feature::EnumerateIdsFirst));
  assert!(cx.has_feature(Feature::E4x));
  assert!(!cx.has_feature(Feature::OldUndefNullThis));
  assert!(!cx.has_feature(Feature::ToStringAsSource));
  assert!(cx.has_feature(Feature::V8Extensions));
  assert!(cx.has_feature(Feature::ParentProtoProperties));

  cx.set_language_version(LanguageVersion::V1_2).unwrap();
  assert!(!cx.has_feature(Feature::EnumerateIdsFirst));
  assert!(!cx.has_feature(Feature::E4x));
  assert!(cx.has_feature(Feature::OldUndefNullThis));
  assert!(cx.has_feature(Feature::ToStringAsSource));
  assert!(cx.has_feature(Feature::NonEcmaGetYear));

  cx.set_language_version(LanguageVersion::V1_7).unwrap();
  assert!(cx.has_feature(Feature::OldUndefNullThis));
  cx.set_language_version(LanguageVersion::V1_8).unwrap();
  assert!(!cx.has_feature(Feature::OldUndefNullThis));
}

#[derive(Default)]
struct RecordingDebugger {
  compiled: Arc<Mutex<Vec<(Option<String>, bool)>>>,
}

impl Debugger for RecordingDebugger {
  fn handle_compilation_done(&mut self, _cx: &Context, script: &DebuggableScript, _source: &str) {
    self
      .compiled
      .lock()
      .unwrap()
      .push((script.function_name.clone(), script.is_function));
  }
}

#[test]
fn debugger_is_notified_recursively() {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();

  let log: Arc<Mutex<Vec<(Option<String>, bool)>>> = Arc::new(Mutex::new(Vec::new()));
  cx.set_debugger(
    Box::new(RecordingDebugger {
      compiled: log.clone(),
    }),
    None,
  )
  .unwrap();

  cx.compile_string(
    "function outer() { function inner() {} }",
    "dbg.js",
    1,
    None,
  )
  .unwrap();

  let seen = log.lock().unwrap();
  // Script first, then each nested function.
  assert_eq!(seen.len(), 3);
  assert_eq!(seen[0], (None, false));
  assert_eq!(seen[1], (Some("outer".to_string()), true));
  assert_eq!(seen[2], (Some("inner".to_string()), true));
  cx.exit().unwrap();
}

#[test]
fn security_tag_requires_a_controller() {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let err = cx
    .compile_string("1", "sec.js", 1, Some("trusted"))
    .unwrap_err();
  assert!(matches!(err, EvalError::Evaluator { .. }));
  cx.exit().unwrap();
}

#[test]
fn decompile_returns_retained_source_or_sentinel() {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();

  let func = cx
    .compile_function(global, "function f(a) { return a; }", "dec.js", 1, None)
    .unwrap();
  let source = cx.decompile_function(func, 2);
  assert!(source.contains("function f(a) { return a; }"));
  assert!(source.starts_with("  "));

  cx.set_generating_source(false).unwrap();
  let func = cx
    .compile_function(global, "function g() {}", "dec.js", 1, None)
    .unwrap();
  let source = cx.decompile_function(func, 0);
  assert!(source.contains("[native code]"));
  assert!(source.contains("function g"));
  cx.exit().unwrap();
}
