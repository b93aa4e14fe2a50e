use runtime_js::Context;
use runtime_js::ContextFactory;

#[test]
fn enter_binds_and_exit_releases() {
  let mut cx = Context::new();
  assert_eq!(Context::current_context_id(), None);

  cx.enter().unwrap();
  assert_eq!(Context::current_context_id(), Some(cx.id()));
  assert!(cx.is_entered());

  // Nested enter/exit keeps the binding until the counter returns to zero.
  cx.enter().unwrap();
  cx.exit().unwrap();
  assert_eq!(Context::current_context_id(), Some(cx.id()));

  cx.exit().unwrap();
  assert_eq!(Context::current_context_id(), None);
  assert!(!cx.is_entered());
}

#[test]
fn exit_without_enter_fails() {
  let mut cx = Context::new();
  assert!(cx.exit().is_err());
}

#[test]
fn entering_context_bound_to_another_thread_fails() {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let id = cx.id();

  let result = std::thread::scope(|scope| {
    scope
      .spawn(|| {
        // This thread sees no current context...
        assert_eq!(Context::current_context_id(), None);
        // ...and may not steal one bound elsewhere.
        let mut other = Context::new();
        other.enter().unwrap();
        assert_ne!(Context::current_context_id(), Some(id));
        other.exit().unwrap();
        Ok::<_, ()>(())
      })
      .join()
  });
  assert!(result.is_ok());

  cx.exit().unwrap();
}

#[test]
fn second_context_on_same_thread_is_rejected() {
  let mut a = Context::new();
  let mut b = Context::new();
  a.enter().unwrap();
  assert!(b.enter().is_err());
  a.exit().unwrap();
  // Once released, the other context may bind.
  b.enter().unwrap();
  b.exit().unwrap();
}

#[test]
fn call_enters_and_exits_on_all_paths() {
  let mut cx = Context::new();
  let id = cx.id();
  let observed = cx
    .call(|cx| {
      assert_eq!(Context::current_context_id(), Some(cx.id()));
      cx.id()
    })
    .unwrap();
  assert_eq!(observed, id);
  assert_eq!(Context::current_context_id(), None);
}

#[test]
fn factory_call_provides_a_fresh_context() {
  let factory = ContextFactory::global();
  let entered = factory
    .call(|cx| {
      assert!(cx.is_entered());
      true
    })
    .unwrap();
  assert!(entered);
  assert_eq!(Context::current_context_id(), None);
}
