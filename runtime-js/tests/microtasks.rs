use runtime_js::Context;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn microtasks_run_in_fifo_order() {
  let mut cx = Context::new();
  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
  for i in 1..=3u8 {
    let sink = sink.clone();
    cx.enqueue_microtask(Box::new(move |_cx| sink.borrow_mut().push(i)));
  }
  cx.process_microtasks();
  assert_eq!(&*sink.borrow(), &[1, 2, 3]);
}

#[test]
fn tasks_enqueued_while_draining_run_in_the_same_drain() {
  let mut cx = Context::new();
  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

  let sink_a = sink.clone();
  cx.enqueue_microtask(Box::new(move |cx| {
    sink_a.borrow_mut().push(1);
    let sink_c = sink_a.clone();
    cx.enqueue_microtask(Box::new(move |_cx| sink_c.borrow_mut().push(3)));
  }));
  let sink_b = sink.clone();
  cx.enqueue_microtask(Box::new(move |_cx| sink_b.borrow_mut().push(2)));

  cx.process_microtasks();
  // A ran first, then B (already queued), then C (enqueued by A).
  assert_eq!(&*sink.borrow(), &[1, 2, 3]);
  assert_eq!(cx.pending_microtask_count(), 0);
}

#[test]
fn draining_an_empty_queue_is_idempotent() {
  let mut cx = Context::new();
  cx.process_microtasks();
  cx.process_microtasks();
  assert_eq!(cx.pending_microtask_count(), 0);
}

#[test]
fn evaluate_drains_microtasks_before_returning() {
  let mut cx = Context::new();
  cx.enter().unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();

  let ran = Rc::new(RefCell::new(false));
  let ran_inner = ran.clone();
  cx.enqueue_microtask(Box::new(move |_cx| *ran_inner.borrow_mut() = true));

  cx.evaluate_string(global, "1 + 1", "test.js", 1, None)
    .unwrap();
  assert!(*ran.borrow(), "the evaluate entry point must drain the queue");
  cx.exit().unwrap();
}

#[test]
fn unhandled_rejection_tracker_is_per_context() {
  let mut cx = Context::new();
  cx.set_track_unhandled_promise_rejections(true);
  cx.unhandled_promise_tracker()
    .rejected(runtime_js::Value::Number(7.0));
  let mut seen = Vec::new();
  cx.unhandled_promise_tracker().process(|v| seen.push(v));
  assert_eq!(seen.len(), 1);
}
