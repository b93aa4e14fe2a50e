use crate::context::Context;
use crate::context::ContextError;
use crate::context::Feature;
use crate::error::EvalError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::RwLock;

/// Notified when contexts created by a factory are bound/released.
pub trait ContextListener: Send + Sync {
  fn context_created(&self, cx: &Context);
  fn context_released(&self, cx: &Context);
}

/// Customization hooks a host installs on its factory instead of subclassing
/// the context.
pub trait FactoryHooks: Send + Sync {
  /// Override a feature decision. `None` defers to the version-dependent
  /// default.
  fn has_feature(&self, cx: &Context, feature: Feature) -> Option<bool> {
    let _ = (cx, feature);
    None
  }

  /// Called when the executed-instruction counter crosses the observer
  /// threshold. Returning an error terminates the running script.
  fn observe_instruction_count(&self, cx: &mut Context, count: u32) -> Result<(), EvalError> {
    let _ = (cx, count);
    Ok(())
  }
}

/// Creates contexts and carries cross-context policy (feature overrides,
/// instruction observation, sealing of new contexts).
pub struct ContextFactory {
  sealed: AtomicBool,
  listeners: Mutex<Vec<Box<dyn ContextListener>>>,
  hooks: RwLock<Option<Arc<dyn FactoryHooks>>>,
}

impl Default for ContextFactory {
  fn default() -> Self {
    Self::new()
  }
}

impl ContextFactory {
  pub fn new() -> Self {
    Self {
      sealed: AtomicBool::new(false),
      listeners: Mutex::new(Vec::new()),
      hooks: RwLock::new(None),
    }
  }

  /// The process-wide default factory.
  pub fn global() -> Arc<ContextFactory> {
    static GLOBAL: OnceLock<Arc<ContextFactory>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(ContextFactory::new())).clone()
  }

  /// Make a fresh, unbound context associated with this factory.
  pub fn make_context(self: &Arc<Self>) -> Context {
    Context::with_factory(self.clone())
  }

  /// Make a context and bind it to the calling thread.
  pub fn enter_context(self: &Arc<Self>) -> Result<Context, ContextError> {
    let mut cx = self.make_context();
    cx.enter()?;
    Ok(cx)
  }

  /// Run `action` inside a freshly entered context, exiting on all paths.
  pub fn call<R>(
    self: &Arc<Self>,
    action: impl FnOnce(&mut Context) -> R,
  ) -> Result<R, ContextError> {
    let mut cx = self.enter_context()?;
    let result = action(&mut cx);
    cx.exit()?;
    Ok(result)
  }

  /// Seal the factory: contexts it creates from now on are sealed on entry.
  pub fn seal_factory(&self) {
    self.sealed.store(true, Ordering::SeqCst);
  }

  pub fn is_sealed(&self) -> bool {
    self.sealed.load(Ordering::SeqCst)
  }

  pub fn add_listener(&self, listener: Box<dyn ContextListener>) {
    self.listeners.lock().unwrap().push(listener);
  }

  pub fn set_hooks(&self, hooks: Arc<dyn FactoryHooks>) {
    *self.hooks.write().unwrap() = Some(hooks);
  }

  fn hooks(&self) -> Option<Arc<dyn FactoryHooks>> {
    self.hooks.read().unwrap().clone()
  }

  pub(crate) fn hook_has_feature(&self, cx: &Context, feature: Feature) -> Option<bool> {
    self.hooks().and_then(|h| h.has_feature(cx, feature))
  }

  pub(crate) fn hook_observe_instruction_count(
    &self,
    cx: &mut Context,
    count: u32,
  ) -> Result<(), EvalError> {
    // Clone the hook handle out of the lock; the hook may reenter the
    // factory.
    match self.hooks() {
      Some(hooks) => hooks.observe_instruction_count(cx, count),
      None => Ok(()),
    }
  }

  pub(crate) fn on_context_created(&self, cx: &Context) {
    for listener in self.listeners.lock().unwrap().iter() {
      listener.context_created(cx);
    }
  }

  pub(crate) fn on_context_released(&self, cx: &Context) {
    for listener in self.listeners.lock().unwrap().iter() {
      listener.context_released(cx);
    }
  }
}
