use crate::error::EvalError;
use crate::factory::ContextFactory;
use crate::heap::JsObject;
use crate::heap::ObjectHeap;
use crate::hooks::Debugger;
use crate::hooks::ModuleLoader;
use crate::hooks::WrapFactory;
use crate::interpreter::Frame;
use crate::realm::Realm;
use crate::rejection::UnhandledRejectionTracker;
use crate::reporter::DefaultErrorReporter;
use crate::reporter::ErrorReporter;
use crate::security::has_global_security_controller;
use crate::security::load_regexp_proxy;
use crate::security::ClassShutter;
use crate::security::RegExpProxy;
use crate::security::SecurityController;
use ahash::HashMap;
use ahash::HashMapExt;
use std::any::Any;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::thread::ThreadId;

/// Language versions selectable on a context.
///
/// The numeric forms are the historical version numbers (`100`..`180` for
/// the 1.x dialects, `200` for ES6, `250` for current ECMAScript, `0` for
/// the legacy default, `-1` for unknown).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LanguageVersion {
  Unknown,
  Default,
  V1_0,
  V1_1,
  V1_2,
  V1_3,
  V1_4,
  V1_5,
  V1_6,
  V1_7,
  V1_8,
  ES6,
  Ecmascript,
}

impl LanguageVersion {
  pub fn as_number(self) -> i32 {
    match self {
      LanguageVersion::Unknown => -1,
      LanguageVersion::Default => 0,
      LanguageVersion::V1_0 => 100,
      LanguageVersion::V1_1 => 110,
      LanguageVersion::V1_2 => 120,
      LanguageVersion::V1_3 => 130,
      LanguageVersion::V1_4 => 140,
      LanguageVersion::V1_5 => 150,
      LanguageVersion::V1_6 => 160,
      LanguageVersion::V1_7 => 170,
      LanguageVersion::V1_8 => 180,
      LanguageVersion::ES6 => 200,
      LanguageVersion::Ecmascript => 250,
    }
  }

  /// Convert from the historical numeric form; an unlisted number is an
  /// invalid-argument error.
  pub fn from_number(version: i32) -> Result<LanguageVersion, ContextError> {
    Ok(match version {
      -1 => LanguageVersion::Unknown,
      0 => LanguageVersion::Default,
      100 => LanguageVersion::V1_0,
      110 => LanguageVersion::V1_1,
      120 => LanguageVersion::V1_2,
      130 => LanguageVersion::V1_3,
      140 => LanguageVersion::V1_4,
      150 => LanguageVersion::V1_5,
      160 => LanguageVersion::V1_6,
      170 => LanguageVersion::V1_7,
      180 => LanguageVersion::V1_8,
      200 => LanguageVersion::ES6,
      250 => LanguageVersion::Ecmascript,
      other => {
        return Err(ContextError::InvalidArgument(format!(
          "bad language version: {}",
          other
        )))
      }
    })
  }
}

/// Togglable engine features. Defaults depend on the language version; a
/// factory hook may override any of them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Feature {
  NonEcmaGetYear,
  MemberExprAsFunctionName,
  ReservedKeywordAsIdentifier,
  ToStringAsSource,
  ParentProtoProperties,
  E4x,
  DynamicScope,
  StrictVars,
  StrictEval,
  LocationInformationInError,
  StrictMode,
  WarningAsError,
  EnhancedJavaAccess,
  V8Extensions,
  OldUndefNullThis,
  EnumerateIdsFirst,
  ThreadSafeObjects,
  IntegerWithoutDecimalPlace,
  LittleEndian,
  EnableXmlSecureParsing,
  EnableJavaMapAccess,
  Intl402,
}

/// Context lifecycle and configuration failures ("invalid-state" and
/// "invalid-argument" signals).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContextError {
  #[error("invalid context state: {0}")]
  InvalidState(String),
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("security violation: {0}")]
  Security(String),
}

/// An identity key for sealing. Unsealing requires the identical key value
/// (pointer identity, not structural equality).
#[derive(Clone, Debug)]
pub struct SealKey(Arc<()>);

impl SealKey {
  pub fn new() -> SealKey {
    SealKey(Arc::new(()))
  }

  fn same(&self, other: &SealKey) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl Default for SealKey {
  fn default() -> Self {
    SealKey::new()
  }
}

/// A unique identity for a context, observable through
/// [`Context::current_context_id`] while the context is entered.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContextId(u64);

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

fn bound_registry() -> &'static Mutex<std::collections::HashMap<u64, ThreadId>> {
  static REGISTRY: OnceLock<Mutex<std::collections::HashMap<u64, ThreadId>>> = OnceLock::new();
  REGISTRY.get_or_init(|| Mutex::new(std::collections::HashMap::new()))
}

thread_local! {
  static CURRENT: Cell<Option<u64>> = const { Cell::new(None) };
}

/// A deferred callable drained after the current evaluation.
pub type Microtask = Box<dyn FnOnce(&mut Context)>;

/// One-shot token granting the right to install a context's class shutter
/// after the slot has been claimed.
#[derive(Debug)]
pub struct ClassShutterSetter {
  context: ContextId,
}

/// The runtime context of an executing script: per-thread ambient state for
/// language configuration, compilation, and interpretation.
///
/// A context must be entered (bound to the calling thread) before it can
/// evaluate scripts, and a context is bound to at most one thread at a time.
pub struct Context {
  id: ContextId,
  factory: Arc<ContextFactory>,

  version: LanguageVersion,
  sealed: bool,
  seal_key: Option<SealKey>,
  enter_count: u32,

  error_reporter: Option<Box<dyn ErrorReporter>>,
  locale: Option<String>,
  time_zone: Option<String>,

  generating_source: bool,
  generating_debug: bool,
  generating_debug_changed: bool,
  interpreted_mode: bool,
  maximum_interpreter_stack_depth: usize,

  instruction_threshold: u32,
  pub(crate) instruction_count: u32,

  debugger: Option<Box<dyn Debugger>>,
  debugger_data: Option<Box<dyn Any>>,
  wrap_factory: Option<Box<dyn WrapFactory>>,
  security_controller: Option<Box<dyn SecurityController>>,
  class_shutter: Option<Box<dyn ClassShutter>>,
  has_class_shutter: bool,
  module_loader: Option<Box<dyn ModuleLoader>>,
  property_listeners: Vec<Box<dyn FnMut(&str)>>,

  thread_locals: HashMap<String, Box<dyn Any>>,
  microtasks: VecDeque<Microtask>,
  unhandled_rejections: UnhandledRejectionTracker,

  regexp_proxy: Option<Rc<dyn RegExpProxy>>,

  // Interpreter state. Frames are heap data on the context so continuation
  // capture can snapshot them and native callbacks can observe positions.
  pub(crate) frames: Vec<Frame>,
  pub(crate) interpreter_entries: Vec<usize>,
  pub(crate) continuations_top_call: bool,
  pub(crate) top_call_scope: Option<JsObject>,
  pub(crate) is_top_level_strict: bool,

  pub(crate) heap: ObjectHeap,
  pub(crate) realm: Option<Realm>,
}

impl Context {
  /// Create a context on the global factory.
  pub fn new() -> Context {
    Context::with_factory(ContextFactory::global())
  }

  /// Create a context associated with `factory`. The context starts in
  /// interpreted mode (there is no native-code backend linked into this
  /// build) at language version ES6.
  pub fn with_factory(factory: Arc<ContextFactory>) -> Context {
    Context {
      id: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
      factory,
      version: LanguageVersion::ES6,
      sealed: false,
      seal_key: None,
      enter_count: 0,
      error_reporter: None,
      locale: None,
      time_zone: None,
      generating_source: true,
      generating_debug: false,
      generating_debug_changed: false,
      interpreted_mode: true,
      maximum_interpreter_stack_depth: usize::MAX,
      instruction_threshold: 0,
      instruction_count: 0,
      debugger: None,
      debugger_data: None,
      wrap_factory: None,
      security_controller: None,
      class_shutter: None,
      has_class_shutter: false,
      module_loader: None,
      property_listeners: Vec::new(),
      thread_locals: HashMap::new(),
      microtasks: VecDeque::new(),
      unhandled_rejections: UnhandledRejectionTracker::new(),
      regexp_proxy: None,
      frames: Vec::new(),
      interpreter_entries: Vec::new(),
      continuations_top_call: false,
      top_call_scope: None,
      is_top_level_strict: false,
      heap: ObjectHeap::new(),
      realm: None,
    }
  }

  pub fn id(&self) -> ContextId {
    self.id
  }

  pub fn factory(&self) -> Arc<ContextFactory> {
    self.factory.clone()
  }

  /// The context id bound to the calling thread, observable only between an
  /// `enter` and its matching `exit`.
  pub fn current_context_id() -> Option<ContextId> {
    CURRENT.with(|c| c.get()).map(ContextId)
  }

  /// Bind this context to the calling thread (incrementing the nesting
  /// counter). Fails when the context is bound to another thread, or when
  /// another context is already bound to this thread.
  pub fn enter(&mut self) -> Result<(), ContextError> {
    let thread = std::thread::current().id();
    let mut registry = bound_registry().lock().unwrap();
    match registry.get(&self.id.0) {
      Some(bound) if *bound != thread => {
        return Err(ContextError::InvalidState(
          "Context is already associated with another thread".into(),
        ));
      }
      Some(_) => {}
      None => {
        let current = CURRENT.with(|c| c.get());
        if let Some(other) = current {
          if other != self.id.0 {
            return Err(ContextError::InvalidState(
              "another Context is already associated with this thread".into(),
            ));
          }
        }
        registry.insert(self.id.0, thread);
        CURRENT.with(|c| c.set(Some(self.id.0)));
        drop(registry);
        self.factory.on_context_created(self);
        if self.factory.is_sealed() && !self.sealed {
          self.seal(None);
        }
        self.enter_count += 1;
        return Ok(());
      }
    }
    self.enter_count += 1;
    Ok(())
  }

  /// Decrement the nesting counter; on reaching zero, detach from the thread
  /// and notify the factory.
  pub fn exit(&mut self) -> Result<(), ContextError> {
    if self.enter_count == 0 {
      return Err(ContextError::InvalidState(
        "calling exit without previous enter".into(),
      ));
    }
    let current = CURRENT.with(|c| c.get());
    if current != Some(self.id.0) {
      return Err(ContextError::InvalidState(
        "Context is not associated with this thread".into(),
      ));
    }
    self.enter_count -= 1;
    if self.enter_count == 0 {
      bound_registry().lock().unwrap().remove(&self.id.0);
      CURRENT.with(|c| c.set(None));
      self.factory.on_context_released(self);
    }
    Ok(())
  }

  /// Scoped enter + action + guaranteed exit on all return paths.
  pub fn call<R>(&mut self, action: impl FnOnce(&mut Context) -> R) -> Result<R, ContextError> {
    self.enter()?;
    let result = action(self);
    self.exit()?;
    Ok(result)
  }

  pub fn is_entered(&self) -> bool {
    self.enter_count > 0
  }

  // --- Sealing -----------------------------------------------------------

  pub fn is_sealed(&self) -> bool {
    self.sealed
  }

  /// Seal: every setter fails from now on. If `seal_key` is `None`, the seal
  /// is permanent; otherwise [`Context::unseal`] with the identical key
  /// restores mutability.
  pub fn seal(&mut self, seal_key: Option<SealKey>) {
    self.sealed = true;
    self.seal_key = seal_key;
  }

  pub fn unseal(&mut self, seal_key: &SealKey) -> Result<(), ContextError> {
    if !self.sealed {
      return Err(ContextError::InvalidState("context is not sealed".into()));
    }
    match &self.seal_key {
      Some(existing) if existing.same(seal_key) => {
        self.sealed = false;
        self.seal_key = None;
        Ok(())
      }
      Some(_) => Err(ContextError::InvalidArgument("wrong seal key".into())),
      None => Err(ContextError::InvalidArgument(
        "context was sealed without a key".into(),
      )),
    }
  }

  fn check_not_sealed(&self) -> Result<(), ContextError> {
    if self.sealed {
      return Err(ContextError::InvalidState("context is sealed".into()));
    }
    Ok(())
  }

  // --- Language version and features -------------------------------------

  pub fn language_version(&self) -> LanguageVersion {
    self.version
  }

  pub fn set_language_version(&mut self, version: LanguageVersion) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    if version != self.version {
      self.fire_property_change("language version");
    }
    self.version = version;
    Ok(())
  }

  /// Whether a feature is on, consulting the factory's override hook first
  /// and falling back to the version-dependent default.
  pub fn has_feature(&self, feature: Feature) -> bool {
    if let Some(answer) = self.factory.clone().hook_has_feature(self, feature) {
      return answer;
    }
    self.default_feature(feature)
  }

  fn default_feature(&self, feature: Feature) -> bool {
    let v = self.version.as_number();
    match feature {
      Feature::NonEcmaGetYear => (100..=120).contains(&v),
      Feature::ToStringAsSource => v == 120,
      Feature::ParentProtoProperties => true,
      Feature::E4x => v == 0 || v >= 160,
      Feature::V8Extensions => true,
      Feature::OldUndefNullThis => v <= 170,
      Feature::EnumerateIdsFirst => v >= 200,
      // STRICT_MODE implies the two narrower strictness features.
      Feature::StrictVars | Feature::StrictEval => {
        self
          .factory
          .clone()
          .hook_has_feature(self, Feature::StrictMode)
          .unwrap_or(false)
      }
      _ => false,
    }
  }

  // --- Error reporting ----------------------------------------------------

  /// Replace the error reporter, returning the previous one.
  pub fn set_error_reporter(
    &mut self,
    reporter: Box<dyn ErrorReporter>,
  ) -> Result<Option<Box<dyn ErrorReporter>>, ContextError> {
    self.check_not_sealed()?;
    self.fire_property_change("error reporter");
    Ok(self.error_reporter.replace(reporter))
  }

  /// Report a warning through the installed reporter; upgraded to an error
  /// when the warning-as-error feature is on.
  pub fn report_warning(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  ) {
    if self.has_feature(Feature::WarningAsError) {
      self.report_error(message, source_name, line_number, line_source, line_offset);
      return;
    }
    self.with_reporter(|reporter| {
      reporter.warning(message, source_name, line_number, line_source, line_offset)
    });
  }

  pub fn report_error(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  ) {
    self.with_reporter(|reporter| {
      reporter.error(message, source_name, line_number, line_source, line_offset)
    });
  }

  pub fn report_runtime_error(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  ) -> EvalError {
    let mut taken = self.error_reporter.take();
    let result = match &mut taken {
      Some(reporter) => {
        reporter.runtime_error(message, source_name, line_number, line_source, line_offset)
      }
      None => DefaultErrorReporter.runtime_error(
        message,
        source_name,
        line_number,
        line_source,
        line_offset,
      ),
    };
    self.error_reporter = taken;
    result
  }

  fn with_reporter(&mut self, f: impl FnOnce(&mut dyn ErrorReporter)) {
    // Take the reporter out so it may call back into the context.
    match self.error_reporter.take() {
      Some(mut reporter) => {
        f(reporter.as_mut());
        self.error_reporter = Some(reporter);
      }
      None => f(&mut DefaultErrorReporter),
    }
  }

  // --- Locale and time zone ----------------------------------------------

  pub fn locale(&self) -> Option<&str> {
    self.locale.as_deref()
  }

  pub fn set_locale(&mut self, locale: impl Into<String>) -> Result<Option<String>, ContextError> {
    self.check_not_sealed()?;
    Ok(self.locale.replace(locale.into()))
  }

  pub fn time_zone(&self) -> Option<&str> {
    self.time_zone.as_deref()
  }

  pub fn set_time_zone(
    &mut self,
    time_zone: impl Into<String>,
  ) -> Result<Option<String>, ContextError> {
    self.check_not_sealed()?;
    Ok(self.time_zone.replace(time_zone.into()))
  }

  // --- Compilation settings ----------------------------------------------

  pub fn is_generating_source(&self) -> bool {
    self.generating_source
  }

  pub fn set_generating_source(&mut self, generating: bool) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.generating_source = generating;
    Ok(())
  }

  pub fn is_generating_debug(&self) -> bool {
    self.generating_debug
  }

  pub fn is_generating_debug_changed(&self) -> bool {
    self.generating_debug_changed
  }

  pub fn set_generating_debug(&mut self, generating: bool) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.generating_debug_changed = true;
    self.generating_debug = generating;
    Ok(())
  }

  /// Whether the context runs scripts in the interpreter. Always true in
  /// this build; kept settable for embeddings that link a code generator.
  pub fn is_interpreted_mode(&self) -> bool {
    self.interpreted_mode
  }

  pub fn set_interpreted_mode(&mut self, interpreted: bool) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.interpreted_mode = interpreted;
    Ok(())
  }

  pub fn maximum_interpreter_stack_depth(&self) -> usize {
    self.maximum_interpreter_stack_depth
  }

  /// Limit interpreter frame depth. Only meaningful (and only settable) in
  /// interpreted mode; the interpreter manages its frames on the heap, so a
  /// runaway recursion would otherwise consume all memory instead of
  /// overflowing a thread stack.
  pub fn set_maximum_interpreter_stack_depth(&mut self, max: usize) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    if !self.interpreted_mode {
      return Err(ContextError::InvalidState(
        "cannot set maximum stack depth outside interpreted mode".into(),
      ));
    }
    if max < 1 {
      return Err(ContextError::InvalidArgument(
        "maximum stack depth must be at least 1".into(),
      ));
    }
    self.maximum_interpreter_stack_depth = max;
    Ok(())
  }

  // --- Instruction observation -------------------------------------------

  pub fn instruction_observer_threshold(&self) -> u32 {
    self.instruction_threshold
  }

  /// A threshold of zero disables counting; otherwise the factory hook is
  /// invoked each time the runtime executes at least this many instructions.
  pub fn set_instruction_observer_threshold(&mut self, threshold: u32) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.instruction_threshold = threshold;
    Ok(())
  }

  pub(crate) fn observe_instruction_count(&mut self) -> Result<(), EvalError> {
    let count = self.instruction_count;
    self.instruction_count = 0;
    let factory = self.factory.clone();
    factory.hook_observe_instruction_count(self, count)
  }

  // --- Host SPI slots ----------------------------------------------------

  pub fn set_debugger(
    &mut self,
    debugger: Box<dyn Debugger>,
    data: Option<Box<dyn Any>>,
  ) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.debugger = Some(debugger);
    self.debugger_data = data;
    Ok(())
  }

  pub fn debugger_context_data(&self) -> Option<&dyn Any> {
    self.debugger_data.as_deref()
  }

  pub(crate) fn take_debugger(&mut self) -> Option<Box<dyn Debugger>> {
    self.debugger.take()
  }

  pub(crate) fn restore_debugger(&mut self, debugger: Option<Box<dyn Debugger>>) {
    if self.debugger.is_none() {
      self.debugger = debugger;
    }
  }

  pub fn has_debugger(&self) -> bool {
    self.debugger.is_some()
  }

  pub fn set_wrap_factory(&mut self, factory: Box<dyn WrapFactory>) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.wrap_factory = Some(factory);
    Ok(())
  }

  pub fn wrap_factory(&self) -> Option<&dyn WrapFactory> {
    self.wrap_factory.as_deref()
  }

  /// Install a security controller. Write-once, and refused while a global
  /// controller is installed.
  pub fn set_security_controller(
    &mut self,
    controller: Box<dyn SecurityController>,
  ) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    if self.security_controller.is_some() {
      return Err(ContextError::Security(
        "cannot overwrite existing SecurityController".into(),
      ));
    }
    if has_global_security_controller() {
      return Err(ContextError::Security(
        "cannot overwrite existing global SecurityController".into(),
      ));
    }
    self.security_controller = Some(controller);
    Ok(())
  }

  pub(crate) fn security_controller(&self) -> Option<&dyn SecurityController> {
    if let Some(global) = crate::security::global_security_controller() {
      return Some(global);
    }
    self.security_controller.as_deref()
  }

  pub fn has_security_controller(&self) -> bool {
    self.security_controller.is_some() || has_global_security_controller()
  }

  /// Install the class-access filter. Singleton per context: the second call
  /// fails.
  pub fn set_class_shutter(&mut self, shutter: Box<dyn ClassShutter>) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    if self.has_class_shutter {
      return Err(ContextError::Security(
        "cannot overwrite existing ClassShutter".into(),
      ));
    }
    self.class_shutter = Some(shutter);
    self.has_class_shutter = true;
    Ok(())
  }

  pub fn class_shutter(&self) -> Option<&dyn ClassShutter> {
    self.class_shutter.as_deref()
  }

  /// Claim the right to install the class shutter later. Available at most
  /// once per context, and only while no shutter has been installed.
  pub fn class_shutter_setter(&mut self) -> Option<ClassShutterSetter> {
    if self.has_class_shutter {
      return None;
    }
    self.has_class_shutter = true;
    Some(ClassShutterSetter { context: self.id })
  }

  /// Install the class shutter through a previously claimed setter token.
  pub fn set_class_shutter_via(
    &mut self,
    setter: &ClassShutterSetter,
    shutter: Box<dyn ClassShutter>,
  ) -> Result<(), ContextError> {
    if setter.context != self.id {
      return Err(ContextError::InvalidArgument(
        "setter token belongs to a different context".into(),
      ));
    }
    self.class_shutter = Some(shutter);
    Ok(())
  }

  pub fn set_module_loader(&mut self, loader: Box<dyn ModuleLoader>) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.module_loader = Some(loader);
    Ok(())
  }

  pub fn module_loader(&self) -> Option<&dyn ModuleLoader> {
    self.module_loader.as_deref()
  }

  pub fn add_property_change_listener(
    &mut self,
    listener: Box<dyn FnMut(&str)>,
  ) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.property_listeners.push(listener);
    Ok(())
  }

  fn fire_property_change(&mut self, property: &str) {
    for listener in &mut self.property_listeners {
      listener(property);
    }
  }

  /// The regexp implementation for this context: the service-installed
  /// loader when present, otherwise the bundled engine.
  pub(crate) fn regexp_proxy(&mut self) -> Rc<dyn RegExpProxy> {
    if self.regexp_proxy.is_none() {
      let proxy: Rc<dyn RegExpProxy> = match load_regexp_proxy() {
        Some(proxy) => Rc::from(proxy),
        None => Rc::new(crate::builtins::regexp::BundledRegExpProxy),
      };
      self.regexp_proxy = Some(proxy);
    }
    self.regexp_proxy.clone().unwrap()
  }

  // --- Thread-local storage ----------------------------------------------

  pub fn put_thread_local(
    &mut self,
    key: impl Into<String>,
    value: Box<dyn Any>,
  ) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.thread_locals.insert(key.into(), value);
    Ok(())
  }

  pub fn get_thread_local(&self, key: &str) -> Option<&dyn Any> {
    self.thread_locals.get(key).map(|b| b.as_ref())
  }

  pub fn remove_thread_local(&mut self, key: &str) -> Result<(), ContextError> {
    self.check_not_sealed()?;
    self.thread_locals.remove(key);
    Ok(())
  }

  // --- Microtasks ---------------------------------------------------------

  /// Append a task to run at the end of the current operation. The evaluate
  /// entry points drain the queue before returning; hosts calling functions
  /// directly should drain via [`Context::process_microtasks`].
  pub fn enqueue_microtask(&mut self, task: Microtask) {
    self.microtasks.push_back(task);
  }

  /// Drain the microtask queue to completion, including tasks enqueued by
  /// running tasks. Idempotent when the queue is empty. Must be called on
  /// the thread the context is bound to.
  pub fn process_microtasks(&mut self) {
    while let Some(task) = self.microtasks.pop_front() {
      task(self);
    }
  }

  pub fn pending_microtask_count(&self) -> usize {
    self.microtasks.len()
  }

  // --- Unhandled rejections ----------------------------------------------

  pub fn set_track_unhandled_promise_rejections(&mut self, track: bool) {
    self.unhandled_rejections.enable(track);
  }

  pub fn unhandled_promise_tracker(&mut self) -> &mut UnhandledRejectionTracker {
    &mut self.unhandled_rejections
  }
}

impl Default for Context {
  fn default() -> Self {
    Context::new()
  }
}

impl Drop for Context {
  fn drop(&mut self) {
    // Dropping a still-entered context must not leave a dangling thread
    // binding.
    if self.enter_count > 0 {
      bound_registry().lock().unwrap().remove(&self.id.0);
      CURRENT.with(|c| {
        if c.get() == Some(self.id.0) {
          c.set(None);
        }
      });
    }
  }
}
