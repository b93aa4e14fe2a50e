use std::sync::OnceLock;
use std::sync::RwLock;

/// Enforces a host security policy on compiled code.
///
/// The engine consults the controller when a security tag accompanies a
/// compilation request; policy interpretation is entirely host-defined.
pub trait SecurityController: Send + Sync {
  /// Vet the opaque security tag attached to a compilation unit. Returning
  /// an error message rejects the compilation.
  fn check_security_tag(&self, tag: &str) -> Result<(), String> {
    let _ = tag;
    Ok(())
  }
}

static GLOBAL_CONTROLLER: OnceLock<Box<dyn SecurityController>> = OnceLock::new();

/// Install a process-wide security controller. Write-once: a second call
/// fails and leaves the first controller in place.
pub fn init_global_security_controller(
  controller: Box<dyn SecurityController>,
) -> Result<(), Box<dyn SecurityController>> {
  GLOBAL_CONTROLLER.set(controller)
}

pub fn global_security_controller() -> Option<&'static dyn SecurityController> {
  GLOBAL_CONTROLLER.get().map(|b| b.as_ref())
}

pub fn has_global_security_controller() -> bool {
  GLOBAL_CONTROLLER.get().is_some()
}

/// Filters which host classes/modules script code may touch.
pub trait ClassShutter: Send + Sync {
  /// Whether script is allowed to see the named host class.
  fn visible_to_scripts(&self, full_class_name: &str) -> bool;
}

/// Discovered engine extension point: yields the regexp implementation the
/// runtime should use. Write-once per process; the engine falls back to its
/// bundled engine when none is installed.
pub trait RegExpLoader: Send + Sync {
  fn new_proxy(&self) -> Box<dyn RegExpProxy>;
}

/// The compiled-regexp provider contract, the seam through which an
/// alternative pattern engine can replace the bundled one.
pub trait RegExpProxy {
  /// Compile `pattern` with an optional flag string into an executable
  /// program.
  fn compile(
    &self,
    pattern: &[u16],
    flags: Option<&str>,
  ) -> Result<std::rc::Rc<regexp_js::RECompiled>, crate::error::EvalError>;
}

static REGEXP_LOADER: OnceLock<RwLock<Option<Box<dyn RegExpLoader>>>> = OnceLock::new();

fn regexp_loader_cell() -> &'static RwLock<Option<Box<dyn RegExpLoader>>> {
  REGEXP_LOADER.get_or_init(|| RwLock::new(None))
}

/// Install the process-wide regexp loader. Write-once.
pub fn init_regexp_loader(loader: Box<dyn RegExpLoader>) -> Result<(), ()> {
  let mut cell = regexp_loader_cell().write().unwrap();
  if cell.is_some() {
    return Err(());
  }
  *cell = Some(loader);
  Ok(())
}

/// Obtain a proxy from the installed loader, if any.
pub fn load_regexp_proxy() -> Option<Box<dyn RegExpProxy>> {
  regexp_loader_cell()
    .read()
    .unwrap()
    .as_ref()
    .map(|loader| loader.new_proxy())
}
