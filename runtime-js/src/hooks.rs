use crate::context::Context;
use crate::debug::DebuggableScript;
use crate::value::Value;
use std::any::Any;

/// Wraps host values as script values when they cross into script.
///
/// The default factory passes primitives through unchanged and refuses
/// opaque host objects (there is no host-object reflection layer in the
/// core).
pub trait WrapFactory {
  fn wrap(&self, cx: &mut Context, value: HostValue) -> Value;
}

/// A host value presented for wrapping.
pub enum HostValue {
  Bool(bool),
  Number(f64),
  String(String),
  /// An opaque host object the factory may understand.
  Opaque(Box<dyn Any>),
}

#[derive(Default)]
pub struct DefaultWrapFactory;

impl WrapFactory for DefaultWrapFactory {
  fn wrap(&self, _cx: &mut Context, value: HostValue) -> Value {
    match value {
      HostValue::Bool(b) => Value::Bool(b),
      HostValue::Number(n) => Value::Number(n),
      HostValue::String(s) => Value::String(s.as_str().into()),
      HostValue::Opaque(_) => Value::Undefined,
    }
  }
}

/// Debugger attachment. The engine notifies the debugger of every finished
/// compilation (script first, then each nested function, recursively) with
/// the original source text. Step/breakpoint hooks are host concerns layered
/// on top.
pub trait Debugger {
  fn handle_compilation_done(&mut self, cx: &Context, script: &DebuggableScript, source: &str);
}

/// Application-supplied loader for host modules referenced by script.
pub trait ModuleLoader {
  /// Resolve a module name to source text, or `None` when unknown.
  fn load_source(&self, module_name: &str) -> Option<String>;
}
