use crate::context::Context;
use crate::error::EvalError;
use crate::heap::JsObject;
use crate::icode::Icode;
use crate::value::Value;
use std::rc::Rc;

/// A host-implemented function. `construct` is true when invoked via `new`.
pub type NativeFn =
  fn(cx: &mut Context, this: Value, args: &[Value], construct: bool) -> Result<Value, EvalError>;

/// Tags identifying which builtin's id-dispatch table a prototype method
/// belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BuiltinTag {
  Array,
  Boolean,
  ErrorObj,
  Function,
  Global,
  Math,
  Number,
  Object,
  RegExp,
  RegExpStringIterator,
  StringObj,
  Symbol,
}

/// The callable payload of a function object.
///
/// Builtin prototype methods are `IdMethod`s: a (tag, id) pair dispatched by
/// a `match` in the owning builtin module, not a function pointer per method.
pub enum FunctionData {
  Interpreted {
    icode: Rc<Icode>,
    /// Lexical scope captured at definition time.
    scope: JsObject,
  },
  Native {
    name: Rc<str>,
    arity: u16,
    func: NativeFn,
    /// Whether `new` is allowed on this function.
    constructable: bool,
  },
  IdMethod {
    tag: BuiltinTag,
    id: u16,
    name: Rc<str>,
    arity: u16,
  },
}

impl FunctionData {
  pub fn name(&self) -> &str {
    match self {
      FunctionData::Interpreted { icode, .. } => icode.fn_name.as_deref().unwrap_or(""),
      FunctionData::Native { name, .. } => name,
      FunctionData::IdMethod { name, .. } => name,
    }
  }

  pub fn arity(&self) -> u16 {
    match self {
      FunctionData::Interpreted { icode, .. } => icode.params.len() as u16,
      FunctionData::Native { arity, .. } => *arity,
      FunctionData::IdMethod { arity, .. } => *arity,
    }
  }
}
