use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EcmaErrorKind;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::object::DONTENUM;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;

const KINDS: [EcmaErrorKind; 8] = [
  EcmaErrorKind::Error,
  EcmaErrorKind::EvalError,
  EcmaErrorKind::RangeError,
  EcmaErrorKind::ReferenceError,
  EcmaErrorKind::SyntaxError,
  EcmaErrorKind::TypeError,
  EcmaErrorKind::UriError,
  EcmaErrorKind::InternalError,
];

/// Allocate the Error prototype graph: `Error.prototype` chains to
/// `Object.prototype`; each subclass prototype chains to `Error.prototype`.
pub(crate) fn alloc_prototypes(
  cx: &mut Context,
  object_prototype: JsObject,
) -> Vec<(EcmaErrorKind, JsObject)> {
  let base = cx
    .heap
    .alloc(ScriptObject::new(ObjectKind::Error, Some(object_prototype)));
  let mut out = vec![(EcmaErrorKind::Error, base)];
  for kind in KINDS.iter().skip(1) {
    let proto = cx
      .heap
      .alloc(ScriptObject::new(ObjectKind::Error, Some(base)));
    out.push((*kind, proto));
  }
  out
}

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> Vec<JsObject> {
  let mut ctors = Vec::new();
  for kind in KINDS {
    let prototype = cx.error_kind_prototype(kind).expect("realm must be initialized");
    cx.define_property(
      prototype,
      PropertyKey::String("name".into()),
      Value::string(kind.name()),
      DONTENUM,
    );
    cx.define_property(
      prototype,
      PropertyKey::String("message".into()),
      Value::string(""),
      DONTENUM,
    );
    define_method(cx, prototype, BuiltinTag::ErrorObj, ID_TO_STRING, "toString", 0);

    let ctor = cx.new_native_function(kind.name(), 1, ctor_for(kind), true);
    install_ctor(cx, scope, kind.name(), ctor, prototype);
    ctors.push(ctor);
  }
  ctors
}

fn ctor_for(kind: EcmaErrorKind) -> crate::function::NativeFn {
  // One native entry per kind; the kind is recovered from the function's
  // name at call time to keep the native signature a plain fn pointer.
  match kind {
    EcmaErrorKind::Error => |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::Error),
    EcmaErrorKind::EvalError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::EvalError)
    }
    EcmaErrorKind::RangeError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::RangeError)
    }
    EcmaErrorKind::ReferenceError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::ReferenceError)
    }
    EcmaErrorKind::SyntaxError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::SyntaxError)
    }
    EcmaErrorKind::TypeError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::TypeError)
    }
    EcmaErrorKind::UriError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::UriError)
    }
    EcmaErrorKind::InternalError => {
      |cx, this, args, c| ctor_error(cx, this, args, c, EcmaErrorKind::InternalError)
    }
  }
}

fn ctor_error(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  _construct: bool,
  kind: EcmaErrorKind,
) -> Result<Value, EvalError> {
  let message = match args.first() {
    Some(v) if !v.is_undefined() => cx.to_string_value(v)?.to_utf8_lossy(),
    _ => String::new(),
  };
  Ok(Value::Object(cx.new_error_object(kind, &message)))
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  _args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_TO_STRING => {
      let Some(obj) = this.as_object() else {
        return Err(EvalError::type_error("Error.prototype.toString called on non-object"));
      };
      let name = cx.get_property_str(obj, "name")?;
      let name = if name.is_undefined() {
        "Error".to_string()
      } else {
        cx.to_string_value(&name)?.to_utf8_lossy()
      };
      let message = cx.get_property_str(obj, "message")?;
      let message = if message.is_undefined() {
        String::new()
      } else {
        cx.to_string_value(&message)?.to_utf8_lossy()
      };
      Ok(Value::string(if message.is_empty() {
        name
      } else if name.is_empty() {
        message
      } else {
        format!("{}: {}", name, message)
      }))
    }
    _ => Err(EvalError::type_error("unknown Error method id")),
  }
}
