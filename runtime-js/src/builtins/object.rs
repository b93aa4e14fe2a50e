use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const ID_TO_SOURCE: u16 = 2;
const ID_VALUE_OF: u16 = 3;
const ID_HAS_OWN_PROPERTY: u16 = 4;
pub(crate) const CTOR_GET_OWN_PROPERTY_NAMES: u16 = 100;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let prototype = cx
    .realm
    .as_ref()
    .map(|r| r.object_prototype)
    .expect("realm must be initialized");
  define_method(cx, prototype, BuiltinTag::Object, ID_TO_STRING, "toString", 0);
  define_method(cx, prototype, BuiltinTag::Object, ID_TO_SOURCE, "toSource", 0);
  define_method(cx, prototype, BuiltinTag::Object, ID_VALUE_OF, "valueOf", 0);
  define_method(
    cx,
    prototype,
    BuiltinTag::Object,
    ID_HAS_OWN_PROPERTY,
    "hasOwnProperty",
    1,
  );

  let ctor = cx.new_native_function("Object", 1, ctor_object, true);
  define_method(
    cx,
    ctor,
    BuiltinTag::Object,
    CTOR_GET_OWN_PROPERTY_NAMES,
    "getOwnPropertyNames",
    1,
  );
  install_ctor(cx, scope, "Object", ctor, prototype);
  ctor
}

fn ctor_object(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  match args.first() {
    Some(Value::Object(obj)) => Ok(Value::Object(*obj)),
    Some(value) if !value.is_null_or_undefined() => {
      // Primitive: wrap. Only the wrapper kinds the core carries.
      Ok(value.clone())
    }
    _ => Ok(Value::Object(cx.new_object())),
  }
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_TO_STRING | ID_TO_SOURCE => {
      let class_name = match &this {
        Value::Object(obj) => cx.heap.get(*obj).class_name,
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Symbol(_) => "Symbol",
      };
      Ok(Value::string(format!("[object {}]", class_name)))
    }
    ID_VALUE_OF => Ok(this),
    ID_HAS_OWN_PROPERTY => {
      let Some(obj) = this.as_object() else {
        return Ok(Value::Bool(false));
      };
      let key_arg = args.first().cloned().unwrap_or(Value::Undefined);
      let key = cx.to_property_key(&key_arg)?;
      Ok(Value::Bool(cx.heap.get(obj).get_own(&key).is_some()))
    }
    CTOR_GET_OWN_PROPERTY_NAMES => {
      let target = args.first().cloned().unwrap_or(Value::Undefined);
      let names = cx.get_own_property_names(&target)?;
      let values = names.into_iter().map(Value::String).collect();
      Ok(Value::Object(cx.new_array(values)))
    }
    _ => Err(EvalError::type_error("unknown Object method id")),
  }
}
