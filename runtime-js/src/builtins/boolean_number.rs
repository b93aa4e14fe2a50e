use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::ScriptObject;
use crate::value::number_to_string;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const ID_VALUE_OF: u16 = 2;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> (JsObject, JsObject) {
  let boolean_prototype = cx.realm.as_ref().expect("realm must be initialized").boolean_prototype;
  define_method(cx, boolean_prototype, BuiltinTag::Boolean, ID_TO_STRING, "toString", 0);
  define_method(cx, boolean_prototype, BuiltinTag::Boolean, ID_VALUE_OF, "valueOf", 0);
  let boolean_ctor = cx.new_native_function("Boolean", 1, ctor_boolean, true);
  install_ctor(cx, scope, "Boolean", boolean_ctor, boolean_prototype);

  let number_prototype = cx.realm.as_ref().expect("realm must be initialized").number_prototype;
  define_method(cx, number_prototype, BuiltinTag::Number, ID_TO_STRING, "toString", 1);
  define_method(cx, number_prototype, BuiltinTag::Number, ID_VALUE_OF, "valueOf", 0);
  let number_ctor = cx.new_native_function("Number", 1, ctor_number, true);
  install_ctor(cx, scope, "Number", number_ctor, number_prototype);

  (boolean_ctor, number_ctor)
}

fn ctor_boolean(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  construct: bool,
) -> Result<Value, EvalError> {
  let value = args.first().map(|v| v.to_boolean()).unwrap_or(false);
  if !construct {
    return Ok(Value::Bool(value));
  }
  let proto = cx.realm.as_ref().map(|r| r.boolean_prototype);
  let obj = cx
    .heap
    .alloc(ScriptObject::new(ObjectKind::BooleanWrapper(value), proto));
  Ok(Value::Object(obj))
}

fn ctor_number(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  construct: bool,
) -> Result<Value, EvalError> {
  let value = match args.first() {
    Some(v) => cx.to_number_value(v)?,
    None => 0.0,
  };
  if !construct {
    return Ok(Value::Number(value));
  }
  let proto = cx.realm.as_ref().map(|r| r.number_prototype);
  let obj = cx
    .heap
    .alloc(ScriptObject::new(ObjectKind::NumberWrapper(value), proto));
  Ok(Value::Object(obj))
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  tag: BuiltinTag,
  id: u16,
  this: Value,
  _args: &[Value],
) -> Result<Value, EvalError> {
  let primitive = unwrap_primitive(cx, tag, &this)?;
  match id {
    ID_TO_STRING => Ok(Value::String(match &primitive {
      Value::Bool(b) => if *b { "true" } else { "false" }.into(),
      Value::Number(n) => number_to_string(*n),
      _ => unreachable!(),
    })),
    ID_VALUE_OF => Ok(primitive),
    _ => Err(EvalError::type_error("unknown Boolean/Number method id")),
  }
}

fn unwrap_primitive(cx: &Context, tag: BuiltinTag, this: &Value) -> Result<Value, EvalError> {
  match (tag, this) {
    (BuiltinTag::Boolean, Value::Bool(b)) => Ok(Value::Bool(*b)),
    (BuiltinTag::Number, Value::Number(n)) => Ok(Value::Number(*n)),
    (_, Value::Object(obj)) => match (&cx.heap.get(*obj).kind, tag) {
      (ObjectKind::BooleanWrapper(b), BuiltinTag::Boolean) => Ok(Value::Bool(*b)),
      (ObjectKind::NumberWrapper(n), BuiltinTag::Number) => Ok(Value::Number(*n)),
      _ => Err(EvalError::type_error("method called on incompatible receiver")),
    },
    _ => Err(EvalError::type_error("method called on incompatible receiver")),
  }
}
