use super::add_species_accessor;
use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::PropertyKey;
use crate::string::JsString;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const ID_JOIN: u16 = 2;
const ID_PUSH: u16 = 3;
const ID_INDEX_OF: u16 = 4;
const ID_SLICE: u16 = 5;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let prototype = cx
    .realm
    .as_ref()
    .map(|r| r.array_prototype)
    .expect("realm must be initialized");
  define_method(cx, prototype, BuiltinTag::Array, ID_TO_STRING, "toString", 0);
  define_method(cx, prototype, BuiltinTag::Array, ID_JOIN, "join", 1);
  define_method(cx, prototype, BuiltinTag::Array, ID_PUSH, "push", 1);
  define_method(cx, prototype, BuiltinTag::Array, ID_INDEX_OF, "indexOf", 1);
  define_method(cx, prototype, BuiltinTag::Array, ID_SLICE, "slice", 2);

  let ctor = cx.new_native_function("Array", 1, ctor_array, true);
  add_species_accessor(cx, ctor);
  install_ctor(cx, scope, "Array", ctor, prototype);
  ctor
}

fn ctor_array(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  if args.len() == 1 {
    if let Value::Number(n) = &args[0] {
      let length = *n as u32;
      if *n != length as f64 {
        return Err(EvalError::range_error("invalid array length"));
      }
      let array = cx.new_array(Vec::new());
      cx.define_property(
        array,
        PropertyKey::String("length".into()),
        Value::Number(length as f64),
        crate::object::DONTENUM | crate::object::PERMANENT,
      );
      return Ok(Value::Object(array));
    }
  }
  Ok(Value::Object(cx.new_array(args.to_vec())))
}

fn array_length(cx: &mut Context, obj: JsObject) -> Result<usize, EvalError> {
  let length = cx.get_property_str(obj, "length")?;
  Ok(crate::value::to_length(cx.to_number_value(&length)?) as usize)
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  let Some(obj) = this.as_object() else {
    return Err(EvalError::type_error("Array method called on non-object"));
  };
  match id {
    ID_TO_STRING => join(cx, obj, ","),
    ID_JOIN => {
      let separator = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(v) => cx.to_string_value(v)?.to_utf8_lossy(),
      };
      join(cx, obj, &separator)
    }
    ID_PUSH => {
      let mut length = array_length(cx, obj)?;
      for arg in args {
        cx.put_property(obj, &PropertyKey::Index(length as u32), arg.clone(), false)?;
        length += 1;
      }
      let length = Value::Number(length as f64);
      cx.put_property(obj, &PropertyKey::String("length".into()), length.clone(), false)?;
      Ok(length)
    }
    ID_INDEX_OF => {
      let needle = args.first().cloned().unwrap_or(Value::Undefined);
      let length = array_length(cx, obj)?;
      for i in 0..length {
        let element = cx.get_property(obj, &PropertyKey::Index(i as u32))?;
        if cx.strict_equals(&element, &needle) {
          return Ok(Value::Number(i as f64));
        }
      }
      Ok(Value::Number(-1.0))
    }
    ID_SLICE => {
      let length = array_length(cx, obj)? as i64;
      let start = relative_index(cx, args.first(), 0, length)?;
      let end = relative_index(cx, args.get(1), length, length)?;
      let mut out = Vec::new();
      for i in start..end.max(start) {
        out.push(cx.get_property(obj, &PropertyKey::Index(i as u32))?);
      }
      Ok(Value::Object(cx.new_array(out)))
    }
    _ => Err(EvalError::type_error("unknown Array method id")),
  }
}

fn relative_index(
  cx: &mut Context,
  arg: Option<&Value>,
  default: i64,
  length: i64,
) -> Result<i64, EvalError> {
  let raw = match arg {
    None | Some(Value::Undefined) => return Ok(default),
    Some(v) => cx.to_number_value(v)?,
  };
  let raw = crate::value::to_integer(raw) as i64;
  Ok(if raw < 0 {
    (length + raw).max(0)
  } else {
    raw.min(length)
  })
}

fn join(cx: &mut Context, obj: JsObject, separator: &str) -> Result<Value, EvalError> {
  let length = array_length(cx, obj)?;
  let mut parts = Vec::with_capacity(length);
  for i in 0..length {
    let element = cx.get_property(obj, &PropertyKey::Index(i as u32))?;
    parts.push(if element.is_null_or_undefined() {
      JsString::empty()
    } else {
      cx.to_string_value(&element)?
    });
  }
  let mut out = JsString::empty();
  let separator: JsString = separator.into();
  for (i, part) in parts.iter().enumerate() {
    if i > 0 {
      out = out.concat(&separator);
    }
    out = out.concat(part);
  }
  Ok(Value::String(out))
}
