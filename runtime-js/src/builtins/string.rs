use super::define_method;
use super::install_ctor;
use super::regexp;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::string::JsString;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const ID_VALUE_OF: u16 = 2;
const ID_CHAR_AT: u16 = 3;
const ID_CHAR_CODE_AT: u16 = 4;
const ID_INDEX_OF: u16 = 5;
const ID_SUBSTRING: u16 = 6;
const ID_MATCH: u16 = 7;
const ID_MATCH_ALL: u16 = 8;
const ID_SEARCH: u16 = 9;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let prototype = cx
    .realm
    .as_ref()
    .map(|r| r.string_prototype)
    .expect("realm must be initialized");
  define_method(cx, prototype, BuiltinTag::StringObj, ID_TO_STRING, "toString", 0);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_VALUE_OF, "valueOf", 0);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_CHAR_AT, "charAt", 1);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_CHAR_CODE_AT, "charCodeAt", 1);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_INDEX_OF, "indexOf", 1);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_SUBSTRING, "substring", 2);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_MATCH, "match", 1);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_MATCH_ALL, "matchAll", 1);
  define_method(cx, prototype, BuiltinTag::StringObj, ID_SEARCH, "search", 1);

  let ctor = cx.new_native_function("String", 1, ctor_string, true);
  install_ctor(cx, scope, "String", ctor, prototype);
  ctor
}

fn ctor_string(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  construct: bool,
) -> Result<Value, EvalError> {
  let value = match args.first() {
    Some(v) => cx.to_string_value(v)?,
    None => JsString::empty(),
  };
  if !construct {
    return Ok(Value::String(value));
  }
  let proto = cx.realm.as_ref().map(|r| r.string_prototype);
  let obj = cx
    .heap
    .alloc(ScriptObject::new(ObjectKind::StringWrapper(value), proto));
  Ok(Value::Object(obj))
}

fn this_string(cx: &mut Context, this: &Value) -> Result<JsString, EvalError> {
  match this {
    Value::String(s) => Ok(s.clone()),
    Value::Object(obj) => match &cx.heap.get(*obj).kind {
      ObjectKind::StringWrapper(s) => Ok(s.clone()),
      _ => cx.to_string_value(this),
    },
    Value::Undefined | Value::Null => Err(EvalError::type_error(
      "String method called on null or undefined",
    )),
    other => cx.to_string_value(other),
  }
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_TO_STRING | ID_VALUE_OF => Ok(Value::String(this_string(cx, &this)?)),
    ID_CHAR_AT => {
      let s = this_string(cx, &this)?;
      let i = index_arg(cx, args)?;
      Ok(Value::String(match checked_index(&s, i) {
        Some(i) => s.substring(i, i + 1),
        None => JsString::empty(),
      }))
    }
    ID_CHAR_CODE_AT => {
      let s = this_string(cx, &this)?;
      let i = index_arg(cx, args)?;
      Ok(match checked_index(&s, i) {
        Some(i) => Value::Number(s.as_code_units()[i] as f64),
        None => Value::Number(f64::NAN),
      })
    }
    ID_INDEX_OF => {
      let s = this_string(cx, &this)?;
      let needle = match args.first() {
        Some(v) => cx.to_string_value(v)?,
        None => "undefined".into(),
      };
      Ok(Value::Number(index_of(&s, &needle) as f64))
    }
    ID_SUBSTRING => {
      let s = this_string(cx, &this)?;
      let len = s.len_code_units() as f64;
      let start = match args.first() {
        Some(v) if !v.is_undefined() => cx.to_number_value(v)?.clamp(0.0, len),
        _ => 0.0,
      };
      let end = match args.get(1) {
        Some(v) if !v.is_undefined() => cx.to_number_value(v)?.clamp(0.0, len),
        _ => len,
      };
      let (lo, hi) = if start <= end {
        (start, end)
      } else {
        (end, start)
      };
      Ok(Value::String(s.substring(lo as usize, hi as usize)))
    }
    ID_MATCH => {
      let s = this_string(cx, &this)?;
      let rx = coerce_to_regexp(cx, args.first())?;
      let symbol = cx.realm.as_ref().expect("realm must be initialized").symbols.match_;
      invoke_protocol(cx, rx, symbol, Value::String(s))
    }
    ID_MATCH_ALL => {
      let s = this_string(cx, &this)?;
      let rx = coerce_to_regexp_global(cx, args.first())?;
      let symbol = cx.realm.as_ref().expect("realm must be initialized").symbols.match_all;
      invoke_protocol(cx, rx, symbol, Value::String(s))
    }
    ID_SEARCH => {
      let s = this_string(cx, &this)?;
      let rx = coerce_to_regexp(cx, args.first())?;
      let symbol = cx.realm.as_ref().expect("realm must be initialized").symbols.search;
      invoke_protocol(cx, rx, symbol, Value::String(s))
    }
    _ => Err(EvalError::type_error("unknown String method id")),
  }
}

fn index_arg(cx: &mut Context, args: &[Value]) -> Result<f64, EvalError> {
  match args.first() {
    Some(v) => cx.to_number_value(v),
    None => Ok(0.0),
  }
}

fn checked_index(s: &JsString, i: f64) -> Option<usize> {
  let i = crate::value::to_integer(i);
  if i < 0.0 || i >= s.len_code_units() as f64 {
    return None;
  }
  Some(i as usize)
}

fn index_of(haystack: &JsString, needle: &JsString) -> i64 {
  let h = haystack.as_code_units();
  let n = needle.as_code_units();
  if n.is_empty() {
    return 0;
  }
  if n.len() > h.len() {
    return -1;
  }
  for i in 0..=(h.len() - n.len()) {
    if &h[i..i + n.len()] == n {
      return i as i64;
    }
  }
  -1
}

/// Coerce the argument into a RegExp object (an existing one passes through).
fn coerce_to_regexp(cx: &mut Context, arg: Option<&Value>) -> Result<JsObject, EvalError> {
  if let Some(Value::Object(obj)) = arg {
    if matches!(cx.heap.get(*obj).kind, ObjectKind::RegExp(_)) {
      return Ok(*obj);
    }
  }
  let args: Vec<Value> = match arg {
    None | Some(Value::Undefined) => Vec::new(),
    Some(v) => vec![v.clone()],
  };
  regexp::construct_regexp(cx, &args)
}

/// `matchAll` requires a global matcher when given a plain pattern string.
fn coerce_to_regexp_global(cx: &mut Context, arg: Option<&Value>) -> Result<JsObject, EvalError> {
  if let Some(Value::Object(obj)) = arg {
    if matches!(cx.heap.get(*obj).kind, ObjectKind::RegExp(_)) {
      return Ok(*obj);
    }
  }
  let pattern = match arg {
    None | Some(Value::Undefined) => Value::Undefined,
    Some(v) => v.clone(),
  };
  regexp::construct_regexp(cx, &[pattern, Value::string("g")])
}

fn invoke_protocol(
  cx: &mut Context,
  rx: JsObject,
  symbol: crate::heap::SymbolId,
  subject: Value,
) -> Result<Value, EvalError> {
  let method = cx.get_property(rx, &PropertyKey::Symbol(symbol))?;
  if !cx.is_callable(&method) {
    return Err(EvalError::type_error("regexp protocol method is missing"));
  }
  cx.call_function(method, Value::Object(rx), &[subject])
}
