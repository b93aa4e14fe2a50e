use super::define_method;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::PropertyKey;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::value::string_to_number;
use crate::value::Value;

const ID_IS_NAN: u16 = 1;
const ID_IS_FINITE: u16 = 2;
const ID_PARSE_INT: u16 = 3;
const ID_PARSE_FLOAT: u16 = 4;

pub(crate) fn init(cx: &mut Context, global: JsObject) {
  let frozen = PERMANENT | READONLY | DONTENUM;
  cx.define_property(
    global,
    PropertyKey::String("undefined".into()),
    Value::Undefined,
    frozen,
  );
  cx.define_property(
    global,
    PropertyKey::String("NaN".into()),
    Value::Number(f64::NAN),
    frozen,
  );
  cx.define_property(
    global,
    PropertyKey::String("Infinity".into()),
    Value::Number(f64::INFINITY),
    frozen,
  );
  cx.define_property(
    global,
    PropertyKey::String("globalThis".into()),
    Value::Object(global),
    DONTENUM,
  );

  define_method(cx, global, BuiltinTag::Global, ID_IS_NAN, "isNaN", 1);
  define_method(cx, global, BuiltinTag::Global, ID_IS_FINITE, "isFinite", 1);
  define_method(cx, global, BuiltinTag::Global, ID_PARSE_INT, "parseInt", 2);
  define_method(cx, global, BuiltinTag::Global, ID_PARSE_FLOAT, "parseFloat", 1);
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  _this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  let arg0 = args.first().cloned().unwrap_or(Value::Undefined);
  match id {
    ID_IS_NAN => {
      let n = cx.to_number_value(&arg0)?;
      Ok(Value::Bool(n.is_nan()))
    }
    ID_IS_FINITE => {
      let n = cx.to_number_value(&arg0)?;
      Ok(Value::Bool(n.is_finite()))
    }
    ID_PARSE_INT => {
      let s = cx.to_string_value(&arg0)?;
      let radix = match args.get(1) {
        Some(r) if !r.is_undefined() => cx.to_number_value(r)? as u32,
        _ => 0,
      };
      Ok(Value::Number(parse_int(&s.to_utf8_lossy(), radix)))
    }
    ID_PARSE_FLOAT => {
      let s = cx.to_string_value(&arg0)?;
      Ok(Value::Number(parse_float(&s.to_utf8_lossy())))
    }
    _ => Err(EvalError::type_error("unknown global method id")),
  }
}

fn parse_int(text: &str, radix: u32) -> f64 {
  let mut s = text.trim_start();
  let mut sign = 1.0;
  if let Some(rest) = s.strip_prefix('-') {
    sign = -1.0;
    s = rest;
  } else if let Some(rest) = s.strip_prefix('+') {
    s = rest;
  }
  let mut radix = radix;
  if radix == 16 || radix == 0 {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
      s = rest;
      radix = 16;
    }
  }
  if radix == 0 {
    radix = 10;
  }
  if !(2..=36).contains(&radix) {
    return f64::NAN;
  }
  let digits: String = s
    .chars()
    .take_while(|c| c.to_digit(radix).is_some())
    .collect();
  if digits.is_empty() {
    return f64::NAN;
  }
  let mut value = 0.0f64;
  for c in digits.chars() {
    value = value * radix as f64 + c.to_digit(radix).unwrap() as f64;
  }
  sign * value
}

fn parse_float(text: &str) -> f64 {
  let s = text.trim_start();
  // Longest prefix that parses as a decimal literal.
  let mut end = 0;
  let bytes = s.as_bytes();
  let mut seen_digit = false;
  let mut seen_dot = false;
  let mut seen_exp = false;
  let mut i = 0;
  if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
    i += 1;
  }
  while i < bytes.len() {
    match bytes[i] {
      b'0'..=b'9' => {
        seen_digit = true;
        end = i + 1;
      }
      b'.' if !seen_dot && !seen_exp => seen_dot = true,
      b'e' | b'E' if seen_digit && !seen_exp => {
        seen_exp = true;
        if i + 1 < bytes.len() && (bytes[i + 1] == b'+' || bytes[i + 1] == b'-') {
          i += 1;
        }
      }
      _ => break,
    }
    i += 1;
  }
  if !seen_digit {
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
      return f64::INFINITY;
    }
    if s.starts_with("-Infinity") {
      return f64::NEG_INFINITY;
    }
    return f64::NAN;
  }
  string_to_number(&s[..end.max(1)].into())
}
