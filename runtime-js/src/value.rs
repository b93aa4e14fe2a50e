use crate::heap::JsObject;
use crate::heap::SymbolId;
use crate::string::JsString;

/// A JavaScript value.
///
/// Objects and symbols are handles into the owning context's heap; everything
/// else is stored inline.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(JsString),
  Symbol(SymbolId),
  Object(JsObject),
}

impl Value {
  pub fn number(n: impl Into<f64>) -> Value {
    Value::Number(n.into())
  }

  pub fn string(s: impl Into<JsString>) -> Value {
    Value::String(s.into())
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Value::Undefined)
  }

  pub fn is_null_or_undefined(&self) -> bool {
    matches!(self, Value::Undefined | Value::Null)
  }

  pub fn as_object(&self) -> Option<JsObject> {
    match self {
      Value::Object(obj) => Some(*obj),
      _ => None,
    }
  }

  /// ECMAScript `ToBoolean`.
  pub fn to_boolean(&self) -> bool {
    match self {
      Value::Undefined | Value::Null => false,
      Value::Bool(b) => *b,
      Value::Number(n) => *n != 0.0 && !n.is_nan(),
      Value::String(s) => !s.is_empty(),
      Value::Symbol(_) | Value::Object(_) => true,
    }
  }

  /// The `typeof` operator result for non-callable values. Callability of
  /// objects is resolved by the caller (the heap knows object kinds).
  pub fn primitive_type_of(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Symbol(_) => "symbol",
      Value::Object(_) => "object",
    }
  }
}

/// ECMAScript `ToString(Number)`.
pub fn number_to_string(n: f64) -> JsString {
  if n.is_nan() {
    return JsString::from_str("NaN");
  }
  if n.is_infinite() {
    return JsString::from_str(if n < 0.0 { "-Infinity" } else { "Infinity" });
  }
  if n == 0.0 {
    // `ToString(-0)` is `"0"`.
    return JsString::from_str("0");
  }
  let mut buffer = ryu::Buffer::new();
  let formatted = buffer.format_finite(n);
  let formatted = formatted.strip_suffix(".0").unwrap_or(formatted);
  JsString::from_str(formatted)
}

/// ECMAScript `ToNumber(String)`.
pub fn string_to_number(s: &JsString) -> f64 {
  let text = s.to_utf8_lossy();
  let trimmed = text.trim_matches(|c: char| {
    c.is_whitespace() || matches!(c, '\u{feff}' | '\u{00a0}' | '\u{2028}' | '\u{2029}')
  });
  if trimmed.is_empty() {
    return 0.0;
  }
  if let Some(hex) = trimmed
    .strip_prefix("0x")
    .or_else(|| trimmed.strip_prefix("0X"))
  {
    return u64::from_str_radix(hex, 16)
      .map(|v| v as f64)
      .unwrap_or(f64::NAN);
  }
  match trimmed {
    "Infinity" | "+Infinity" => f64::INFINITY,
    "-Infinity" => f64::NEG_INFINITY,
    _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
  }
}

/// ECMAScript `ToInteger`: truncate towards zero, NaN becomes 0.
pub fn to_integer(n: f64) -> f64 {
  if n.is_nan() {
    0.0
  } else {
    n.trunc()
  }
}

/// ECMAScript `ToLength`: clamp to `[0, 2^53 - 1]`.
pub fn to_length(n: f64) -> u64 {
  let n = to_integer(n);
  if n <= 0.0 {
    0
  } else {
    n.min(9007199254740991.0) as u64
  }
}

/// ECMAScript `ToInt32`.
pub fn to_int32(n: f64) -> i32 {
  to_uint32(n) as i32
}

/// ECMAScript `ToUint32`.
pub fn to_uint32(n: f64) -> u32 {
  if !n.is_finite() || n == 0.0 {
    return 0;
  }
  let n = n.trunc();
  let modulus = 4294967296.0;
  let mut r = n % modulus;
  if r < 0.0 {
    r += modulus;
  }
  r as u32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn number_formatting_matches_ecma() {
    assert!(number_to_string(f64::NAN).eq_str("NaN"));
    assert!(number_to_string(-0.0).eq_str("0"));
    assert!(number_to_string(1.0).eq_str("1"));
    assert!(number_to_string(1.5).eq_str("1.5"));
    assert!(number_to_string(f64::INFINITY).eq_str("Infinity"));
  }

  #[test]
  fn string_to_number_forms() {
    assert_eq!(string_to_number(&"42".into()), 42.0);
    assert_eq!(string_to_number(&"  3.5  ".into()), 3.5);
    assert_eq!(string_to_number(&"0xff".into()), 255.0);
    assert_eq!(string_to_number(&"".into()), 0.0);
    assert!(string_to_number(&"4x".into()).is_nan());
  }

  #[test]
  fn uint32_wraps() {
    assert_eq!(to_uint32(-1.0), 4294967295);
    assert_eq!(to_int32(4294967295.0), -1);
    assert_eq!(to_uint32(f64::NAN), 0);
  }
}
