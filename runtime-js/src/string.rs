use std::fmt;
use std::rc::Rc;

/// A JavaScript String value.
///
/// Per ECMAScript, strings are sequences of UTF-16 code units and may contain
/// unpaired surrogate code units. Cloning is cheap (shared backing buffer).
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString {
  units: Rc<[u16]>,
}

impl JsString {
  pub fn from_code_units(units: &[u16]) -> Self {
    Self {
      units: units.into(),
    }
  }

  pub fn from_u16_vec(units: Vec<u16>) -> Self {
    Self {
      units: units.into(),
    }
  }

  pub fn from_str(s: &str) -> Self {
    Self {
      units: s.encode_utf16().collect::<Vec<_>>().into(),
    }
  }

  pub fn empty() -> Self {
    Self {
      units: Vec::new().into(),
    }
  }

  pub fn len_code_units(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  pub fn as_code_units(&self) -> &[u16] {
    &self.units
  }

  /// Substring by code-unit bounds (clamped).
  pub fn substring(&self, start: usize, end: usize) -> JsString {
    let len = self.units.len();
    let start = start.min(len);
    let end = end.clamp(start, len);
    JsString::from_code_units(&self.units[start..end])
  }

  pub fn concat(&self, other: &JsString) -> JsString {
    let mut units = Vec::with_capacity(self.units.len() + other.units.len());
    units.extend_from_slice(&self.units);
    units.extend_from_slice(&other.units);
    JsString::from_u16_vec(units)
  }

  pub fn to_utf8_lossy(&self) -> String {
    String::from_utf16_lossy(&self.units)
  }

  pub fn eq_str(&self, s: &str) -> bool {
    self.units.iter().copied().eq(s.encode_utf16())
  }
}

impl fmt::Debug for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Rust `String` cannot represent lone surrogates; use a lossy conversion
    // so Debug never panics.
    write!(f, "{:?}", self.to_utf8_lossy())
  }
}

impl fmt::Display for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_utf8_lossy())
  }
}

impl From<&str> for JsString {
  fn from(s: &str) -> Self {
    JsString::from_str(s)
  }
}

impl From<String> for JsString {
  fn from(s: String) -> Self {
    JsString::from_str(&s)
  }
}
