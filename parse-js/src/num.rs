use num_bigint::BigUint;

/// Parse a source-text numeric literal (including radix prefixes and legacy
/// octal forms) into its JS number value.
///
/// Returns `None` when the raw text is not a valid literal.
pub fn parse_number_literal(raw: &str) -> Option<f64> {
  if let Some(rest) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
    return parse_radix(rest, 2);
  }
  if let Some(rest) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
    return parse_radix(rest, 8);
  }
  if let Some(rest) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
    return parse_radix(rest, 16);
  }

  if is_legacy_octal_literal(raw) {
    return parse_radix(&raw[1..], 8);
  }

  parse_decimal(raw)
}

/// Whether `raw` is a legacy octal integer literal (`0` followed by octal
/// digits only, e.g. `010`). `08`/`09` are decimal, not octal.
pub fn is_legacy_octal_literal(raw: &str) -> bool {
  raw.len() > 1
    && raw.starts_with('0')
    && raw[1..].bytes().all(|b| (b'0'..=b'7').contains(&b))
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
  if digits.is_empty() {
    return None;
  }
  let value = BigUint::parse_bytes(digits.as_bytes(), radix)?;
  parse_decimal(&value.to_str_radix(10))
}

fn parse_decimal(raw: &str) -> Option<f64> {
  let mut cleaned = raw.to_string();
  if cleaned.starts_with('.') {
    cleaned.insert(0, '0');
  }
  if cleaned.ends_with('.') {
    cleaned.push('0');
  }
  fast_float::parse(&cleaned).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_decimal_forms() {
    assert_eq!(parse_number_literal("0"), Some(0.0));
    assert_eq!(parse_number_literal("42"), Some(42.0));
    assert_eq!(parse_number_literal("4.5"), Some(4.5));
    assert_eq!(parse_number_literal(".5"), Some(0.5));
    assert_eq!(parse_number_literal("5."), Some(5.0));
    assert_eq!(parse_number_literal("1e3"), Some(1000.0));
    assert_eq!(parse_number_literal("1E-2"), Some(0.01));
  }

  #[test]
  fn parses_radix_forms() {
    assert_eq!(parse_number_literal("0xff"), Some(255.0));
    assert_eq!(parse_number_literal("0XFF"), Some(255.0));
    assert_eq!(parse_number_literal("0b101"), Some(5.0));
    assert_eq!(parse_number_literal("0o17"), Some(15.0));
  }

  #[test]
  fn parses_legacy_octal() {
    assert!(is_legacy_octal_literal("010"));
    assert!(!is_legacy_octal_literal("08"));
    assert_eq!(parse_number_literal("010"), Some(8.0));
    // `08` has a non-octal digit so it falls back to decimal.
    assert_eq!(parse_number_literal("08"), Some(8.0));
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(parse_number_literal("0x"), None);
    assert_eq!(parse_number_literal("0b"), None);
  }
}
