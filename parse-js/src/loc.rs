use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::token::TT;
#[cfg(feature = "diagnostics")]
use diagnostics::TextRange as DiagnosticTextRange;
use std::cmp::max;
use std::cmp::min;
use std::ops::Add;
use std::ops::AddAssign;

/// A half-open location within the current source expressed as UTF-8 byte
/// offsets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Loc(pub usize, pub usize);

impl Loc {
  pub fn is_empty(&self) -> bool {
    self.0 >= self.1
  }

  pub fn len(&self) -> usize {
    self.1 - self.0
  }

  pub fn extend(&mut self, other: Loc) {
    self.0 = min(self.0, other.0);
    self.1 = max(self.1, other.1);
  }

  pub fn error(self, typ: SyntaxErrorType, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError::new(typ, self, actual_token)
  }

  /// Convert into a `diagnostics` range, clamping offsets to `u32`.
  #[cfg(feature = "diagnostics")]
  pub fn to_diagnostics_range(&self) -> DiagnosticTextRange {
    DiagnosticTextRange::new(clamp_to_u32(self.0), clamp_to_u32(self.1))
  }
}

impl Add for Loc {
  type Output = Loc;

  fn add(self, rhs: Self) -> Self::Output {
    let mut new = self;
    new.extend(rhs);
    new
  }
}

impl AddAssign for Loc {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(rhs);
  }
}

#[cfg(feature = "diagnostics")]
fn clamp_to_u32(value: usize) -> u32 {
  value.try_into().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extend_covers_both_ranges() {
    let mut a = Loc(4, 7);
    a.extend(Loc(10, 12));
    assert_eq!(a, Loc(4, 12));
    assert_eq!(Loc(1, 2) + Loc(0, 1), Loc(0, 2));
  }
}
