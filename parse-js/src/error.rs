use crate::loc::Loc;
use crate::token::TT;
#[cfg(feature = "diagnostics")]
use diagnostics::Diagnostic;
#[cfg(feature = "diagnostics")]
use diagnostics::FileId;
#[cfg(feature = "diagnostics")]
use diagnostics::Span;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use std::error::Error;
use std::fmt::Display;

/// A stable classification of syntax errors produced by the lexer and parser.
///
/// Diagnostic codes (prefix `PS`) are assigned per variant and are stable:
/// - `PS0001`: [`SyntaxErrorType::ExpectedSyntax`]
/// - `PS0002`: [`SyntaxErrorType::ForHeaderMalformed`]
/// - `PS0003`: [`SyntaxErrorType::InvalidAssignmentTarget`]
/// - `PS0004`: [`SyntaxErrorType::InvalidCharacterEscape`]
/// - `PS0005`: [`SyntaxErrorType::LabelNotAllowed`]
/// - `PS0006`: [`SyntaxErrorType::LineTerminatorAfterRestrictedKeyword`]
/// - `PS0007`: [`SyntaxErrorType::MalformedLiteralNumber`]
/// - `PS0008`: [`SyntaxErrorType::RequiredTokenNotFound`]
/// - `PS0009`: [`SyntaxErrorType::ReservedWordAsIdentifier`]
/// - `PS0010`: [`SyntaxErrorType::TryStatementHasNoCatchOrFinally`]
/// - `PS0011`: [`SyntaxErrorType::UnexpectedEnd`]
/// - `PS0012`: [`SyntaxErrorType::UnexpectedToken`]
/// - `PS0013`: [`SyntaxErrorType::WithInStrictMode`]
/// - `PS0014`: [`SyntaxErrorType::OctalInStrictMode`]
/// - `PS0015`: [`SyntaxErrorType::DuplicateParameter`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedSyntax(&'static str),
  ForHeaderMalformed,
  InvalidAssignmentTarget,
  InvalidCharacterEscape,
  LabelNotAllowed,
  LineTerminatorAfterRestrictedKeyword(&'static str),
  MalformedLiteralNumber,
  RequiredTokenNotFound(TT),
  ReservedWordAsIdentifier,
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
  UnexpectedToken,
  WithInStrictMode,
  OctalInStrictMode,
  DuplicateParameter,
}

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::ExpectedSyntax(_) => "PS0001",
      SyntaxErrorType::ForHeaderMalformed => "PS0002",
      SyntaxErrorType::InvalidAssignmentTarget => "PS0003",
      SyntaxErrorType::InvalidCharacterEscape => "PS0004",
      SyntaxErrorType::LabelNotAllowed => "PS0005",
      SyntaxErrorType::LineTerminatorAfterRestrictedKeyword(_) => "PS0006",
      SyntaxErrorType::MalformedLiteralNumber => "PS0007",
      SyntaxErrorType::RequiredTokenNotFound(_) => "PS0008",
      SyntaxErrorType::ReservedWordAsIdentifier => "PS0009",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "PS0010",
      SyntaxErrorType::UnexpectedEnd => "PS0011",
      SyntaxErrorType::UnexpectedToken => "PS0012",
      SyntaxErrorType::WithInStrictMode => "PS0013",
      SyntaxErrorType::OctalInStrictMode => "PS0014",
      SyntaxErrorType::DuplicateParameter => "PS0015",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    match self {
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::ForHeaderMalformed => "malformed `for` statement header".into(),
      SyntaxErrorType::InvalidAssignmentTarget => "invalid assignment target".into(),
      SyntaxErrorType::InvalidCharacterEscape => "invalid character escape".into(),
      SyntaxErrorType::LabelNotAllowed => "label not allowed here".into(),
      SyntaxErrorType::LineTerminatorAfterRestrictedKeyword(kw) => {
        format!("line terminator not allowed after `{}`", kw)
      }
      SyntaxErrorType::MalformedLiteralNumber => "malformed number literal".into(),
      SyntaxErrorType::RequiredTokenNotFound(token) => format!("expected token {:?}", token),
      SyntaxErrorType::ReservedWordAsIdentifier => {
        "reserved word may not be used as an identifier".into()
      }
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement requires a catch or finally block".into()
      }
      SyntaxErrorType::UnexpectedEnd => actual_token
        .map(|tok| format!("unexpected end before {:?}", tok))
        .unwrap_or_else(|| "unexpected end of input".into()),
      SyntaxErrorType::UnexpectedToken => "unexpected token".into(),
      SyntaxErrorType::WithInStrictMode => "`with` statements are not allowed in strict mode".into(),
      SyntaxErrorType::OctalInStrictMode => {
        "legacy octal literals are not allowed in strict mode".into()
      }
      SyntaxErrorType::DuplicateParameter => "duplicate parameter name".into(),
    }
  }
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }

  /// Whether this error was caused by running off the end of the input, i.e.
  /// the source could become valid by appending more text. Interactive hosts
  /// key off this to decide whether to keep reading.
  pub fn is_unexpected_end(&self) -> bool {
    matches!(self.typ, SyntaxErrorType::UnexpectedEnd)
      || matches!(
        (self.typ, self.actual_token),
        (SyntaxErrorType::RequiredTokenNotFound(_), Some(TT::EOF))
          | (SyntaxErrorType::ExpectedSyntax(_), Some(TT::EOF))
          | (SyntaxErrorType::UnexpectedToken, Some(TT::EOF))
      )
  }

  /// Convert this syntax error into a shared [`diagnostics::Diagnostic`].
  #[cfg(feature = "diagnostics")]
  pub fn to_diagnostic(&self, file: FileId) -> Diagnostic {
    let mut diagnostic = Diagnostic::error(
      self.typ.code(),
      self.typ.message(self.actual_token),
      Span::new(file, self.loc.to_diagnostics_range()),
    );
    if let Some(actual) = self.actual_token {
      diagnostic = diagnostic.with_note(format!("found token: {:?}", actual));
    }
    diagnostic
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} [token={:?}]", self.typ.message(self.actual_token), self.actual_token)
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;
