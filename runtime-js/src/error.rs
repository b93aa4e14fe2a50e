use crate::continuation::NativeContinuation;
use crate::value::Value;
use std::fmt;
use std::fmt::Display;

/// Source position attached to engine errors.
///
/// When the failure occurs inside an interpreted frame, the interpreter fills
/// this in; otherwise the engine walks its retained frame chain for the
/// nearest interpreted frame with a valid line number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourcePosition {
  pub source_name: Option<String>,
  pub line_number: u32,
  pub line_source: Option<String>,
  pub line_offset: u32,
}

impl SourcePosition {
  pub fn new(source_name: impl Into<String>, line_number: u32) -> Self {
    Self {
      source_name: Some(source_name.into()),
      line_number,
      line_source: None,
      line_offset: 0,
    }
  }

  pub fn is_known(&self) -> bool {
    self.source_name.is_some() || self.line_number != 0
  }
}

impl Display for SourcePosition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.source_name {
      Some(name) => write!(f, "{}:{}", name, self.line_number),
      None => write!(f, "<unknown>:{}", self.line_number),
    }
  }
}

/// The native error kinds of the language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EcmaErrorKind {
  Error,
  EvalError,
  RangeError,
  ReferenceError,
  SyntaxError,
  TypeError,
  UriError,
  InternalError,
}

impl EcmaErrorKind {
  pub fn name(&self) -> &'static str {
    match self {
      EcmaErrorKind::Error => "Error",
      EcmaErrorKind::EvalError => "EvalError",
      EcmaErrorKind::RangeError => "RangeError",
      EcmaErrorKind::ReferenceError => "ReferenceError",
      EcmaErrorKind::SyntaxError => "SyntaxError",
      EcmaErrorKind::TypeError => "TypeError",
      EcmaErrorKind::UriError => "URIError",
      EcmaErrorKind::InternalError => "InternalError",
    }
  }
}

/// Errors leaving an evaluation entry point.
///
/// - `Ecma` is a natively-raised language error; script `catch` observes it
///   as an Error object of the named kind.
/// - `Thrown` is a value thrown by script `throw`.
/// - `Evaluator` is a host-surface failure (I/O, compile limits, continuation
///   rules); script `catch` observes its message as an `Error`.
/// - `Wrapped` is a non-engine host error adapted at a boundary.
/// - `ContinuationPending` unwinds all script frames and is not catchable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
  #[error("{}: {message} ({position})", kind.name())]
  Ecma {
    kind: EcmaErrorKind,
    message: String,
    position: SourcePosition,
  },
  #[error("uncaught script exception ({position})")]
  Thrown {
    value: Value,
    position: SourcePosition,
  },
  #[error("{message} ({position})")]
  Evaluator {
    message: String,
    position: SourcePosition,
  },
  #[error("wrapped host exception: {message}")]
  Wrapped { message: String },
  #[error("continuation captured")]
  ContinuationPending(#[from] ContinuationPending),
}

impl EvalError {
  pub fn type_error(message: impl Into<String>) -> EvalError {
    EvalError::Ecma {
      kind: EcmaErrorKind::TypeError,
      message: message.into(),
      position: SourcePosition::default(),
    }
  }

  pub fn range_error(message: impl Into<String>) -> EvalError {
    EvalError::Ecma {
      kind: EcmaErrorKind::RangeError,
      message: message.into(),
      position: SourcePosition::default(),
    }
  }

  pub fn reference_error(message: impl Into<String>) -> EvalError {
    EvalError::Ecma {
      kind: EcmaErrorKind::ReferenceError,
      message: message.into(),
      position: SourcePosition::default(),
    }
  }

  pub fn syntax_error(message: impl Into<String>, position: SourcePosition) -> EvalError {
    EvalError::Ecma {
      kind: EcmaErrorKind::SyntaxError,
      message: message.into(),
      position,
    }
  }

  pub fn evaluator(message: impl Into<String>) -> EvalError {
    EvalError::Evaluator {
      message: message.into(),
      position: SourcePosition::default(),
    }
  }

  /// Whether script `try` may catch this error.
  pub fn is_catchable(&self) -> bool {
    !matches!(self, EvalError::ContinuationPending(_))
  }

  pub fn position(&self) -> Option<&SourcePosition> {
    match self {
      EvalError::Ecma { position, .. }
      | EvalError::Thrown { position, .. }
      | EvalError::Evaluator { position, .. } => Some(position),
      EvalError::Wrapped { .. } | EvalError::ContinuationPending(_) => None,
    }
  }

  /// Attach a source position if none is present yet. The innermost frame
  /// wins; outer frames must not overwrite it.
  pub fn with_position(mut self, new: SourcePosition) -> EvalError {
    if let Some(existing) = self.position() {
      if existing.is_known() {
        return self;
      }
    }
    match &mut self {
      EvalError::Ecma { position, .. }
      | EvalError::Thrown { position, .. }
      | EvalError::Evaluator { position, .. } => *position = new,
      EvalError::Wrapped { .. } | EvalError::ContinuationPending(_) => {}
    }
    self
  }
}

/// Raised (as an error) when script captures a continuation; the host must
/// catch it, stash the continuation, and later resume.
#[derive(Debug, Clone, thiserror::Error)]
#[error("script suspended by continuation capture")]
pub struct ContinuationPending {
  continuation: NativeContinuation,
  applied_value: Option<Value>,
}

impl ContinuationPending {
  pub fn new(continuation: NativeContinuation) -> Self {
    Self {
      continuation,
      applied_value: None,
    }
  }

  pub fn continuation(&self) -> &NativeContinuation {
    &self.continuation
  }

  pub fn into_continuation(self) -> NativeContinuation {
    self.continuation
  }

  /// Value the host wants delivered when resuming (optional convenience
  /// mirror of the original API).
  pub fn set_applied_value(&mut self, value: Value) {
    self.applied_value = Some(value);
  }

  pub fn applied_value(&self) -> Option<&Value> {
    self.applied_value.as_ref()
  }
}
