use crate::error::EvalError;
use crate::error::SourcePosition;

/// Pluggable sink for warnings, recoverable errors, and fatal runtime
/// errors.
///
/// Every method receives the message plus the source position pieces
/// `(source_name, line_number, line_source, line_offset)`.
pub trait ErrorReporter {
  /// Report a warning. Warnings never interrupt compilation or execution
  /// (unless the context upgrades them to errors).
  fn warning(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  );

  /// Report a recoverable (compile-time) error. The engine raises the
  /// corresponding syntax error itself after this notification returns.
  fn error(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  );

  /// Report a fatal runtime error, producing the evaluator exception that
  /// will terminate the script.
  fn runtime_error(
    &mut self,
    message: &str,
    source_name: &str,
    line_number: u32,
    line_source: Option<&str>,
    line_offset: u32,
  ) -> EvalError {
    let _ = (source_name, line_number, line_source, line_offset);
    EvalError::Evaluator {
      message: message.to_string(),
      position: SourcePosition {
        source_name: Some(source_name.to_string()),
        line_number,
        line_source: line_source.map(|s| s.to_string()),
        line_offset,
      },
    }
  }
}

/// The reporter used when the embedding installs none: warnings are dropped,
/// errors surface only through the exceptions the engine raises.
#[derive(Default)]
pub struct DefaultErrorReporter;

impl ErrorReporter for DefaultErrorReporter {
  fn warning(
    &mut self,
    _message: &str,
    _source_name: &str,
    _line_number: u32,
    _line_source: Option<&str>,
    _line_offset: u32,
  ) {
  }

  fn error(
    &mut self,
    _message: &str,
    _source_name: &str,
    _line_number: u32,
    _line_source: Option<&str>,
    _line_offset: u32,
  ) {
  }
}
