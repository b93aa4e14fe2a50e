use crate::line_position;
use crate::Diagnostic;
use crate::FileId;
use std::fmt::Write;

/// Provides access to source text for rendering diagnostics.
///
/// Returning `None` allows consumers to gracefully handle missing sources
/// (for example, an evaluation unit compiled with source generation off).
pub trait SourceProvider {
  /// Returns the display name for a file, or `None` if the file is unknown.
  fn file_name(&self, file: FileId) -> Option<&str>;
  /// Returns the file contents, or `None` if the source is unavailable.
  fn file_text(&self, file: FileId) -> Option<&str>;
}

/// Render a diagnostic into a human-readable string with caret highlighting.
pub fn render_diagnostic(provider: &dyn SourceProvider, diagnostic: &Diagnostic) -> String {
  let mut output = String::new();

  writeln!(
    output,
    "{}[{}]: {}",
    diagnostic.severity, diagnostic.code, diagnostic.message
  )
  .unwrap();

  let name = provider
    .file_name(diagnostic.primary.file)
    .unwrap_or("<unknown>");
  let text = provider.file_text(diagnostic.primary.file);
  match text {
    Some(text) => {
      let start = diagnostic.primary.range.start as usize;
      let pos = line_position(text, start);
      writeln!(output, " --> {}:{}:{}", name, pos.line, pos.column).unwrap();
      let gutter_width = pos.line.to_string().len();
      writeln!(output, "{:>width$} |", "", width = gutter_width).unwrap();
      writeln!(
        output,
        "{:>width$} | {}",
        pos.line,
        pos.line_text,
        width = gutter_width
      )
      .unwrap();
      let underline_len = (diagnostic.primary.range.len() as usize)
        .min(pos.line_text.len().saturating_sub(pos.offset_in_line))
        .max(1);
      writeln!(
        output,
        "{:>width$} | {}{}",
        "",
        " ".repeat(pos.offset_in_line),
        "^".repeat(underline_len),
        width = gutter_width
      )
      .unwrap();
    }
    None => {
      writeln!(
        output,
        " --> {}:[{}..{}]",
        name, diagnostic.primary.range.start, diagnostic.primary.range.end
      )
      .unwrap();
    }
  }

  for note in &diagnostic.notes {
    writeln!(output, " = note: {}", note).unwrap();
  }

  output
}
