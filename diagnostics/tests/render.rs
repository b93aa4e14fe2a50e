use diagnostics::render::render_diagnostic;
use diagnostics::render::SourceProvider;
use diagnostics::Diagnostic;
use diagnostics::FileId;
use diagnostics::Span;
use diagnostics::TextRange;

struct OneFile {
  name: &'static str,
  text: Option<&'static str>,
}

impl SourceProvider for OneFile {
  fn file_name(&self, _file: FileId) -> Option<&str> {
    Some(self.name)
  }

  fn file_text(&self, _file: FileId) -> Option<&str> {
    self.text
  }
}

#[test]
fn renders_caret_under_offending_range() {
  let provider = OneFile {
    name: "repl",
    text: Some("var x = ;\nvar y = 2;"),
  };
  let diag = Diagnostic::error(
    "TEST0001",
    "unexpected token",
    Span::new(FileId(0), TextRange::new(8, 9)),
  );

  let rendered = render_diagnostic(&provider, &diag);
  assert!(rendered.starts_with("error[TEST0001]: unexpected token"));
  assert!(rendered.contains(" --> repl:1:9"));
  assert!(rendered.contains("1 | var x = ;"));
  assert!(rendered.contains("  |         ^"));
}

#[test]
fn renders_notes_and_multiline_positions() {
  let provider = OneFile {
    name: "f.js",
    text: Some("a;\nb;\nc d;"),
  };
  let diag = Diagnostic::warning(
    "TEST0002",
    "suspicious whitespace",
    Span::new(FileId(0), TextRange::new(8, 9)),
  )
  .with_note("did you mean a call?");

  let rendered = render_diagnostic(&provider, &diag);
  assert!(rendered.contains(" --> f.js:3:3"));
  assert!(rendered.contains(" = note: did you mean a call?"));
}

#[test]
fn renders_without_source_text() {
  let provider = OneFile {
    name: "gone.js",
    text: None,
  };
  let diag = Diagnostic::error(
    "TEST0003",
    "missing source",
    Span::new(FileId(0), TextRange::new(3, 7)),
  );

  let rendered = render_diagnostic(&provider, &diag);
  assert!(rendered.contains(" --> gone.js:[3..7]"));
}
