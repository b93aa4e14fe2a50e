use super::decode_string_literal;
use super::lex_next;
use super::split_regex_literal;
use super::LexMode;
use super::Lexer;
use crate::token::TT;

fn lex_all(source: &str) -> Vec<TT> {
  let mut lexer = Lexer::new(source);
  let mut out = Vec::new();
  loop {
    let t = lex_next(&mut lexer, LexMode::Standard);
    if t.typ == TT::EOF {
      break;
    }
    out.push(t.typ);
  }
  out
}

#[test]
fn lexes_keywords_and_identifiers() {
  assert_eq!(lex_all("var index"), vec![TT::KeywordVar, TT::Identifier]);
  // `in` must not swallow the start of `index`.
  assert_eq!(lex_all("in index"), vec![TT::KeywordIn, TT::Identifier]);
}

#[test]
fn lexes_longest_operator() {
  assert_eq!(lex_all(">>>="), vec![TT::ChevronRightChevronRightChevronRightEquals]);
  assert_eq!(lex_all("==="), vec![TT::EqualsEqualsEquals]);
  assert_eq!(lex_all("== ="), vec![TT::EqualsEquals, TT::Equals]);
}

#[test]
fn tracks_line_terminators_across_comments() {
  let mut lexer = Lexer::new("a /* x\n y */ b // z\nc");
  let a = lex_next(&mut lexer, LexMode::Standard);
  let b = lex_next(&mut lexer, LexMode::Standard);
  let c = lex_next(&mut lexer, LexMode::Standard);
  assert_eq!(a.typ, TT::Identifier);
  assert!(!a.preceded_by_line_terminator);
  assert!(b.preceded_by_line_terminator);
  assert!(c.preceded_by_line_terminator);
}

#[test]
fn slash_is_regex_mode_lexes_regex_literal() {
  let mut lexer = Lexer::new("/a[/]b/gi");
  let t = lex_next(&mut lexer, LexMode::SlashIsRegex);
  assert_eq!(t.typ, TT::LiteralRegex);
  assert_eq!(&lexer[t.loc], "/a[/]b/gi");
  let (pattern, flags) = split_regex_literal(&lexer[t.loc]);
  assert_eq!(pattern, "a[/]b");
  assert_eq!(flags, "gi");
}

#[test]
fn standard_mode_lexes_division() {
  assert_eq!(lex_all("a / b"), vec![TT::Identifier, TT::Slash, TT::Identifier]);
}

#[test]
fn decodes_string_escapes() {
  assert_eq!(
    decode_string_literal(r#""a\nb""#).unwrap(),
    "a\nb".encode_utf16().collect::<Vec<_>>()
  );
  assert_eq!(decode_string_literal(r#""\x41""#).unwrap(), vec![0x41]);
  assert_eq!(decode_string_literal(r#""A""#).unwrap(), vec![0x41]);
  // Lone surrogates survive decoding.
  assert_eq!(decode_string_literal(r#""\uD83D""#).unwrap(), vec![0xd83d]);
  // Legacy octal escape.
  assert_eq!(decode_string_literal(r#""\101""#).unwrap(), vec![0x41]);
}

#[test]
fn string_with_bare_newline_is_invalid() {
  let mut lexer = Lexer::new("\"a\nb\"");
  let t = lex_next(&mut lexer, LexMode::Standard);
  assert_eq!(t.typ, TT::Invalid);
}
