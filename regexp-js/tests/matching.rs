use regexp_js::compile_str;
use regexp_js::ExecOptions;
use regexp_js::ReMatch;

fn units(s: &str) -> Vec<u16> {
  s.encode_utf16().collect()
}

fn find(pattern: &str, flags: &str, input: &str, start: usize) -> Option<ReMatch> {
  let re = compile_str(pattern, flags).expect("pattern must compile");
  re.find(&units(input), start, &ExecOptions::default())
    .expect("budget must not be exceeded")
}

fn matched<'a>(input: &'a str, m: &ReMatch) -> String {
  let u = units(input);
  String::from_utf16_lossy(&u[m.start..m.end])
}

#[test]
fn literal_runs_and_scanning() {
  let m = find("bc", "", "abcd", 0).unwrap();
  assert_eq!((m.start, m.end), (1, 3));
  assert!(find("xy", "", "abcd", 0).is_none());
}

#[test]
fn case_folding() {
  assert!(find("abc", "i", "xAbCy", 0).is_some());
  assert!(find("[a-z]+", "i", "HELLO", 0).is_some());
  assert!(find("abc", "", "ABC", 0).is_none());
}

#[test]
fn anchors_and_multiline() {
  assert!(find("^b", "", "a\nb", 0).is_none());
  let m = find("^b", "m", "a\nb", 0).unwrap();
  assert_eq!(m.start, 2);
  assert!(find("a$", "", "a\nb", 0).is_none());
  assert!(find("a$", "m", "a\nb", 0).is_some());
}

#[test]
fn dot_and_dotall() {
  assert!(find("a.b", "", "a\nb", 0).is_none());
  assert!(find("a.b", "s", "a\nb", 0).is_some());
}

#[test]
fn quantifiers_greedy_and_lazy() {
  let m = find("a+", "", "caaat", 0).unwrap();
  assert_eq!(matched("caaat", &m), "aaa");
  let m = find("a+?", "", "caaat", 0).unwrap();
  assert_eq!(matched("caaat", &m), "a");
  let m = find("a{2,3}", "", "aaaa", 0).unwrap();
  assert_eq!(matched("aaaa", &m), "aaa");
  let m = find("a{2}", "", "aaaa", 0).unwrap();
  assert_eq!((m.start, m.end), (0, 2));
  assert!(find("a{3,}", "", "aa", 0).is_none());
}

#[test]
fn alternation_prefers_leftmost() {
  let m = find("ab|a", "", "ab", 0).unwrap();
  assert_eq!(matched("ab", &m), "ab");
  let m = find("a|ab", "", "ab", 0).unwrap();
  assert_eq!(matched("ab", &m), "a");
}

#[test]
fn capture_groups_record_bounds() {
  let input = "2024-01-31";
  let m = find("(\\d{4})-(\\d{2})-(\\d{2})", "", input, 0).unwrap();
  assert_eq!(m.captures.len(), 3);
  assert_eq!(m.captures[0], Some((0, 4)));
  assert_eq!(m.captures[1], Some((5, 7)));
  assert_eq!(m.captures[2], Some((8, 10)));
}

#[test]
fn unparticipating_groups_are_unset() {
  let m = find("(a)|(b)", "", "b", 0).unwrap();
  assert_eq!(m.captures[0], None);
  assert_eq!(m.captures[1], Some((0, 1)));
}

#[test]
fn backreferences() {
  let m = find("(\\w+) \\1", "", "hey hey you", 0).unwrap();
  assert_eq!(matched("hey hey you", &m), "hey hey");
  assert!(find("(a)\\1", "", "ab", 0).is_none());
  // An unset group backreference matches the empty string.
  assert!(find("(?:(a)|b)\\1", "", "b", 0).is_some());
}

#[test]
fn character_classes() {
  assert!(find("[abc]+", "", "cab", 0).is_some());
  assert!(find("[^abc]", "", "abc", 0).is_none());
  let m = find("[0-9a-f]+", "", "zz1f9z", 0).unwrap();
  assert_eq!(matched("zz1f9z", &m), "1f9");
  // `-` at the edges is literal; `\b` inside a class is backspace.
  assert!(find("[-a]", "", "-", 0).is_some());
  assert!(find("[\\b]", "", "\u{8}", 0).is_some());
  assert!(find("[\\d]+", "", "x42", 0).is_some());
}

#[test]
fn lookahead() {
  let m = find("a(?=b)", "", "ab ac", 0).unwrap();
  assert_eq!((m.start, m.end), (0, 1));
  let m = find("a(?!b)", "", "ab ac", 0).unwrap();
  assert_eq!(m.start, 3);
}

#[test]
fn lookbehind() {
  let m = find("(?<=\\$)\\d+", "", "price $42 today", 0).unwrap();
  assert_eq!(matched("price $42 today", &m), "42");
  let m = find("(?<!\\$)\\b\\d+", "", "$42 17", 0).unwrap();
  assert_eq!(matched("$42 17", &m), "17");
}

#[test]
fn sticky_requires_exact_start() {
  assert!(find("a", "y", "ba", 0).is_none());
  let m = find("a", "y", "ba", 1).unwrap();
  assert_eq!((m.start, m.end), (1, 2));
}

#[test]
fn empty_loop_bodies_terminate() {
  // Without a progress guard these spin forever (or blow the budget).
  let m = find("(a*)*b", "", "aaab", 0).unwrap();
  assert_eq!(m.end, 4);
  let m = find("(?:a?)*", "", "", 0).unwrap();
  assert_eq!((m.start, m.end), (0, 0));
}

#[test]
fn unicode_mode_atoms_are_code_points() {
  // Non-unicode: `.` sees two lone surrogates. Unicode: one code point.
  let emoji = "\u{1F600}";
  let m = find(".", "", emoji, 0).unwrap();
  assert_eq!(m.end - m.start, 1);
  let m = find(".", "u", emoji, 0).unwrap();
  assert_eq!(m.end - m.start, 2);
}

#[test]
fn unicode_escape_pairs_combine() {
  let m = find("\\uD83D\\uDE00", "u", "\u{1F600}", 0).unwrap();
  assert_eq!((m.start, m.end), (0, 2));
}

#[test]
fn budget_bounds_catastrophic_backtracking() {
  let re = compile_str("(a+)+$", "").unwrap();
  let input = units(&format!("{}b", "a".repeat(64)));
  let result = re.find(&input, 0, &ExecOptions {
    budget: 10_000,
    ..ExecOptions::default()
  });
  assert!(result.is_err(), "pathological pattern must hit the budget");
}

#[test]
fn compile_errors() {
  assert!(compile_str("(", "").is_err());
  assert!(compile_str("[a", "").is_err());
  assert!(compile_str("a{2,1}", "").is_err());
  assert!(compile_str("*a", "").is_err());
  assert!(compile_str("a\\", "").is_err());
  // Legacy tolerances outside unicode mode.
  assert!(compile_str("a{", "").is_ok());
  assert!(compile_str("\\q", "").is_ok());
  assert!(compile_str("\\q", "u").is_err());
}

#[test]
fn source_and_flags_are_preserved() {
  let re = compile_str("a(b)c", "ig").unwrap();
  assert_eq!(String::from_utf16_lossy(re.source_units()), "a(b)c");
  assert_eq!(re.paren_count, 1);
  assert_eq!(re.flags.canonical_string(), "gi");
}
