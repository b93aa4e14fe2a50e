use runtime_js::Context;
use runtime_js::JsObject;
use runtime_js::LanguageVersion;
use runtime_js::Value;

fn with_version(version: LanguageVersion, f: impl FnOnce(&mut Context, JsObject)) {
  let mut cx = Context::new();
  cx.enter().unwrap();
  cx.set_language_version(version).unwrap();
  let global = cx.init_standard_objects(None, false).unwrap();
  f(&mut cx, global);
  cx.exit().unwrap();
}

fn eval_string(cx: &mut Context, global: JsObject, source: &str) -> String {
  match cx
    .evaluate_string(global, source, "legacy.js", 1, None)
    .unwrap()
  {
    Value::String(s) => s.to_utf8_lossy(),
    other => panic!("expected string, got {:?}", other),
  }
}

const DRIVE_TWO_MATCHES: &str = "var re = / /g;\n\
                                 re.exec('hi there bye');\n\
                                 var first = RegExp['$`'];\n\
                                 re.exec('hi there bye');\n\
                                 first + '|' + RegExp['$`']";

#[test]
fn left_context_under_version_1_2_is_the_skipped_text() {
  // The 1.2 dialect defines $` as the left context of the last match only.
  with_version(LanguageVersion::V1_2, |cx, global| {
    assert_eq!(eval_string(cx, global, DRIVE_TWO_MATCHES), "hi|there");
  });
}

#[test]
fn left_context_under_later_versions_is_the_whole_prefix() {
  with_version(LanguageVersion::ES6, |cx, global| {
    assert_eq!(eval_string(cx, global, DRIVE_TWO_MATCHES), "hi|hi there");
  });
}

#[test]
fn dollar_statics_reflect_the_last_match() {
  with_version(LanguageVersion::ES6, |cx, global| {
    assert_eq!(
      eval_string(
        cx,
        global,
        "/(\\d+)-(\\d+)/.exec('a 12-34 z');\n\
         [RegExp.$1, RegExp.$2, RegExp['$&'], RegExp[\"$'\"], RegExp['$_']].join('|')"
      ),
      "12|34|12-34| z|a 12-34 z"
    );
    // Unmatched groups read as the empty string.
    assert_eq!(
      eval_string(cx, global, "/(a)|(b)/.exec('b'); RegExp.$1 + '.' + RegExp.$2"),
      ".b"
    );
  });
}
