use super::define_method;
use super::define_symbol_method;
use super::install_ctor;
use super::regexp_iterator;
use crate::context::Context;
use crate::context::LanguageVersion;
use crate::error::EcmaErrorKind;
use crate::error::EvalError;
use crate::error::SourcePosition;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::security::RegExpProxy;
use crate::string::JsString;
use crate::value::to_integer;
use crate::value::to_length;
use crate::value::Value;
use regexp_js::advance_string_index;
use regexp_js::parse_flags;
use regexp_js::ExecOptions;
use regexp_js::RECompiled;
use regexp_js::RegExpFlags;
use std::rc::Rc;

/// Kind of match requested from the execution core.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MatchType {
  Test,
  Match,
  Prefix,
}

/// Internal state of one RegExp instance: the shared compiled program.
/// (`lastIndex` is an ordinary property slot so its attributes behave like
/// any other property.)
pub struct RegExpData {
  pub re: Rc<RECompiled>,
}

/// A slice of a subject string, tracked without copying.
#[derive(Clone, Debug, Default)]
pub struct SubString {
  pub subject: JsString,
  pub index: usize,
  pub length: usize,
}

impl SubString {
  fn new(subject: &JsString, index: usize, length: usize) -> SubString {
    SubString {
      subject: subject.clone(),
      index,
      length,
    }
  }

  pub fn to_js_string(&self) -> JsString {
    self.subject.substring(self.index, self.index + self.length)
  }
}

/// Per-realm legacy match state backing `RegExp.$1..$9`, `` RegExp["$`"] ``
/// and friends.
#[derive(Default)]
pub struct RegExpImpl {
  pub input: Option<JsString>,
  /// The legacy `RegExp.multiline` toggle: forces `^`/`$` to match at line
  /// boundaries for every execution in this realm.
  pub multiline: bool,
  pub last_match: SubString,
  pub left_context: SubString,
  pub right_context: SubString,
  pub parens: Vec<Option<SubString>>,
  pub last_paren: Option<SubString>,
}

/// The bundled pattern engine exposed through the RegExpProxy seam.
pub struct BundledRegExpProxy;

impl RegExpProxy for BundledRegExpProxy {
  fn compile(&self, pattern: &[u16], flags: Option<&str>) -> Result<Rc<RECompiled>, EvalError> {
    let flags = parse_flags(flags.unwrap_or("")).map_err(to_syntax_error)?;
    RECompiled::compile(pattern, flags)
      .map(Rc::new)
      .map_err(to_syntax_error)
  }
}

fn to_syntax_error(err: impl std::fmt::Display) -> EvalError {
  EvalError::syntax_error(
    format!("invalid regular expression: {}", err),
    SourcePosition::default(),
  )
}

// Prototype ids.
const ID_COMPILE: u16 = 1;
const ID_TO_STRING: u16 = 2;
const ID_TO_SOURCE: u16 = 3;
const ID_EXEC: u16 = 4;
const ID_TEST: u16 = 5;
const ID_PREFIX: u16 = 6;
const SYMBOL_ID_MATCH: u16 = 7;
const SYMBOL_ID_MATCH_ALL: u16 = 8;
const SYMBOL_ID_SEARCH: u16 = 9;

/// Allocate `RegExp.prototype`. Like instances, the prototype holds a (an
/// empty) compiled program.
pub(crate) fn alloc_prototype(
  cx: &mut Context,
  object_prototype: JsObject,
) -> Result<JsObject, EvalError> {
  let re = BundledRegExpProxy.compile(&[], None)?;
  let mut proto = ScriptObject::new(ObjectKind::RegExp(RegExpData { re }), Some(object_prototype));
  proto.define_value(
    PropertyKey::String("lastIndex".into()),
    Value::Number(0.0),
    PERMANENT | DONTENUM,
  );
  Ok(cx.heap.alloc(proto))
}

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> Result<JsObject, EvalError> {
  let realm = cx.realm.as_ref().expect("realm must be initialized");
  let prototype = realm.regexp_prototype;
  let symbols = realm.symbols;

  define_method(cx, prototype, BuiltinTag::RegExp, ID_COMPILE, "compile", 2);
  define_method(cx, prototype, BuiltinTag::RegExp, ID_TO_STRING, "toString", 0);
  define_method(cx, prototype, BuiltinTag::RegExp, ID_TO_SOURCE, "toSource", 0);
  define_method(cx, prototype, BuiltinTag::RegExp, ID_EXEC, "exec", 1);
  define_method(cx, prototype, BuiltinTag::RegExp, ID_TEST, "test", 1);
  define_method(cx, prototype, BuiltinTag::RegExp, ID_PREFIX, "prefix", 1);
  define_symbol_method(
    cx,
    prototype,
    BuiltinTag::RegExp,
    SYMBOL_ID_MATCH,
    symbols.match_,
    "[Symbol.match]",
    1,
  );
  define_symbol_method(
    cx,
    prototype,
    BuiltinTag::RegExp,
    SYMBOL_ID_MATCH_ALL,
    symbols.match_all,
    "[Symbol.matchAll]",
    1,
  );
  define_symbol_method(
    cx,
    prototype,
    BuiltinTag::RegExp,
    SYMBOL_ID_SEARCH,
    symbols.search,
    "[Symbol.search]",
    1,
  );

  let ctor = cx.new_native_function("RegExp", 2, ctor_regexp, true);
  super::add_species_accessor(cx, ctor);
  install_ctor(cx, scope, "RegExp", ctor, prototype);

  // Legacy ctor statics start out empty.
  for name in [
    "$1", "$2", "$3", "$4", "$5", "$6", "$7", "$8", "$9", "lastMatch", "$&", "leftContext", "$`",
    "rightContext", "$'", "input", "$_",
  ] {
    cx.define_property(ctor, PropertyKey::from_str(name), Value::string(""), DONTENUM);
  }
  cx.define_property(
    ctor,
    PropertyKey::String("multiline".into()),
    Value::Bool(false),
    DONTENUM,
  );

  Ok(ctor)
}

fn ctor_regexp(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  construct: bool,
) -> Result<Value, EvalError> {
  // Calling the ctor as a function on an existing RegExp with no flags
  // returns the argument unchanged.
  if !construct {
    if let Some(Value::Object(obj)) = args.first() {
      let is_regexp = matches!(cx.heap.get(*obj).kind, ObjectKind::RegExp(_));
      let no_flags = args.get(1).map(|f| f.is_undefined()).unwrap_or(true);
      if is_regexp && no_flags {
        return Ok(Value::Object(*obj));
      }
    }
  }
  Ok(Value::Object(construct_regexp(cx, args)?))
}

/// Construct a new RegExp instance from constructor-style arguments.
pub(crate) fn construct_regexp(cx: &mut Context, args: &[Value]) -> Result<JsObject, EvalError> {
  let re = compile_from_args(cx, args)?;
  Ok(new_regexp_object(cx, re))
}

/// The §4.4 construction rules: program reuse, the ES6-only two-argument
/// form, and naked-slash escaping for string-coerced sources.
fn compile_from_args(cx: &mut Context, args: &[Value]) -> Result<Rc<RECompiled>, EvalError> {
  let arg0_regexp = match args.first() {
    Some(Value::Object(obj)) => match &cx.heap.get(*obj).kind {
      ObjectKind::RegExp(data) => Some(data.re.clone()),
      _ => None,
    },
    _ => None,
  };
  let no_flags = args.get(1).map(|f| f.is_undefined()).unwrap_or(true);

  if let Some(re) = &arg0_regexp {
    if no_flags {
      // Avoid recompiling the regex.
      return Ok(re.clone());
    }
    // Passing a regex plus flags is allowed from ES6 on.
    if cx.language_version().as_number() < LanguageVersion::ES6.as_number() {
      return Err(EvalError::type_error(
        "only one argument may be given to RegExp constructor",
      ));
    }
  }

  let pattern: Vec<u16> = match (args.first(), &arg0_regexp) {
    (_, Some(re)) => re.source_units().to_vec(),
    (None, _) | (Some(Value::Undefined), _) => Vec::new(),
    (Some(other), _) => {
      let s = cx.to_string_value(other)?;
      escape_regexp(&s)
    }
  };
  let flags = if no_flags {
    None
  } else {
    Some(cx.to_string_value(&args[1])?.to_utf8_lossy())
  };
  let proxy = cx.regexp_proxy();
  proxy.compile(&pattern, flags.as_deref())
}

/// Escape any naked slashes in a string-coerced pattern source.
fn escape_regexp(source: &JsString) -> Vec<u16> {
  let units = source.as_code_units();
  let mut out = Vec::with_capacity(units.len());
  for (i, &unit) in units.iter().enumerate() {
    if unit == '/' as u16 && (i == 0 || units[i - 1] != '\\' as u16) {
      out.push('\\' as u16);
    }
    out.push(unit);
  }
  out
}

pub(crate) fn new_regexp_object(cx: &mut Context, re: Rc<RECompiled>) -> JsObject {
  let proto = cx.realm.as_ref().map(|r| r.regexp_prototype);
  let mut obj = ScriptObject::new(ObjectKind::RegExp(RegExpData { re }), proto);
  obj.define_value(
    PropertyKey::String("lastIndex".into()),
    Value::Number(0.0),
    PERMANENT | DONTENUM,
  );
  cx.heap.alloc(obj)
}

fn regexp_data(cx: &Context, obj: JsObject) -> Option<Rc<RECompiled>> {
  match &cx.heap.get(obj).kind {
    ObjectKind::RegExp(data) => Some(data.re.clone()),
    _ => None,
  }
}

fn real_this(cx: &Context, this: &Value, method: &str) -> Result<JsObject, EvalError> {
  match this.as_object() {
    Some(obj) if matches!(cx.heap.get(obj).kind, ObjectKind::RegExp(_)) => Ok(obj),
    _ => Err(EvalError::type_error(format!(
      "RegExp.prototype.{} called on incompatible receiver",
      method
    ))),
  }
}

// --- Instance id slots ---------------------------------------------------

/// The computed instance properties: `source`, `flags`, and the per-flag
/// booleans. All are PERMANENT|READONLY|DONTENUM. `lastIndex` is an ordinary
/// slot and is not handled here.
pub(crate) fn instance_get(
  cx: &mut Context,
  obj: JsObject,
  key: &PropertyKey,
) -> Result<Option<Value>, EvalError> {
  let Some(re) = regexp_data(cx, obj) else {
    return Ok(None);
  };
  let PropertyKey::String(name) = key else {
    return Ok(None);
  };
  let flags = re.flags;
  Ok(match &**name {
    "source" => Some(Value::String(JsString::from_code_units(re.source_units()))),
    "flags" => Some(Value::string(flags.canonical_string())),
    "global" => Some(Value::Bool(flags.has(RegExpFlags::GLOB))),
    "ignoreCase" => Some(Value::Bool(flags.has(RegExpFlags::FOLD))),
    "multiline" => Some(Value::Bool(flags.has(RegExpFlags::MULTILINE))),
    "dotAll" => Some(Value::Bool(flags.has(RegExpFlags::DOTALL))),
    "sticky" => Some(Value::Bool(flags.has(RegExpFlags::STICKY))),
    _ => None,
  })
}

/// Writes to the computed readonly instance properties are rejected like any
/// other readonly assignment: a type error in strict code, a silent no-op
/// otherwise.
pub(crate) fn instance_put(
  cx: &mut Context,
  obj: JsObject,
  key: &PropertyKey,
  _value: &Value,
  strict: bool,
) -> Result<bool, EvalError> {
  if regexp_data(cx, obj).is_none() {
    return Ok(false);
  }
  let PropertyKey::String(name) = key else {
    return Ok(false);
  };
  if !matches!(
    &**name,
    "source" | "flags" | "global" | "ignoreCase" | "multiline" | "dotAll" | "sticky"
  ) {
    return Ok(false);
  }
  if strict {
    return Err(EvalError::type_error(format!(
      "cannot assign to property \"{}\": readonly property",
      name
    )));
  }
  Ok(true)
}

pub(crate) fn instance_has(cx: &Context, obj: JsObject, key: &PropertyKey) -> bool {
  if !matches!(cx.heap.get(obj).kind, ObjectKind::RegExp(_)) {
    return false;
  }
  let PropertyKey::String(name) = key else {
    return false;
  };
  matches!(
    &**name,
    "source" | "flags" | "global" | "ignoreCase" | "multiline" | "dotAll" | "sticky"
  )
}

/// Update a RegExp's `lastIndex`, honoring its attribute bitmap: a readonly
/// `lastIndex` makes the update a type error.
fn set_last_index(cx: &mut Context, obj: JsObject, value: Value) -> Result<(), EvalError> {
  let key = PropertyKey::String("lastIndex".into());
  let attributes = cx
    .heap
    .get(obj)
    .get_own(&key)
    .map(|slot| slot.attributes)
    .unwrap_or(PERMANENT | DONTENUM);
  if attributes & READONLY != 0 {
    return Err(EvalError::type_error("lastIndex is read-only"));
  }
  cx.heap.get_mut(obj).define_value(key, value, attributes);
  Ok(())
}

/// `lastIndex` update through an arbitrary receiver (the dynamic protocols
/// operate on any object shape).
fn set_last_index_dynamic(cx: &mut Context, obj: JsObject, value: Value) -> Result<(), EvalError> {
  if matches!(cx.heap.get(obj).kind, ObjectKind::RegExp(_)) {
    return set_last_index(cx, obj, value);
  }
  cx.put_property(obj, &PropertyKey::String("lastIndex".into()), value, true)
}

// --- Execution -----------------------------------------------------------

/// `execSub`: the shared core of `exec`, `test`, `prefix`, and the symbol
/// protocols' builtin fast path.
fn exec_sub(
  cx: &mut Context,
  this_obj: JsObject,
  args: &[Value],
  match_type: MatchType,
) -> Result<Value, EvalError> {
  let subject = match args.first() {
    Some(v) => cx.to_string_value(v)?,
    None => cx
      .realm
      .as_ref()
      .and_then(|r| r.regexp_impl.input.clone())
      .unwrap_or_else(|| "undefined".into()),
  };

  let re = regexp_data(cx, this_obj).expect("exec_sub requires a RegExp receiver");
  let global_or_sticky =
    re.flags.has(RegExpFlags::GLOB) || re.flags.has(RegExpFlags::STICKY);

  let mut index = 0usize;
  if global_or_sticky {
    let last_index = cx.get_property_str(this_obj, "lastIndex")?;
    let d = to_integer(cx.to_number_value(&last_index)?);
    if d < 0.0 || d > subject.len_code_units() as f64 {
      set_last_index(cx, this_obj, Value::Number(0.0))?;
      return Ok(Value::Null);
    }
    index = d as usize;
  }

  let result = execute_regexp(cx, &re, &subject, &mut index, match_type)?;

  if global_or_sticky {
    if result.is_null_or_undefined() || matches!(result, Value::Bool(false)) {
      set_last_index(cx, this_obj, Value::Number(0.0))?;
    } else {
      set_last_index(cx, this_obj, Value::Number(index as f64))?;
    }
  }
  Ok(result)
}

/// Run the compiled program and materialize the match result, updating the
/// realm's legacy match state.
fn execute_regexp(
  cx: &mut Context,
  re: &Rc<RECompiled>,
  subject: &JsString,
  indexp: &mut usize,
  match_type: MatchType,
) -> Result<Value, EvalError> {
  let units = subject.as_code_units();
  let end = units.len();
  let start = (*indexp).min(end);
  let force_multiline = cx
    .realm
    .as_ref()
    .map(|r| r.regexp_impl.multiline)
    .unwrap_or(false);

  let found = re
    .find(units, start, &ExecOptions {
      force_multiline,
      ..ExecOptions::default()
    })
    .map_err(|err| EvalError::Ecma {
      kind: EcmaErrorKind::InternalError,
      message: err.to_string(),
      position: SourcePosition::default(),
    })?;

  let Some(found) = found else {
    return Ok(match match_type {
      MatchType::Prefix => Value::Undefined,
      _ => Value::Null,
    });
  };

  // STICKY requires the match to begin exactly at the given index; the
  // engine already enforces that by not scanning forward.
  let skipped = found.start - start;
  let ep = found.end;
  *indexp = ep;
  let matchlen = ep - (start + skipped);
  let match_index = found.start;

  let result = if match_type == MatchType::Test {
    // Testing for a match: no array allocation, just true.
    Value::Bool(true)
  } else {
    let matched = subject.substring(match_index, match_index + matchlen);
    let array = cx.new_array(vec![Value::String(matched)]);
    for (i, capture) in found.captures.iter().enumerate() {
      let value = match capture {
        Some((s, e)) => Value::String(subject.substring(*s, *e)),
        None => Value::Undefined,
      };
      cx.put_property(array, &PropertyKey::Index((i + 1) as u32), value, false)?;
    }
    // `index` and `input` are defined last so enumeration order puts the
    // numbered elements first.
    cx.put_property(
      array,
      &PropertyKey::String("index".into()),
      Value::Number((start + skipped) as f64),
      false,
    )?;
    cx.put_property(
      array,
      &PropertyKey::String("input".into()),
      Value::String(subject.clone()),
      false,
    )?;
    Value::Object(array)
  };

  // Legacy match state.
  let version_1_2 = cx.language_version() == LanguageVersion::V1_2;
  if let Some(realm) = cx.realm.as_mut() {
    let imp = &mut realm.regexp_impl;
    imp.input = Some(subject.clone());
    imp.parens = found
      .captures
      .iter()
      .map(|capture| capture.map(|(s, e)| SubString::new(subject, s, e - s)))
      .collect();
    imp.last_paren = imp.parens.iter().rev().flatten().next().cloned();
    imp.last_match = SubString::new(subject, match_index, matchlen);
    imp.left_context = if version_1_2 {
      // The 1.2 dialect defined the left context as the text skipped over
      // by this match only, not everything before it.
      SubString::new(subject, start, skipped)
    } else {
      SubString::new(subject, 0, start + skipped)
    };
    imp.right_context = SubString::new(subject, ep, end - ep);
  }
  update_ctor_statics(cx);

  Ok(result)
}

/// Push the legacy match state onto the constructor's `$1..$9` etc.
fn update_ctor_statics(cx: &mut Context) {
  let Some(realm) = cx.realm.as_ref() else {
    return;
  };
  let ctor = realm.regexp_ctor;
  let imp = &realm.regexp_impl;
  let mut updates: Vec<(String, Value)> = Vec::new();
  for i in 0..9usize {
    let value = imp
      .parens
      .get(i)
      .and_then(|p| p.as_ref())
      .map(|p| Value::String(p.to_js_string()))
      .unwrap_or_else(|| Value::string(""));
    updates.push((format!("${}", i + 1), value));
  }
  let last_match = Value::String(imp.last_match.to_js_string());
  let left = Value::String(imp.left_context.to_js_string());
  let right = Value::String(imp.right_context.to_js_string());
  let input = imp
    .input
    .clone()
    .map(Value::String)
    .unwrap_or_else(|| Value::string(""));
  updates.push(("lastMatch".into(), last_match.clone()));
  updates.push(("$&".into(), last_match));
  updates.push(("leftContext".into(), left.clone()));
  updates.push(("$`".into(), left));
  updates.push(("rightContext".into(), right.clone()));
  updates.push(("$'".into(), right));
  updates.push(("input".into(), input.clone()));
  updates.push(("$_".into(), input));
  for (name, value) in updates {
    cx.define_property(ctor, PropertyKey::from_str(&name), value, DONTENUM);
  }
}

// --- Prototype dispatch --------------------------------------------------

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_COMPILE => {
      let obj = real_this(cx, &this, "compile")?;
      let re = compile_from_args(cx, args)?;
      match &mut cx.heap.get_mut(obj).kind {
        ObjectKind::RegExp(data) => data.re = re,
        _ => unreachable!(),
      }
      set_last_index(cx, obj, Value::Number(0.0))?;
      Ok(Value::Object(obj))
    }
    ID_TO_STRING | ID_TO_SOURCE => {
      // Observed contract: a plain-object receiver is formatted from its
      // own `source`/`flags` properties, substituting "undefined".
      if let Some(obj) = this.as_object() {
        if !matches!(cx.heap.get(obj).kind, ObjectKind::RegExp(_)) {
          let source = cx.get_property_str(obj, "source")?;
          let source = if source.is_undefined() {
            "undefined".to_string()
          } else {
            cx.to_string_value(&source)?.to_utf8_lossy()
          };
          let flags = cx.get_property_str(obj, "flags")?;
          let flags = if flags.is_undefined() {
            "undefined".to_string()
          } else {
            cx.to_string_value(&flags)?.to_utf8_lossy()
          };
          return Ok(Value::string(format!("/{}/{}", source, flags)));
        }
      }
      let obj = real_this(cx, &this, "toString")?;
      let re = regexp_data(cx, obj).unwrap();
      let source = if re.source_units().is_empty() {
        "(?:)".to_string()
      } else {
        JsString::from_code_units(re.source_units()).to_utf8_lossy()
      };
      Ok(Value::string(format!(
        "/{}/{}",
        source,
        re.flags.canonical_string()
      )))
    }
    ID_EXEC => {
      let obj = real_this(cx, &this, "exec")?;
      exec_sub(cx, obj, args, MatchType::Match)
    }
    ID_TEST => {
      let obj = real_this(cx, &this, "test")?;
      let result = exec_sub(cx, obj, args, MatchType::Test)?;
      Ok(Value::Bool(matches!(result, Value::Bool(true))))
    }
    ID_PREFIX => {
      let obj = real_this(cx, &this, "prefix")?;
      exec_sub(cx, obj, args, MatchType::Prefix)
    }
    SYMBOL_ID_MATCH => js_symbol_match(cx, this, args),
    SYMBOL_ID_MATCH_ALL => js_symbol_match_all(cx, this, args),
    SYMBOL_ID_SEARCH => {
      let obj = real_this(cx, &this, "[Symbol.search]")?;
      let result = exec_sub(cx, obj, args, MatchType::Match)?;
      match result {
        Value::Object(array) => cx.get_property_str(array, "index"),
        _ => Ok(Value::Number(-1.0)),
      }
    }
    _ => Err(EvalError::type_error("unknown RegExp method id")),
  }
}

/// The dynamic `exec` protocol: honor a script-replaced `exec` method,
/// falling back to the builtin behavior.
pub(crate) fn regexp_exec(
  cx: &mut Context,
  regexp: JsObject,
  subject: &JsString,
) -> Result<Value, EvalError> {
  let method = cx.get_property_str(regexp, "exec")?;
  if cx.is_callable(&method) {
    let result = cx.call_function(
      method,
      Value::Object(regexp),
      &[Value::String(subject.clone())],
    )?;
    if !matches!(result, Value::Null | Value::Object(_)) {
      return Err(EvalError::type_error(
        "exec method returned something other than an object or null",
      ));
    }
    return Ok(result);
  }
  let obj = real_this(cx, &Value::Object(regexp), "exec")?;
  exec_sub(cx, obj, &[Value::String(subject.clone())], MatchType::Match)
}

/// `RegExp.prototype[Symbol.match]`.
fn js_symbol_match(cx: &mut Context, this: Value, args: &[Value]) -> Result<Value, EvalError> {
  let Some(this_obj) = this.as_object() else {
    return Err(EvalError::type_error(
      "RegExp.prototype[Symbol.match] called on non-object",
    ));
  };

  let subject = match args.first() {
    Some(v) => cx.to_string_value(v)?,
    None => "undefined".into(),
  };
  let flags_value = cx.get_property_str(this_obj, "flags")?;
  let flags = cx.to_string_value(&flags_value)?.to_utf8_lossy();
  let full_unicode = flags.contains('u') || flags.contains('v');

  if !flags.contains('g') {
    return regexp_exec(cx, this_obj, &subject);
  }

  set_last_index_dynamic(cx, this_obj, Value::Number(0.0))?;
  let result = cx.new_array(Vec::new());
  let mut count = 0u32;
  loop {
    let matched = regexp_exec(cx, this_obj, &subject)?;
    let Value::Object(matched) = matched else {
      return Ok(if count == 0 {
        Value::Null
      } else {
        Value::Object(result)
      });
    };

    let first = cx.get_property(matched, &PropertyKey::Index(0))?;
    let match_str = cx.to_string_value(&first)?;
    cx.put_property(
      result,
      &PropertyKey::Index(count),
      Value::String(match_str.clone()),
      false,
    )?;
    count += 1;

    if match_str.is_empty() {
      let this_index = cx.get_property_str(this_obj, "lastIndex")?;
      let this_index = to_length(cx.to_number_value(&this_index)?) as usize;
      let next_index = advance_string_index(subject.as_code_units(), this_index, full_unicode);
      set_last_index_dynamic(cx, this_obj, Value::Number(next_index as f64))?;
    }
  }
}

/// `RegExp.prototype[Symbol.matchAll]`: build a species-constructed matcher
/// and return a lazy iterator over its matches.
fn js_symbol_match_all(cx: &mut Context, this: Value, args: &[Value]) -> Result<Value, EvalError> {
  let Some(this_obj) = this.as_object() else {
    return Err(EvalError::type_error(
      "RegExp.prototype[Symbol.matchAll] called on non-object",
    ));
  };

  let subject = match args.first() {
    Some(v) => cx.to_string_value(v)?,
    None => "undefined".into(),
  };

  let default_ctor = cx
    .realm
    .as_ref()
    .map(|r| r.regexp_ctor)
    .expect("realm must be initialized");
  let species = cx.species_constructor(this_obj, default_ctor)?;

  let flags_value = cx.get_property_str(this_obj, "flags")?;
  let flags = cx.to_string_value(&flags_value)?.to_utf8_lossy();

  let matcher = cx.construct(
    Value::Object(species),
    &[Value::Object(this_obj), Value::string(flags.clone())],
  )?;
  let Value::Object(matcher) = matcher else {
    return Err(EvalError::type_error("species constructor returned a non-object"));
  };

  let last_index = cx.get_property_str(this_obj, "lastIndex")?;
  let last_index = to_length(cx.to_number_value(&last_index)?);
  set_last_index_dynamic(cx, matcher, Value::Number(last_index as f64))?;

  let global = flags.contains('g');
  let full_unicode = flags.contains('u') || flags.contains('v');
  Ok(Value::Object(regexp_iterator::new_iterator(
    cx,
    matcher,
    subject,
    global,
    full_unicode,
  )))
}
