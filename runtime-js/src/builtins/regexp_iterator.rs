use super::define_symbol_method;
use super::regexp;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::string::JsString;
use crate::value::to_length;
use crate::value::Value;
use regexp_js::advance_string_index;

const ID_NEXT: u16 = 1;
const SYMBOL_ID_ITERATOR: u16 = 2;

/// State of one `matchAll` iterator: the species-constructed matcher, the
/// subject, and the termination/advance mode derived from the flags.
pub struct RegExpIteratorData {
  pub matcher: JsObject,
  pub subject: JsString,
  pub global: bool,
  pub full_unicode: bool,
  pub done: bool,
}

pub(crate) fn init(cx: &mut Context, _scope: JsObject) {
  let realm = cx.realm.as_ref().expect("realm must be initialized");
  let prototype = realm.regexp_iterator_prototype;
  let iterator_symbol = realm.symbols.iterator;
  super::define_method(
    cx,
    prototype,
    BuiltinTag::RegExpStringIterator,
    ID_NEXT,
    "next",
    0,
  );
  define_symbol_method(
    cx,
    prototype,
    BuiltinTag::RegExpStringIterator,
    SYMBOL_ID_ITERATOR,
    iterator_symbol,
    "[Symbol.iterator]",
    0,
  );
}

pub(crate) fn new_iterator(
  cx: &mut Context,
  matcher: JsObject,
  subject: JsString,
  global: bool,
  full_unicode: bool,
) -> JsObject {
  let proto = cx.realm.as_ref().map(|r| r.regexp_iterator_prototype);
  cx.heap.alloc(ScriptObject::new(
    ObjectKind::RegExpStringIterator(RegExpIteratorData {
      matcher,
      subject,
      global,
      full_unicode,
      done: false,
    }),
    proto,
  ))
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  _args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    SYMBOL_ID_ITERATOR => Ok(this),
    ID_NEXT => next(cx, this),
    _ => Err(EvalError::type_error("unknown RegExp String Iterator method id")),
  }
}

fn next(cx: &mut Context, this: Value) -> Result<Value, EvalError> {
  let Some(obj) = this.as_object() else {
    return Err(EvalError::type_error(
      "%RegExpStringIteratorPrototype%.next called on non-object",
    ));
  };
  let (matcher, subject, global, full_unicode, done) = match &cx.heap.get(obj).kind {
    ObjectKind::RegExpStringIterator(data) => (
      data.matcher,
      data.subject.clone(),
      data.global,
      data.full_unicode,
      data.done,
    ),
    _ => {
      return Err(EvalError::type_error(
        "%RegExpStringIteratorPrototype%.next called on incompatible receiver",
      ))
    }
  };

  if done {
    return iter_result(cx, Value::Undefined, true);
  }

  let matched = regexp::regexp_exec(cx, matcher, &subject)?;
  let Value::Object(matched) = matched else {
    mark_done(cx, obj);
    return iter_result(cx, Value::Undefined, true);
  };

  if !global {
    mark_done(cx, obj);
    return iter_result(cx, Value::Object(matched), false);
  }

  // An empty overall match must advance lastIndex past the current position
  // (surrogate-aware in full-unicode mode) or the iterator would never
  // terminate.
  let first = cx.get_property(matched, &PropertyKey::Index(0))?;
  let match_str = cx.to_string_value(&first)?;
  if match_str.is_empty() {
    let this_index = cx.get_property_str(matcher, "lastIndex")?;
    let this_index = to_length(cx.to_number_value(&this_index)?) as usize;
    let next_index = advance_string_index(subject.as_code_units(), this_index, full_unicode);
    cx.put_property(
      matcher,
      &PropertyKey::String("lastIndex".into()),
      Value::Number(next_index as f64),
      true,
    )?;
  }
  iter_result(cx, Value::Object(matched), false)
}

fn mark_done(cx: &mut Context, iterator: JsObject) {
  if let ObjectKind::RegExpStringIterator(data) = &mut cx.heap.get_mut(iterator).kind {
    data.done = true;
  }
}

fn iter_result(cx: &mut Context, value: Value, done: bool) -> Result<Value, EvalError> {
  let result = cx.new_object();
  cx.define_property(result, PropertyKey::String("value".into()), value, 0);
  cx.define_property(
    result,
    PropertyKey::String("done".into()),
    Value::Bool(done),
    0,
  );
  Ok(Value::Object(result))
}
