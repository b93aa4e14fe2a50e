use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::string::JsString;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const CTOR_FOR: u16 = 100;
const CTOR_KEY_FOR: u16 = 101;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let prototype = cx
    .realm
    .as_ref()
    .map(|r| r.symbol_prototype)
    .expect("realm must be initialized");
  define_method(cx, prototype, BuiltinTag::Symbol, ID_TO_STRING, "toString", 0);

  let ctor = cx.new_native_function("Symbol", 0, ctor_symbol, false);
  define_method(cx, ctor, BuiltinTag::Symbol, CTOR_FOR, "for", 1);
  define_method(cx, ctor, BuiltinTag::Symbol, CTOR_KEY_FOR, "keyFor", 1);

  // The well-known symbols are data properties on the constructor.
  let frozen = PERMANENT | READONLY | DONTENUM;
  let symbols = cx.realm.as_ref().expect("realm must be initialized").symbols;
  for (name, id) in [
    ("match", symbols.match_),
    ("matchAll", symbols.match_all),
    ("search", symbols.search),
    ("species", symbols.species),
    ("iterator", symbols.iterator),
  ] {
    cx.define_property(ctor, PropertyKey::from_str(name), Value::Symbol(id), frozen);
  }

  install_ctor(cx, scope, "Symbol", ctor, prototype);
  ctor
}

fn ctor_symbol(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  construct: bool,
) -> Result<Value, EvalError> {
  if construct {
    return Err(EvalError::type_error("Symbol is not a constructor"));
  }
  let description = match args.first() {
    Some(v) if !v.is_undefined() => Some(cx.to_string_value(v)?),
    _ => None,
  };
  Ok(Value::Symbol(cx.heap.alloc_symbol(description)))
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_TO_STRING => {
      let symbol = match &this {
        Value::Symbol(id) => *id,
        Value::Object(obj) => match cx.heap.get(*obj).kind {
          ObjectKind::Symbol(id) => id,
          _ => {
            return Err(EvalError::type_error(
              "Symbol.prototype.toString called on incompatible receiver",
            ))
          }
        },
        _ => {
          return Err(EvalError::type_error(
            "Symbol.prototype.toString called on incompatible receiver",
          ))
        }
      };
      let description = cx
        .heap
        .symbol(symbol)
        .description
        .clone()
        .unwrap_or_else(JsString::empty);
      Ok(Value::string(format!("Symbol({})", description.to_utf8_lossy())))
    }
    CTOR_FOR => {
      let key = match args.first() {
        Some(v) => cx.to_string_value(v)?,
        None => "undefined".into(),
      };
      if let Some(realm) = cx.realm.as_ref() {
        if let Some((_, id)) = realm.symbol_registry.iter().find(|(k, _)| *k == key) {
          return Ok(Value::Symbol(*id));
        }
      }
      let id = cx.heap.alloc_symbol(Some(key.clone()));
      if let Some(realm) = cx.realm.as_mut() {
        realm.symbol_registry.push((key, id));
      }
      Ok(Value::Symbol(id))
    }
    CTOR_KEY_FOR => {
      let Some(Value::Symbol(id)) = args.first() else {
        return Err(EvalError::type_error("Symbol.keyFor expects a symbol"));
      };
      let key = cx
        .realm
        .as_ref()
        .and_then(|realm| realm.symbol_registry.iter().find(|(_, i)| i == id))
        .map(|(k, _)| Value::String(k.clone()));
      Ok(key.unwrap_or(Value::Undefined))
    }
    _ => Err(EvalError::type_error("unknown Symbol method id")),
  }
}
