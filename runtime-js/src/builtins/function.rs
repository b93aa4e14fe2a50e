use super::define_method;
use super::install_ctor;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::value::Value;

const ID_TO_STRING: u16 = 1;
const ID_CALL: u16 = 2;
const ID_APPLY: u16 = 3;

/// The call behavior of `Function.prototype` itself: accepts any arguments
/// and returns undefined.
pub(crate) fn prototype_noop(
  _cx: &mut Context,
  _this: Value,
  _args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  Ok(Value::Undefined)
}

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let prototype = cx
    .realm
    .as_ref()
    .map(|r| r.function_prototype)
    .expect("realm must be initialized");
  define_method(cx, prototype, BuiltinTag::Function, ID_TO_STRING, "toString", 0);
  define_method(cx, prototype, BuiltinTag::Function, ID_CALL, "call", 1);
  define_method(cx, prototype, BuiltinTag::Function, ID_APPLY, "apply", 2);

  let ctor = cx.new_native_function("Function", 1, ctor_function, true);
  install_ctor(cx, scope, "Function", ctor, prototype);
  ctor
}

/// `new Function(p1, ..., pn, body)`: assemble a definition and compile it
/// against the global scope.
fn ctor_function(
  cx: &mut Context,
  _this: Value,
  args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  let mut params = Vec::new();
  let mut body = String::new();
  for (i, arg) in args.iter().enumerate() {
    let text = cx.to_string_value(arg)?.to_utf8_lossy();
    if i + 1 == args.len() {
      body = text;
    } else {
      params.push(text);
    }
  }
  let source = format!("function anonymous({}) {{\n{}\n}}", params.join(", "), body);
  let Some(global) = cx.global_object() else {
    return Err(EvalError::evaluator("no global scope is initialized"));
  };
  let func = cx.compile_function(global, &source, "anonymous", 1, None)?;
  Ok(Value::Object(func))
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match id {
    ID_TO_STRING => {
      let Some(obj) = this.as_object() else {
        return Err(EvalError::type_error("Function.prototype.toString called on non-function"));
      };
      Ok(Value::string(cx.function_source(obj)))
    }
    ID_CALL => {
      let call_this = args.first().cloned().unwrap_or(Value::Undefined);
      let rest = if args.is_empty() { &[] } else { &args[1..] };
      cx.call_function(this, call_this, rest)
    }
    ID_APPLY => {
      let call_this = args.first().cloned().unwrap_or(Value::Undefined);
      let call_args = match args.get(1) {
        None | Some(Value::Undefined) | Some(Value::Null) => Vec::new(),
        Some(Value::Object(array)) => {
          let length = cx.get_property_str(*array, "length")?;
          let length = cx.to_number_value(&length)? as usize;
          let mut out = Vec::with_capacity(length);
          for i in 0..length {
            out.push(cx.get_property(*array, &crate::object::PropertyKey::Index(i as u32))?);
          }
          out
        }
        _ => {
          return Err(EvalError::type_error(
            "second argument to Function.prototype.apply must be an array",
          ))
        }
      };
      cx.call_function(this, call_this, &call_args)
    }
    _ => Err(EvalError::type_error("unknown Function method id")),
  }
}
