use super::define_method;
use crate::context::Context;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::object::PropertyKey;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::value::Value;

const ID_ABS: u16 = 1;
const ID_CEIL: u16 = 2;
const ID_FLOOR: u16 = 3;
const ID_MAX: u16 = 4;
const ID_MIN: u16 = 5;
const ID_POW: u16 = 6;
const ID_ROUND: u16 = 7;
const ID_SQRT: u16 = 8;

pub(crate) fn init(cx: &mut Context, scope: JsObject) -> JsObject {
  let math = cx.new_object();
  let frozen = PERMANENT | READONLY | DONTENUM;
  for (name, value) in [
    ("E", std::f64::consts::E),
    ("LN10", std::f64::consts::LN_10),
    ("LN2", std::f64::consts::LN_2),
    ("PI", std::f64::consts::PI),
    ("SQRT2", std::f64::consts::SQRT_2),
  ] {
    cx.define_property(math, PropertyKey::from_str(name), Value::Number(value), frozen);
  }
  define_method(cx, math, BuiltinTag::Math, ID_ABS, "abs", 1);
  define_method(cx, math, BuiltinTag::Math, ID_CEIL, "ceil", 1);
  define_method(cx, math, BuiltinTag::Math, ID_FLOOR, "floor", 1);
  define_method(cx, math, BuiltinTag::Math, ID_MAX, "max", 2);
  define_method(cx, math, BuiltinTag::Math, ID_MIN, "min", 2);
  define_method(cx, math, BuiltinTag::Math, ID_POW, "pow", 2);
  define_method(cx, math, BuiltinTag::Math, ID_ROUND, "round", 1);
  define_method(cx, math, BuiltinTag::Math, ID_SQRT, "sqrt", 1);
  cx.define_property(scope, PropertyKey::String("Math".into()), Value::Object(math), DONTENUM);
  math
}

pub(crate) fn exec_id_call(
  cx: &mut Context,
  id: u16,
  _this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  let arg = |cx: &mut Context, i: usize| -> Result<f64, EvalError> {
    match args.get(i) {
      Some(v) => cx.to_number_value(v),
      None => Ok(f64::NAN),
    }
  };
  let result = match id {
    ID_ABS => arg(cx, 0)?.abs(),
    ID_CEIL => arg(cx, 0)?.ceil(),
    ID_FLOOR => arg(cx, 0)?.floor(),
    ID_MAX => {
      let mut best = f64::NEG_INFINITY;
      for v in args {
        let n = cx.to_number_value(v)?;
        if n.is_nan() {
          best = f64::NAN;
          break;
        }
        best = best.max(n);
      }
      best
    }
    ID_MIN => {
      let mut best = f64::INFINITY;
      for v in args {
        let n = cx.to_number_value(v)?;
        if n.is_nan() {
          best = f64::NAN;
          break;
        }
        best = best.min(n);
      }
      best
    }
    ID_POW => arg(cx, 0)?.powf(arg(cx, 1)?),
    ID_ROUND => {
      // ECMAScript rounds halves towards +Infinity.
      let n = arg(cx, 0)?;
      (n + 0.5).floor()
    }
    ID_SQRT => arg(cx, 0)?.sqrt(),
    _ => return Err(EvalError::type_error("unknown Math method id")),
  };
  Ok(Value::Number(result))
}
