use crate::builtins;
use crate::context::Context;
use crate::context::Feature;
use crate::error::EcmaErrorKind;
use crate::error::EvalError;
use crate::function::FunctionData;
use crate::heap::JsObject;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::PropertyValue;
use crate::object::ScriptObject;
use crate::object::DONTENUM;
use crate::object::EMPTY;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::string::JsString;
use crate::value::number_to_string;
use crate::value::string_to_number;
use crate::value::to_uint32;
use crate::value::Value;
use std::rc::Rc;

impl Context {
  // --- Object creation ---------------------------------------------------

  pub fn object_prototype(&self) -> Option<JsObject> {
    self.realm.as_ref().map(|r| r.object_prototype)
  }

  pub fn new_object(&mut self) -> JsObject {
    let proto = self.object_prototype();
    self.heap.alloc(ScriptObject::standard(proto))
  }

  pub fn new_array(&mut self, elements: Vec<Value>) -> JsObject {
    let proto = self.realm.as_ref().map(|r| r.array_prototype);
    let mut obj = ScriptObject::new(ObjectKind::Array, proto);
    obj.define_value(
      PropertyKey::String("length".into()),
      Value::Number(elements.len() as f64),
      DONTENUM | PERMANENT,
    );
    for (i, element) in elements.into_iter().enumerate() {
      obj.define_value(PropertyKey::Index(i as u32), element, EMPTY);
    }
    self.heap.alloc(obj)
  }

  pub fn new_native_function(
    &mut self,
    name: &str,
    arity: u16,
    func: crate::function::NativeFn,
    constructable: bool,
  ) -> JsObject {
    let proto = self.realm.as_ref().map(|r| r.function_prototype);
    let obj = ScriptObject::new(
      ObjectKind::Function(FunctionData::Native {
        name: name.into(),
        arity,
        func,
        constructable,
      }),
      proto,
    );
    self.heap.alloc(obj)
  }

  pub fn new_error_object(&mut self, kind: EcmaErrorKind, message: &str) -> JsObject {
    let proto = self.realm.as_ref().map(|r| r.error_prototype(kind));
    let mut obj = ScriptObject::new(ObjectKind::Error, proto);
    obj.define_value(
      PropertyKey::String("message".into()),
      Value::string(message),
      DONTENUM,
    );
    self.heap.alloc(obj)
  }

  /// Convert an engine error into the value script `catch` observes.
  pub fn error_to_value(&mut self, error: &EvalError) -> Value {
    match error {
      EvalError::Thrown { value, .. } => value.clone(),
      EvalError::Ecma { kind, message, .. } => {
        Value::Object(self.new_error_object(*kind, message))
      }
      EvalError::Evaluator { message, .. } | EvalError::Wrapped { message } => {
        Value::Object(self.new_error_object(EcmaErrorKind::Error, message))
      }
      EvalError::ContinuationPending(_) => Value::Undefined,
    }
  }

  /// Adapt an error crossing an engine boundary: engine errors pass through,
  /// everything else becomes a wrapped evaluator-visible error.
  pub fn adapt_host_error(&mut self, message: impl Into<String>) -> EvalError {
    EvalError::Wrapped {
      message: message.into(),
    }
  }

  // --- Property access ---------------------------------------------------

  /// `Get`: walk the prototype chain; builtin instance-id slots come first.
  pub fn get_property(&mut self, obj: JsObject, key: &PropertyKey) -> Result<Value, EvalError> {
    if let Some(value) = self.kind_instance_get(obj, key)? {
      return Ok(value);
    }
    let mut cursor = Some(obj);
    while let Some(current) = cursor {
      if current != obj {
        if let Some(value) = self.kind_instance_get(current, key)? {
          return Ok(value);
        }
      }
      match self.heap.get(current).get_own(key) {
        Some(slot) => match slot.value.clone() {
          PropertyValue::Data(value) => return Ok(value),
          PropertyValue::Accessor { getter, .. } => {
            return match getter {
              Some(getter) => {
                self.call_function(Value::Object(getter), Value::Object(obj), &[])
              }
              None => Ok(Value::Undefined),
            };
          }
        },
        None => cursor = self.heap.get(current).prototype,
      }
    }
    Ok(Value::Undefined)
  }

  pub fn get_property_str(&mut self, obj: JsObject, name: &str) -> Result<Value, EvalError> {
    self.get_property(obj, &PropertyKey::from_str(name))
  }

  /// Builtin-computed instance slots (a switch over the object kind).
  fn kind_instance_get(
    &mut self,
    obj: JsObject,
    key: &PropertyKey,
  ) -> Result<Option<Value>, EvalError> {
    match &self.heap.get(obj).kind {
      ObjectKind::RegExp(_) => builtins::regexp::instance_get(self, obj, key),
      ObjectKind::StringWrapper(s) => {
        let s = s.clone();
        match key {
          PropertyKey::String(name) if &**name == "length" => {
            Ok(Some(Value::Number(s.len_code_units() as f64)))
          }
          PropertyKey::Index(i) => {
            let units = s.as_code_units();
            Ok(
              units
                .get(*i as usize)
                .map(|unit| Value::String(JsString::from_code_units(&[*unit]))),
            )
          }
          _ => Ok(None),
        }
      }
      ObjectKind::Function(data) => match key {
        PropertyKey::String(name) if &**name == "length" => {
          Ok(Some(Value::Number(data.arity() as f64)))
        }
        PropertyKey::String(name) if &**name == "name" => {
          Ok(Some(Value::string(data.name())))
        }
        _ => Ok(None),
      },
      _ => Ok(None),
    }
  }

  /// `Put`: honors readonly/sealed/setters; `strict` selects between a
  /// type error and a silent ignore on readonly violations.
  pub fn put_property(
    &mut self,
    obj: JsObject,
    key: &PropertyKey,
    value: Value,
    strict: bool,
  ) -> Result<(), EvalError> {
    if builtins::regexp::instance_put(self, obj, key, &value, strict)? {
      return Ok(());
    }

    // Find the governing slot along the chain.
    let mut cursor = Some(obj);
    while let Some(current) = cursor {
      let object = self.heap.get(current);
      if let Some(slot) = object.get_own(key) {
        match slot.value.clone() {
          PropertyValue::Accessor { setter, .. } => {
            return match setter {
              Some(setter) => self
                .call_function(Value::Object(setter), Value::Object(obj), &[value])
                .map(|_| ()),
              None => reject_put(strict, key, "setter is not defined"),
            };
          }
          PropertyValue::Data(_) => {
            if slot.attributes & READONLY != 0 {
              return reject_put(strict, key, "readonly property");
            }
            if current == obj {
              if self.heap.get(obj).sealed {
                return reject_put(strict, key, "object is sealed");
              }
              let attributes = slot.attributes;
              let value = self.array_length_written(obj, key, value)?;
              self
                .heap
                .get_mut(obj)
                .define(key.clone(), PropertyValue::Data(value), attributes);
              return Ok(());
            }
            // Writable inherited data property: shadow on the receiver.
            break;
          }
        }
      }
      cursor = object.prototype;
    }

    if self.heap.get(obj).sealed {
      return reject_put(strict, key, "object is sealed");
    }
    self
      .heap
      .get_mut(obj)
      .define(key.clone(), PropertyValue::Data(value), EMPTY);
    self.array_index_written(obj, key);
    Ok(())
  }

  /// Writing an array's `length` is bidirectional: shrinking deletes every
  /// own index property at or above the new length, and the stored value is
  /// the normalized length. Non-array receivers and other keys pass through.
  fn array_length_written(
    &mut self,
    obj: JsObject,
    key: &PropertyKey,
    value: Value,
  ) -> Result<Value, EvalError> {
    let PropertyKey::String(name) = key else {
      return Ok(value);
    };
    if &**name != "length" || !matches!(self.heap.get(obj).kind, ObjectKind::Array) {
      return Ok(value);
    }
    let n = self.to_number_value(&value)?;
    let new_length = to_uint32(n);
    if new_length as f64 != n {
      return Err(EvalError::range_error("invalid array length"));
    }
    let doomed: Vec<PropertyKey> = self
      .heap
      .get(obj)
      .own_string_keys(true)
      .into_iter()
      .filter(|key| matches!(key, PropertyKey::Index(i) if *i >= new_length))
      .collect();
    for key in doomed {
      self.heap.get_mut(obj).delete_own(&key);
    }
    Ok(Value::Number(new_length as f64))
  }

  /// Keep an array's `length` in sync after an index write.
  fn array_index_written(&mut self, obj: JsObject, key: &PropertyKey) {
    let PropertyKey::Index(i) = key else {
      return;
    };
    if !matches!(self.heap.get(obj).kind, ObjectKind::Array) {
      return;
    }
    let length_key = PropertyKey::String("length".into());
    let current = match self.heap.get(obj).get_own(&length_key) {
      Some(slot) => match &slot.value {
        PropertyValue::Data(Value::Number(n)) => *n as u32,
        _ => 0,
      },
      None => 0,
    };
    if *i >= current {
      let object = self.heap.get_mut(obj);
      if let Some(slot) = object.get_own_mut(&length_key) {
        slot.value = PropertyValue::Data(Value::Number((*i + 1) as f64));
      }
    }
  }

  /// Host-level raw define: no readonly checks, used by builtin
  /// initialization and host embeddings.
  pub fn define_property(&mut self, obj: JsObject, key: PropertyKey, value: Value, attributes: u8) {
    self.heap.get_mut(obj).define_value(key, value, attributes);
  }

  pub fn define_accessor(
    &mut self,
    obj: JsObject,
    key: PropertyKey,
    getter: Option<JsObject>,
    setter: Option<JsObject>,
    attributes: u8,
  ) {
    self
      .heap
      .get_mut(obj)
      .define(key, PropertyValue::Accessor { getter, setter }, attributes);
  }

  /// Host-level attribute update (e.g. making `lastIndex` readonly).
  pub fn set_property_attributes(
    &mut self,
    obj: JsObject,
    key: &PropertyKey,
    attributes: u8,
  ) -> Result<(), EvalError> {
    match self.heap.get_mut(obj).get_own_mut(key) {
      Some(slot) => {
        slot.attributes = attributes;
        Ok(())
      }
      None => Err(EvalError::type_error(format!(
        "no such property: {}",
        key.as_display_string()
      ))),
    }
  }

  pub fn delete_property(&mut self, obj: JsObject, key: &PropertyKey) -> bool {
    self.heap.get_mut(obj).delete_own(key)
  }

  pub fn has_property(&self, obj: JsObject, key: &PropertyKey) -> bool {
    if builtins::regexp::instance_has(self, obj, key) {
      return true;
    }
    let mut cursor = Some(obj);
    while let Some(current) = cursor {
      let object = self.heap.get(current);
      if object.get_own(key).is_some() {
        return true;
      }
      cursor = object.prototype;
    }
    false
  }

  /// Own string-keyed property names in the ES6 key order. Fails with a
  /// type error for null/undefined/primitive receivers.
  pub fn get_own_property_names(&mut self, target: &Value) -> Result<Vec<JsString>, EvalError> {
    let Value::Object(obj) = target else {
      return Err(EvalError::type_error(
        "Object.getOwnPropertyNames called on non-object",
      ));
    };
    let ids_first = self.has_feature(Feature::EnumerateIdsFirst);
    let keys = self.heap.get(*obj).own_string_keys(ids_first);
    Ok(
      keys
        .into_iter()
        .map(|key| match key {
          PropertyKey::Index(i) => JsString::from_str(&i.to_string()),
          PropertyKey::String(s) => JsString::from_str(&s),
          PropertyKey::Symbol(_) => unreachable!("own_string_keys excludes symbols"),
        })
        .collect(),
    )
  }

  /// Keys for `for..in`: enumerable string keys of the object and its
  /// prototype chain, deduplicated, in the ES6 key order per object.
  pub fn enum_keys(&mut self, obj: JsObject) -> Vec<JsString> {
    let ids_first = self.has_feature(Feature::EnumerateIdsFirst);
    let mut seen = Vec::<String>::new();
    let mut out = Vec::new();
    let mut cursor = Some(obj);
    while let Some(current) = cursor {
      let object = self.heap.get(current);
      for key in object.own_string_keys(ids_first) {
        let enumerable = object
          .get_own(&key)
          .map(|slot| slot.attributes & DONTENUM == 0)
          .unwrap_or(false);
        let name = match key {
          PropertyKey::Index(i) => i.to_string(),
          PropertyKey::String(s) => s.to_string(),
          PropertyKey::Symbol(_) => continue,
        };
        if seen.contains(&name) {
          continue;
        }
        seen.push(name.clone());
        if enumerable {
          out.push(JsString::from_str(&name));
        }
      }
      cursor = object.prototype;
    }
    out
  }

  /// Seal a script object (no further additions/deletions/modifications).
  pub fn seal_object(&mut self, obj: JsObject) {
    self.heap.get_mut(obj).seal();
  }

  // --- Scope chain -------------------------------------------------------

  /// Resolve a free name along the scope chain (each scope consulted through
  /// its prototype chain as well). Returns the value and the scope object
  /// that held it.
  pub fn name_lookup(
    &mut self,
    scope: JsObject,
    name: &str,
  ) -> Result<Option<(Value, JsObject)>, EvalError> {
    let key = PropertyKey::from_str(name);
    let mut cursor = Some(scope);
    while let Some(current) = cursor {
      let effective = self.effective_scope_target(current);
      if self.has_property(effective, &key) {
        let value = self.get_property(effective, &key)?;
        return Ok(Some((value, effective)));
      }
      cursor = self.heap.get(current).parent_scope;
    }
    Ok(None)
  }

  /// `with` scopes delegate to their target object.
  fn effective_scope_target(&self, scope: JsObject) -> JsObject {
    match self.heap.get(scope).kind {
      ObjectKind::With { target } => target,
      _ => scope,
    }
  }

  /// Assign a free name: the nearest scope that knows the name wins;
  /// otherwise the assignment creates a global, unless strict variable
  /// semantics forbid it.
  pub fn name_set(
    &mut self,
    scope: JsObject,
    name: &str,
    value: Value,
    strict: bool,
  ) -> Result<(), EvalError> {
    let key = PropertyKey::from_str(name);
    let mut cursor = Some(scope);
    let mut last = scope;
    while let Some(current) = cursor {
      let effective = self.effective_scope_target(current);
      if self.has_property(effective, &key) {
        return self.put_property(effective, &key, value, strict);
      }
      last = effective;
      cursor = self.heap.get(current).parent_scope;
    }
    if strict || self.has_feature(Feature::StrictVars) {
      return Err(EvalError::reference_error(format!(
        "assignment to undeclared variable \"{}\"",
        name
      )));
    }
    self.put_property(last, &key, value, false)
  }

  /// Initialize a declared binding in its declaring scope directly.
  pub fn bind_name(&mut self, scope: JsObject, name: &str, value: Value) -> Result<(), EvalError> {
    let key = PropertyKey::from_str(name);
    self.put_property(scope, &key, value, false)
  }

  pub fn name_delete(&mut self, scope: JsObject, name: &str) -> bool {
    let key = PropertyKey::from_str(name);
    let mut cursor = Some(scope);
    while let Some(current) = cursor {
      let effective = self.effective_scope_target(current);
      if self.heap.get(effective).get_own(&key).is_some() {
        return self.delete_property(effective, &key);
      }
      if self.has_property(effective, &key) {
        // Found on a prototype: delete targets the own property only.
        return true;
      }
      cursor = self.heap.get(current).parent_scope;
    }
    true
  }

  /// Property read with a primitive-aware receiver (`"abc".length`, method
  /// lookup through the wrapper prototypes).
  pub fn get_member(&mut self, base: &Value, key: &PropertyKey) -> Result<Value, EvalError> {
    match base {
      Value::Object(obj) => self.get_property(*obj, key),
      Value::String(s) => {
        match key {
          PropertyKey::String(name) if &**name == "length" => {
            return Ok(Value::Number(s.len_code_units() as f64));
          }
          PropertyKey::Index(i) => {
            return Ok(match s.as_code_units().get(*i as usize) {
              Some(unit) => Value::String(JsString::from_code_units(&[*unit])),
              None => Value::Undefined,
            });
          }
          _ => {}
        }
        match self.realm.as_ref().map(|r| r.string_prototype) {
          Some(proto) => self.get_property(proto, key),
          None => Ok(Value::Undefined),
        }
      }
      Value::Number(_) => match self.realm.as_ref().map(|r| r.number_prototype) {
        Some(proto) => self.get_property(proto, key),
        None => Ok(Value::Undefined),
      },
      Value::Bool(_) => match self.realm.as_ref().map(|r| r.boolean_prototype) {
        Some(proto) => self.get_property(proto, key),
        None => Ok(Value::Undefined),
      },
      Value::Symbol(_) => match self.realm.as_ref().map(|r| r.symbol_prototype) {
        Some(proto) => self.get_property(proto, key),
        None => Ok(Value::Undefined),
      },
      Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
        "cannot read property \"{}\" of {}",
        key.as_display_string(),
        if matches!(base, Value::Null) {
          "null"
        } else {
          "undefined"
        }
      ))),
    }
  }

  /// Property write with a primitive-aware receiver. Writes to primitives
  /// are dropped (or a type error in strict code).
  pub fn set_member(
    &mut self,
    base: &Value,
    key: &PropertyKey,
    value: Value,
    strict: bool,
  ) -> Result<(), EvalError> {
    match base {
      Value::Object(obj) => self.put_property(*obj, key, value, strict),
      Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
        "cannot set property \"{}\" of {}",
        key.as_display_string(),
        if matches!(base, Value::Null) {
          "null"
        } else {
          "undefined"
        }
      ))),
      _ => {
        if strict {
          return Err(EvalError::type_error(
            "cannot create a property on a primitive value",
          ));
        }
        Ok(())
      }
    }
  }

  // --- Conversions and operators -----------------------------------------

  pub fn is_callable(&self, value: &Value) -> bool {
    match value {
      Value::Object(obj) => self.heap.get(*obj).is_callable(),
      _ => false,
    }
  }

  pub fn typeof_value(&self, value: &Value) -> &'static str {
    match value {
      Value::Object(obj) if self.heap.get(*obj).is_callable() => "function",
      other => other.primitive_type_of(),
    }
  }

  /// `ToPrimitive`, driven through the script-visible `toString`/`valueOf`
  /// methods so user overrides are honored.
  pub fn to_primitive(&mut self, value: &Value, string_hint: bool) -> Result<Value, EvalError> {
    let Value::Object(obj) = value else {
      return Ok(value.clone());
    };
    let methods: [&str; 2] = if string_hint {
      ["toString", "valueOf"]
    } else {
      ["valueOf", "toString"]
    };
    for name in methods {
      let method = self.get_property_str(*obj, name)?;
      if self.is_callable(&method) {
        let result = self.call_function(method, value.clone(), &[])?;
        if !matches!(result, Value::Object(_)) {
          return Ok(result);
        }
      }
    }
    Err(EvalError::type_error(
      "cannot convert object to primitive value",
    ))
  }

  pub fn to_string_value(&mut self, value: &Value) -> Result<JsString, EvalError> {
    match value {
      Value::Undefined => Ok("undefined".into()),
      Value::Null => Ok("null".into()),
      Value::Bool(true) => Ok("true".into()),
      Value::Bool(false) => Ok("false".into()),
      Value::Number(n) => Ok(number_to_string(*n)),
      Value::String(s) => Ok(s.clone()),
      Value::Symbol(_) => Err(EvalError::type_error(
        "cannot convert a Symbol value to a string",
      )),
      Value::Object(_) => {
        let primitive = self.to_primitive(value, true)?;
        self.to_string_value(&primitive)
      }
    }
  }

  pub fn to_number_value(&mut self, value: &Value) -> Result<f64, EvalError> {
    match value {
      Value::Undefined => Ok(f64::NAN),
      Value::Null => Ok(0.0),
      Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
      Value::Number(n) => Ok(*n),
      Value::String(s) => Ok(string_to_number(s)),
      Value::Symbol(_) => Err(EvalError::type_error(
        "cannot convert a Symbol value to a number",
      )),
      Value::Object(_) => {
        let primitive = self.to_primitive(value, false)?;
        self.to_number_value(&primitive)
      }
    }
  }

  /// Convert a value to a property key (symbols pass through).
  pub fn to_property_key(&mut self, value: &Value) -> Result<PropertyKey, EvalError> {
    match value {
      Value::Symbol(id) => Ok(PropertyKey::Symbol(*id)),
      Value::Number(n) => {
        let s = number_to_string(*n);
        Ok(PropertyKey::from_js_string(&s))
      }
      other => {
        let s = self.to_string_value(other)?;
        Ok(PropertyKey::from_js_string(&s))
      }
    }
  }

  pub fn strict_equals(&self, a: &Value, b: &Value) -> bool {
    match (a, b) {
      (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
      (Value::Bool(x), Value::Bool(y)) => x == y,
      (Value::Number(x), Value::Number(y)) => x == y,
      (Value::String(x), Value::String(y)) => x == y,
      (Value::Symbol(x), Value::Symbol(y)) => x == y,
      (Value::Object(x), Value::Object(y)) => x == y,
      _ => false,
    }
  }

  pub fn loose_equals(&mut self, a: &Value, b: &Value) -> Result<bool, EvalError> {
    match (a, b) {
      (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
      (Value::Number(_), Value::Number(_))
      | (Value::String(_), Value::String(_))
      | (Value::Bool(_), Value::Bool(_))
      | (Value::Object(_), Value::Object(_))
      | (Value::Symbol(_), Value::Symbol(_)) => Ok(self.strict_equals(a, b)),
      (Value::Number(_), Value::String(_)) => {
        let bn = self.to_number_value(b)?;
        Ok(matches!(a, Value::Number(x) if *x == bn))
      }
      (Value::String(_), Value::Number(_)) => self.loose_equals(b, a),
      (Value::Bool(_), _) => {
        let an = self.to_number_value(a)?;
        self.loose_equals(&Value::Number(an), b)
      }
      (_, Value::Bool(_)) => {
        let bn = self.to_number_value(b)?;
        self.loose_equals(a, &Value::Number(bn))
      }
      (Value::Number(_) | Value::String(_), Value::Object(_)) => {
        let bp = self.to_primitive(b, false)?;
        self.loose_equals(a, &bp)
      }
      (Value::Object(_), Value::Number(_) | Value::String(_)) => {
        let ap = self.to_primitive(a, false)?;
        self.loose_equals(&ap, b)
      }
      _ => Ok(false),
    }
  }

  pub fn instanceof(&mut self, value: &Value, ctor: &Value) -> Result<bool, EvalError> {
    let Value::Object(ctor_obj) = ctor else {
      return Err(EvalError::type_error(
        "right-hand side of instanceof is not callable",
      ));
    };
    if !self.heap.get(*ctor_obj).is_callable() {
      return Err(EvalError::type_error(
        "right-hand side of instanceof is not callable",
      ));
    }
    let prototype = self.get_property_str(*ctor_obj, "prototype")?;
    let Value::Object(proto_obj) = prototype else {
      return Err(EvalError::type_error("constructor has no prototype object"));
    };
    let Value::Object(mut cursor) = value.clone() else {
      return Ok(false);
    };
    loop {
      match self.heap.get(cursor).prototype {
        Some(parent) if parent == proto_obj => return Ok(true),
        Some(parent) => cursor = parent,
        None => return Ok(false),
      }
    }
  }

  /// `@@species` constructor derivation used by cloning protocols.
  pub fn species_constructor(
    &mut self,
    obj: JsObject,
    default_ctor: JsObject,
  ) -> Result<JsObject, EvalError> {
    let ctor = self.get_property_str(obj, "constructor")?;
    let ctor_obj = match ctor {
      Value::Undefined => return Ok(default_ctor),
      Value::Object(o) => o,
      _ => return Err(EvalError::type_error("constructor is not an object")),
    };
    let species_symbol = self
      .realm
      .as_ref()
      .map(|r| r.symbols.species)
      .expect("realm must be initialized");
    let species = self.get_property(ctor_obj, &PropertyKey::Symbol(species_symbol))?;
    match species {
      Value::Undefined | Value::Null => Ok(default_ctor),
      Value::Object(o) if self.heap.get(o).is_callable() => Ok(o),
      _ => Err(EvalError::type_error("species constructor is not callable")),
    }
  }

  /// The decompiled or native-code source form of a function object.
  pub fn function_source(&self, obj: JsObject) -> String {
    let ObjectKind::Function(data) = &self.heap.get(obj).kind else {
      return String::new();
    };
    match data {
      FunctionData::Interpreted { icode, .. } => crate::compile::decompile_icode(icode, 0),
      FunctionData::Native { name, .. } | FunctionData::IdMethod { name, .. } => {
        format!("function {}() {{\n\t[native code]\n}}", name)
      }
    }
  }

  pub(crate) fn make_id_method(
    &mut self,
    tag: crate::function::BuiltinTag,
    id: u16,
    name: &str,
    arity: u16,
  ) -> JsObject {
    let proto = self.realm.as_ref().map(|r| r.function_prototype);
    let obj = ScriptObject::new(
      ObjectKind::Function(FunctionData::IdMethod {
        tag,
        id,
        name: name.into(),
        arity,
      }),
      proto,
    );
    self.heap.alloc(obj)
  }

  pub(crate) fn make_interpreted_function(
    &mut self,
    icode: Rc<crate::icode::Icode>,
    scope: JsObject,
  ) -> JsObject {
    let fn_proto = self.realm.as_ref().map(|r| r.function_prototype);
    let func = self.heap.alloc(ScriptObject::new(
      ObjectKind::Function(FunctionData::Interpreted { icode, scope }),
      fn_proto,
    ));
    // Every function gets a fresh `prototype` object whose `constructor`
    // points back.
    let proto = self.new_object();
    self.define_property(
      proto,
      PropertyKey::String("constructor".into()),
      Value::Object(func),
      DONTENUM,
    );
    self.define_property(
      func,
      PropertyKey::String("prototype".into()),
      Value::Object(proto),
      DONTENUM | PERMANENT,
    );
    func
  }
}

fn reject_put(strict: bool, key: &PropertyKey, reason: &str) -> Result<(), EvalError> {
  if strict {
    return Err(EvalError::type_error(format!(
      "cannot assign to property \"{}\": {}",
      key.as_display_string(),
      reason
    )));
  }
  Ok(())
}
