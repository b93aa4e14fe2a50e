use crate::function::FunctionData;
use crate::heap::JsObject;
use crate::heap::SymbolId;
use crate::string::JsString;
use crate::value::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Property attribute: the value may not be changed.
pub const READONLY: u8 = 0x01;
/// Property attribute: skipped by `for..in` enumeration.
pub const DONTENUM: u8 = 0x02;
/// Property attribute: the property may not be deleted.
pub const PERMANENT: u8 = 0x04;

pub const EMPTY: u8 = 0;

/// A property key, normalized: integer-indexed keys are split out so
/// enumeration can order them numerically.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PropertyKey {
  Index(u32),
  String(Rc<str>),
  Symbol(SymbolId),
}

impl PropertyKey {
  /// Normalize a string key: canonical array indices become `Index`.
  pub fn from_str(name: &str) -> PropertyKey {
    if let Some(index) = to_array_index(name) {
      return PropertyKey::Index(index);
    }
    PropertyKey::String(name.into())
  }

  pub fn from_js_string(name: &JsString) -> PropertyKey {
    PropertyKey::from_str(&name.to_utf8_lossy())
  }

  pub fn as_display_string(&self) -> String {
    match self {
      PropertyKey::Index(i) => i.to_string(),
      PropertyKey::String(s) => s.to_string(),
      PropertyKey::Symbol(_) => "Symbol(...)".to_string(),
    }
  }
}

/// `ToString(ToUint32(P)) === P` and `ToUint32(P) != 2^32-1`: the array index
/// conditions used by ordinary own-key ordering.
pub fn to_array_index(name: &str) -> Option<u32> {
  if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
    return None;
  }
  let mut value: u64 = 0;
  for b in name.bytes() {
    if !b.is_ascii_digit() {
      return None;
    }
    value = value * 10 + (b - b'0') as u64;
    if value > u32::MAX as u64 {
      return None;
    }
  }
  if value == u32::MAX as u64 {
    return None;
  }
  Some(value as u32)
}

/// A property's payload: plain data, or accessor functions.
#[derive(Clone, Debug)]
pub enum PropertyValue {
  Data(Value),
  Accessor {
    getter: Option<JsObject>,
    setter: Option<JsObject>,
  },
}

#[derive(Clone, Debug)]
pub struct PropertySlot {
  pub value: PropertyValue,
  pub attributes: u8,
  /// Insertion order, for enumeration.
  pub order: u32,
}

/// What kind of object this is. Builtins carry their internal data here; the
/// interpreter and builtin dispatch switch over this instead of resolving
/// virtual methods.
pub enum ObjectKind {
  /// Plain objects, activations, and the global scope.
  Standard,
  Array,
  Function(FunctionData),
  BooleanWrapper(bool),
  NumberWrapper(f64),
  StringWrapper(JsString),
  Error,
  RegExp(crate::builtins::regexp::RegExpData),
  RegExpStringIterator(crate::builtins::regexp_iterator::RegExpIteratorData),
  Symbol(SymbolId),
  /// A `with`-statement scope: name access is redirected to `target`.
  With { target: JsObject },
}

/// A script object: a property map plus prototype and scope links.
pub struct ScriptObject {
  pub kind: ObjectKind,
  pub prototype: Option<JsObject>,
  /// Enclosing scope for objects used as scopes (activations, `with`
  /// scopes). `None` for the global scope and ordinary objects.
  pub parent_scope: Option<JsObject>,
  pub sealed: bool,
  pub class_name: &'static str,
  ints: BTreeMap<u32, PropertySlot>,
  strings: Vec<(Rc<str>, PropertySlot)>,
  symbols: Vec<(SymbolId, PropertySlot)>,
  next_order: u32,
}

impl ScriptObject {
  pub fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
    let class_name = match &kind {
      ObjectKind::Standard => "Object",
      ObjectKind::Array => "Array",
      ObjectKind::Function(_) => "Function",
      ObjectKind::BooleanWrapper(_) => "Boolean",
      ObjectKind::NumberWrapper(_) => "Number",
      ObjectKind::StringWrapper(_) => "String",
      ObjectKind::Error => "Error",
      ObjectKind::RegExp(_) => "RegExp",
      ObjectKind::RegExpStringIterator(_) => "RegExp String Iterator",
      ObjectKind::Symbol(_) => "Symbol",
      ObjectKind::With { .. } => "With",
    };
    Self {
      kind,
      prototype,
      parent_scope: None,
      sealed: false,
      class_name,
      ints: BTreeMap::new(),
      strings: Vec::new(),
      symbols: Vec::new(),
      next_order: 0,
    }
  }

  pub fn standard(prototype: Option<JsObject>) -> Self {
    Self::new(ObjectKind::Standard, prototype)
  }

  pub fn is_callable(&self) -> bool {
    matches!(self.kind, ObjectKind::Function(_))
  }

  fn bump_order(&mut self) -> u32 {
    let order = self.next_order;
    self.next_order += 1;
    order
  }

  pub fn get_own(&self, key: &PropertyKey) -> Option<&PropertySlot> {
    match key {
      PropertyKey::Index(i) => self.ints.get(i),
      PropertyKey::String(name) => self
        .strings
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, slot)| slot),
      PropertyKey::Symbol(id) => self
        .symbols
        .iter()
        .find(|(k, _)| k == id)
        .map(|(_, slot)| slot),
    }
  }

  pub fn get_own_mut(&mut self, key: &PropertyKey) -> Option<&mut PropertySlot> {
    match key {
      PropertyKey::Index(i) => self.ints.get_mut(i),
      PropertyKey::String(name) => self
        .strings
        .iter_mut()
        .find(|(k, _)| k == name)
        .map(|(_, slot)| slot),
      PropertyKey::Symbol(id) => self
        .symbols
        .iter_mut()
        .find(|(k, _)| k == id)
        .map(|(_, slot)| slot),
    }
  }

  /// Define (or overwrite) a property, bypassing readonly checks. Callers
  /// enforce attribute semantics; this is the raw map write.
  pub fn define(&mut self, key: PropertyKey, value: PropertyValue, attributes: u8) {
    let order = self.bump_order();
    match key {
      PropertyKey::Index(i) => {
        match self.ints.get_mut(&i) {
          Some(slot) => {
            slot.value = value;
            slot.attributes = attributes;
          }
          None => {
            self.ints.insert(i, PropertySlot {
              value,
              attributes,
              order,
            });
          }
        };
      }
      PropertyKey::String(name) => {
        match self.strings.iter_mut().find(|(k, _)| *k == name) {
          Some((_, slot)) => {
            slot.value = value;
            slot.attributes = attributes;
          }
          None => self.strings.push((name, PropertySlot {
            value,
            attributes,
            order,
          })),
        };
      }
      PropertyKey::Symbol(id) => {
        match self.symbols.iter_mut().find(|(k, _)| *k == id) {
          Some((_, slot)) => {
            slot.value = value;
            slot.attributes = attributes;
          }
          None => self.symbols.push((id, PropertySlot {
            value,
            attributes,
            order,
          })),
        };
      }
    }
  }

  pub fn define_value(&mut self, key: PropertyKey, value: Value, attributes: u8) {
    self.define(key, PropertyValue::Data(value), attributes);
  }

  /// Remove an own property. Returns false only when the property exists and
  /// is PERMANENT; removing an absent property is a successful no-op.
  pub fn delete_own(&mut self, key: &PropertyKey) -> bool {
    let permanent = match self.get_own(key) {
      None => return true,
      Some(slot) => slot.attributes & PERMANENT != 0,
    };
    if permanent || self.sealed {
      return false;
    }
    match key {
      PropertyKey::Index(i) => {
        self.ints.remove(i);
      }
      PropertyKey::String(name) => self.strings.retain(|(k, _)| k != name),
      PropertyKey::Symbol(id) => self.symbols.retain(|(k, _)| k != id),
    }
    true
  }

  /// Own string-keyed property names (indices included, symbols excluded).
  ///
  /// With `ids_first` (the ES6 rule) integer indices come first in numeric
  /// order, then string keys by insertion; otherwise everything is in plain
  /// insertion order.
  pub fn own_string_keys(&self, ids_first: bool) -> Vec<PropertyKey> {
    if ids_first {
      let mut keys: Vec<PropertyKey> = self.ints.keys().map(|i| PropertyKey::Index(*i)).collect();
      let mut strings: Vec<_> = self.strings.iter().collect();
      strings.sort_by_key(|(_, slot)| slot.order);
      keys.extend(strings.into_iter().map(|(k, _)| PropertyKey::String(k.clone())));
      keys
    } else {
      let mut keys: Vec<(u32, PropertyKey)> = self
        .ints
        .iter()
        .map(|(i, slot)| (slot.order, PropertyKey::Index(*i)))
        .chain(
          self
            .strings
            .iter()
            .map(|(k, slot)| (slot.order, PropertyKey::String(k.clone()))),
        )
        .collect();
      keys.sort_by_key(|(order, _)| *order);
      keys.into_iter().map(|(_, k)| k).collect()
    }
  }

  /// Own symbol keys in insertion order.
  pub fn own_symbol_keys(&self) -> Vec<SymbolId> {
    let mut symbols: Vec<_> = self.symbols.iter().collect();
    symbols.sort_by_key(|(_, slot)| slot.order);
    symbols.into_iter().map(|(k, _)| *k).collect()
  }

  /// Seal: no additions, deletions, or modifications from now on.
  pub fn seal(&mut self) {
    self.sealed = true;
  }
}
