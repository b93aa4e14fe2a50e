use crate::context::Context;
use crate::context::LanguageVersion;
use crate::error::EcmaErrorKind;
use crate::error::EvalError;
use crate::function::BuiltinTag;
use crate::heap::JsObject;
use crate::heap::SymbolId;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::object::READONLY;
use crate::realm::Realm;
use crate::realm::WellKnownSymbols;
use crate::value::Value;

pub mod array;
pub mod boolean_number;
pub mod error;
pub mod function;
pub mod global;
pub mod math;
pub mod object;
pub mod regexp;
pub mod regexp_iterator;
pub mod string;
pub mod symbol;

/// Dispatch a prototype id-method call: a switch over (builtin, id) instead
/// of per-method function pointers.
pub(crate) fn dispatch_id_call(
  cx: &mut Context,
  tag: BuiltinTag,
  id: u16,
  this: Value,
  args: &[Value],
) -> Result<Value, EvalError> {
  match tag {
    BuiltinTag::Array => array::exec_id_call(cx, id, this, args),
    BuiltinTag::Boolean | BuiltinTag::Number => boolean_number::exec_id_call(cx, tag, id, this, args),
    BuiltinTag::ErrorObj => error::exec_id_call(cx, id, this, args),
    BuiltinTag::Function => function::exec_id_call(cx, id, this, args),
    BuiltinTag::Global => global::exec_id_call(cx, id, this, args),
    BuiltinTag::Math => math::exec_id_call(cx, id, this, args),
    BuiltinTag::Object => object::exec_id_call(cx, id, this, args),
    BuiltinTag::RegExp => regexp::exec_id_call(cx, id, this, args),
    BuiltinTag::RegExpStringIterator => regexp_iterator::exec_id_call(cx, id, this, args),
    BuiltinTag::StringObj => string::exec_id_call(cx, id, this, args),
    BuiltinTag::Symbol => symbol::exec_id_call(cx, id, this, args),
  }
}

/// Install an id-dispatched prototype method.
pub(crate) fn define_method(
  cx: &mut Context,
  target: JsObject,
  tag: BuiltinTag,
  id: u16,
  name: &str,
  arity: u16,
) {
  let func = cx.make_id_method(tag, id, name, arity);
  cx.define_property(
    target,
    PropertyKey::from_str(name),
    Value::Object(func),
    DONTENUM,
  );
}

/// Install an id-dispatched prototype method keyed by a well-known symbol.
pub(crate) fn define_symbol_method(
  cx: &mut Context,
  target: JsObject,
  tag: BuiltinTag,
  id: u16,
  symbol: SymbolId,
  name: &str,
  arity: u16,
) {
  let func = cx.make_id_method(tag, id, name, arity);
  cx.define_property(
    target,
    PropertyKey::Symbol(symbol),
    Value::Object(func),
    DONTENUM,
  );
}

/// Wire a constructor and its prototype together and install the constructor
/// in the scope under its canonical name.
pub(crate) fn install_ctor(
  cx: &mut Context,
  scope: JsObject,
  name: &str,
  ctor: JsObject,
  prototype: JsObject,
) {
  cx.define_property(
    ctor,
    PropertyKey::String("prototype".into()),
    Value::Object(prototype),
    PERMANENT | READONLY | DONTENUM,
  );
  cx.define_property(
    prototype,
    PropertyKey::String("constructor".into()),
    Value::Object(ctor),
    DONTENUM,
  );
  cx.define_property(scope, PropertyKey::from_str(name), Value::Object(ctor), DONTENUM);
}

/// Install the ES6 `@@species` accessor (a getter returning `this`) on a
/// constructor.
pub(crate) fn add_species_accessor(cx: &mut Context, ctor: JsObject) {
  if cx.language_version().as_number() < LanguageVersion::ES6.as_number() {
    return;
  }
  let Some(realm) = cx.realm.as_ref() else {
    return;
  };
  let species = realm.symbols.species;
  let getter = cx.new_native_function("get [Symbol.species]", 0, species_getter, false);
  cx.define_accessor(
    ctor,
    PropertyKey::Symbol(species),
    Some(getter),
    None,
    DONTENUM | PERMANENT,
  );
}

fn species_getter(
  _cx: &mut Context,
  this: Value,
  _args: &[Value],
  _construct: bool,
) -> Result<Value, EvalError> {
  Ok(this)
}

impl Context {
  /// Initialize the standard builtins on `scope` (or a fresh object),
  /// setting it up to act as a global object. Must be called before scripts
  /// are evaluated in that scope.
  ///
  /// When `sealed` is set, every produced builtin object rejects further
  /// modification (the scope itself stays writable).
  pub fn init_standard_objects(
    &mut self,
    scope: Option<JsObject>,
    sealed: bool,
  ) -> Result<JsObject, EvalError> {
    self.init_objects_impl(scope, sealed, false)
  }

  /// Like [`Context::init_standard_objects`], omitting the host-interop
  /// surface; safe for sandboxed scopes.
  pub fn init_safe_standard_objects(
    &mut self,
    scope: Option<JsObject>,
    sealed: bool,
  ) -> Result<JsObject, EvalError> {
    self.init_objects_impl(scope, sealed, true)
  }

  fn init_objects_impl(
    &mut self,
    scope: Option<JsObject>,
    sealed: bool,
    _safe: bool,
  ) -> Result<JsObject, EvalError> {
    // The prototype graph is allocated first so that the realm is available
    // to every later allocation.
    let object_prototype = self.heap.alloc(ScriptObject::standard(None));
    let function_prototype = self.heap.alloc(ScriptObject::new(
      ObjectKind::Function(crate::function::FunctionData::Native {
        name: "".into(),
        arity: 0,
        func: function::prototype_noop,
        constructable: false,
      }),
      Some(object_prototype),
    ));
    let array_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));
    let string_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));
    let boolean_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));
    let number_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));
    let symbol_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));
    let regexp_prototype = regexp::alloc_prototype(self, object_prototype)?;
    let regexp_iterator_prototype = self
      .heap
      .alloc(ScriptObject::standard(Some(object_prototype)));

    let error_prototypes = error::alloc_prototypes(self, object_prototype);

    let symbols = WellKnownSymbols {
      match_: self.heap.alloc_symbol(Some("Symbol.match".into())),
      match_all: self.heap.alloc_symbol(Some("Symbol.matchAll".into())),
      search: self.heap.alloc_symbol(Some("Symbol.search".into())),
      species: self.heap.alloc_symbol(Some("Symbol.species".into())),
      iterator: self.heap.alloc_symbol(Some("Symbol.iterator".into())),
    };

    let global = match scope {
      Some(scope) => {
        self.heap.get_mut(scope).prototype = Some(object_prototype);
        scope
      }
      None => self.heap.alloc(ScriptObject::standard(Some(object_prototype))),
    };

    self.realm = Some(Realm {
      global,
      object_prototype,
      function_prototype,
      array_prototype,
      string_prototype,
      boolean_prototype,
      number_prototype,
      symbol_prototype,
      regexp_prototype,
      regexp_iterator_prototype,
      // Fixed up below, once the constructor exists.
      regexp_ctor: regexp_prototype,
      error_prototypes,
      symbols,
      symbol_registry: Vec::new(),
      regexp_impl: regexp::RegExpImpl::default(),
    });

    let mut library = vec![
      object_prototype,
      function_prototype,
      array_prototype,
      string_prototype,
      boolean_prototype,
      number_prototype,
      symbol_prototype,
      regexp_prototype,
      regexp_iterator_prototype,
    ];

    global::init(self, global);
    library.push(object::init(self, global));
    library.push(function::init(self, global));
    library.push(array::init(self, global));
    library.push(string::init(self, global));
    let (bool_ctor, number_ctor) = boolean_number::init(self, global);
    library.push(bool_ctor);
    library.push(number_ctor);
    library.extend(error::init(self, global));
    library.push(math::init(self, global));
    if self.language_version().as_number() >= LanguageVersion::ES6.as_number() {
      library.push(symbol::init(self, global));
    }
    let regexp_ctor = regexp::init(self, global)?;
    library.push(regexp_ctor);
    regexp_iterator::init(self, global);
    if let Some(realm) = self.realm.as_mut() {
      realm.regexp_ctor = regexp_ctor;
    }

    if sealed {
      library.extend(
        self
          .realm
          .as_ref()
          .map(|r| r.error_prototypes.iter().map(|(_, p)| *p).collect::<Vec<_>>())
          .unwrap_or_default(),
      );
      for obj in library {
        self.seal_object(obj);
      }
    }

    Ok(global)
  }

  /// The global object of the context's realm.
  pub fn global_object(&self) -> Option<JsObject> {
    self.realm.as_ref().map(|r| r.global)
  }

  pub(crate) fn error_kind_prototype(&self, kind: EcmaErrorKind) -> Option<JsObject> {
    self.realm.as_ref().map(|r| r.error_prototype(kind))
  }
}
