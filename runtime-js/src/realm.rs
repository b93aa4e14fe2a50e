use crate::builtins::regexp::RegExpImpl;
use crate::error::EcmaErrorKind;
use crate::heap::JsObject;
use crate::heap::SymbolId;
use crate::string::JsString;

/// The well-known symbols a global scope exposes.
#[derive(Copy, Clone, Debug)]
pub struct WellKnownSymbols {
  pub match_: SymbolId,
  pub match_all: SymbolId,
  pub search: SymbolId,
  pub species: SymbolId,
  pub iterator: SymbolId,
}

/// Per-global-scope engine state: the global object, the builtin prototype
/// graph, well-known symbols, and the legacy regexp match state.
///
/// A context hosts one realm, established by
/// [`crate::Context::init_standard_objects`].
pub struct Realm {
  pub global: JsObject,
  pub object_prototype: JsObject,
  pub function_prototype: JsObject,
  pub array_prototype: JsObject,
  pub string_prototype: JsObject,
  pub boolean_prototype: JsObject,
  pub number_prototype: JsObject,
  pub symbol_prototype: JsObject,
  pub regexp_prototype: JsObject,
  pub regexp_iterator_prototype: JsObject,
  pub regexp_ctor: JsObject,
  pub error_prototypes: Vec<(EcmaErrorKind, JsObject)>,
  pub symbols: WellKnownSymbols,
  pub symbol_registry: Vec<(JsString, SymbolId)>,
  pub regexp_impl: RegExpImpl,
}

impl Realm {
  pub fn error_prototype(&self, kind: EcmaErrorKind) -> JsObject {
    self
      .error_prototypes
      .iter()
      .find(|(k, _)| *k == kind)
      .map(|(_, proto)| *proto)
      .unwrap_or(self.object_prototype)
  }
}
