use crate::object::ScriptObject;
use crate::string::JsString;

/// Handle to a script object in a context's [`ObjectHeap`].
///
/// Handles are plain slot indices: objects are never moved or individually
/// freed, so a handle stays valid for the life of its context. Prototype and
/// scope links are stored as handles rather than owning pointers, which is
/// what keeps the scope ↔ function ↔ prototype cycles collectible when the
/// context itself is dropped.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct JsObject(u32);

/// Handle to a symbol record in a context's heap. Symbol identity is handle
/// identity.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SymbolId(u32);

#[derive(Debug)]
pub struct SymbolRecord {
  pub description: Option<JsString>,
}

/// The per-context object table.
///
/// There is no collector: object lifetimes are governed by the host
/// allocator, and the whole table is released when the owning context is
/// dropped.
#[derive(Default)]
pub struct ObjectHeap {
  objects: Vec<ScriptObject>,
  symbols: Vec<SymbolRecord>,
}

impl ObjectHeap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc(&mut self, object: ScriptObject) -> JsObject {
    let index = u32::try_from(self.objects.len()).expect("object heap exhausted");
    self.objects.push(object);
    JsObject(index)
  }

  pub fn get(&self, handle: JsObject) -> &ScriptObject {
    &self.objects[handle.0 as usize]
  }

  pub fn get_mut(&mut self, handle: JsObject) -> &mut ScriptObject {
    &mut self.objects[handle.0 as usize]
  }

  pub fn alloc_symbol(&mut self, description: Option<JsString>) -> SymbolId {
    let index = u32::try_from(self.symbols.len()).expect("symbol table exhausted");
    self.symbols.push(SymbolRecord { description });
    SymbolId(index)
  }

  pub fn symbol(&self, id: SymbolId) -> &SymbolRecord {
    &self.symbols[id.0 as usize]
  }

  pub fn object_count(&self) -> usize {
    self.objects.len()
  }
}
