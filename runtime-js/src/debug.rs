use crate::icode::Icode;
use std::rc::Rc;

/// A debugger-facing view of a compiled unit: a tree mirroring the script's
/// nested function structure.
#[derive(Clone, Debug)]
pub struct DebuggableScript {
  pub source_name: String,
  pub function_name: Option<String>,
  pub param_names: Vec<String>,
  pub is_function: bool,
  pub base_lineno: u32,
  pub functions: Vec<DebuggableScript>,
}

impl DebuggableScript {
  pub fn from_icode(icode: &Rc<Icode>) -> DebuggableScript {
    DebuggableScript {
      source_name: icode.source_name.to_string(),
      function_name: icode.fn_name.as_ref().map(|n| n.to_string()),
      param_names: icode.params.iter().map(|p| p.to_string()).collect(),
      is_function: icode.is_function,
      base_lineno: icode.base_lineno,
      functions: icode.functions.iter().map(DebuggableScript::from_icode).collect(),
    }
  }

  pub fn function_count(&self) -> usize {
    self.functions.len()
  }
}
