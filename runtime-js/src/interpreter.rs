use crate::builtins;
use crate::context::Context;
use crate::continuation::NativeContinuation;
use crate::error::ContinuationPending;
use crate::error::EvalError;
use crate::error::SourcePosition;
use crate::function::FunctionData;
use crate::heap::JsObject;
use crate::icode::Icode;
use crate::icode::Op;
use crate::object::ObjectKind;
use crate::object::PropertyKey;
use crate::object::ScriptObject;
use crate::object::DONTENUM;
use crate::object::PERMANENT;
use crate::string::JsString;
use crate::value::to_int32;
use crate::value::to_uint32;
use crate::value::Value;
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct HandlerEntry {
  pub pc: u32,
  pub stack_len: u32,
  pub scope: JsObject,
}

#[derive(Clone)]
pub(crate) struct EnumState {
  pub keys: Vec<JsString>,
  pub index: usize,
  pub obj: Option<JsObject>,
}

/// One interpreter activation record. Frames are plain heap data chained on
/// the context (not host stack frames) so continuations can snapshot them.
#[derive(Clone)]
pub struct Frame {
  pub(crate) icode: Rc<Icode>,
  pub(crate) pc: usize,
  pub(crate) stack: Vec<Value>,
  pub(crate) scope: JsObject,
  pub(crate) this_value: Value,
  pub(crate) handlers: Vec<HandlerEntry>,
  pub(crate) enums: Vec<EnumState>,
  pub(crate) script_result: Value,
  /// For `new` activations: the freshly created instance, substituted when
  /// the constructor returns a non-object.
  pub(crate) construct_this: Option<JsObject>,
}

impl Frame {
  fn new(icode: Rc<Icode>, scope: JsObject, this_value: Value) -> Frame {
    Frame {
      icode,
      pc: 0,
      stack: Vec::new(),
      scope,
      this_value,
      handlers: Vec::new(),
      enums: Vec::new(),
      script_result: Value::Undefined,
      construct_this: None,
    }
  }
}

impl Context {
  /// Call a callable value. This is the host entry point; nested interpreted
  /// calls made by running script do not recurse through here.
  pub fn call_function(
    &mut self,
    callee: Value,
    this: Value,
    args: &[Value],
  ) -> Result<Value, EvalError> {
    let Some(obj) = callee.as_object() else {
      return Err(EvalError::type_error("value is not a function"));
    };
    let data = match &self.heap.get(obj).kind {
      ObjectKind::Function(data) => data,
      _ => return Err(EvalError::type_error("value is not a function")),
    };
    match data {
      FunctionData::Native { func, .. } => {
        let func = *func;
        func(self, this, args, false)
      }
      FunctionData::IdMethod { tag, id, .. } => {
        let (tag, id) = (*tag, *id);
        builtins::dispatch_id_call(self, tag, id, this, args)
      }
      FunctionData::Interpreted { icode, scope } => {
        let (icode, scope) = (icode.clone(), *scope);
        self.run_function(icode, scope, this, args)
      }
    }
  }

  /// Construct via `new` from the host.
  pub fn construct(&mut self, callee: Value, args: &[Value]) -> Result<Value, EvalError> {
    let Some(obj) = callee.as_object() else {
      return Err(EvalError::type_error("value is not a constructor"));
    };
    let data = match &self.heap.get(obj).kind {
      ObjectKind::Function(data) => data,
      _ => return Err(EvalError::type_error("value is not a constructor")),
    };
    match data {
      FunctionData::Native {
        func,
        constructable,
        ..
      } => {
        if !constructable {
          return Err(EvalError::type_error("function is not a constructor"));
        }
        let func = *func;
        func(self, Value::Undefined, args, true)
      }
      FunctionData::IdMethod { .. } => {
        Err(EvalError::type_error("function is not a constructor"))
      }
      FunctionData::Interpreted { icode, scope } => {
        let (icode, scope) = (icode.clone(), *scope);
        let instance = self.make_instance_for(obj)?;
        let frame_this = Value::Object(instance);
        let result =
          self.run_function_framed(icode, scope, frame_this, args, Some(instance))?;
        Ok(result)
      }
    }
  }

  fn make_instance_for(&mut self, ctor: JsObject) -> Result<JsObject, EvalError> {
    let proto = match self.get_property_str(ctor, "prototype")? {
      Value::Object(proto) => Some(proto),
      _ => self.object_prototype(),
    };
    Ok(self.heap.alloc(ScriptObject::standard(proto)))
  }

  fn run_function(
    &mut self,
    icode: Rc<Icode>,
    closure_scope: JsObject,
    this: Value,
    args: &[Value],
  ) -> Result<Value, EvalError> {
    self.run_function_framed(icode, closure_scope, this, args, None)
  }

  fn run_function_framed(
    &mut self,
    icode: Rc<Icode>,
    closure_scope: JsObject,
    this: Value,
    args: &[Value],
    construct_this: Option<JsObject>,
  ) -> Result<Value, EvalError> {
    let this = self.coerce_this(&icode, this);
    let activation = self.make_activation(&icode, closure_scope, args)?;
    let mut frame = Frame::new(icode, activation, this);
    frame.construct_this = construct_this;
    self.run_with_frame(frame)
  }

  /// Execute a toplevel script artifact against `scope`.
  pub(crate) fn exec_script_icode(
    &mut self,
    icode: Rc<Icode>,
    scope: JsObject,
  ) -> Result<Value, EvalError> {
    // Toplevel var/function bindings live directly on the scope.
    for name in icode.var_names.clone() {
      let key = PropertyKey::from_str(&name);
      if self.heap.get(scope).get_own(&key).is_none() {
        self.define_property(scope, key, Value::Undefined, PERMANENT);
      }
    }
    for idx in icode.decl_functions.clone() {
      let fn_icode = icode.functions[idx as usize].clone();
      let name = fn_icode.fn_name.clone();
      let func = self.make_interpreted_function(fn_icode, scope);
      if let Some(name) = name {
        self.define_property(scope, PropertyKey::from_str(&name), Value::Object(func), PERMANENT);
      }
    }
    let frame = Frame::new(icode, scope, Value::Object(scope));
    let result = self.run_with_frame(frame);
    self.process_microtasks();
    result
  }

  fn coerce_this(&self, icode: &Icode, this: Value) -> Value {
    if icode.strict {
      return this;
    }
    if this.is_null_or_undefined() {
      if let Some(realm) = &self.realm {
        return Value::Object(realm.global);
      }
    }
    this
  }

  fn make_activation(
    &mut self,
    icode: &Icode,
    closure_scope: JsObject,
    args: &[Value],
  ) -> Result<JsObject, EvalError> {
    let mut activation = ScriptObject::standard(None);
    activation.parent_scope = Some(closure_scope);
    let activation = self.heap.alloc(activation);
    for (i, param) in icode.params.iter().enumerate() {
      let value = args.get(i).cloned().unwrap_or(Value::Undefined);
      self.define_property(activation, PropertyKey::from_str(param), value, PERMANENT);
    }
    let arguments = self.new_array(args.to_vec());
    self.define_property(
      activation,
      PropertyKey::String("arguments".into()),
      Value::Object(arguments),
      PERMANENT | DONTENUM,
    );
    for name in &icode.var_names {
      let key = PropertyKey::from_str(name);
      if self.heap.get(activation).get_own(&key).is_none() {
        self.define_property(activation, key, Value::Undefined, PERMANENT);
      }
    }
    for idx in &icode.decl_functions {
      let fn_icode = icode.functions[*idx as usize].clone();
      let name = fn_icode.fn_name.clone();
      let func = self.make_interpreted_function(fn_icode, activation);
      if let Some(name) = name {
        self.define_property(
          activation,
          PropertyKey::from_str(&name),
          Value::Object(func),
          PERMANENT,
        );
      }
    }
    Ok(activation)
  }

  fn run_with_frame(&mut self, frame: Frame) -> Result<Value, EvalError> {
    let base = self.frames.len();
    self.check_frame_depth()?;
    self.frames.push(frame);
    self.interpreter_entries.push(base);
    let result = self.dispatch(base);
    self.interpreter_entries.pop();
    // On error paths the dispatch loop already unwound down to `base`.
    debug_assert!(self.frames.len() == base || result.is_err());
    self.frames.truncate(base);
    result
  }

  fn check_frame_depth(&self) -> Result<(), EvalError> {
    if self.frames.len() >= self.maximum_interpreter_stack_depth() {
      return Err(EvalError::range_error(
        "exceeded maximum interpreter stack depth",
      ));
    }
    Ok(())
  }

  /// The source position of the innermost interpreter frame, used for errors
  /// raised outside any script frame context.
  pub fn source_position_from_stack(&self) -> SourcePosition {
    match self.frames.last() {
      Some(frame) => position_of(&frame.icode, frame.pc.saturating_sub(1)),
      None => SourcePosition::default(),
    }
  }

  // --- Continuations -----------------------------------------------------

  /// Capture the current interpreter frame chain. Only valid while executing
  /// under a `*_with_continuations` entry point with no host frame between
  /// the top call and the capture point.
  pub fn capture_continuation(&mut self) -> Result<ContinuationPending, EvalError> {
    if !self.continuations_top_call || self.interpreter_entries.len() != 1 {
      return Err(EvalError::evaluator(
        "cannot capture a continuation here: the code was not called directly by \
         execute_script_with_continuations or call_function_with_continuations, or a host \
         frame intervenes",
      ));
    }
    Ok(ContinuationPending::new(NativeContinuation::new(
      self.frames.clone(),
    )))
  }

  /// Call a function that may capture continuations. The function must be an
  /// interpreted artifact, and no top call may be pending.
  pub fn call_function_with_continuations(
    &mut self,
    function: Value,
    scope: JsObject,
    args: &[Value],
  ) -> Result<Value, EvalError> {
    let is_interpreted = function
      .as_object()
      .map(|obj| {
        matches!(
          self.heap.get(obj).kind,
          ObjectKind::Function(FunctionData::Interpreted { .. })
        )
      })
      .unwrap_or(false);
    if !is_interpreted {
      return Err(EvalError::evaluator(
        "function was not created by interpreted mode",
      ));
    }
    if !self.frames.is_empty() {
      return Err(EvalError::evaluator(
        "cannot have any pending top calls when executing a script with continuations",
      ));
    }
    self.continuations_top_call = true;
    self.top_call_scope = Some(scope);
    let result = self.call_function(function, Value::Object(scope), args);
    self.continuations_top_call = false;
    self.top_call_scope = None;
    self.process_microtasks();
    result
  }

  /// Execute a script artifact that may capture continuations.
  pub fn execute_script_with_continuations(
    &mut self,
    script: &crate::compile::Script,
    scope: JsObject,
  ) -> Result<Value, EvalError> {
    if !self.frames.is_empty() {
      return Err(EvalError::evaluator(
        "cannot have any pending top calls when executing a script with continuations",
      ));
    }
    self.continuations_top_call = true;
    self.top_call_scope = Some(scope);
    let result = self.exec_script_icode(script.icode(), scope);
    self.continuations_top_call = false;
    self.top_call_scope = None;
    result
  }

  /// Restart execution from a captured continuation, delivering `value` as
  /// the result of the call that suspended.
  pub fn resume_continuation(
    &mut self,
    continuation: &NativeContinuation,
    scope: JsObject,
    value: Value,
  ) -> Result<Value, EvalError> {
    if !self.frames.is_empty() {
      return Err(EvalError::evaluator(
        "cannot resume a continuation while script is running",
      ));
    }
    let base = 0;
    self.continuations_top_call = true;
    self.top_call_scope = Some(scope);
    for frame in continuation.frames() {
      self.frames.push(frame.clone());
    }
    if let Some(top) = self.frames.last_mut() {
      top.stack.push(value);
    }
    self.interpreter_entries.push(base);
    let result = self.dispatch(base);
    self.interpreter_entries.pop();
    self.frames.truncate(base);
    self.continuations_top_call = false;
    self.top_call_scope = None;
    self.process_microtasks();
    result
  }

  // --- Dispatch loop -----------------------------------------------------

  fn dispatch(&mut self, base: usize) -> Result<Value, EvalError> {
    loop {
      let step = self.step(base);
      match step {
        Ok(Some(value)) => return Ok(value),
        Ok(None) => {}
        Err(err) => {
          if let Some(value) = self.unwind(base, err)? {
            return Ok(value);
          }
        }
      }
    }
  }

  /// Deliver an error to the innermost handler within this activation, or
  /// propagate it.
  fn unwind(&mut self, base: usize, err: EvalError) -> Result<Option<Value>, EvalError> {
    let mut err = err;
    if !err.is_catchable() {
      self.frames.truncate(base);
      return Err(err);
    }
    loop {
      if self.frames.len() <= base {
        self.frames.truncate(base);
        return Err(err);
      }
      if let Some(handler) = self.frames.last_mut().unwrap().handlers.pop() {
        let value = self.error_to_value(&err);
        let frame = self.frames.last_mut().unwrap();
        frame.stack.truncate(handler.stack_len as usize);
        frame.scope = handler.scope;
        frame.stack.push(value);
        frame.pc = handler.pc as usize;
        return Ok(None);
      }
      let frame = self.frames.pop().unwrap();
      err = err.with_position(position_of(&frame.icode, frame.pc.saturating_sub(1)));
    }
  }

  /// Execute one instruction of the current frame. Returns `Some(value)`
  /// when the activation completed.
  fn step(&mut self, base: usize) -> Result<Option<Value>, EvalError> {
    // Instruction observation.
    if self.instruction_observer_threshold() > 0 {
      self.instruction_count += 1;
      if self.instruction_count >= self.instruction_observer_threshold() {
        self.observe_instruction_count()?;
      }
    }

    let (op, icode, strict) = {
      let frame = self.frames.last_mut().expect("dispatch without frame");
      if frame.pc >= frame.icode.ops.len() {
        // Defensive: the epilogue always emits a return.
        return self.finish_frame(base, Value::Undefined);
      }
      let op = frame.icode.ops[frame.pc].clone();
      frame.pc += 1;
      (op, frame.icode.clone(), frame.icode.strict)
    };

    macro_rules! frame {
      () => {
        self.frames.last_mut().unwrap()
      };
    }
    macro_rules! pop {
      () => {
        frame!().stack.pop().expect("operand stack underflow")
      };
    }
    macro_rules! push {
      ($v:expr) => {{
        let v = $v;
        frame!().stack.push(v);
      }};
    }

    match op {
      Op::PushNumber(n) => push!(Value::Number(n)),
      Op::PushString(i) => push!(Value::String(icode.string_consts[i as usize].clone())),
      Op::PushBool(b) => push!(Value::Bool(b)),
      Op::PushNull => push!(Value::Null),
      Op::PushUndefined | Op::PushHole => push!(Value::Undefined),
      Op::PushThis => push!(frame!().this_value.clone()),
      Op::NewRegExp(i) => {
        let re = icode.regexps[i as usize].clone();
        let obj = builtins::regexp::new_regexp_object(self, re);
        push!(Value::Object(obj));
      }
      Op::NewArray(n) => {
        let mut elements = Vec::with_capacity(n as usize);
        for _ in 0..n {
          elements.push(pop!());
        }
        elements.reverse();
        let obj = self.new_array(elements);
        push!(Value::Object(obj));
      }
      Op::NewObject(n) => {
        let mut pairs = Vec::with_capacity(n as usize);
        for _ in 0..n {
          let value = pop!();
          let key = pop!();
          pairs.push((key, value));
        }
        pairs.reverse();
        let obj = self.new_object();
        for (key, value) in pairs {
          let key = self.to_property_key(&key)?;
          self.define_property(obj, key, value, crate::object::EMPTY);
        }
        push!(Value::Object(obj));
      }
      Op::MakeClosure(i) => {
        let fn_icode = icode.functions[i as usize].clone();
        let scope = frame!().scope;
        let func = self.make_interpreted_function(fn_icode, scope);
        push!(Value::Object(func));
      }

      Op::Dup => {
        let top = frame!().stack.last().cloned().expect("operand stack underflow");
        push!(top);
      }
      Op::Dup2 => {
        let len = frame!().stack.len();
        let a = frame!().stack[len - 2].clone();
        let b = frame!().stack[len - 1].clone();
        push!(a);
        push!(b);
      }
      Op::Pop => {
        let _ = pop!();
      }
      Op::Swap => {
        let len = frame!().stack.len();
        frame!().stack.swap(len - 1, len - 2);
      }
      Op::Rot3 => {
        // [a, b, c] -> [b, c, a]
        let c = pop!();
        let b = pop!();
        let a = pop!();
        push!(b);
        push!(c);
        push!(a);
      }

      Op::GetName(i) => {
        let name = icode.names[i as usize].clone();
        let scope = frame!().scope;
        match self.name_lookup(scope, &name)? {
          Some((value, _)) => push!(value),
          None => {
            return Err(EvalError::reference_error(format!(
              "\"{}\" is not defined",
              name
            )));
          }
        }
      }
      Op::SetName(i) => {
        let name = icode.names[i as usize].clone();
        let value = pop!();
        let scope = frame!().scope;
        self.name_set(scope, &name, value.clone(), strict)?;
        push!(value);
      }
      Op::BindName(i) => {
        let name = icode.names[i as usize].clone();
        let value = pop!();
        let scope = frame!().scope;
        self.name_set(scope, &name, value, false)?;
      }
      Op::TypeofName(i) => {
        let name = icode.names[i as usize].clone();
        let scope = frame!().scope;
        let result = match self.name_lookup(scope, &name)? {
          Some((value, _)) => self.typeof_value(&value),
          None => "undefined",
        };
        push!(Value::string(result));
      }
      Op::DeleteName(i) => {
        let name = icode.names[i as usize].clone();
        let scope = frame!().scope;
        let deleted = self.name_delete(scope, &name);
        push!(Value::Bool(deleted));
      }

      Op::GetProp(i) => {
        let name = icode.names[i as usize].clone();
        let base = pop!();
        let value = self.get_member(&base, &PropertyKey::from_str(&name))?;
        push!(value);
      }
      Op::SetProp(i) => {
        let name = icode.names[i as usize].clone();
        let value = pop!();
        let base = pop!();
        self.set_member(&base, &PropertyKey::from_str(&name), value.clone(), strict)?;
        push!(value);
      }
      Op::GetElem => {
        let index = pop!();
        let base = pop!();
        let key = self.to_property_key(&index)?;
        let value = self.get_member(&base, &key)?;
        push!(value);
      }
      Op::SetElem => {
        let value = pop!();
        let index = pop!();
        let base = pop!();
        let key = self.to_property_key(&index)?;
        self.set_member(&base, &key, value.clone(), strict)?;
        push!(value);
      }
      Op::DeleteProp(i) => {
        let name = icode.names[i as usize].clone();
        let base = pop!();
        let deleted = match base.as_object() {
          Some(obj) => self.delete_property(obj, &PropertyKey::from_str(&name)),
          None => true,
        };
        push!(Value::Bool(deleted));
      }
      Op::DeleteElem => {
        let index = pop!();
        let base = pop!();
        let key = self.to_property_key(&index)?;
        let deleted = match base.as_object() {
          Some(obj) => self.delete_property(obj, &key),
          None => true,
        };
        push!(Value::Bool(deleted));
      }

      Op::Call(argc) | Op::CallWithThis(argc) => {
        let mut args = Vec::with_capacity(argc as usize);
        for _ in 0..argc {
          args.push(pop!());
        }
        args.reverse();
        let callee = pop!();
        let this = if matches!(op, Op::CallWithThis(_)) {
          pop!()
        } else {
          Value::Undefined
        };
        self.invoke(base, callee, this, args)?;
      }
      Op::New(argc) => {
        let mut args = Vec::with_capacity(argc as usize);
        for _ in 0..argc {
          args.push(pop!());
        }
        args.reverse();
        let callee = pop!();
        self.invoke_new(base, callee, args)?;
      }

      Op::Return => {
        let value = pop!();
        return self.finish_frame(base, value);
      }
      Op::ReturnUndefined => {
        return self.finish_frame(base, Value::Undefined);
      }
      Op::Throw => {
        let value = pop!();
        let position = position_of(&icode, frame!().pc.saturating_sub(1));
        return Err(EvalError::Thrown { value, position });
      }
      Op::Rethrow => {
        let value = pop!();
        let position = position_of(&icode, frame!().pc.saturating_sub(1));
        return Err(EvalError::Thrown { value, position });
      }

      Op::PushHandler(pc) => {
        let frame = frame!();
        let entry = HandlerEntry {
          pc,
          stack_len: frame.stack.len() as u32,
          scope: frame.scope,
        };
        frame.handlers.push(entry);
      }
      Op::PopHandler => {
        frame!().handlers.pop().expect("handler stack underflow");
      }
      Op::EnterCatch(i) => {
        let name = icode.names[i as usize].clone();
        let value = pop!();
        let parent = frame!().scope;
        let mut scope = ScriptObject::standard(None);
        scope.parent_scope = Some(parent);
        let scope = self.heap.alloc(scope);
        self.define_property(scope, PropertyKey::from_str(&name), value, PERMANENT);
        frame!().scope = scope;
      }

      Op::EnumInit => {
        let value = pop!();
        let state = match &value {
          Value::Object(obj) => EnumState {
            keys: self.enum_keys(*obj),
            index: 0,
            obj: Some(*obj),
          },
          Value::String(s) => EnumState {
            keys: (0..s.len_code_units())
              .map(|i| JsString::from_str(&i.to_string()))
              .collect(),
            index: 0,
            obj: None,
          },
          _ => EnumState {
            keys: Vec::new(),
            index: 0,
            obj: None,
          },
        };
        frame!().enums.push(state);
      }
      Op::EnumNext(target) => loop {
        let (key, done) = {
          let frame = self.frames.last_mut().unwrap();
          let state = frame.enums.last_mut().expect("enum stack underflow");
          match state.keys.get(state.index) {
            Some(key) => {
              state.index += 1;
              (Some(key.clone()), false)
            }
            None => (None, true),
          }
        };
        if done {
          frame!().pc = target as usize;
          break;
        }
        let key = key.unwrap();
        // Skip keys deleted while iterating.
        let obj = self.frames.last().unwrap().enums.last().unwrap().obj;
        if let Some(obj) = obj {
          if !self.has_property(obj, &PropertyKey::from_js_string(&key)) {
            continue;
          }
        }
        push!(Value::String(key));
        break;
      },
      Op::EnumDone => {
        frame!().enums.pop().expect("enum stack underflow");
      }

      Op::EnterWith => {
        let value = pop!();
        let Some(target) = value.as_object() else {
          return Err(EvalError::type_error("with target must be an object"));
        };
        let parent = frame!().scope;
        let mut scope = ScriptObject::new(ObjectKind::With { target }, None);
        scope.parent_scope = Some(parent);
        let scope = self.heap.alloc(scope);
        frame!().scope = scope;
      }
      Op::LeaveWith => {
        let scope = frame!().scope;
        let parent = self
          .heap
          .get(scope)
          .parent_scope
          .expect("leaving scope without parent");
        frame!().scope = parent;
      }

      Op::StoreResult => {
        let value = pop!();
        frame!().script_result = value;
      }
      Op::PushResult => {
        let value = frame!().script_result.clone();
        push!(value);
      }
      Op::Debugger => {}

      // Operators.
      Op::Add => {
        let b = pop!();
        let a = pop!();
        let pa = self.to_primitive(&a, false)?;
        let pb = self.to_primitive(&b, false)?;
        if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
          let sa = self.to_string_value(&pa)?;
          let sb = self.to_string_value(&pb)?;
          push!(Value::String(sa.concat(&sb)));
        } else {
          let na = self.to_number_value(&pa)?;
          let nb = self.to_number_value(&pb)?;
          push!(Value::Number(na + nb));
        }
      }
      Op::Sub | Op::Mul | Op::Div | Op::Mod => {
        let b = pop!();
        let a = pop!();
        let na = self.to_number_value(&a)?;
        let nb = self.to_number_value(&b)?;
        let result = match op {
          Op::Sub => na - nb,
          Op::Mul => na * nb,
          Op::Div => na / nb,
          Op::Mod => na % nb,
          _ => unreachable!(),
        };
        push!(Value::Number(result));
      }
      Op::BitAnd | Op::BitOr | Op::BitXor | Op::Shl | Op::Shr => {
        let b = pop!();
        let a = pop!();
        let ia = to_int32(self.to_number_value(&a)?);
        let ib = to_int32(self.to_number_value(&b)?);
        let result = match op {
          Op::BitAnd => ia & ib,
          Op::BitOr => ia | ib,
          Op::BitXor => ia ^ ib,
          Op::Shl => ia.wrapping_shl(ib as u32 & 31),
          Op::Shr => ia.wrapping_shr(ib as u32 & 31),
          _ => unreachable!(),
        };
        push!(Value::Number(result as f64));
      }
      Op::Ushr => {
        let b = pop!();
        let a = pop!();
        let ua = to_uint32(self.to_number_value(&a)?);
        let ib = to_uint32(self.to_number_value(&b)?);
        push!(Value::Number(ua.wrapping_shr(ib & 31) as f64));
      }
      Op::Eq => {
        let b = pop!();
        let a = pop!();
        let eq = self.loose_equals(&a, &b)?;
        push!(Value::Bool(eq));
      }
      Op::Ne => {
        let b = pop!();
        let a = pop!();
        let eq = self.loose_equals(&a, &b)?;
        push!(Value::Bool(!eq));
      }
      Op::StrictEq => {
        let b = pop!();
        let a = pop!();
        let eq = self.strict_equals(&a, &b);
        push!(Value::Bool(eq));
      }
      Op::StrictNe => {
        let b = pop!();
        let a = pop!();
        let eq = self.strict_equals(&a, &b);
        push!(Value::Bool(!eq));
      }
      Op::Lt | Op::Gt | Op::Le | Op::Ge => {
        let b = pop!();
        let a = pop!();
        let pa = self.to_primitive(&a, false)?;
        let pb = self.to_primitive(&b, false)?;
        let result = if let (Value::String(sa), Value::String(sb)) = (&pa, &pb) {
          let ord = sa.as_code_units().cmp(sb.as_code_units());
          match op {
            Op::Lt => ord.is_lt(),
            Op::Gt => ord.is_gt(),
            Op::Le => ord.is_le(),
            Op::Ge => ord.is_ge(),
            _ => unreachable!(),
          }
        } else {
          let na = self.to_number_value(&pa)?;
          let nb = self.to_number_value(&pb)?;
          match op {
            Op::Lt => na < nb,
            Op::Gt => na > nb,
            Op::Le => na <= nb,
            Op::Ge => na >= nb,
            _ => unreachable!(),
          }
        };
        push!(Value::Bool(result));
      }
      Op::In => {
        let b = pop!();
        let a = pop!();
        let Some(obj) = b.as_object() else {
          return Err(EvalError::type_error(
            "right-hand side of `in` is not an object",
          ));
        };
        let key = self.to_property_key(&a)?;
        push!(Value::Bool(self.has_property(obj, &key)));
      }
      Op::Instanceof => {
        let b = pop!();
        let a = pop!();
        let result = self.instanceof(&a, &b)?;
        push!(Value::Bool(result));
      }
      Op::Not => {
        let a = pop!();
        push!(Value::Bool(!a.to_boolean()));
      }
      Op::BitNot => {
        let a = pop!();
        let ia = to_int32(self.to_number_value(&a)?);
        push!(Value::Number(!ia as f64));
      }
      Op::Neg => {
        let a = pop!();
        let na = self.to_number_value(&a)?;
        push!(Value::Number(-na));
      }
      Op::Pos => {
        let a = pop!();
        let na = self.to_number_value(&a)?;
        push!(Value::Number(na));
      }
      Op::TypeofValue => {
        let a = pop!();
        push!(Value::string(self.typeof_value(&a)));
      }

      Op::Jump(target) => {
        frame!().pc = target as usize;
      }
      Op::JumpIfFalse(target) => {
        let a = pop!();
        if !a.to_boolean() {
          frame!().pc = target as usize;
        }
      }
      Op::JumpIfTrue(target) => {
        let a = pop!();
        if a.to_boolean() {
          frame!().pc = target as usize;
        }
      }
    }
    Ok(None)
  }

  /// Invoke a callable from the dispatch loop. Interpreted callees become a
  /// new frame (no host recursion); native callees run inline and their
  /// result is pushed.
  fn invoke(
    &mut self,
    _base: usize,
    callee: Value,
    this: Value,
    args: Vec<Value>,
  ) -> Result<(), EvalError> {
    let Some(obj) = callee.as_object() else {
      return Err(self.not_a_function_error(&callee));
    };
    let data = match &self.heap.get(obj).kind {
      ObjectKind::Function(data) => data,
      _ => return Err(self.not_a_function_error(&callee)),
    };
    match data {
      FunctionData::Native { func, .. } => {
        let func = *func;
        let result = func(self, this, &args, false)?;
        self.frames.last_mut().unwrap().stack.push(result);
      }
      FunctionData::IdMethod { tag, id, .. } => {
        let (tag, id) = (*tag, *id);
        let result = builtins::dispatch_id_call(self, tag, id, this, &args)?;
        self.frames.last_mut().unwrap().stack.push(result);
      }
      FunctionData::Interpreted { icode, scope } => {
        let (icode, scope) = (icode.clone(), *scope);
        let this = self.coerce_this(&icode, this);
        let activation = self.make_activation(&icode, scope, &args)?;
        self.check_frame_depth()?;
        self.frames.push(Frame::new(icode, activation, this));
      }
    }
    Ok(())
  }

  fn invoke_new(&mut self, _base: usize, callee: Value, args: Vec<Value>) -> Result<(), EvalError> {
    let Some(obj) = callee.as_object() else {
      return Err(self.not_a_function_error(&callee));
    };
    let data = match &self.heap.get(obj).kind {
      ObjectKind::Function(data) => data,
      _ => return Err(self.not_a_function_error(&callee)),
    };
    match data {
      FunctionData::Native {
        func,
        constructable,
        ..
      } => {
        if !constructable {
          return Err(EvalError::type_error("function is not a constructor"));
        }
        let func = *func;
        let result = func(self, Value::Undefined, &args, true)?;
        self.frames.last_mut().unwrap().stack.push(result);
      }
      FunctionData::IdMethod { .. } => {
        return Err(EvalError::type_error("function is not a constructor"));
      }
      FunctionData::Interpreted { icode, scope } => {
        let (icode, scope) = (icode.clone(), *scope);
        let instance = self.make_instance_for(obj)?;
        let activation = self.make_activation(&icode, scope, &args)?;
        self.check_frame_depth()?;
        let mut frame = Frame::new(icode, activation, Value::Object(instance));
        frame.construct_this = Some(instance);
        self.frames.push(frame);
      }
    }
    Ok(())
  }

  fn not_a_function_error(&mut self, callee: &Value) -> EvalError {
    let description = self
      .to_string_value(callee)
      .map(|s| s.to_utf8_lossy())
      .unwrap_or_else(|_| "value".to_string());
    EvalError::type_error(format!("{} is not a function", description))
  }

  /// Complete the current frame with `value`; either finish the activation
  /// or deliver the result to the calling frame.
  fn finish_frame(&mut self, base: usize, value: Value) -> Result<Option<Value>, EvalError> {
    let frame = self.frames.pop().expect("finishing without frame");
    let value = match frame.construct_this {
      Some(instance) if !matches!(value, Value::Object(_)) => Value::Object(instance),
      _ => value,
    };
    if self.frames.len() == base {
      return Ok(Some(value));
    }
    self.frames.last_mut().unwrap().stack.push(value);
    Ok(None)
  }
}

pub(crate) fn position_of(icode: &Icode, pc: usize) -> SourcePosition {
  let line_number = icode.line_at(pc);
  let line_source = icode.raw_source.as_ref().and_then(|source| {
    source
      .lines()
      .nth(line_number.saturating_sub(icode.base_lineno) as usize)
      .map(|l| l.to_string())
  });
  SourcePosition {
    source_name: Some(icode.source_name.to_string()),
    line_number,
    line_source,
    line_offset: 0,
  }
}
