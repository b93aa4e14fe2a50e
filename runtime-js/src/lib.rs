//! Embeddable JavaScript runtime for the serrano engine.
//!
//! This crate is the core a host links against to evaluate script fragments
//! against its own global scope. It provides:
//! - The per-thread [`Context`] lifecycle (enter/exit nesting, sealing,
//!   feature flags, microtask queue, continuation capture)
//! - The compilation pipeline (parse → IR → icode) and the frame-based
//!   interpreter that executes it
//! - The scope/object model (property maps with attribute bitmaps, prototype
//!   chains, id-dispatched builtins)
//! - The RegExp script-object surface over the `regexp-js` engine
//!
//! # Threading
//!
//! A context is bound to at most one thread between `enter` and the matching
//! `exit`. Contexts share no mutable state; the only process-global state is
//! the write-once security controller and regexp loader registries.
//!
//! # Object lifetimes
//!
//! Script objects live in a per-context slot table addressed by handles;
//! prototype and scope links are handles, not owning pointers, and the whole
//! table is released with its context.

mod builtins;
mod codegen;
mod compile;
mod context;
mod continuation;
mod debug;
mod error;
mod factory;
mod function;
mod heap;
mod hooks;
mod icode;
mod interpreter;
mod ir;
mod object;
mod object_ops;
mod realm;
mod rejection;
mod reporter;
mod security;
mod string;
mod value;

pub use crate::compile::CompilerEnv;
pub use crate::compile::Evaluator;
pub use crate::compile::InterpreterCompiler;
pub use crate::compile::Script;
pub use crate::context::ClassShutterSetter;
pub use crate::context::Context;
pub use crate::context::ContextError;
pub use crate::context::ContextId;
pub use crate::context::Feature;
pub use crate::context::LanguageVersion;
pub use crate::context::Microtask;
pub use crate::context::SealKey;
pub use crate::continuation::NativeContinuation;
pub use crate::debug::DebuggableScript;
pub use crate::error::ContinuationPending;
pub use crate::error::EcmaErrorKind;
pub use crate::error::EvalError;
pub use crate::error::SourcePosition;
pub use crate::factory::ContextFactory;
pub use crate::factory::ContextListener;
pub use crate::factory::FactoryHooks;
pub use crate::function::BuiltinTag;
pub use crate::function::NativeFn;
pub use crate::heap::JsObject;
pub use crate::heap::SymbolId;
pub use crate::hooks::Debugger;
pub use crate::hooks::DefaultWrapFactory;
pub use crate::hooks::HostValue;
pub use crate::hooks::ModuleLoader;
pub use crate::hooks::WrapFactory;
pub use crate::object::PropertyKey;
pub use crate::object::DONTENUM;
pub use crate::object::PERMANENT;
pub use crate::object::READONLY;
pub use crate::rejection::UnhandledRejectionTracker;
pub use crate::reporter::DefaultErrorReporter;
pub use crate::reporter::ErrorReporter;
pub use crate::security::init_global_security_controller;
pub use crate::security::init_regexp_loader;
pub use crate::security::ClassShutter;
pub use crate::security::RegExpLoader;
pub use crate::security::RegExpProxy;
pub use crate::security::SecurityController;
pub use crate::string::JsString;
pub use crate::value::Value;
