//! JavaScript-flavor regular expression engine.
//!
//! This crate is self-contained: it knows nothing about script objects or
//! prototypes. It compiles a pattern + flag string into an immutable
//! [`RECompiled`] program and executes that program against UTF-16 code-unit
//! input with an explicit backtracking stack.
//!
//! - Input and all reported indices are **UTF-16 code units** (the string
//!   model of the language being implemented), not bytes or `char`s.
//! - The `u`/`v` flags switch the engine into full-unicode mode, where
//!   surrogate pairs are treated as single atoms.
//! - Backtracking is bounded by a step budget; a pathological pattern fails
//!   with [`MatchError::BudgetExceeded`] instead of exhausting the host
//!   stack.

mod compile;
mod error;
mod exec;
mod flags;
mod parse;
mod unicode;

pub use crate::compile::RECompiled;
pub use crate::error::MatchError;
pub use crate::error::RegExpError;
pub use crate::error::RegExpErrorKind;
pub use crate::exec::ExecOptions;
pub use crate::exec::ReMatch;
pub use crate::flags::parse_flags;
pub use crate::flags::RegExpFlags;
pub use crate::unicode::advance_string_index;

/// Compile a pattern given as UTF-16 code units.
pub fn compile(pattern: &[u16], flags: RegExpFlags) -> Result<RECompiled, RegExpError> {
  RECompiled::compile(pattern, flags)
}

/// Compile a pattern and flag string given as Rust strings.
pub fn compile_str(pattern: &str, flags: &str) -> Result<RECompiled, RegExpError> {
  let flags = parse_flags(flags)?;
  let units: Vec<u16> = pattern.encode_utf16().collect();
  RECompiled::compile(&units, flags)
}
