use crate::error::RegExpError;
use crate::error::RegExpErrorKind;
use crate::flags::RegExpFlags;
use crate::parse::ClassItem;
use crate::parse::ClassSet;
use crate::parse::PatternParser;
use crate::parse::ReNode;
use crate::unicode::canonicalize;

/// Instruction-count ceiling per compiled program. Bounded-repeat expansion
/// can multiply the body; exceeding the ceiling is a compile error rather
/// than unbounded memory growth.
const MAX_INSTS: usize = 1 << 14;

/// One opcode of a compiled pattern.
#[derive(Clone, Debug)]
pub enum Inst {
  /// Match one input atom exactly (case-canonicalized when folding).
  Atom { value: u32 },
  /// Match one input atom against a class table entry.
  Class { index: u16 },
  /// `.`
  Any,
  Bol,
  Eol,
  WordBoundary,
  NotWordBoundary,
  /// Record the current position in a capture slot.
  Save { slot: u16 },
  /// Try `primary` first; on backtrack, resume at `secondary`.
  Split { primary: u32, secondary: u32 },
  Jump { target: u32 },
  /// Match the text most recently captured by a group (empty if unset).
  Backref { group: u16 },
  /// Record the current position in a loop-progress register.
  Mark { reg: u16 },
  /// Fail this path if no input was consumed since the matching `Mark`.
  Progress { reg: u16 },
  /// Run a lookaround subprogram.
  Look {
    behind: bool,
    negated: bool,
    index: u16,
  },
}

/// Predicates usable inside character classes.
#[derive(Copy, Clone, Debug)]
pub enum ClassPred {
  Digit,
  NotDigit,
  Space,
  NotSpace,
  Word,
  NotWord,
}

/// A character class, preprocessed for matching. Case-fold variants are
/// materialized at compile time so the matcher only does containment tests.
#[derive(Clone, Debug)]
pub struct CompiledClass {
  pub negated: bool,
  pub ranges: Vec<(u32, u32)>,
  pub preds: Vec<ClassPred>,
}

impl CompiledClass {
  fn add_atom(&mut self, atom: u32, fold: bool, unicode: bool) {
    self.ranges.push((atom, atom));
    if fold {
      for variant in case_variants(atom, unicode) {
        self.ranges.push((variant, variant));
      }
    }
  }
}

/// An executable pattern program. Lookarounds are separate subprograms that
/// share the capture slot space of their parent.
#[derive(Clone, Debug)]
pub struct Program {
  pub insts: Vec<Inst>,
  pub classes: Vec<CompiledClass>,
  pub subprograms: Vec<Program>,
  pub marks: usize,
}

/// A compiled regular expression: original source, flags, capture-group
/// count, and the opcode program. Immutable after compilation.
#[derive(Debug)]
pub struct RECompiled {
  pub source: Box<[u16]>,
  pub flags: RegExpFlags,
  pub paren_count: u32,
  pub program: Program,
}

impl RECompiled {
  pub fn compile(pattern: &[u16], flags: RegExpFlags) -> Result<RECompiled, RegExpError> {
    let mut parser = PatternParser::new(pattern, flags);
    let node = parser.parse()?;
    let paren_count = parser.total_groups();
    let program = Compiler::new(flags).compile(&node)?;
    Ok(RECompiled {
      source: pattern.to_vec().into_boxed_slice(),
      flags,
      paren_count,
      program,
    })
  }

  /// The pattern source as it was given (no delimiters).
  pub fn source_units(&self) -> &[u16] {
    &self.source
  }
}

struct Compiler {
  flags: RegExpFlags,
  insts: Vec<Inst>,
  classes: Vec<CompiledClass>,
  subprograms: Vec<Program>,
  marks: usize,
}

impl Compiler {
  fn new(flags: RegExpFlags) -> Self {
    Self {
      flags,
      insts: Vec::new(),
      classes: Vec::new(),
      subprograms: Vec::new(),
      marks: 0,
    }
  }

  fn compile(mut self, node: &ReNode) -> Result<Program, RegExpError> {
    self.emit(node)?;
    Ok(Program {
      insts: self.insts,
      classes: self.classes,
      subprograms: self.subprograms,
      marks: self.marks,
    })
  }

  fn push(&mut self, inst: Inst) -> Result<u32, RegExpError> {
    if self.insts.len() >= MAX_INSTS {
      return Err(RegExpError::new(
        RegExpErrorKind::TooLarge,
        "regular expression too large",
        0,
      ));
    }
    self.insts.push(inst);
    Ok((self.insts.len() - 1) as u32)
  }

  fn here(&self) -> u32 {
    self.insts.len() as u32
  }

  fn patch_split_secondary(&mut self, at: u32, target: u32) {
    let Inst::Split { secondary, .. } = &mut self.insts[at as usize] else {
      unreachable!("patch target is not a split");
    };
    *secondary = target;
  }

  fn patch_split_primary(&mut self, at: u32, target: u32) {
    let Inst::Split { primary, .. } = &mut self.insts[at as usize] else {
      unreachable!("patch target is not a split");
    };
    *primary = target;
  }

  fn patch_jump(&mut self, at: u32, target: u32) {
    let Inst::Jump { target: t } = &mut self.insts[at as usize] else {
      unreachable!("patch target is not a jump");
    };
    *t = target;
  }

  fn emit(&mut self, node: &ReNode) -> Result<(), RegExpError> {
    match node {
      ReNode::Empty => {}
      ReNode::Atom(value) => {
        let value = if self.flags.has(RegExpFlags::FOLD) {
          canonicalize(*value, self.flags.has(RegExpFlags::UNICODE))
        } else {
          *value
        };
        self.push(Inst::Atom { value })?;
      }
      ReNode::Class(set) => {
        let index = self.compile_class(set)? as u16;
        self.push(Inst::Class { index })?;
      }
      ReNode::Any => {
        self.push(Inst::Any)?;
      }
      ReNode::Bol => {
        self.push(Inst::Bol)?;
      }
      ReNode::Eol => {
        self.push(Inst::Eol)?;
      }
      ReNode::WordBoundary => {
        self.push(Inst::WordBoundary)?;
      }
      ReNode::NotWordBoundary => {
        self.push(Inst::NotWordBoundary)?;
      }
      ReNode::Concat(parts) => {
        for part in parts {
          self.emit(part)?;
        }
      }
      ReNode::Alternation(alternatives) => {
        self.emit_alternation(alternatives)?;
      }
      ReNode::Group { index, body } => {
        if let Some(index) = index {
          self.push(Inst::Save {
            slot: ((index - 1) * 2) as u16,
          })?;
          self.emit(body)?;
          self.push(Inst::Save {
            slot: ((index - 1) * 2 + 1) as u16,
          })?;
        } else {
          self.emit(body)?;
        }
      }
      ReNode::Backref(group) => {
        self.push(Inst::Backref {
          group: *group as u16,
        })?;
      }
      ReNode::Lookahead { negated, body } => {
        let index = self.compile_subprogram(body)?;
        self.push(Inst::Look {
          behind: false,
          negated: *negated,
          index,
        })?;
      }
      ReNode::Lookbehind { negated, body } => {
        let index = self.compile_subprogram(body)?;
        self.push(Inst::Look {
          behind: true,
          negated: *negated,
          index,
        })?;
      }
      ReNode::Repeat {
        body,
        min,
        max,
        greedy,
      } => {
        self.emit_repeat(body, *min, *max, *greedy)?;
      }
    }
    Ok(())
  }

  fn emit_alternation(&mut self, alternatives: &[ReNode]) -> Result<(), RegExpError> {
    debug_assert!(alternatives.len() >= 2);
    let mut end_jumps = Vec::new();
    for (i, alternative) in alternatives.iter().enumerate() {
      if i + 1 < alternatives.len() {
        let split = self.push(Inst::Split {
          primary: self.here() + 1,
          secondary: 0,
        })?;
        self.emit(alternative)?;
        end_jumps.push(self.push(Inst::Jump { target: 0 })?);
        let next = self.here();
        self.patch_split_secondary(split, next);
      } else {
        self.emit(alternative)?;
      }
    }
    let end = self.here();
    for jump in end_jumps {
      self.patch_jump(jump, end);
    }
    Ok(())
  }

  fn emit_repeat(
    &mut self,
    body: &ReNode,
    min: u32,
    max: Option<u32>,
    greedy: bool,
  ) -> Result<(), RegExpError> {
    for _ in 0..min {
      self.emit(body)?;
    }
    match max {
      None => self.emit_star(body, greedy),
      Some(max) => self.emit_optional_chain(body, max - min, greedy),
    }
  }

  /// `body*`: a split/loop with a progress guard when the body can match
  /// empty (otherwise `(a?)*`-style loops would never terminate).
  fn emit_star(&mut self, body: &ReNode, greedy: bool) -> Result<(), RegExpError> {
    let guard = can_match_empty(body).then(|| {
      let reg = self.marks as u16;
      self.marks += 1;
      reg
    });
    let top = self.here();
    let split = self.push(Inst::Split {
      primary: 0,
      secondary: 0,
    })?;
    let body_start = self.here();
    if let Some(reg) = guard {
      self.push(Inst::Mark { reg })?;
    }
    self.emit(body)?;
    if let Some(reg) = guard {
      self.push(Inst::Progress { reg })?;
    }
    self.push(Inst::Jump { target: top })?;
    let after = self.here();
    if greedy {
      self.patch_split_primary(split, body_start);
      self.patch_split_secondary(split, after);
    } else {
      self.patch_split_primary(split, after);
      self.patch_split_secondary(split, body_start);
    }
    Ok(())
  }

  /// `body{0,count}` as nested optionals, so each iteration commits before
  /// the next may begin.
  fn emit_optional_chain(
    &mut self,
    body: &ReNode,
    count: u32,
    greedy: bool,
  ) -> Result<(), RegExpError> {
    if count == 0 {
      return Ok(());
    }
    let split = self.push(Inst::Split {
      primary: 0,
      secondary: 0,
    })?;
    let body_start = self.here();
    self.emit(body)?;
    self.emit_optional_chain(body, count - 1, greedy)?;
    let after = self.here();
    if greedy {
      self.patch_split_primary(split, body_start);
      self.patch_split_secondary(split, after);
    } else {
      self.patch_split_primary(split, after);
      self.patch_split_secondary(split, body_start);
    }
    Ok(())
  }

  fn compile_subprogram(&mut self, body: &ReNode) -> Result<u16, RegExpError> {
    let program = Compiler::new(self.flags).compile(body)?;
    self.subprograms.push(program);
    Ok((self.subprograms.len() - 1) as u16)
  }

  fn compile_class(&mut self, set: &ClassSet) -> Result<usize, RegExpError> {
    let fold = self.flags.has(RegExpFlags::FOLD);
    let unicode = self.flags.has(RegExpFlags::UNICODE);
    let mut compiled = CompiledClass {
      negated: set.negated,
      ranges: Vec::new(),
      preds: Vec::new(),
    };
    for item in &set.items {
      match item {
        ClassItem::Atom(atom) => compiled.add_atom(*atom, fold, unicode),
        ClassItem::Range(lo, hi) => {
          compiled.ranges.push((*lo, *hi));
          if fold {
            // Materialize case variants: per-character for small ranges, and
            // the ASCII letter counterparts for large ones.
            if hi - lo <= 0x400 {
              for atom in *lo..=*hi {
                for variant in case_variants(atom, unicode) {
                  compiled.ranges.push((variant, variant));
                }
              }
            } else {
              for (a_lo, a_hi, b_lo) in [('a', 'z', 'A'), ('A', 'Z', 'a')] {
                let (a_lo, a_hi, b_lo) = (a_lo as u32, a_hi as u32, b_lo as u32);
                let o_lo = (*lo).max(a_lo);
                let o_hi = (*hi).min(a_hi);
                if o_lo <= o_hi {
                  compiled.ranges.push((b_lo + (o_lo - a_lo), b_lo + (o_hi - a_lo)));
                }
              }
            }
          }
        }
        ClassItem::Digit => compiled.preds.push(ClassPred::Digit),
        ClassItem::NotDigit => compiled.preds.push(ClassPred::NotDigit),
        ClassItem::Space => compiled.preds.push(ClassPred::Space),
        ClassItem::NotSpace => compiled.preds.push(ClassPred::NotSpace),
        ClassItem::Word => compiled.preds.push(ClassPred::Word),
        ClassItem::NotWord => compiled.preds.push(ClassPred::NotWord),
      }
    }
    self.classes.push(compiled);
    Ok(self.classes.len() - 1)
  }
}

/// Case variants of an atom, for compile-time class expansion.
fn case_variants(atom: u32, unicode: bool) -> Vec<u32> {
  let mut out = Vec::new();
  let Some(c) = char::from_u32(atom) else {
    return out;
  };
  let mut push = |v: char| {
    if v as u32 != atom {
      out.push(v as u32);
    }
  };
  let mut upper = c.to_uppercase();
  if let (Some(u), None) = (upper.next(), upper.next()) {
    push(u);
  }
  let mut lower = c.to_lowercase();
  if let (Some(l), None) = (lower.next(), lower.next()) {
    push(l);
  }
  if !unicode {
    // The legacy rule never folds non-ASCII onto ASCII; drop such variants.
    out.retain(|&v| !(atom >= 128 && v < 128));
  }
  out
}

/// Whether a pattern node can match the empty string, used to decide if loop
/// bodies need progress guards.
fn can_match_empty(node: &ReNode) -> bool {
  match node {
    ReNode::Empty
    | ReNode::Bol
    | ReNode::Eol
    | ReNode::WordBoundary
    | ReNode::NotWordBoundary
    | ReNode::Backref(_)
    | ReNode::Lookahead { .. }
    | ReNode::Lookbehind { .. } => true,
    ReNode::Atom(_) | ReNode::Class(_) | ReNode::Any => false,
    ReNode::Concat(parts) => parts.iter().all(can_match_empty),
    ReNode::Alternation(alternatives) => alternatives.iter().any(can_match_empty),
    ReNode::Group { body, .. } => can_match_empty(body),
    ReNode::Repeat { body, min, .. } => *min == 0 || can_match_empty(body),
  }
}
