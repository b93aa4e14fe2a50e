use crate::compile::ClassPred;
use crate::compile::CompiledClass;
use crate::compile::Inst;
use crate::compile::Program;
use crate::compile::RECompiled;
use crate::error::MatchError;
use crate::flags::RegExpFlags;
use crate::unicode::atom_at;
use crate::unicode::canonicalize;
use crate::unicode::is_digit_atom;
use crate::unicode::is_line_terminator;
use crate::unicode::is_space_atom;
use crate::unicode::is_word_atom;

/// Execution knobs supplied by the caller.
#[derive(Clone, Copy, Debug)]
pub struct ExecOptions {
  /// Treat `^`/`$` as multiline even when the pattern lacks the `m` flag
  /// (the legacy `RegExp.multiline` setting).
  pub force_multiline: bool,
  /// Backtracking step budget for one `find` call.
  pub budget: u64,
}

impl Default for ExecOptions {
  fn default() -> Self {
    Self {
      force_multiline: false,
      budget: 1_000_000,
    }
  }
}

/// A successful match: overall bounds plus per-group capture bounds, all in
/// code units. `captures[i]` is group `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReMatch {
  pub start: usize,
  pub end: usize,
  pub captures: Vec<Option<(usize, usize)>>,
}

impl RECompiled {
  /// Search for a match starting at or after `start` (exactly at `start`
  /// when the pattern is sticky).
  pub fn find(
    &self,
    input: &[u16],
    start: usize,
    options: &ExecOptions,
  ) -> Result<Option<ReMatch>, MatchError> {
    let mut matcher = Matcher {
      input,
      fold: self.flags.has(RegExpFlags::FOLD),
      unicode: self.flags.has(RegExpFlags::UNICODE),
      dotall: self.flags.has(RegExpFlags::DOTALL),
      multiline: self.flags.has(RegExpFlags::MULTILINE) || options.force_multiline,
      budget: options.budget,
    };
    let sticky = self.flags.has(RegExpFlags::STICKY);
    let slots = (self.paren_count as usize) * 2;

    let mut attempt = start.min(input.len());
    loop {
      let mut caps: Vec<isize> = vec![-1; slots];
      if let Some(end) = matcher.match_program(&self.program, attempt, &mut caps, None)? {
        let captures = caps
          .chunks_exact(2)
          .map(|pair| match pair {
            [s, e] if *s >= 0 && *e >= *s => Some((*s as usize, *e as usize)),
            _ => None,
          })
          .collect();
        return Ok(Some(ReMatch {
          start: attempt,
          end,
          captures,
        }));
      }
      if sticky || attempt >= input.len() {
        return Ok(None);
      }
      attempt += 1;
    }
  }
}

struct Backtrack {
  pc: usize,
  pos: usize,
  caps: Vec<isize>,
  marks: Vec<usize>,
}

struct Matcher<'a> {
  input: &'a [u16],
  fold: bool,
  unicode: bool,
  dotall: bool,
  multiline: bool,
  budget: u64,
}

impl<'a> Matcher<'a> {
  /// Run `program` from `pos`. Returns the end position of a successful
  /// match. When `require_end` is set, only paths ending exactly there
  /// succeed (used for lookbehind).
  fn match_program(
    &mut self,
    program: &Program,
    pos: usize,
    caps: &mut Vec<isize>,
    require_end: Option<usize>,
  ) -> Result<Option<usize>, MatchError> {
    let insts = &program.insts;
    let mut stack: Vec<Backtrack> = Vec::new();
    let mut marks: Vec<usize> = vec![usize::MAX; program.marks];
    let mut pc = 0usize;
    let mut pos = pos;

    macro_rules! backtrack {
      () => {
        match stack.pop() {
          Some(entry) => {
            pc = entry.pc;
            pos = entry.pos;
            *caps = entry.caps;
            marks = entry.marks;
            continue;
          }
          None => return Ok(None),
        }
      };
    }

    loop {
      if self.budget == 0 {
        return Err(MatchError::BudgetExceeded);
      }
      self.budget -= 1;

      if pc == insts.len() {
        match require_end {
          Some(end) if pos != end => backtrack!(),
          _ => return Ok(Some(pos)),
        }
      }

      match &insts[pc] {
        Inst::Atom { value } => match atom_at(self.input, pos, self.unicode) {
          Some((atom, width)) if self.atom_eq(atom, *value) => {
            pos += width;
            pc += 1;
          }
          _ => backtrack!(),
        },
        Inst::Class { index } => match atom_at(self.input, pos, self.unicode) {
          Some((atom, width)) if class_matches(&program.classes[*index as usize], atom) => {
            pos += width;
            pc += 1;
          }
          _ => backtrack!(),
        },
        Inst::Any => match atom_at(self.input, pos, self.unicode) {
          Some((atom, width)) if self.dotall || !is_line_terminator(atom) => {
            pos += width;
            pc += 1;
          }
          _ => backtrack!(),
        },
        Inst::Bol => {
          let at_bol = pos == 0
            || (self.multiline && is_line_terminator(self.input[pos - 1] as u32));
          if at_bol {
            pc += 1;
          } else {
            backtrack!()
          }
        }
        Inst::Eol => {
          let at_eol = pos == self.input.len()
            || (self.multiline && is_line_terminator(self.input[pos] as u32));
          if at_eol {
            pc += 1;
          } else {
            backtrack!()
          }
        }
        Inst::WordBoundary => {
          if self.word_boundary_at(pos) {
            pc += 1;
          } else {
            backtrack!()
          }
        }
        Inst::NotWordBoundary => {
          if !self.word_boundary_at(pos) {
            pc += 1;
          } else {
            backtrack!()
          }
        }
        Inst::Save { slot } => {
          caps[*slot as usize] = pos as isize;
          pc += 1;
        }
        Inst::Split { primary, secondary } => {
          stack.push(Backtrack {
            pc: *secondary as usize,
            pos,
            caps: caps.clone(),
            marks: marks.clone(),
          });
          pc = *primary as usize;
        }
        Inst::Jump { target } => {
          pc = *target as usize;
        }
        Inst::Backref { group } => {
          let slot = ((*group - 1) * 2) as usize;
          let (s, e) = (caps[slot], caps[slot + 1]);
          if s < 0 || e < s {
            // An unset capture matches the empty string.
            pc += 1;
            continue;
          }
          match self.backref_len_at(pos, s as usize, e as usize) {
            Some(len) => {
              pos += len;
              pc += 1;
            }
            None => backtrack!(),
          }
        }
        Inst::Mark { reg } => {
          marks[*reg as usize] = pos;
          pc += 1;
        }
        Inst::Progress { reg } => {
          if marks[*reg as usize] == pos {
            backtrack!()
          }
          pc += 1;
        }
        Inst::Look {
          behind,
          negated,
          index,
        } => {
          let sub = &program.subprograms[*index as usize];
          let matched = if *behind {
            self.match_behind(sub, pos, caps)?
          } else {
            let mut sub_caps = caps.clone();
            match self.match_program(sub, pos, &mut sub_caps, None)? {
              Some(_) => Some(sub_caps),
              None => None,
            }
          };
          match (matched, *negated) {
            (Some(sub_caps), false) => {
              // Captures made inside a positive lookaround persist.
              *caps = sub_caps;
              pc += 1;
            }
            (None, true) => {
              pc += 1;
            }
            _ => backtrack!(),
          }
        }
      }
    }
  }

  /// Lookbehind: find any start position whose sub-match ends exactly at
  /// `pos`.
  fn match_behind(
    &mut self,
    sub: &Program,
    pos: usize,
    caps: &[isize],
  ) -> Result<Option<Vec<isize>>, MatchError> {
    let mut start = pos;
    loop {
      let mut sub_caps = caps.to_vec();
      if self
        .match_program(sub, start, &mut sub_caps, Some(pos))?
        .is_some()
      {
        return Ok(Some(sub_caps));
      }
      if start == 0 {
        return Ok(None);
      }
      start -= 1;
    }
  }

  fn atom_eq(&self, input_atom: u32, pattern_atom: u32) -> bool {
    if input_atom == pattern_atom {
      return true;
    }
    self.fold && canonicalize(input_atom, self.unicode) == pattern_atom
  }

  /// Compare the captured text `[s, e)` against the input at `pos`.
  /// Returns the consumed length in code units.
  fn backref_len_at(&self, pos: usize, s: usize, e: usize) -> Option<usize> {
    let mut ref_i = s;
    let mut in_i = pos;
    while ref_i < e {
      let (ref_atom, ref_w) = atom_at(self.input, ref_i, self.unicode)?;
      let (in_atom, in_w) = atom_at(self.input, in_i, self.unicode)?;
      let equal = if self.fold {
        canonicalize(ref_atom, self.unicode) == canonicalize(in_atom, self.unicode)
      } else {
        ref_atom == in_atom
      };
      if !equal {
        return None;
      }
      ref_i += ref_w;
      in_i += in_w;
    }
    Some(in_i - pos)
  }

  fn word_boundary_at(&self, pos: usize) -> bool {
    let prev = pos > 0 && is_word_atom(self.input[pos - 1] as u32);
    let next = pos < self.input.len() && is_word_atom(self.input[pos] as u32);
    prev != next
  }
}

fn class_matches(class: &CompiledClass, atom: u32) -> bool {
  let mut found = class.ranges.iter().any(|&(lo, hi)| lo <= atom && atom <= hi);
  if !found {
    found = class.preds.iter().any(|pred| match pred {
      ClassPred::Digit => is_digit_atom(atom),
      ClassPred::NotDigit => !is_digit_atom(atom),
      ClassPred::Space => is_space_atom(atom),
      ClassPred::NotSpace => !is_space_atom(atom),
      ClassPred::Word => is_word_atom(atom),
      ClassPred::NotWord => !is_word_atom(atom),
    });
  }
  found != class.negated
}
