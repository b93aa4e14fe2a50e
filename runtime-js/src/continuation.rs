use crate::interpreter::Frame;

/// A captured continuation: a snapshot of the interpreter's frame chain.
///
/// The interpreter keeps its frames as heap data (not host activation
/// records) precisely so this snapshot is possible. Resuming pushes clones
/// of the frames back and continues execution with a supplied value as the
/// result of the call that captured.
#[derive(Clone)]
pub struct NativeContinuation {
  frames: Vec<Frame>,
}

impl NativeContinuation {
  pub(crate) fn new(frames: Vec<Frame>) -> Self {
    Self { frames }
  }

  pub(crate) fn frames(&self) -> &[Frame] {
    &self.frames
  }

  pub fn frame_count(&self) -> usize {
    self.frames.len()
  }
}

impl std::fmt::Debug for NativeContinuation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NativeContinuation")
      .field("frames", &self.frames.len())
      .finish()
  }
}
