/// Pointer into a fixed, ordered list of stages.
///
/// Only ever moves forward, one stage at a time, and stops on the last stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCursor {
    len: usize,
    index: usize,
}

impl StageCursor {
    /// `len` is clamped to at least one stage and `start` to the last stage.
    pub fn new(len: usize, start: usize) -> Self {
        let len = len.max(1);
        Self {
            len,
            index: start.min(len - 1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_terminal(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Moves one stage forward. Returns `false` once the last stage is reached.
    pub fn advance(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.index += 1;
        true
    }
}
