//! Return Address Stack (RAS).
//!
//! The RAS is a circular stack that pushes return addresses on calls and pops
//! them on returns. Predictions modify it speculatively at fetch, so every
//! prediction records the top-of-stack index and a misprediction restores it.

/// Return Address Stack structure.
#[derive(Debug)]
pub struct Ras {
    /// The stack storage.
    stack: Vec<u32>,
    /// Index of the current top entry.
    top: usize,
}

impl Ras {
    /// Creates a new Return Address Stack with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: vec![0; capacity],
            top: 0,
        }
    }

    /// Number of entries.
    pub fn capacity(&self) -> usize {
        self.stack.len()
    }

    /// Current top-of-stack index, used as a recovery checkpoint.
    pub const fn checkpoint(&self) -> usize {
        self.top
    }

    /// Pushes a return address, overwriting the oldest entry when full.
    pub fn push(&mut self, addr: u32) {
        if self.stack.is_empty() {
            return;
        }
        self.top = (self.top + 1) % self.stack.len();
        if let Some(slot) = self.stack.get_mut(self.top) {
            *slot = addr;
        }
    }

    /// Pops the top return address. An empty slot reads as 0.
    pub fn pop(&mut self) -> Option<u32> {
        let len = self.stack.len();
        let addr = self.stack.get(self.top).copied()?;
        self.top = (self.top + len - 1) % len;
        Some(addr)
    }

    /// Returns the top entry without popping it.
    pub fn top(&self) -> Option<u32> {
        self.stack.get(self.top).copied()
    }

    /// Restores the top-of-stack index.
    pub fn recover(&mut self, checkpoint: usize) {
        if checkpoint < self.stack.len() {
            self.top = checkpoint;
        }
    }
}
