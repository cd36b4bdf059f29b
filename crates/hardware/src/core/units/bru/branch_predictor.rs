//! Branch Predictor Interface.
//!
//! This module defines the `BranchPredictor` trait that all branch prediction
//! implementations must adhere to, plus the values that travel with a control
//! instruction from fetch to commit:
//! 1. **Prediction:** The predicted target (or fall-through) and the RAS
//!    checkpoint taken before the prediction touched the stack.
//! 2. **PredictorUpdate:** Which counter the prediction read and whether the
//!    RAS supplied the target, so commit trains the same state.
//! 3. **BranchOutcome:** What actually happened.

use crate::isa::Mnemonic;

/// Two-bit saturating counter; predicts taken at 2 or 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounter(u8);

impl SaturatingCounter {
    /// Counter tables start alternating weakly-not-taken and weakly-taken.
    pub fn table(size: usize) -> Vec<Self> {
        (0..size).map(|i| Self(if i % 2 == 0 { 1 } else { 2 })).collect()
    }

    /// Predicted direction.
    #[inline]
    pub const fn is_taken(self) -> bool {
        self.0 >= 2
    }

    /// Moves one step toward the outcome.
    #[inline]
    pub const fn update(&mut self, taken: bool) {
        if taken {
            if self.0 < 3 {
                self.0 += 1;
            }
        } else if self.0 > 0 {
            self.0 -= 1;
        }
    }
}

/// Predictor state read at fetch and trained at commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictorUpdate {
    /// Index of the direction counter used for a conditional branch.
    pub counter: Option<usize>,
    /// The return address stack supplied the target.
    pub ras: bool,
    /// Component state read by the combined predictor.
    pub choice: Option<ChoiceUpdate>,
}

/// What the combined predictor read for one conditional branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoiceUpdate {
    /// Bimodal counter index.
    pub bimodal: usize,
    /// Two-level counter index.
    pub two_level: usize,
    /// Chooser counter index.
    pub meta: usize,
    /// Bimodal direction.
    pub bimodal_taken: bool,
    /// Two-level direction.
    pub two_level_taken: bool,
}

/// Result of [`BranchPredictor::predict`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Prediction {
    /// Predicted target, or `None` to fall through.
    pub target: Option<u32>,
    /// State to hand back to [`BranchPredictor::update`].
    pub update: PredictorUpdate,
    /// Top of the return address stack before this prediction.
    pub ras_checkpoint: usize,
}

/// Resolved behaviour of a committed control instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Address of the next instruction actually executed.
    pub target: u32,
    /// The instruction redirected control.
    pub taken: bool,
    /// Fetch followed a non-sequential prediction.
    pub predicted_taken: bool,
    /// The predicted next pc matched the actual one.
    pub correct: bool,
}

/// Trait for branch prediction algorithms.
pub trait BranchPredictor: std::fmt::Debug {
    /// Predicts the next pc after the control instruction at `pc`.
    ///
    /// Calls push `pc + 4` on the return address stack and returns pop it.
    fn predict(&mut self, pc: u32, mnemonic: &Mnemonic) -> Prediction;

    /// Trains the predictor with the committed outcome of the instruction at `pc`.
    fn update(&mut self, pc: u32, mnemonic: &Mnemonic, outcome: BranchOutcome, update: PredictorUpdate);

    /// Restores the return address stack to a checkpoint after a misprediction.
    fn recover(&mut self, ras_checkpoint: usize);

    /// Current return address stack top, recorded for instructions that make
    /// no prediction.
    fn checkpoint(&self) -> usize {
        0
    }

    /// Returns true if the predictor keeps state between predictions.
    fn is_dynamic(&self) -> bool {
        true
    }
}
