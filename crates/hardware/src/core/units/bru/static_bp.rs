//! Static Branch Predictor.
//!
//! Implements an "Always Not Taken" policy for conditional branches. Jumps,
//! calls and returns are predicted through the BTB; no state is speculatively
//! modified, so there is nothing to recover.

use super::branch_predictor::{BranchOutcome, BranchPredictor, Prediction, PredictorUpdate};
use super::btb::Btb;
use crate::isa::{Mnemonic, MnemonicKind};

/// Static Branch Predictor structure.
#[derive(Debug)]
pub struct StaticPredictor {
    /// Branch Target Buffer for jump targets.
    btb: Btb,
}

impl StaticPredictor {
    /// Creates a new Static Predictor with a `btb_size`-entry BTB.
    pub fn new(btb_size: usize) -> Self {
        Self {
            btb: Btb::new(btb_size),
        }
    }
}

impl BranchPredictor for StaticPredictor {
    fn predict(&mut self, pc: u32, mnemonic: &Mnemonic) -> Prediction {
        let target = match mnemonic.kind {
            MnemonicKind::Conditional => None,
            _ => self.btb.lookup(pc),
        };
        Prediction {
            target,
            ..Prediction::default()
        }
    }

    fn update(&mut self, pc: u32, _mnemonic: &Mnemonic, outcome: BranchOutcome, _update: PredictorUpdate) {
        self.btb.update(pc, outcome.target, outcome.taken);
    }

    fn recover(&mut self, _ras_checkpoint: usize) {}

    fn is_dynamic(&self) -> bool {
        false
    }
}
