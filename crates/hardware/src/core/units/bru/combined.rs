//! Combined Branch Predictor.
//!
//! Runs a bimodal and a two-level predictor side by side. A third table of
//! two-bit counters, indexed like the bimodal one, picks the component whose
//! direction is used: taken selects the two-level predictor. When the two
//! components disagree, the chooser moves toward the one that was right.

use super::branch_predictor::{
    BranchOutcome, BranchPredictor, ChoiceUpdate, Prediction, PredictorUpdate,
};
use super::btb::Btb;
use super::ras::Ras;
use super::two_bit::{BimodalTable, predict_with};
use super::two_level::TwoLevelTable;
use crate::config::BranchPredictorConfig;
use crate::isa::{Mnemonic, MnemonicKind};

/// Combined Predictor structure.
#[derive(Debug)]
pub struct CombinedPredictor {
    bimodal: BimodalTable,
    two_level: TwoLevelTable,
    /// Chooser counters.
    meta: BimodalTable,
    /// Branch Target Buffer.
    btb: Btb,
    /// Return Address Stack.
    ras: Ras,
}

impl CombinedPredictor {
    /// Creates a predictor from its configuration section.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        Self {
            bimodal: BimodalTable::new(config.bimod_size),
            two_level: TwoLevelTable::new(config),
            meta: BimodalTable::new(config.meta_size),
            btb: Btb::new(config.btb_size),
            ras: Ras::new(config.ras_size),
        }
    }

    /// Returns true if the chooser currently trusts the two-level predictor at `pc`.
    pub fn prefers_two_level(&self, pc: u32) -> bool {
        self.meta.is_taken(self.meta.index(pc))
    }
}

impl BranchPredictor for CombinedPredictor {
    fn predict(&mut self, pc: u32, mnemonic: &Mnemonic) -> Prediction {
        let choice = (mnemonic.kind == MnemonicKind::Conditional).then(|| {
            let bimodal = self.bimodal.index(pc);
            let two_level = self.two_level.index(pc);
            ChoiceUpdate {
                bimodal,
                two_level,
                meta: self.meta.index(pc),
                bimodal_taken: self.bimodal.is_taken(bimodal),
                two_level_taken: self.two_level.is_taken(two_level),
            }
        });
        let taken = choice.map(|c| {
            if self.meta.is_taken(c.meta) {
                c.two_level_taken
            } else {
                c.bimodal_taken
            }
        });
        let update = PredictorUpdate {
            choice,
            ..PredictorUpdate::default()
        };
        predict_with(pc, mnemonic, taken, update, &self.btb, &mut self.ras)
    }

    fn update(&mut self, pc: u32, mnemonic: &Mnemonic, outcome: BranchOutcome, update: PredictorUpdate) {
        if mnemonic.kind == MnemonicKind::FunctionReturn && !update.ras {
            return;
        }
        if let Some(choice) = update.choice {
            self.two_level.record(pc, outcome.taken);
            self.bimodal.train(choice.bimodal, outcome.taken);
            self.two_level.train(choice.two_level, outcome.taken);
            if choice.bimodal_taken != choice.two_level_taken {
                self.meta
                    .train(choice.meta, choice.two_level_taken == outcome.taken);
            }
        }
        self.btb.update(pc, outcome.target, outcome.taken);
    }

    fn recover(&mut self, ras_checkpoint: usize) {
        self.ras.recover(ras_checkpoint);
    }

    fn checkpoint(&self) -> usize {
        self.ras.checkpoint()
    }
}
