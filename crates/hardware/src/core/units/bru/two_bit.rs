//! Bimodal (Two-Bit) Branch Predictor.
//!
//! A table of two-bit saturating counters indexed by a hash of the branch
//! address. Taken predictions read their target from the BTB; returns are
//! predicted by the RAS.

use super::branch_predictor::{
    BranchOutcome, BranchPredictor, Prediction, PredictorUpdate, SaturatingCounter,
};
use super::btb::Btb;
use super::ras::Ras;
use crate::isa::{Mnemonic, MnemonicKind};

/// Table of two-bit counters indexed by a hash of the branch address.
#[derive(Debug)]
pub(super) struct BimodalTable {
    counters: Vec<SaturatingCounter>,
}

impl BimodalTable {
    /// Creates `size` counters (a power of two).
    pub(super) fn new(size: usize) -> Self {
        Self {
            counters: SaturatingCounter::table(size.max(1)),
        }
    }

    /// Folds the high address bits onto the word index.
    pub(super) fn index(&self, pc: u32) -> usize {
        (((pc >> 19) ^ (pc >> 2)) as usize) & (self.counters.len() - 1)
    }

    /// Direction of counter `index`.
    pub(super) fn is_taken(&self, index: usize) -> bool {
        self.counters.get(index).is_some_and(|c| c.is_taken())
    }

    /// Moves counter `index` toward `taken`.
    pub(super) fn train(&mut self, index: usize, taken: bool) {
        if let Some(counter) = self.counters.get_mut(index) {
            counter.update(taken);
        }
    }
}

/// Two-Bit Predictor structure.
#[derive(Debug)]
pub struct TwoBitPredictor {
    /// Direction counters.
    table: BimodalTable,
    /// Branch Target Buffer.
    btb: Btb,
    /// Return Address Stack.
    ras: Ras,
}

impl TwoBitPredictor {
    /// Creates a predictor with `bimod_size` counters (a power of two).
    pub fn new(bimod_size: usize, btb_size: usize, ras_size: usize) -> Self {
        Self {
            table: BimodalTable::new(bimod_size),
            btb: Btb::new(btb_size),
            ras: Ras::new(ras_size),
        }
    }
}

/// Prediction shared by the dynamic predictors: direction from `taken`
/// (conditional branches only), target from the RAS for returns and from the
/// BTB otherwise. `update` carries the direction state the caller read.
pub(super) fn predict_with(
    pc: u32,
    mnemonic: &Mnemonic,
    taken: Option<bool>,
    mut update: PredictorUpdate,
    btb: &Btb,
    ras: &mut Ras,
) -> Prediction {
    let ras_checkpoint = ras.checkpoint();

    if mnemonic.kind == MnemonicKind::FunctionReturn && ras.capacity() > 0 {
        update.ras = true;
        let target = ras.pop().filter(|&t| t > 1);
        return Prediction {
            target,
            update,
            ras_checkpoint,
        };
    }
    if mnemonic.kind == MnemonicKind::FunctionCall && ras.capacity() > 0 {
        ras.push(pc.wrapping_add(crate::common::constants::INSTRUCTION_SIZE));
    }

    let taken = match mnemonic.kind {
        MnemonicKind::Conditional => taken.unwrap_or(false),
        _ => true,
    };
    Prediction {
        target: if taken { btb.lookup(pc) } else { None },
        update,
        ras_checkpoint,
    }
}

impl BranchPredictor for TwoBitPredictor {
    fn predict(&mut self, pc: u32, mnemonic: &Mnemonic) -> Prediction {
        let counter = (mnemonic.kind == MnemonicKind::Conditional).then(|| self.table.index(pc));
        let update = PredictorUpdate {
            counter,
            ..PredictorUpdate::default()
        };
        let taken = counter.map(|i| self.table.is_taken(i));
        predict_with(pc, mnemonic, taken, update, &self.btb, &mut self.ras)
    }

    fn update(&mut self, pc: u32, mnemonic: &Mnemonic, outcome: BranchOutcome, update: PredictorUpdate) {
        if mnemonic.kind == MnemonicKind::FunctionReturn && !update.ras {
            return;
        }
        if let Some(index) = update.counter {
            self.table.train(index, outcome.taken);
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
