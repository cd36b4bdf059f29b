//! Two-Level Adaptive Branch Predictor.
//!
//! The first level holds per-address branch history registers, the second a
//! table of two-bit counters indexed by the history concatenated with (or,
//! with `xor`, hashed against) the branch address.

use super::branch_predictor::{
    BranchOutcome, BranchPredictor, Prediction, PredictorUpdate, SaturatingCounter,
};
use super::btb::Btb;
use super::ras::Ras;
use super::two_bit::predict_with;
use crate::config::BranchPredictorConfig;
use crate::isa::{Mnemonic, MnemonicKind};

/// History registers and the counters they index.
#[derive(Debug)]
pub(super) struct TwoLevelTable {
    /// Branch history registers.
    histories: Vec<u32>,
    /// Second-level counters.
    counters: Vec<SaturatingCounter>,
    /// History width in bits.
    shift_width: u32,
    /// Hash history with the address instead of concatenating.
    xor: bool,
}

impl TwoLevelTable {
    pub(super) fn new(config: &BranchPredictorConfig) -> Self {
        Self {
            histories: vec![0; config.l1_size.max(1)],
            counters: SaturatingCounter::table(config.l2_size.max(1)),
            shift_width: config.shift_width.min(31),
            xor: config.xor,
        }
    }

    fn history_index(&self, pc: u32) -> usize {
        ((pc >> 2) as usize) & (self.histories.len() - 1)
    }

    /// Counter selected by the history of `pc`.
    pub(super) fn index(&self, pc: u32) -> usize {
        let history = self.histories.get(self.history_index(pc)).copied().unwrap_or(0);
        let address = pc >> 2;
        let index = if self.xor {
            ((history ^ address) & ((1 << self.shift_width) - 1)) | (address << self.shift_width)
        } else {
            history | (address << self.shift_width)
        };
        (index as usize) & (self.counters.len() - 1)
    }

    /// Direction of counter `index`.
    pub(super) fn is_taken(&self, index: usize) -> bool {
        self.counters.get(index).is_some_and(|c| c.is_taken())
    }

    /// Shifts the outcome into the history of `pc`.
    pub(super) fn record(&mut self, pc: u32, taken: bool) {
        let slot = self.history_index(pc);
        let mask = (1u32 << self.shift_width) - 1;
        if let Some(history) = self.histories.get_mut(slot) {
            *history = ((*history << 1) | u32::from(taken)) & mask;
        }
    }

    /// Moves counter `index` toward `taken`.
    pub(super) fn train(&mut self, index: usize, taken: bool) {
        if let Some(counter) = self.counters.get_mut(index) {
            counter.update(taken);
        }
    }
}

/// Two-Level Predictor structure.
#[derive(Debug)]
pub struct TwoLevelPredictor {
    /// Direction state.
    table: TwoLevelTable,
    /// Branch Target Buffer.
    btb: Btb,
    /// Return Address Stack.
    ras: Ras,
}

impl TwoLevelPredictor {
    /// Creates a predictor from its configuration section.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        Self {
            table: TwoLevelTable::new(config),
            btb: Btb::new(config.btb_size),
            ras: Ras::new(config.ras_size),
        }
    }
}

impl BranchPredictor for TwoLevelPredictor {
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
        if mnemonic.kind == MnemonicKind::Conditional {
            self.table.record(pc, outcome.taken);
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
