//! Branch prediction unit (BRU) implementations.
//!
//! This module contains the branch prediction algorithms (static, bimodal
//! two-bit, two-level adaptive, and the combination of the last two under a
//! chooser), the branch target buffer (BTB) and the circular return address
//! stack (RAS).

pub use self::branch_predictor::{
    BranchOutcome, BranchPredictor, ChoiceUpdate, Prediction, PredictorUpdate, SaturatingCounter,
};

/// Branch predictor trait and the values passed between fetch and commit.
pub mod branch_predictor;

/// Branch Target Buffer for storing predicted branch targets.
pub mod btb;

/// Bimodal and two-level predictors under a chooser table.
pub mod combined;

/// Return Address Stack for predicting return addresses.
pub mod ras;

/// Static branch predictor (conditional branches not taken).
pub mod static_bp;

/// Bimodal table of two-bit counters.
pub mod two_bit;

/// Per-address history two-level predictor.
pub mod two_level;

use self::{
    combined::CombinedPredictor, static_bp::StaticPredictor, two_bit::TwoBitPredictor,
    two_level::TwoLevelPredictor,
};
use crate::config::{BranchPredictor as BpType, BranchPredictorConfig};
use crate::isa::Mnemonic;

/// Enum wrapper for static dispatch of Branch Predictors.
/// This avoids vtable lookups in the critical fetch loop.
#[derive(Debug)]
pub enum BranchPredictorWrapper {
    /// Always not taken.
    Static(StaticPredictor),
    /// Bimodal.
    TwoBit(TwoBitPredictor),
    /// Two-level adaptive.
    TwoLevel(TwoLevelPredictor),
    /// Bimodal and two-level under a chooser.
    Combined(CombinedPredictor),
}

impl BranchPredictorWrapper {
    /// Creates the predictor selected by the configuration.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        match config.kind {
            BpType::Static => Self::Static(StaticPredictor::new(config.btb_size)),
            BpType::TwoBit => Self::TwoBit(TwoBitPredictor::new(
                config.bimod_size,
                config.btb_size,
                config.ras_size,
            )),
            BpType::TwoLevel => Self::TwoLevel(TwoLevelPredictor::new(config)),
            BpType::Combined => Self::Combined(CombinedPredictor::new(config)),
        }
    }
}

impl BranchPredictor for BranchPredictorWrapper {
    #[inline(always)]
    fn predict(&mut self, pc: u32, mnemonic: &Mnemonic) -> Prediction {
        match self {
            Self::Static(bp) => bp.predict(pc, mnemonic),
            Self::TwoBit(bp) => bp.predict(pc, mnemonic),
            Self::TwoLevel(bp) => bp.predict(pc, mnemonic),
            Self::Combined(bp) => bp.predict(pc, mnemonic),
        }
    }

    #[inline(always)]
    fn update(&mut self, pc: u32, mnemonic: &Mnemonic, outcome: BranchOutcome, update: PredictorUpdate) {
        match self {
            Self::Static(bp) => bp.update(pc, mnemonic, outcome, update),
            Self::TwoBit(bp) => bp.update(pc, mnemonic, outcome, update),
            Self::TwoLevel(bp) => bp.update(pc, mnemonic, outcome, update),
            Self::Combined(bp) => bp.update(pc, mnemonic, outcome, update),
        }
    }

    #[inline(always)]
    fn recover(&mut self, ras_checkpoint: usize) {
        match self {
            Self::Static(bp) => bp.recover(ras_checkpoint),
            Self::TwoBit(bp) => bp.recover(ras_checkpoint),
            Self::TwoLevel(bp) => bp.recover(ras_checkpoint),
            Self::Combined(bp) => bp.recover(ras_checkpoint),
        }
    }

    fn checkpoint(&self) -> usize {
        match self {
            Self::Static(bp) => bp.checkpoint(),
            Self::TwoBit(bp) => bp.checkpoint(),
            Self::TwoLevel(bp) => bp.checkpoint(),
            Self::Combined(bp) => bp.checkpoint(),
        }
    }

    fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Static(_))
    }
}
