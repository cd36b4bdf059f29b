//! Main-memory latency models behind the directory.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per access.
//! 2. **DramController:** Open-row model with CAS, RAS and precharge latencies.
//!
//! The directory asks the controller for a latency whenever it reads a line
//! from memory or copies a line back.

use crate::config::{MemoryConfig, MemoryController as ControllerKind};

/// Memory controller reporting access latency in cycles.
pub trait MemoryController: std::fmt::Debug {
    /// Returns the number of cycles required for an access to `addr`.
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// Builds the controller selected by the memory configuration.
pub fn build(config: &MemoryConfig) -> Box<dyn MemoryController> {
    match config.controller {
        ControllerKind::Simple => Box::new(SimpleController::new(config.latency)),
        ControllerKind::Dram => Box::new(DramController::new(config.t_cas, config.t_ras, config.t_pre)),
    }
}

/// Fixed-latency memory controller.
#[derive(Debug, Clone)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller where every access takes `latency` cycles.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// Rows are 2 KiB.
const ROW_MASK: u64 = !2047;

/// DRAM-style controller with a single open row.
#[derive(Debug, Clone)]
pub struct DramController {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
}

impl DramController {
    /// Creates a controller with no row open.
    pub const fn new(t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
        }
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr & ROW_MASK;
        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}
