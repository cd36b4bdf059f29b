//! Fluent builders for programs and small machine configurations.

use cmpsim_core::config::{BranchPredictor, Config, Protocol};
use cmpsim_core::isa::Program;

/// Default text base of test programs.
pub const TEXT_BASE: u32 = 0x1000;

/// Builds a [`Program`] word by word.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    base: u32,
    words: Vec<u32>,
    data: Vec<(u32, u32)>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::at(TEXT_BASE)
    }

    pub fn at(base: u32) -> Self {
        Self {
            base,
            words: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn push(mut self, word: u32) -> Self {
        self.words.push(word);
        self
    }

    pub fn extend(mut self, words: &[u32]) -> Self {
        self.words.extend_from_slice(words);
        self
    }

    pub fn data(mut self, addr: u32, value: u32) -> Self {
        self.data.push((addr, value));
        self
    }

    /// Address of instruction `index`.
    pub fn pc_of(&self, index: usize) -> u32 {
        self.base + 4 * index as u32
    }

    pub fn build(self) -> Program {
        self.data
            .into_iter()
            .fold(Program::new(self.base, self.words), |p, (a, v)| p.with_data(a, v))
    }
}

/// Builds a small, fast machine: one single-threaded core and short memory latency.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.core.num_cores = 1;
        config.core.threads_per_core = 1;
        config.memory.latency = 20;
        config.general.max_cycles = 100_000;
        Self { config }
    }

    pub fn cores(mut self, n: usize) -> Self {
        self.config.core.num_cores = n;
        self
    }

    pub fn threads(mut self, n: usize) -> Self {
        self.config.core.threads_per_core = n;
        self
    }

    pub fn decode_buffer(mut self, n: usize) -> Self {
        self.config.core.decode_buffer_capacity = n;
        self
    }

    pub fn commit_width(mut self, n: usize) -> Self {
        self.config.core.commit_width = n;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    pub fn predictor(mut self, kind: BranchPredictor) -> Self {
        self.config.branch_predictor.kind = kind;
        self
    }

    pub fn commit_timeout(mut self, cycles: u64) -> Self {
        self.config.general.commit_timeout = cycles;
        self
    }

    pub fn memory_latency(mut self, cycles: u64) -> Self {
        self.config.memory.latency = cycles;
        self
    }

    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.config.general.max_cycles = cycles;
        self
    }

    pub fn fast_forward(mut self, instructions: u64) -> Self {
        self.config.general.fast_forward_instructions = instructions;
        self
    }

    pub fn warmup(mut self, instructions: u64) -> Self {
        self.config.general.warmup_instructions = instructions;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
