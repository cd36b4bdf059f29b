//! Configuration system for the multicore simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (widths, capacities, caches, predictors).
//! 2. **Structures:** Hierarchical config for general, core, functional units, caches,
//!    TLBs, memory, interconnect, branch prediction, and thread roles.
//! 3. **Enums:** Coherence protocol, memory controller, replacement policy, and branch
//!    predictor types.
//! 4. **Validation:** Geometry and capacity checks that fail fast before any hardware
//!    is built.
//!
//! Configuration is supplied as JSON (`Config::from_json_str`, `Config::from_json_file`)
//! or built with `Config::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::common::error::{SimError, SimResult};
use crate::isa::{NUM_FP_REGS, NUM_INT_REGS, NUM_MISC_REGS};

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden in the JSON configuration.
mod defaults {
    /// Upper bound on measured cycles before the run stops.
    pub const MAX_CYCLES: u64 = 10_000_000;

    /// Cycles without a commit before the liveness watchdog fires.
    pub const COMMIT_TIMEOUT: u64 = crate::common::constants::COMMIT_TIMEOUT;

    /// Number of processor cores.
    pub const NUM_CORES: usize = 2;

    /// Hardware threads per core.
    pub const THREADS_PER_CORE: usize = 2;

    /// Instructions renamed and dispatched per cycle.
    pub const DECODE_WIDTH: usize = 4;

    /// Issue slots per cycle, shared by instruction, load and store queues.
    pub const ISSUE_WIDTH: usize = 8;

    /// Instructions retired per cycle per thread.
    pub const COMMIT_WIDTH: usize = 4;

    /// Decode buffer capacity per thread.
    pub const DECODE_BUFFER_CAPACITY: usize = 96;

    /// Reorder buffer capacity per thread.
    pub const ROB_CAPACITY: usize = 96;

    /// Load/store queue capacity per thread.
    pub const LSQ_CAPACITY: usize = 48;

    /// Physical integer registers per core.
    pub const PHYS_INT_REGS: usize = 128;

    /// Physical floating-point registers per core.
    pub const PHYS_FP_REGS: usize = 128;

    /// Physical miscellaneous registers per core.
    pub const PHYS_MISC_REGS: usize = 16;

    /// Integer ALU count.
    pub const INT_ALUS: usize = 8;

    /// Integer multiply/divide unit count.
    pub const INT_MULT_DIVS: usize = 2;

    /// Floating-point adder count.
    pub const FP_ADDERS: usize = 8;

    /// Floating-point multiply/divide unit count.
    pub const FP_MULT_DIVS: usize = 2;

    /// Memory port count.
    pub const MEMORY_PORTS: usize = 4;

    /// Default L1 size in bytes (32 KiB).
    pub const L1_SIZE: usize = 32 * 1024;

    /// Default L2 (directory) size in bytes (512 KiB).
    pub const L2_SIZE: usize = 512 * 1024;

    /// Default cache line size in bytes (64 bytes).
    pub const CACHE_LINE: usize = 64;

    /// Default L1 associativity.
    pub const L1_WAYS: usize = 4;

    /// Default L2 associativity.
    pub const L2_WAYS: usize = 8;

    /// Default L1 hit latency in cycles.
    pub const L1_LATENCY: u64 = 1;

    /// Default L2 hit latency in cycles.
    pub const L2_LATENCY: u64 = 10;

    /// Concurrent read accesses per L1.
    pub const READ_PORTS: usize = 4;

    /// Concurrent write accesses per L1.
    pub const WRITE_PORTS: usize = 2;

    /// Fixed memory latency of the simple controller.
    pub const MEMORY_LATENCY: u64 = 200;

    /// CAS (Column Access Strobe) latency in DRAM cycles.
    pub const T_CAS: u64 = 14;

    /// RAS (Row Access Strobe) latency in DRAM cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in DRAM cycles.
    pub const T_PRE: u64 = 14;

    /// Per-message router latency in cycles.
    pub const HOP_LATENCY: u64 = 2;

    /// Link bandwidth in bytes per cycle.
    pub const LINK_BANDWIDTH: u64 = 32;

    /// Default Branch Target Buffer size (512 entries).
    pub const BTB_SIZE: usize = 512;

    /// Default Return Address Stack size (16 entries).
    pub const RAS_SIZE: usize = 16;

    /// Default bimodal table size (2048 counters).
    pub const BIMOD_SIZE: usize = 2048;

    /// Default first-level history table size of the two-level predictor.
    pub const TWO_LEVEL_L1_SIZE: usize = 1;

    /// Default second-level counter table size of the two-level predictor.
    pub const TWO_LEVEL_L2_SIZE: usize = 1024;

    /// Default history width in bits of the two-level predictor.
    pub const TWO_LEVEL_SHIFT_WIDTH: u32 = 8;

    /// Default chooser table size of the combined predictor (1024 counters).
    pub const META_SIZE: usize = 1024;

    /// Default TLB capacity in bytes of mapped address space (512 pages).
    pub const TLB_SIZE: usize = 32 * 1024;

    /// Default TLB associativity.
    pub const TLB_WAYS: usize = 4;

    /// Default translation granule in bytes.
    pub const TLB_PAGE: usize = 64;

    /// Default TLB hit latency in cycles.
    pub const TLB_HIT_LATENCY: u64 = 2;

    /// Default TLB miss (walk) latency in cycles.
    pub const TLB_MISS_LATENCY: u64 = 30;
}

/// Cache-coherence protocol spoken between the L1 controllers and the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Protocol {
    /// Modified / Shared / Invalid.
    ///
    /// A read miss always installs the line Shared.
    #[serde(alias = "MSI")]
    Msi,
    /// Modified / Exclusive / Shared / Invalid.
    ///
    /// A read miss with no other sharers installs the line Exclusive, which
    /// upgrades to Modified on a store without a directory round trip.
    #[default]
    #[serde(alias = "MESI")]
    Mesi,
}

/// Memory controller implementation types.
///
/// Specifies the type of memory controller behind the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryController {
    /// Simple fixed-latency memory controller.
    ///
    /// All memory accesses take a fixed number of cycles regardless
    /// of address patterns or row buffer state.
    #[default]
    Simple,
    /// DRAM controller with row buffer modeling.
    ///
    /// Models CAS, RAS and precharge latencies with an open-row policy.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which cache line to evict
/// when a new line must be installed in a full cache set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used replacement policy.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Pseudo-LRU (MRU-bit) replacement policy.
    #[serde(alias = "Plru")]
    Plru,
    /// First In First Out replacement policy.
    #[serde(alias = "Fifo")]
    Fifo,
    /// Random replacement policy.
    #[serde(alias = "Random")]
    Random,
    /// Most Recently Used replacement policy.
    #[serde(alias = "Mru")]
    Mru,
}

/// Branch prediction algorithm types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BranchPredictor {
    /// Static predictor: conditional branches are predicted not taken.
    Static,
    /// Bimodal table of two-bit saturating counters.
    #[default]
    TwoBit,
    /// Two-level adaptive predictor with per-address history registers.
    TwoLevel,
    /// Bimodal and two-level predictors with a table of counters choosing
    /// between them per branch.
    Combined,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use cmpsim_core::config::{Config, Protocol};
///
/// let config = Config::default();
/// assert_eq!(config.core.num_cores, 2);
/// assert_eq!(config.protocol, Protocol::Mesi);
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserializing a partial JSON document; omitted fields keep their defaults:
///
/// ```
/// use cmpsim_core::config::{BranchPredictor, Config, Protocol, ReplacementPolicy};
///
/// let json = r#"{
///     "general": { "max_cycles": 5000 },
///     "core": { "num_cores": 4, "threads_per_core": 1, "commit_width": 2 },
///     "cache": {
///         "l1d": { "size_bytes": 8192, "ways": 2, "policy": "Fifo" }
///     },
///     "protocol": "Msi",
///     "branch_predictor": { "kind": "TwoLevel", "l2_size": 256 }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.max_cycles, 5000);
/// assert_eq!(config.core.num_cores, 4);
/// assert_eq!(config.core.decode_width, 4);
/// assert_eq!(config.cache.l1d.policy, ReplacementPolicy::Fifo);
/// assert_eq!(config.cache.l1d.line_bytes, 64);
/// assert_eq!(config.protocol, Protocol::Msi);
/// assert_eq!(config.branch_predictor.kind, BranchPredictor::TwoLevel);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Core widths, buffer capacities and register files
    #[serde(default)]
    pub core: CoreConfig,
    /// Functional unit counts
    #[serde(default)]
    pub fu: FuConfig,
    /// Cache hierarchy configuration
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Per-thread TLBs
    #[serde(default)]
    pub tlb: TlbConfig,
    /// Coherence protocol
    #[serde(default)]
    pub protocol: Protocol,
    /// Main memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Interconnect configuration
    #[serde(default)]
    pub network: NetworkConfig,
    /// Branch predictor configuration
    #[serde(default)]
    pub branch_predictor: BranchPredictorConfig,
    /// Hardware thread roles
    #[serde(default)]
    pub threads: ThreadRoleConfig,
}

impl Config {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Total number of hardware threads in the machine.
    pub const fn total_threads(&self) -> usize {
        self.core.num_cores * self.core.threads_per_core
    }

    /// Rejects configurations that describe hardware that cannot be built.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] naming the first offending setting.
    pub fn validate(&self) -> SimResult<()> {
        let core = &self.core;
        let positive = [
            ("core.num_cores", core.num_cores),
            ("core.threads_per_core", core.threads_per_core),
            ("core.decode_width", core.decode_width),
            ("core.issue_width", core.issue_width),
            ("core.commit_width", core.commit_width),
            ("core.decode_buffer_capacity", core.decode_buffer_capacity),
            ("core.rob_capacity", core.rob_capacity),
            ("core.lsq_capacity", core.lsq_capacity),
            ("fu.int_alu", self.fu.int_alu),
            ("fu.int_mult_div", self.fu.int_mult_div),
            ("fu.fp_adder", self.fu.fp_adder),
            ("fu.fp_mult_div", self.fu.fp_mult_div),
            ("fu.memory_port", self.fu.memory_port),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SimError::config(format!("{name} must be non-zero")));
            }
        }

        let threads = core.threads_per_core;
        for (name, capacity, arch) in [
            ("core.phys_int_regs", core.phys_int_regs, NUM_INT_REGS),
            ("core.phys_fp_regs", core.phys_fp_regs, NUM_FP_REGS),
            ("core.phys_misc_regs", core.phys_misc_regs, NUM_MISC_REGS),
        ] {
            if capacity <= threads * arch {
                return Err(SimError::config(format!(
                    "{name} = {capacity} leaves no renaming registers for {threads} thread(s) of {arch} architectural registers"
                )));
            }
        }

        self.cache.l1i.validate("cache.l1i")?;
        self.cache.l1d.validate("cache.l1d")?;
        self.cache.l2.validate("cache.l2")?;
        if self.cache.l1i.line_bytes != self.cache.l2.line_bytes
            || self.cache.l1d.line_bytes != self.cache.l2.line_bytes
        {
            return Err(SimError::config(
                "all cache levels must share one coherence line size",
            ));
        }

        self.tlb.geometry().validate("tlb")?;

        if self.network.bandwidth == 0 {
            return Err(SimError::config("network.bandwidth must be non-zero"));
        }

        let bp = &self.branch_predictor;
        for (name, size) in [
            ("branch_predictor.btb_size", bp.btb_size),
            ("branch_predictor.ras_size", bp.ras_size),
            ("branch_predictor.bimod_size", bp.bimod_size),
            ("branch_predictor.l1_size", bp.l1_size),
            ("branch_predictor.l2_size", bp.l2_size),
            ("branch_predictor.meta_size", bp.meta_size),
        ] {
            if !size.is_power_of_two() {
                return Err(SimError::config(format!(
                    "{name} = {size} must be a power of two"
                )));
            }
        }

        let total = self.total_threads();
        if self.threads.main_thread >= total {
            return Err(SimError::config(format!(
                "threads.main_thread = {} but the machine has {total} thread(s)",
                self.threads.main_thread
            )));
        }
        if let Some(helper) = self.threads.helper_thread {
            if helper >= total || helper == self.threads.main_thread {
                return Err(SimError::config(format!(
                    "threads.helper_thread = {helper} must name a thread other than the main thread"
                )));
            }
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Upper bound on measured cycles.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Instructions per thread executed functionally before warm-up.
    #[serde(default)]
    pub fast_forward_instructions: u64,

    /// Instructions per thread executed functionally with cache accesses before measurement.
    #[serde(default)]
    pub warmup_instructions: u64,

    /// Cycles without a commit before the liveness watchdog fires.
    #[serde(default = "GeneralConfig::default_commit_timeout")]
    pub commit_timeout: u64,
}

impl GeneralConfig {
    /// Returns the default cycle limit.
    const fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }

    /// Returns the default watchdog threshold.
    const fn default_commit_timeout() -> u64 {
        defaults::COMMIT_TIMEOUT
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
            fast_forward_instructions: 0,
            warmup_instructions: 0,
            commit_timeout: defaults::COMMIT_TIMEOUT,
        }
    }
}

/// Out-of-order core parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Number of cores.
    pub num_cores: usize,
    /// Hardware threads per core.
    pub threads_per_core: usize,
    /// Rename and dispatch width.
    pub decode_width: usize,
    /// Issue quantum per cycle.
    pub issue_width: usize,
    /// Commit width per thread.
    pub commit_width: usize,
    /// Decode buffer entries per thread.
    pub decode_buffer_capacity: usize,
    /// Reorder buffer entries per thread.
    pub rob_capacity: usize,
    /// Load/store queue entries per thread.
    pub lsq_capacity: usize,
    /// Integer physical registers per core.
    pub phys_int_regs: usize,
    /// Floating-point physical registers per core.
    pub phys_fp_regs: usize,
    /// Miscellaneous physical registers per core.
    pub phys_misc_regs: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            threads_per_core: defaults::THREADS_PER_CORE,
            decode_width: defaults::DECODE_WIDTH,
            issue_width: defaults::ISSUE_WIDTH,
            commit_width: defaults::COMMIT_WIDTH,
            decode_buffer_capacity: defaults::DECODE_BUFFER_CAPACITY,
            rob_capacity: defaults::ROB_CAPACITY,
            lsq_capacity: defaults::LSQ_CAPACITY,
            phys_int_regs: defaults::PHYS_INT_REGS,
            phys_fp_regs: defaults::PHYS_FP_REGS,
            phys_misc_regs: defaults::PHYS_MISC_REGS,
        }
    }
}

/// Functional unit counts per core. Latencies are fixed per operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FuConfig {
    /// Integer ALUs.
    pub int_alu: usize,
    /// Integer multiply/divide units.
    pub int_mult_div: usize,
    /// Floating-point adders.
    pub fp_adder: usize,
    /// Floating-point multiply/divide units.
    pub fp_mult_div: usize,
    /// Memory ports.
    pub memory_port: usize,
}

impl Default for FuConfig {
    fn default() -> Self {
        Self {
            int_alu: defaults::INT_ALUS,
            int_mult_div: defaults::INT_MULT_DIVS,
            fp_adder: defaults::FP_ADDERS,
            fp_mult_div: defaults::FP_MULT_DIVS,
            memory_port: defaults::MEMORY_PORTS,
        }
    }
}

/// Geometry and timing of one cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total capacity in bytes.
    #[serde(default = "CacheConfig::default_l1_size")]
    pub size_bytes: usize,
    /// Line size in bytes.
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,
    /// Associativity.
    #[serde(default = "CacheConfig::default_l1_ways")]
    pub ways: usize,
    /// Hit latency in cycles.
    #[serde(default = "CacheConfig::default_l1_latency")]
    pub latency: u64,
    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
    /// Concurrent read accesses.
    #[serde(default = "CacheConfig::default_read_ports")]
    pub read_ports: usize,
    /// Concurrent write accesses.
    #[serde(default = "CacheConfig::default_write_ports")]
    pub write_ports: usize,
}

impl CacheConfig {
    const fn default_l1_size() -> usize {
        defaults::L1_SIZE
    }

    const fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    const fn default_l1_ways() -> usize {
        defaults::L1_WAYS
    }

    const fn default_l1_latency() -> u64 {
        defaults::L1_LATENCY
    }

    const fn default_read_ports() -> usize {
        defaults::READ_PORTS
    }

    const fn default_write_ports() -> usize {
        defaults::WRITE_PORTS
    }

    /// Default shared second-level (directory) cache.
    pub fn l2() -> Self {
        Self {
            size_bytes: defaults::L2_SIZE,
            ways: defaults::L2_WAYS,
            latency: defaults::L2_LATENCY,
            ..Self::default()
        }
    }

    /// Number of sets implied by size, line and associativity.
    pub const fn sets(&self) -> usize {
        self.size_bytes / (self.line_bytes * self.ways)
    }

    fn validate(&self, name: &str) -> SimResult<()> {
        if self.size_bytes == 0 || self.ways == 0 {
            return Err(SimError::config(format!("{name} has zero capacity")));
        }
        if !self.line_bytes.is_power_of_two() || self.line_bytes < 4 {
            return Err(SimError::config(format!(
                "{name}.line_bytes = {} must be a power of two of at least 4",
                self.line_bytes
            )));
        }
        if self.size_bytes % (self.line_bytes * self.ways) != 0 || self.sets() == 0 {
            return Err(SimError::config(format!(
                "{name}: {} bytes is not a whole number of {}-way sets of {}-byte lines",
                self.size_bytes, self.ways, self.line_bytes
            )));
        }
        if !self.sets().is_power_of_two() {
            return Err(SimError::config(format!(
                "{name} has {} sets; the set count must be a power of two",
                self.sets()
            )));
        }
        if self.read_ports == 0 || self.write_ports == 0 {
            return Err(SimError::config(format!("{name} needs at least one read and one write port")));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::L1_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::L1_WAYS,
            latency: defaults::L1_LATENCY,
            policy: ReplacementPolicy::Lru,
            read_ports: defaults::READ_PORTS,
            write_ports: defaults::WRITE_PORTS,
        }
    }
}

/// Per-core L1 caches and the shared directory cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Instruction cache of every core.
    #[serde(default)]
    pub l1i: CacheConfig,
    /// Data cache of every core.
    #[serde(default)]
    pub l1d: CacheConfig,
    /// Shared directory cache.
    #[serde(default = "CacheConfig::l2")]
    pub l2: CacheConfig,
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            l1i: CacheConfig::default(),
            l1d: CacheConfig::default(),
            l2: CacheConfig::l2(),
        }
    }
}

/// Instruction and data TLB of every hardware thread.
///
/// A TLB is a tag-only LRU array of `page_bytes` entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlbConfig {
    /// Capacity in bytes of mapped address space.
    pub size_bytes: usize,
    /// Translation granule in bytes.
    pub page_bytes: usize,
    /// Associativity.
    pub ways: usize,
    /// Cycles to translate a cached page.
    pub hit_latency: u64,
    /// Cycles to translate a page that missed.
    pub miss_latency: u64,
}

impl TlbConfig {
    /// The TLB as a cache array geometry.
    pub fn geometry(&self) -> CacheConfig {
        CacheConfig {
            size_bytes: self.size_bytes,
            line_bytes: self.page_bytes,
            ways: self.ways,
            latency: self.hit_latency,
            policy: ReplacementPolicy::Lru,
            ..CacheConfig::default()
        }
    }
}

impl Default for TlbConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::TLB_SIZE,
            page_bytes: defaults::TLB_PAGE,
            ways: defaults::TLB_WAYS,
            hit_latency: defaults::TLB_HIT_LATENCY,
            miss_latency: defaults::TLB_MISS_LATENCY,
        }
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory controller model.
    pub controller: MemoryController,
    /// Latency of the simple controller.
    pub latency: u64,
    /// Column access latency of the DRAM controller.
    pub t_cas: u64,
    /// Row activation latency of the DRAM controller.
    pub t_ras: u64,
    /// Precharge latency of the DRAM controller.
    pub t_pre: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            controller: MemoryController::Simple,
            latency: defaults::MEMORY_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
        }
    }
}

/// Interconnect between the L1 controllers, the directory and memory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Fixed per-message latency in cycles.
    pub hop_latency: u64,
    /// Link bandwidth in bytes per cycle.
    pub bandwidth: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hop_latency: defaults::HOP_LATENCY,
            bandwidth: defaults::LINK_BANDWIDTH,
        }
    }
}

/// Branch predictor selection and table sizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BranchPredictorConfig {
    /// Predictor algorithm.
    pub kind: BranchPredictor,
    /// Branch target buffer entries.
    pub btb_size: usize,
    /// Return address stack entries.
    pub ras_size: usize,
    /// Bimodal counter table entries.
    pub bimod_size: usize,
    /// Two-level: history register count.
    pub l1_size: usize,
    /// Two-level: counter table entries.
    pub l2_size: usize,
    /// Two-level: history width in bits.
    pub shift_width: u32,
    /// Two-level: xor history with the branch address.
    pub xor: bool,
    /// Combined: chooser counter table entries.
    pub meta_size: usize,
}

impl Default for BranchPredictorConfig {
    fn default() -> Self {
        Self {
            kind: BranchPredictor::TwoBit,
            btb_size: defaults::BTB_SIZE,
            ras_size: defaults::RAS_SIZE,
            bimod_size: defaults::BIMOD_SIZE,
            l1_size: defaults::TWO_LEVEL_L1_SIZE,
            l2_size: defaults::TWO_LEVEL_L2_SIZE,
            shift_width: defaults::TWO_LEVEL_SHIFT_WIDTH,
            xor: false,
            meta_size: defaults::META_SIZE,
        }
    }
}

/// Which hardware threads run the main program and the helper program.
///
/// Thread ids are global: thread `t` of core `c` is `c * threads_per_core + t`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadRoleConfig {
    /// Global id of the main thread.
    pub main_thread: usize,
    /// Global id of the helper thread, if one is configured.
    pub helper_thread: Option<usize>,
}
