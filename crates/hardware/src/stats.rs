//! Simulation statistics collection and reporting.
//!
//! This module gathers the counters every component keeps into one report. It provides:
//! 1. **Summary:** Cycles per phase, committed instructions and IPC.
//! 2. **Threads:** Commits, squashes, branch prediction and stall reasons per thread.
//! 3. **Cores:** Issue and writeback counts and functional-unit stalls per operation.
//! 4. **Caches:** Hits, misses, evictions, hit ratio and occupancy per L1 and per TLB.
//! 5. **Directory and Network:** Coherence requests, memory traffic and messages.
//!
//! Reports print as selectable sections or export as JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::common::SimResult;
use crate::core::cpu::CoreStats;
use crate::core::thread::{ThreadRole, ThreadState, ThreadStats};
use crate::isa::FuOperation;
use crate::sim::{Phase, Simulation};
use crate::soc::coherence::directory::DirectoryStats;
use crate::soc::coherence::l1::L1Stats;
use crate::soc::interconnect::NetworkStats;
use crate::soc::tlb::TlbStats;

/// Statistics of one hardware thread.
#[derive(Clone, Debug, Serialize)]
pub struct ThreadReport {
    /// Thread name, `c<core>t<index>`.
    pub name: String,
    /// Machine-wide thread id.
    pub global_id: usize,
    /// Workload role.
    pub role: ThreadRole,
    /// Pipeline state at collection time.
    pub state: ThreadState,
    /// Fraction of committed control instructions predicted correctly.
    pub prediction_accuracy: f64,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: ThreadStats,
}

/// Statistics of one core.
#[derive(Clone, Debug, Serialize)]
pub struct CoreReport {
    /// Core name, `c<id>`.
    pub name: String,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: CoreStats,
    /// Issue attempts that found no free unit, per operation.
    pub fu_stalls: BTreeMap<FuOperation, u64>,
    /// The core's threads.
    pub threads: Vec<ThreadReport>,
}

/// Statistics of one L1 controller.
#[derive(Clone, Debug, Serialize)]
pub struct CacheReport {
    /// Controller name (`l1i0`, `l1d0`, ...).
    pub name: String,
    /// Hits over all accesses.
    pub hit_ratio: f64,
    /// Valid lines.
    pub occupancy: usize,
    /// Lines the cache can hold.
    pub capacity: usize,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: L1Stats,
}

impl CacheReport {
    /// Reads and fetches plus writes.
    pub const fn accesses(&self) -> u64 {
        self.counters.read_hits
            + self.counters.read_misses
            + self.counters.write_hits
            + self.counters.write_misses
    }
}

/// Statistics of one TLB.
#[derive(Clone, Debug, Serialize)]
pub struct TlbReport {
    /// TLB name (`itlb0`, `dtlb0`, ...).
    pub name: String,
    /// Hits over all lookups.
    pub hit_ratio: f64,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: TlbStats,
}

/// Statistics of the directory.
#[derive(Clone, Debug, Serialize)]
pub struct DirectoryReport {
    /// Tracked lines.
    pub occupancy: usize,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: DirectoryStats,
}

/// Complete simulation report.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    /// Phase at collection time.
    pub phase: Phase,
    /// Clock value (warm-up plus measured cycles).
    pub cycles: u64,
    /// Measured cycles.
    pub measured_cycles: u64,
    /// Instructions committed by every thread.
    pub committed: u64,
    /// Committed instructions per measured cycle.
    pub ipc: f64,
    /// Every thread finished.
    pub finished: bool,
    /// Per-core statistics.
    pub cores: Vec<CoreReport>,
    /// Per-L1 statistics, in controller id order.
    pub caches: Vec<CacheReport>,
    /// Per-TLB statistics, instruction TLBs first.
    pub tlbs: Vec<TlbReport>,
    /// Directory statistics.
    pub directory: DirectoryReport,
    /// Network traffic.
    pub network: NetworkStats,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"threads"`, `"core"`, `"cache"`,
/// `"directory"`, `"network"`. Pass an empty slice to `print_sections` to print
/// all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "threads", "core", "cache", "directory", "network"];

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl SimStats {
    /// Snapshots the counters of `sim`.
    pub fn collect(sim: &Simulation) -> Self {
        let cores = sim
            .cores()
            .iter()
            .map(|core| CoreReport {
                name: core.name.clone(),
                counters: core.stats.clone(),
                fu_stalls: core.fu.no_free_unit.clone(),
                threads: core
                    .threads
                    .iter()
                    .map(|t| ThreadReport {
                        name: t.name.clone(),
                        global_id: t.global_id,
                        role: t.role,
                        state: t.state,
                        prediction_accuracy: t.stats.prediction_accuracy(),
                        counters: t.stats.clone(),
                    })
                    .collect(),
            })
            .collect();

        let caches = sim
            .memory()
            .l1s()
            .iter()
            .map(|l1| {
                let s = l1.stats;
                CacheReport {
                    name: l1.name().to_owned(),
                    hit_ratio: ratio(
                        s.read_hits + s.write_hits,
                        s.read_hits + s.read_misses + s.write_hits + s.write_misses,
                    ),
                    occupancy: l1.occupancy(),
                    capacity: l1.capacity(),
                    counters: s,
                }
            })
            .collect();

        let tlbs = sim
            .memory()
            .tlbs()
            .map(|tlb| TlbReport {
                name: tlb.name().to_owned(),
                hit_ratio: tlb.stats.hit_ratio(),
                counters: tlb.stats,
            })
            .collect();

        let directory = sim.memory().directory();
        let committed = sim.committed();
        Self {
            phase: sim.phase(),
            cycles: sim.cycle(),
            measured_cycles: sim.measured_cycles(),
            committed,
            ipc: ratio(committed, sim.measured_cycles()),
            finished: sim.is_finished(),
            cores,
            caches,
            tlbs,
            directory: DirectoryReport {
                occupancy: directory.occupancy(),
                counters: directory.stats,
            },
            network: sim.memory().network().stats,
        }
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::common::SimError::ConfigParse`] if serialization fails.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an
    /// empty slice to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            println!("\n==========================================================");
            println!("CMP SIMULATION STATISTICS");
            println!("==========================================================");
            println!("phase                    {:?}", self.phase);
            println!("sim_cycles               {}", self.cycles);
            println!("sim_measured_cycles      {}", self.measured_cycles);
            println!("sim_insts                {}", self.committed);
            println!("sim_ipc                  {:.4}", self.ipc);
            println!("sim_finished             {}", self.finished);
            println!("----------------------------------------------------------");
        }
        if want("threads") {
            println!("THREADS");
            for t in self.cores.iter().flat_map(|c| &c.threads) {
                let s = &t.counters;
                println!("  {} ({:?}, {:?})", t.name, t.role, t.state);
                println!("    committed            {}", s.committed);
                println!("    functional           {}", s.functional);
                println!("    fetched              {}", s.fetched);
                println!("    squashes             {} ({} entries)", s.squashes, s.squashed_entries);
                println!(
                    "    bp.lookups           {} | mispredicts: {} | accuracy: {:.2}%",
                    s.predictions,
                    s.mispredictions,
                    t.prediction_accuracy * 100.0
                );
                println!("    loads.forwarded      {}", s.forwarded_loads);
                println!(
                    "    stalls.fetch         decode_buffer: {} | icache: {}",
                    s.fetch_stalls_decode_buffer_full, s.fetch_stalls_icache
                );
                println!(
                    "    stalls.rename        empty: {} | rob: {} | lsq: {} | regs: {}",
                    s.rename_stalls_decode_buffer_empty,
                    s.rename_stalls_rob_full,
                    s.rename_stalls_lsq_full,
                    s.rename_stalls_no_phys_reg
                );
                println!(
                    "    stalls.issue         fu: {} | load: {} | store: {}",
                    s.issue_stalls_no_free_fu, s.issue_stalls_cannot_load, s.issue_stalls_cannot_store
                );
                println!("    head_incomplete      {}", s.cycles_head_incomplete);
                println!("    commit_timeouts      {}", s.commit_timeouts);
            }
            println!("----------------------------------------------------------");
        }
        if want("core") {
            println!("CORES");
            for c in &self.cores {
                let s = &c.counters;
                println!(
                    "  {:<6} cycles: {:<10} | warmup: {:<8} | ff: {:<8} | issued: {:<10} | written_back: {}",
                    c.name, s.cycles, s.warmup_cycles, s.fast_forward_cycles, s.issued, s.written_back
                );
                for (op, stalls) in &c.fu_stalls {
                    println!("    fu_stall.{:<12} {}", format!("{op:?}"), stalls);
                }
            }
            println!("----------------------------------------------------------");
        }
        if want("cache") {
            println!("L1 CACHES");
            for l1 in &self.caches {
                println!(
                    "  {:<6} accesses: {:<10} | hit_ratio: {:.2}% | evictions: {:<8} | invalidations: {:<8} | occupancy: {}/{}",
                    l1.name,
                    l1.accesses(),
                    l1.hit_ratio * 100.0,
                    l1.counters.evictions,
                    l1.counters.invalidations,
                    l1.occupancy,
                    l1.capacity
                );
            }
            println!("TLBS");
            for tlb in &self.tlbs {
                println!(
                    "  {:<6} hits: {:<10} | misses: {:<8} | hit_ratio: {:.2}% | evictions: {}",
                    tlb.name,
                    tlb.counters.hits,
                    tlb.counters.misses,
                    tlb.hit_ratio * 100.0,
                    tlb.counters.evictions
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("directory") {
            let d = &self.directory.counters;
            println!("DIRECTORY");
            println!("  requests.gets          {}", d.get_s);
            println!("  requests.getm          {}", d.get_m);
            println!("  requests.put           {}", d.puts);
            println!("  hits                   {}", d.hits);
            println!("  misses                 {}", d.misses);
            println!("  memory.reads           {}", d.memory_reads);
            println!("  memory.writes          {}", d.memory_writes);
            println!("  memory.write_cycles    {}", d.writeback_cycles);
            println!("  recalls                {}", d.recalls);
            println!("  stalled_requests       {}", d.stalled_requests);
            println!("  occupancy              {}", self.directory.occupancy);
            println!("----------------------------------------------------------");
        }
        if want("network") {
            println!("NETWORK");
            println!("  messages               {}", self.network.messages);
            println!("  bytes                  {}", self.network.bytes);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
