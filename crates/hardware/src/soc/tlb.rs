//! Translation lookaside buffers.
//!
//! Every hardware thread owns an instruction TLB and a data TLB. A TLB is a
//! tag-only [`CacheArray`] with LRU replacement: a lookup costs the hit
//! latency, or the miss latency after which the page is installed.
//!
//! The hierarchy starts the lookup together with the L1 access. The access is
//! reported to the core only once both have finished; [`Translations`] holds
//! the cycle at which each in-flight access finishes translating.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::TlbConfig;
use crate::soc::cache::CacheArray;

/// Per-TLB counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TlbStats {
    /// Lookups that found the page.
    pub hits: u64,
    /// Lookups that had to walk.
    pub misses: u64,
    /// Pages displaced by a miss.
    pub evictions: u64,
}

impl TlbStats {
    /// Hits over all lookups.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// One thread's instruction or data TLB.
#[derive(Debug)]
pub struct Tlb {
    name: String,
    array: CacheArray<()>,
    hit_latency: u64,
    miss_latency: u64,
    /// Counters.
    pub stats: TlbStats,
}

impl Tlb {
    /// Builds an empty TLB from a validated configuration.
    pub fn new(name: impl Into<String>, config: &TlbConfig) -> Self {
        Self {
            name: name.into(),
            array: CacheArray::new(&config.geometry()),
            hit_latency: config.hit_latency,
            miss_latency: config.miss_latency,
            stats: TlbStats::default(),
        }
    }

    /// TLB name (`itlb0`, `dtlb3`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the page of `addr` is cached.
    pub fn contains(&self, addr: u64) -> bool {
        self.array.find(self.array.tag_of(addr)).is_some()
    }

    /// Pages currently cached.
    pub fn occupancy(&self) -> usize {
        self.array.iter().filter(|(_, line)| line.tag.is_some()).count()
    }

    /// Looks up the page of `addr`, installing it on a miss. Returns the
    /// cycles the translation takes.
    pub fn translate(&mut self, addr: u64) -> u64 {
        let tag = self.array.tag_of(addr);
        if let Some(id) = self.array.find(tag) {
            self.array.touch(id);
            self.stats.hits += 1;
            return self.hit_latency;
        }

        self.stats.misses += 1;
        let set = self.array.set_of(tag);
        let free = self
            .array
            .set_lines(set)
            .find(|(_, line)| line.tag.is_none())
            .map(|(id, _)| id);
        let id = match free {
            Some(id) => id,
            None => {
                self.stats.evictions += 1;
                self.array.victim(set)
            }
        };
        if let Some(line) = self.array.line_mut(id) {
            line.tag = Some(tag);
        }
        self.array.touch(id);
        self.miss_latency
    }
}

/// Translation deadlines of the in-flight L1 accesses, keyed by L1 id and tag.
///
/// Only primary accesses are translated; aliases merged into one complete
/// with it.
#[derive(Debug, Default)]
pub struct Translations {
    ready: HashMap<(usize, u64), u64>,
}

impl Translations {
    /// Records that the access to `tag` on `l1` finishes translating at `ready_at`.
    pub fn start(&mut self, l1: usize, tag: u64, ready_at: u64) {
        let _ = self.ready.insert((l1, tag), ready_at);
    }

    /// Forgets the translation of the access to `tag` on `l1` and returns how
    /// many cycles after `now` its completion must still wait.
    pub fn finish(&mut self, l1: usize, tag: u64, now: u64) -> u64 {
        self.ready
            .remove(&(l1, tag))
            .map_or(0, |ready_at| ready_at.saturating_sub(now))
    }

    /// Number of accesses still tracked.
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Returns true if no access is tracked.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}
