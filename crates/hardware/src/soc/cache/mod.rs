//! Set-associative storage shared by the L1 controllers and the directory.
//!
//! [`CacheArray`] holds the tag and per-line payload of every way and maps
//! addresses to sets. The coherence state machines live in the payload; the
//! array itself only answers lookups and asks the eviction policy for victims.

/// Replacement policy implementations (FIFO, LRU, MRU, PLRU, Random).
pub mod policies;

use self::policies::EvictionPolicy;
use crate::config::CacheConfig;

/// Tag, set and way of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId {
    /// Set index.
    pub set: usize,
    /// Way index.
    pub way: usize,
}

/// One way of a set.
#[derive(Debug, Clone)]
pub struct Line<T> {
    /// Line-aligned tag, or `None` when the way holds nothing.
    pub tag: Option<u64>,
    /// Controller-specific state.
    pub state: T,
}

/// Geometry plus line storage plus eviction policy.
#[derive(Debug)]
pub struct CacheArray<T> {
    sets: usize,
    ways: usize,
    line_bytes: u64,
    lines: Vec<Line<T>>,
    policy: Box<dyn EvictionPolicy>,
}

impl<T: Default> CacheArray<T> {
    /// Builds an empty array from a validated cache configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let sets = config.sets().max(1);
        let ways = config.ways.max(1);
        let lines = (0..sets * ways)
            .map(|_| Line {
                tag: None,
                state: T::default(),
            })
            .collect();
        Self {
            sets,
            ways,
            line_bytes: config.line_bytes as u64,
            lines,
            policy: policies::build(config.policy, sets, ways),
        }
    }
}

impl<T> CacheArray<T> {
    /// Line size in bytes.
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Line-aligned tag of `addr`.
    pub const fn tag_of(&self, addr: u64) -> u64 {
        addr & !(self.line_bytes - 1)
    }

    /// Set that `tag` maps to.
    pub const fn set_of(&self, tag: u64) -> usize {
        ((tag / self.line_bytes) as usize) & (self.sets - 1)
    }

    /// Way of `set` currently holding `tag`.
    pub fn find(&self, tag: u64) -> Option<LineId> {
        let set = self.set_of(tag);
        (0..self.ways)
            .find(|&way| self.line(LineId { set, way }).is_some_and(|l| l.tag == Some(tag)))
            .map(|way| LineId { set, way })
    }

    /// Way that the eviction policy nominates in `set`.
    pub fn victim(&mut self, set: usize) -> LineId {
        LineId {
            set,
            way: self.policy.get_victim(set) % self.ways,
        }
    }

    /// Tells the eviction policy that `id` was used.
    pub fn touch(&mut self, id: LineId) {
        self.policy.update(id.set, id.way);
    }

    /// Line at `id`.
    pub fn line(&self, id: LineId) -> Option<&Line<T>> {
        self.lines.get(id.set * self.ways + id.way)
    }

    /// Mutable line at `id`.
    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line<T>> {
        self.lines.get_mut(id.set * self.ways + id.way)
    }

    /// Ways of `set` with their ids.
    pub fn set_lines(&self, set: usize) -> impl Iterator<Item = (LineId, &Line<T>)> + '_ {
        (0..self.ways).filter_map(move |way| {
            let id = LineId { set, way };
            self.line(id).map(|line| (id, line))
        })
    }

    /// Every line with its id.
    pub fn iter(&self) -> impl Iterator<Item = (LineId, &Line<T>)> + '_ {
        self.lines.iter().enumerate().map(|(i, line)| {
            (
                LineId {
                    set: i / self.ways,
                    way: i % self.ways,
                },
                line,
            )
        })
    }
}
