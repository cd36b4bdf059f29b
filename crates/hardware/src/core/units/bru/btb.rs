//! Branch Target Buffer (BTB).
//!
//! The BTB is a direct-mapped cache that stores target addresses for control flow
//! instructions. It allows the fetch stage to predict the target of a branch or
//! jump before the instruction is executed.

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, Default)]
struct BtbEntry {
    /// Address of the control instruction that owns the entry.
    tag: u32,
    /// The predicted target address.
    target: u32,
    /// Indicates if this entry contains valid data.
    valid: bool,
}

/// Branch Target Buffer structure.
#[derive(Debug)]
pub struct Btb {
    /// The table of BTB entries.
    table: Vec<BtbEntry>,
    /// The total number of entries in the BTB.
    size: usize,
}

impl Btb {
    /// Creates a new Branch Target Buffer with the specified size (a power of two).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            table: vec![BtbEntry::default(); size],
            size,
        }
    }

    /// Shifts out instruction alignment and masks against the table size.
    const fn index(&self, pc: u32) -> usize {
        ((pc >> 2) as usize) & (self.size - 1)
    }

    /// Looks up a target address for the given program counter.
    pub fn lookup(&self, pc: u32) -> Option<u32> {
        self.table
            .get(self.index(pc))
            .filter(|e| e.valid && e.tag == pc)
            .map(|e| e.target)
    }

    /// Records the target of a taken control instruction.
    pub fn update(&mut self, pc: u32, target: u32, taken: bool) {
        if !taken {
            return;
        }
        let idx = self.index(pc);
        if let Some(slot) = self.table.get_mut(idx) {
            *slot = BtbEntry {
                tag: pc,
                target,
                valid: true,
            };
        }
    }
}
