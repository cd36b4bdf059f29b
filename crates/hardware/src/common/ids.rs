//! Simulation-scoped identifiers and the generational entry arena.
//!
//! Every dynamic object that outlives a single call (dynamic instructions, ROB and
//! LSQ entries, cache accesses) receives an id from the [`IdCounter`] owned by the
//! simulation instance. The [`Arena`] stores ROB and LSQ entries by slot and hands
//! out [`Handle`]s that pair the slot with the entry id, so a handle kept in a
//! dependents list or in a pending event can be checked for staleness after its
//! slot has been reused.

/// Monotonically increasing id source owned by one simulation.
#[derive(Debug, Clone)]
pub struct IdCounter {
    next: u64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCounter {
    /// Creates a counter whose first id is 1.
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next id.
    pub const fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns the number of ids handed out so far.
    pub const fn issued(&self) -> u64 {
        self.next.saturating_sub(1)
    }
}

/// Reference to an arena slot, valid only while the slot holds the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: usize,
    id: u64,
}

impl Handle {
    /// Id of the entry this handle was created for.
    #[inline]
    pub const fn id(self) -> u64 {
        self.id
    }

    /// Slot index inside the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    id: u64,
    value: Option<T>,
}

/// Slot storage with free-list reuse and id-checked access.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Stores `value` under `id` and returns its handle.
    pub fn insert(&mut self, id: u64, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index] = Slot {
                id,
                value: Some(value),
            };
            Handle { index, id }
        } else {
            self.slots.push(Slot {
                id,
                value: Some(value),
            });
            Handle {
                index: self.slots.len() - 1,
                id,
            }
        }
    }

    /// Returns the entry for `handle`, or `None` if the handle is stale.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.id == handle.id)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable variant of [`Arena::get`].
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.id == handle.id)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Returns true if `handle` still refers to a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes and returns the entry for `handle`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .filter(|slot| slot.id == handle.id)?;
        let value = slot.value.take()?;
        slot.id = 0;
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Number of live entries.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no entry is live.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
