//! Backing memory behind the shared directory.

/// Memory controller latency models.
pub mod controller;

pub use controller::{DramController, MemoryController, SimpleController};
