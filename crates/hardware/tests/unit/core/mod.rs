/// Register files, reorder buffer, squash recovery and memory disambiguation.
pub mod pipeline;

/// Whole-machine runs: commit bandwidth, phases and the commit watchdog.
pub mod scenarios;

/// Branch prediction and functional units.
pub mod units;
