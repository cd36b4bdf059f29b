
/// Functional unit timings and pool.
pub mod fu;
