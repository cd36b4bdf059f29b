//! Shared test infrastructure.

/// Program and configuration builders.
pub mod builder;

/// Logging setup and run loops.
pub mod harness;

/// Mocked collaborators.
pub mod mocks;
