//! Execution resources shared by the threads of a core.
//!
//! This module contains the functional-unit pool and the branch prediction
//! unit (predictors, BTB and return address stack).

/// Branch prediction unit: predictors, BTB and RAS.
pub mod bru;

/// Functional-unit pool.
pub mod fu;
