/// Store-to-load ordering in the LSQ.
pub mod disambiguation;

/// Instruction fetch and line requests.
pub mod fetch;


/// Program-ordered entry queues.
pub mod rob;
