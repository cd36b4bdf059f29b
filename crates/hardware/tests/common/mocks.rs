//! Mocked collaborators.

use cmpsim_core::soc::memory::MemoryController;
use mockall::mock;

mock! {
    /// Memory controller with scripted latencies.
    pub Controller {}

    impl MemoryController for Controller {
        fn access_latency(&mut self, addr: u64) -> u64;
    }
}

impl std::fmt::Debug for MockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockController").finish_non_exhaustive()
    }
}

/// A mocked controller answering every access with `latency`.
pub fn fixed_latency(latency: u64) -> MockController {
    let mut mock = MockController::new();
    let _ = mock.expect_access_latency().return_const(latency);
    mock
}
