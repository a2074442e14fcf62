use crate::error::host::HostError;

use common::ErrorLocation;

use std::sync::atomic::{AtomicBool, Ordering};

/// Set while a host owns the engine's process-wide state.
static HOST_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Proof that the holder is the only live host in the process.
/// Released on drop.
#[derive(Debug)]
pub(crate) struct ProcessGuard {
    _private: (),
}

impl ProcessGuard {
    #[track_caller]
    pub(crate) fn acquire() -> Result<Self, HostError> {
        HOST_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| Self { _private: () })
            .map_err(|_| HostError::AlreadyRunning {
                location: ErrorLocation::caller(),
            })
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        HOST_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// True while some host in this process has not been shut down or dropped.
pub fn is_host_active() -> bool {
    HOST_ACTIVE.load(Ordering::SeqCst)
}
