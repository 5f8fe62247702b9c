//! Bootstrap readiness
//!
//! Calls can reach the bridge while the host is still starting up, before
//! the class and instance tables are safe to consult. The process-wide flag
//! below is set exactly once when startup is over; until then the bridge
//! answers every call with a default value.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag indicating the host finished bootstrapping
static BOOTSTRAP_COMPLETE: AtomicBool = AtomicBool::new(false);

/// Check if bootstrap has completed for this process
pub fn is_bootstrap_complete() -> bool {
    BOOTSTRAP_COMPLETE.load(Ordering::Acquire)
}

/// Mark bootstrap as complete (never reset outside tests)
pub fn mark_bootstrap_complete() {
    BOOTSTRAP_COMPLETE.store(true, Ordering::Release);
}

/// Reset bootstrap state (for testing)
#[cfg(test)]
pub(crate) fn reset_bootstrap() {
    BOOTSTRAP_COMPLETE.store(false, Ordering::Release);
}

/// Source of the readiness flag consulted by a bridge
pub trait Bootstrap: Send + Sync {
    /// Whether the host is ready for normal dispatch
    fn is_complete(&self) -> bool;
}

/// Reads the process-wide flag
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessBootstrap;

impl Bootstrap for ProcessBootstrap {
    fn is_complete(&self) -> bool {
        is_bootstrap_complete()
    }
}

/// A readiness flag owned by one bridge, for hosts that run several
/// isolated bridges (and for tests)
#[derive(Debug, Default)]
pub struct BootstrapFlag(AtomicBool);

impl BootstrapFlag {
    /// Create a flag in the given state
    pub fn new(complete: bool) -> Self {
        Self(AtomicBool::new(complete))
    }

    /// Mark the flag complete
    pub fn mark_complete(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Bootstrap for BootstrapFlag {
    fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
