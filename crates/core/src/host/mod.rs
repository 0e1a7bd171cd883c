//! Services consumed from the hosting process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers "is the host process currently tearing down".
///
/// Consulted before every fast-path read in the registry and before the bank
/// execution queue is constructed.
pub trait HostExitProbe: Send + Sync {
    fn is_exit_requested(&self) -> bool;
}

/// Probe for hosts that never signal exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverExiting;

impl HostExitProbe for NeverExiting {
    fn is_exit_requested(&self) -> bool {
        false
    }
}

impl<F> HostExitProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_exit_requested(&self) -> bool {
        self()
    }
}

/// Shared exit flag that the host raises once it starts shutting down.
#[derive(Debug, Default, Clone)]
pub struct ExitSignal {
    requested: Arc<AtomicBool>,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_exit(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

impl HostExitProbe for ExitSignal {
    fn is_exit_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
