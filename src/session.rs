use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide UI state shared by every handler.
///
/// Created once at startup and handed to the router; `first_load` is true
/// until the first feed has been served.
#[derive(Debug)]
pub struct SessionState {
    first_load: AtomicBool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            first_load: AtomicBool::new(true),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_first_load(&self) -> bool {
        self.first_load.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was still set.
    pub fn take_first_load(&self) -> bool {
        self.first_load.swap(false, Ordering::AcqRel)
    }

    pub fn reset(&self) {
        self.first_load.store(true, Ordering::Release);
    }
}
