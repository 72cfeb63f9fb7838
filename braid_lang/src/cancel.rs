//! Cooperative cancellation for interpreter evaluation.
//!
//! Each interpreter context owns a token; container stringification and
//! other long iterations poll it and bail out cleanly when it fires.
//! Cloning the token shares the underlying flag, so a UI thread can hold
//! a clone and request cancellation while evaluation is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    requested: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
