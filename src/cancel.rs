//! Cooperative cancellation for long-running sweeps.
//!
//! A `CancelToken` is a cloneable flag shared between the caller and an
//! enumeration or simplification pass. The pass checks it at the top of each
//! step and fails with `FcaError::Cancelled`, leaving no partial state
//! observable to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::FcaError;

/// Cloneable cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe the request.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with `Cancelled` if cancellation was requested.
    pub fn check(&self) -> Result<(), FcaError> {
        if self.is_cancelled() {
            Err(FcaError::Cancelled)
        } else {
            Ok(())
        }
    }
}
