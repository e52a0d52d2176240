//! Cooperative cancellation for long-running builds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{PackageError, Result};

/// A cloneable flag that a caller can raise to abort a build.
///
/// Builders poll it between steps; raising it mid-build makes the build
/// return [`PackageError::Cancelled`] at the next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once the flag has been raised.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PackageError::Cancelled)
        } else {
            Ok(())
        }
    }
}
