/*!
 * Cooperative cancellation shared between a run and whoever may stop it
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Marker returned by every traversal step once a stop request is observed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation stopped by user")]
pub struct Cancelled;

/// A cloneable stop flag.
///
/// Clones share the same flag: the invoking context keeps one handle to call
/// [`cancel`](Self::cancel) from any thread while the worker polls
/// [`check`](Self::check) at its checkpoints.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint: `Err(Cancelled)` once a stop was requested
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
