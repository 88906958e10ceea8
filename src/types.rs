//! Type definitions and aliases

use futures::future::BoxFuture;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The eventual outcome of one two-step operation.
///
/// Resolved exactly once, to success or to the failure the composition
/// strategy chose to surface.
pub type PendingResult = BoxFuture<'static, Result<()>>;

/// How a settled operation ended, as seen by the harness after the
/// failure has been suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The operation resolved successfully
    Succeeded,
    /// The operation resolved with a failure
    Failed,
    /// The operation's task panicked before resolving
    Panicked,
}
