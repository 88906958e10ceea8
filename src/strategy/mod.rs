//! Composition strategies for two chained asynchronous calls
//!
//! Every strategy makes a first call and, only when it fails, a second
//! compensating call. They differ in how the second call is chained and in
//! which failure ends up settling the pending result:
//!
//! - [`Strategy::ExceptionallyCompose`] chains the second call as a
//!   continuation. The original failure is only re-raised when the second
//!   call succeeds; a failing second call replaces it.
//! - [`Strategy::BlockingJoin`] blocks the current worker thread until the
//!   second call finishes, then re-raises the original failure.
//! - [`Strategy::SeparatePendingResult`] resolves a separately created
//!   pending result from a completion handler attached to the second call.

use crate::{
    client::ResourceLister,
    error::{AppError, Result},
    types::PendingResult,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use tokio::{runtime::Handle, sync::oneshot, task};

/// The three ways of composing the two calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Chain the second call with a combinator on the first call's failure
    ExceptionallyCompose,
    /// Block inside the failure handler until the second call finishes
    BlockingJoin,
    /// Bridge both calls through a pending result created up front
    SeparatePendingResult,
}

impl Strategy {
    /// All strategies, in the order they are usually compared
    pub const ALL: [Strategy; 3] = [
        Strategy::ExceptionallyCompose,
        Strategy::BlockingJoin,
        Strategy::SeparatePendingResult,
    ];

    /// Stable kebab-case name, as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ExceptionallyCompose => "exceptionally-compose",
            Strategy::BlockingJoin => "blocking-join",
            Strategy::SeparatePendingResult => "separate-pending-result",
        }
    }

    /// One-line description for logs and help output
    pub fn description(&self) -> &'static str {
        match self {
            Strategy::ExceptionallyCompose => "compose the second call onto the first call's failure",
            Strategy::BlockingJoin => "block the worker thread on the second call inside the failure handler",
            Strategy::SeparatePendingResult => "resolve a separate pending result from the second call's completion",
        }
    }

    /// Whether the strategy parks a runtime thread while the second call runs
    pub fn is_blocking(&self) -> bool {
        matches!(self, Strategy::BlockingJoin)
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::SeparatePendingResult
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "exceptionally-compose" | "compose" => Ok(Strategy::ExceptionallyCompose),
            "blocking-join" | "join" => Ok(Strategy::BlockingJoin),
            "separate-pending-result" | "separate" => Ok(Strategy::SeparatePendingResult),
            _ => Err(AppError::parse(format!(
                "Invalid strategy '{}', expected one of: exceptionally-compose, blocking-join, separate-pending-result",
                s
            ))),
        }
    }
}

/// Builds two-step operations against a pair of long-lived clients.
///
/// The clients are read-only after construction and shared by every
/// operation; they may be the same instance.
#[derive(Clone)]
pub struct Composer {
    first: Arc<dyn ResourceLister>,
    second: Arc<dyn ResourceLister>,
}

impl Composer {
    /// Create a composer making the first call on `first` and the
    /// compensating call on `second`
    pub fn new(first: Arc<dyn ResourceLister>, second: Arc<dyn ResourceLister>) -> Self {
        Self { first, second }
    }

    /// Create a composer that makes both calls on one client
    pub fn with_shared_client(client: Arc<dyn ResourceLister>) -> Self {
        Self {
            first: Arc::clone(&client),
            second: client,
        }
    }

    /// Whether both calls go through the same client instance
    pub fn shares_client(&self) -> bool {
        Arc::ptr_eq(&self.first, &self.second)
    }

    /// Start one two-step operation using `strategy`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn invoke(&self, strategy: Strategy) -> PendingResult {
        match strategy {
            Strategy::ExceptionallyCompose => self.exceptionally_compose(),
            Strategy::BlockingJoin => self.blocking_join(),
            Strategy::SeparatePendingResult => self.separate_pending_result(),
        }
    }

    /// A no-argument operation factory bound to `strategy`
    pub fn strategy_fn(&self, strategy: Strategy) -> impl Fn() -> PendingResult + Send + Sync + 'static {
        let composer = self.clone();
        move || composer.invoke(strategy)
    }

    /// Chain the second call onto the first call's failure.
    ///
    /// Only the second call's success path re-raises the original failure;
    /// if the second call fails, its failure settles the result instead.
    pub fn exceptionally_compose(&self) -> PendingResult {
        let first = Arc::clone(&self.first);
        let second = Arc::clone(&self.second);

        async move {
            match first.list_resources().await {
                Ok(()) => Ok(()),
                Err(original) => {
                    second.list_resources().await?;
                    Err(AppError::compensated(original))
                }
            }
        }
        .boxed()
    }

    /// Wait for the second call synchronously inside the failure handler.
    ///
    /// The worker thread running the operation stays parked until the second
    /// call settles. Its outcome is ignored and the original failure is
    /// re-raised.
    pub fn blocking_join(&self) -> PendingResult {
        let first = Arc::clone(&self.first);
        let second = Arc::clone(&self.second);

        async move {
            match first.list_resources().await {
                Ok(()) => Ok(()),
                Err(original) => {
                    let handle = Handle::current();
                    let _compensation = task::block_in_place(|| {
                        handle.block_on(second.list_resources())
                    });
                    Err(AppError::compensated(original))
                }
            }
        }
        .boxed()
    }

    /// Resolve a pending result created up front from the second call's
    /// completion handler.
    ///
    /// A failed second call settles the result with both failures; a
    /// successful one settles it with the original failure. Nothing blocks.
    pub fn separate_pending_result(&self) -> PendingResult {
        let first = Arc::clone(&self.first);
        let second = Arc::clone(&self.second);
        let (resolve, pending) = oneshot::channel::<Result<()>>();

        tokio::spawn(async move {
            match first.list_resources().await {
                Ok(()) => {
                    let _ = resolve.send(Ok(()));
                }
                Err(original) => {
                    tokio::spawn(async move {
                        let failure = match second.list_resources().await {
                            Ok(()) => original,
                            Err(compensation) => AppError::compensation_failed(original, compensation),
                        };
                        let _ = resolve.send(Err(failure));
                    });
                }
            }
        });

        async move {
            pending.await.unwrap_or_else(|_| {
                Err(AppError::internal("pending result was dropped before it was resolved"))
            })
        }
        .boxed()
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("shares_client", &self.shares_client())
            .finish()
    }
}
