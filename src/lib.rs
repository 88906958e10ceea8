//! Compose Bench
//!
//! A micro-benchmark comparing three ways of composing two chained
//! asynchronous network calls when the first one fails: combinator
//! composition, a blocking join inside the failure handler, and manual
//! bridging through a separate pending result.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod models;
pub mod stats;
pub mod strategy;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::Config;
pub use client::{ResourceClient, ResourceLister};
pub use strategy::{Composer, Strategy};
pub use harness::{Benchmark, BenchmarkReport, run_trial};
pub use stats::SummaryStatistics;
pub use types::PendingResult;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TRIAL_COUNT: u32 = 20;
    pub const DEFAULT_INVOCATIONS_PER_TRIAL: usize = 1000;
    // DNS-resolvable, but answers too slowly for the connect timeout below
    pub const DEFAULT_ENDPOINT: &str = "http://amazon.com";
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10);
    pub const DEFAULT_SHARED_CLIENT: bool = false;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    // tokio's own default for the blocking pool
    pub const MIN_BLOCKING_THREADS: usize = 512;
}
