//! Trial harness
//!
//! A trial starts M operations concurrently, waits until every one of them
//! has settled and reports the elapsed wall-clock time. A benchmark runs N
//! trials back to back and summarizes their durations.

use crate::{
    client::ClientFactory,
    error::{AppError, Result},
    logging::BenchmarkLogger,
    models::Config,
    stats::SummaryStatistics,
    strategy::{Composer, Strategy},
    types::{PendingResult, Settlement},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

/// Outcome of one trial
#[derive(Debug, Clone)]
pub struct Trial {
    /// Zero-based position in the run
    pub index: usize,
    pub started_at: DateTime<Utc>,
    /// Time from the first invocation until the last operation settled
    pub duration: Duration,
    pub succeeded: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl Trial {
    /// Number of operations that settled, whichever way
    pub fn settled(&self) -> usize {
        self.succeeded + self.failed + self.panicked
    }
}

/// Run one trial and return how long it took.
///
/// Failures of individual operations are suppressed.
pub async fn run_trial<F>(strategy: &F, invocations: usize) -> Duration
where
    F: Fn() -> PendingResult,
{
    measure_trial(0, strategy, invocations).await.duration
}

/// Run one trial and tally how its operations settled.
///
/// Each pending result is driven by its own task so the operations make
/// progress concurrently on the runtime's worker pool. A panicking
/// operation is counted and otherwise ignored.
pub async fn measure_trial<F>(index: usize, strategy: &F, invocations: usize) -> Trial
where
    F: Fn() -> PendingResult,
{
    let started_at = Utc::now();
    let start = Instant::now();

    let handles: Vec<_> = (0..invocations)
        .map(|_| tokio::spawn(strategy()))
        .collect();
    let outcomes = join_all(handles).await;

    let duration = start.elapsed();

    let mut trial = Trial {
        index,
        started_at,
        duration,
        succeeded: 0,
        failed: 0,
        panicked: 0,
    };

    for outcome in outcomes {
        let settlement = match outcome {
            Ok(Ok(())) => Settlement::Succeeded,
            Ok(Err(_)) => Settlement::Failed,
            Err(_) => Settlement::Panicked,
        };
        match settlement {
            Settlement::Succeeded => trial.succeeded += 1,
            Settlement::Failed => trial.failed += 1,
            Settlement::Panicked => trial.panicked += 1,
        }
    }

    trial
}

/// Build the multi-threaded runtime a benchmark described by `config` runs on.
///
/// The blocking pool is sized with [`Config::blocking_thread_limit`] so a
/// blocking-join trial with every operation parked still settles.
pub fn build_runtime(config: &Config) -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .max_blocking_threads(config.blocking_thread_limit())
        .thread_name("compose-bench-worker")
        .enable_all()
        .build()
        .map_err(|e| AppError::benchmark(format!("Failed to start async runtime: {}", e)))
}

/// Settlement counts across every trial of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementTotals {
    pub succeeded: usize,
    pub failed: usize,
    pub panicked: usize,
}

/// Everything a benchmark run produced
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub strategy: Strategy,
    pub invocations_per_trial: usize,
    pub shared_client: bool,
    /// Per-trial durations in milliseconds, in run order
    pub trial_durations_ms: Vec<u64>,
    pub totals: SettlementTotals,
    pub statistics: SummaryStatistics,
}

/// N sequential trials of M concurrent operations with one strategy
pub struct Benchmark {
    composer: Composer,
    strategy: Strategy,
    trial_count: u32,
    invocations_per_trial: usize,
    logger: BenchmarkLogger,
}

impl Benchmark {
    pub fn new(
        composer: Composer,
        strategy: Strategy,
        trial_count: u32,
        invocations_per_trial: usize,
        logger: BenchmarkLogger,
    ) -> Self {
        Self {
            composer,
            strategy,
            trial_count,
            invocations_per_trial,
            logger,
        }
    }

    /// Build the clients described by `config` and a benchmark over them
    pub fn from_config(config: &Config, logger: BenchmarkLogger) -> Result<Self> {
        let (first, second) = ClientFactory::new(config).create_pair()?;
        Ok(Self::new(
            Composer::new(first, second),
            config.strategy,
            config.trial_count,
            config.invocations_per_trial,
            logger,
        ))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn logger(&self) -> &BenchmarkLogger {
        &self.logger
    }

    /// Run every trial, log the summary and return the report.
    ///
    /// Must be called from within a tokio runtime, normally one from
    /// [`build_runtime`]. Blocking-join is refused on a current-thread
    /// runtime, where the blocked thread would be the only one able to drive
    /// the call it waits for.
    pub async fn run(&self) -> Result<BenchmarkReport> {
        self.ensure_runtime_supports_strategy()?;

        let correlation_id = self
            .logger
            .log_run_start(
                self.strategy,
                self.trial_count,
                self.invocations_per_trial,
                self.composer.shares_client(),
            )
            .await;

        let strategy_fn = self.composer.strategy_fn(self.strategy);
        let mut trials = Vec::with_capacity(self.trial_count as usize);

        for index in 0..self.trial_count as usize {
            let trial = measure_trial(index, &strategy_fn, self.invocations_per_trial).await;
            self.logger.log_trial(&trial).await;
            trials.push(trial);
        }

        let durations: Vec<Duration> = trials.iter().map(|t| t.duration).collect();
        let statistics = match SummaryStatistics::from_durations(&durations) {
            Ok(statistics) => statistics,
            Err(e) => {
                self.logger.log_failure(&correlation_id, &e).await;
                return Err(e);
            }
        };

        self.logger.log_summary(&correlation_id, &statistics).await;

        let totals = trials.iter().fold(SettlementTotals::default(), |mut acc, t| {
            acc.succeeded += t.succeeded;
            acc.failed += t.failed;
            acc.panicked += t.panicked;
            acc
        });

        Ok(BenchmarkReport {
            strategy: self.strategy,
            invocations_per_trial: self.invocations_per_trial,
            shared_client: self.composer.shares_client(),
            trial_durations_ms: durations
                .iter()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .collect(),
            totals,
            statistics,
        })
    }

    fn ensure_runtime_supports_strategy(&self) -> Result<()> {
        if !self.strategy.is_blocking() {
            return Ok(());
        }

        let handle = Handle::try_current()
            .map_err(|e| AppError::internal(format!("No tokio runtime available: {}", e)))?;

        if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(AppError::config(format!(
                "The {} strategy needs a multi-threaded runtime",
                self.strategy
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ResourceLister, ScriptedClient};
    use futures::FutureExt;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn quiet_logger() -> BenchmarkLogger {
        BenchmarkLogger::new(&Config {
            enable_color: false,
            ..Default::default()
        })
    }

    fn scripted_pair(
        first_fails: bool,
        second_fails: bool,
    ) -> (Arc<ScriptedClient>, Arc<ScriptedClient>, Composer) {
        let first = Arc::new(if first_fails {
            ScriptedClient::failing(AppError::network("connection refused"), Duration::from_millis(1))
        } else {
            ScriptedClient::succeeding(Duration::from_millis(1))
        });
        let second = Arc::new(if second_fails {
            ScriptedClient::failing(AppError::timeout("connect timed out"), Duration::from_millis(1))
        } else {
            ScriptedClient::succeeding(Duration::from_millis(1))
        });
        let composer = Composer::new(
            Arc::clone(&first) as Arc<dyn ResourceLister>,
            Arc::clone(&second) as Arc<dyn ResourceLister>,
        );
        (first, second, composer)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_operation_settles_before_trial_returns() {
        let (first, second, composer) = scripted_pair(false, false);
        let strategy_fn = composer.strategy_fn(Strategy::SeparatePendingResult);

        let trial = measure_trial(0, &strategy_fn, 1000).await;

        assert_eq!(trial.settled(), 1000);
        assert_eq!(trial.succeeded, 1000);
        assert_eq!(first.calls(), 1000);
        assert_eq!(second.calls(), 0);
        assert!(trial.duration >= Duration::from_millis(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_trial_returns_elapsed_time() {
        let (_, _, composer) = scripted_pair(false, false);
        let strategy_fn = composer.strategy_fn(Strategy::ExceptionallyCompose);

        let duration = run_trial(&strategy_fn, 1000).await;
        assert!(duration >= Duration::from_millis(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failures_are_suppressed_for_every_strategy() {
        for strategy in Strategy::ALL {
            for second_fails in [false, true] {
                let (first, second, composer) = scripted_pair(true, second_fails);
                let strategy_fn = composer.strategy_fn(strategy);

                let trial = tokio::time::timeout(
                    Duration::from_secs(10),
                    measure_trial(0, &strategy_fn, 100),
                )
                .await
                .expect("trial did not settle");

                assert_eq!(trial.failed, 100, "{}", strategy);
                assert_eq!(trial.panicked, 0);
                assert_eq!(first.calls(), 100);
                assert_eq!(second.calls(), 100);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_operations_are_counted() {
        async fn explode() -> Result<()> {
            panic!("operation blew up")
        }
        let strategy_fn = || -> PendingResult { explode().boxed() };

        let trial = measure_trial(3, &strategy_fn, 5).await;
        assert_eq!(trial.index, 3);
        assert_eq!(trial.panicked, 5);
        assert_eq!(trial.settled(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_benchmark_runs_every_trial() {
        let (first, _, composer) = scripted_pair(true, false);
        let benchmark = Benchmark::new(composer, Strategy::BlockingJoin, 4, 25, quiet_logger());

        let report = assert_ok!(benchmark.run().await);

        assert_eq!(report.trial_durations_ms.len(), 4);
        assert_eq!(report.statistics.count, 4);
        assert_eq!(report.strategy, Strategy::BlockingJoin);
        assert_eq!(
            report.totals,
            SettlementTotals {
                succeeded: 0,
                failed: 100,
                panicked: 0,
            }
        );
        assert_eq!(first.calls(), 100);
        assert!(!report.shared_client);
    }

    #[tokio::test]
    async fn test_blocking_join_refused_on_current_thread_runtime() {
        let (first, _, composer) = scripted_pair(true, false);
        let benchmark = Benchmark::new(composer, Strategy::BlockingJoin, 2, 10, quiet_logger());

        let error = assert_err!(benchmark.run().await);
        assert_eq!(error.category(), "CONFIG");
        assert_eq!(first.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_blocking_strategies_run_on_current_thread_runtime() {
        for strategy in [Strategy::ExceptionallyCompose, Strategy::SeparatePendingResult] {
            let (_, second, composer) = scripted_pair(true, true);
            let benchmark = Benchmark::new(composer, strategy, 2, 10, quiet_logger());

            let report = assert_ok!(benchmark.run().await);
            assert_eq!(report.totals.failed, 20);
            assert_eq!(second.calls(), 20);
        }
    }

    #[test]
    fn test_blocking_join_settles_at_full_concurrency() {
        let config = Config {
            strategy: Strategy::BlockingJoin,
            invocations_per_trial: 1000,
            worker_threads: 2,
            ..Default::default()
        };
        let invocations = config.invocations_per_trial;

        // A stalled runtime also stalls its own timers, so wait from outside it
        let (done, finished) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = build_runtime(&config).unwrap();
            let trial = runtime.block_on(async {
                let first: Arc<dyn ResourceLister> = Arc::new(ScriptedClient::failing(
                    AppError::network("connection refused"),
                    Duration::from_millis(10),
                ));
                let second: Arc<dyn ResourceLister> = Arc::new(ScriptedClient::failing(
                    AppError::timeout("connect timed out"),
                    Duration::from_millis(50),
                ));
                let composer = Composer::new(first, second);
                let strategy_fn = composer.strategy_fn(Strategy::BlockingJoin);
                measure_trial(0, &strategy_fn, invocations).await
            });
            let _ = done.send(trial);
        });

        let trial = finished
            .recv_timeout(Duration::from_secs(60))
            .expect("blocking-join trial did not settle");
        assert_eq!(trial.settled(), 1000);
        assert_eq!(trial.failed, 1000);
        assert!(trial.duration >= Duration::from_millis(60));
    }

    #[test]
    fn test_build_runtime_is_multi_threaded() {
        let config = Config {
            worker_threads: 2,
            ..Default::default()
        };
        let runtime = build_runtime(&config).unwrap();
        assert_eq!(runtime.handle().runtime_flavor(), RuntimeFlavor::MultiThread);
    }

    #[test]
    fn test_from_config_builds_clients() {
        let config = Config {
            shared_client: true,
            strategy: Strategy::ExceptionallyCompose,
            trial_count: 2,
            ..Default::default()
        };
        let benchmark = Benchmark::from_config(&config, quiet_logger()).unwrap();
        assert_eq!(benchmark.strategy(), Strategy::ExceptionallyCompose);
        assert_eq!(benchmark.trial_count, 2);
        assert!(benchmark.composer.shares_client());
    }

    #[test]
    fn test_report_serializes() {
        let report = BenchmarkReport {
            strategy: Strategy::SeparatePendingResult,
            invocations_per_trial: 1000,
            shared_client: false,
            trial_durations_ms: vec![10, 20],
            totals: SettlementTotals::default(),
            statistics: SummaryStatistics::from_millis(&[10, 20]).unwrap(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"], "separate-pending-result");
        assert_eq!(json["statistics"]["sum_ms"], 30);
    }
}
