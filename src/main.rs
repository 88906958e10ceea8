//! Compose Bench - Main CLI Application
//!
//! Runs N sequential trials of M concurrent two-call operations with one
//! composition strategy and logs summary statistics of the trial durations.

use clap::Parser;
use compose_bench::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager, ValidationLevel},
    error::{AppError, ErrorReporter, Result},
    harness::{build_runtime, Benchmark},
    logging::LoggerFactory,
    models::Config,
    BUILD_TIME, GIT_COMMIT, PKG_NAME, TARGET_TRIPLE, VERSION,
};
use std::process;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        eprintln!(
            "Panic in thread '{}': {}",
            thread.name().unwrap_or("<unnamed>"),
            panic_info
        );
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        fail(&AppError::validation(message), cli.use_colors(), false);
    }

    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        return;
    }

    if let Some(ref path) = cli.write_env_example {
        if let Err(e) = EnvManager::save_example_env_file(path) {
            fail(&e, cli.use_colors(), cli.verbose);
        }
        println!("Example configuration written to {}", path.display());
        return;
    }

    let config = match load_config(cli.clone()) {
        Ok(config) => config,
        Err(e) => fail(&e, cli.use_colors(), cli.verbose),
    };

    if config.debug {
        println!("{}", cli.get_config_summary());
    }

    if !config.enable_color {
        colored::control::set_override(false);
    }

    let runtime = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(e) => fail(&e, config.enable_color, config.verbose),
    };

    if let Err(e) = runtime.block_on(run_application(config.clone())) {
        fail(&e, config.enable_color, config.verbose);
    }
}

/// Report a fatal error and exit with its exit code
fn fail(error: &AppError, use_color: bool, verbose: bool) -> ! {
    ErrorReporter::new(use_color, verbose).report_error(error);
    process::exit(error.exit_code());
}

/// Main application logic
async fn run_application(config: Config) -> Result<()> {
    let factory = LoggerFactory::new(config.clone());
    let app_logger = factory.create_logger("APP").await;

    app_logger
        .debug(&format!("{} v{}", PKG_NAME, VERSION))
        .field("git_commit", GIT_COMMIT)
        .field("build_time", BUILD_TIME)
        .field("target", TARGET_TRIPLE)
        .field("worker_threads", config.worker_threads)
        .log()
        .await;

    for warning in validate_config(&config)? {
        if warning.level != ValidationLevel::Info || config.verbose {
            eprintln!("{}", warning.format(config.enable_color));
        }
    }

    if config.verbose {
        println!("{}", display_config_summary(&config));
        println!();
    }

    let benchmark = Benchmark::from_config(&config, factory.create_benchmark_logger().await)?;
    let report = benchmark.run().await?;

    if config.verbose {
        app_logger
            .info(&format!(
                "Settled {} operations: {} succeeded, {} failed, {} panicked",
                report.totals.succeeded + report.totals.failed + report.totals.panicked,
                report.totals.succeeded,
                report.totals.failed,
                report.totals.panicked
            ))
            .field("std_dev_ms", report.statistics.std_dev_ms)
            .log()
            .await;
    }

    if config.json_logs {
        app_logger
            .info("Benchmark report")
            .field("report", &report)
            .log()
            .await;
    }

    Ok(())
}
