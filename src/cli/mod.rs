//! Command-line interface

use crate::strategy::Strategy;
use clap::Parser;
use std::path::PathBuf;

/// Compose Bench - compares three ways of chaining two asynchronous calls
/// when the first one fails
#[derive(Parser, Debug, Clone)]
#[command(name = "compose-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of sequential trials [default: 20]
    #[arg(short = 't', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub trials: Option<u32>,

    /// Concurrent operations per trial [default: 1000]
    #[arg(short = 'n', long, value_parser = parse_positive_usize)]
    pub invocations: Option<usize>,

    /// Composition strategy [default: separate-pending-result]
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Endpoint both calls are sent to [default: http://amazon.com]
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Connection timeout in milliseconds [default: 10]
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout_ms: Option<u64>,

    /// Use a single client instance for both calls
    #[arg(long)]
    pub shared_client: bool,

    /// Runtime worker threads [default: number of CPUs]
    #[arg(short, long, value_parser = parse_positive_usize)]
    pub workers: Option<usize>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Emit log entries as JSON lines
    #[arg(long)]
    pub json: bool,

    /// List the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write a commented example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.json && self.color {
            return Err("--color has no effect with --json".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line overrides:\n");
        if let Some(trials) = self.trials {
            summary.push_str(&format!("  Trials: {}\n", trials));
        }
        if let Some(invocations) = self.invocations {
            summary.push_str(&format!("  Invocations per trial: {}\n", invocations));
        }
        if let Some(strategy) = self.strategy {
            summary.push_str(&format!("  Strategy: {}\n", strategy));
        }
        if let Some(ref endpoint) = self.endpoint {
            summary.push_str(&format!("  Endpoint: {}\n", endpoint));
        }
        if let Some(timeout) = self.connect_timeout_ms {
            summary.push_str(&format!("  Connection timeout: {}ms\n", timeout));
        }
        if self.shared_client {
            summary.push_str("  Shared client: Yes\n");
        }
        if let Some(workers) = self.workers {
            summary.push_str(&format!("  Worker threads: {}\n", workers));
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("Invalid number: {}", s)),
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    cfg!(unix)
}
