//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};
use std::path::PathBuf;

/// Configuration parser that layers defaults, the env file, environment
/// variables and CLI arguments
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read the env file from `path` instead of `./.env`
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(&self.env_file, self.cli.debug)?;

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(trials) = self.cli.trials {
            config.trial_count = trials;
        }

        if let Some(invocations) = self.cli.invocations {
            config.invocations_per_trial = invocations;
        }

        if let Some(strategy) = self.cli.strategy {
            config.strategy = strategy;
        }

        if let Some(ref endpoint) = self.cli.endpoint {
            config.endpoint = endpoint.clone();
        }

        if let Some(timeout) = self.cli.connect_timeout_ms {
            config.connect_timeout_ms = timeout;
        }

        if self.cli.shared_client {
            config.shared_client = true;
        }

        if let Some(workers) = self.cli.workers {
            config.worker_threads = workers;
        }

        if self.cli.color {
            config.enable_color = true;
        } else if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
        config.json_logs = self.cli.json;

        if config.debug {
            println!("Applied CLI overrides to configuration");
            println!(
                "Final config: trials={}, invocations={}, strategy={}, connect_timeout={}ms",
                config.trial_count,
                config.invocations_per_trial,
                config.strategy,
                config.connect_timeout_ms
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("Strategy: {} ({})", config.strategy, config.strategy.description()),
        format!("Trials: {}", config.trial_count),
        format!("Invocations per trial: {}", config.invocations_per_trial),
        format!("Endpoint: {}", config.endpoint),
        format!("Connection timeout: {}ms", config.connect_timeout_ms),
        format!(
            "Clients: {}",
            if config.shared_client { "shared" } else { "distinct" }
        ),
        format!("Worker threads: {}", config.worker_threads),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
