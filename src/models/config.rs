//! Configuration data model and validation

use crate::strategy::Strategy;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of sequential trials (N)
    #[serde(default = "default_trial_count")]
    pub trial_count: u32,

    /// Concurrent operations started per trial (M)
    #[serde(default = "default_invocations_per_trial")]
    pub invocations_per_trial: usize,

    /// Composition strategy under test
    #[serde(default)]
    pub strategy: Strategy,

    /// Endpoint override both clients send their calls to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Use one client instance for both calls
    #[serde(default = "default_shared_client")]
    pub shared_client: bool,

    /// Runtime worker threads
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Emit log entries as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trial_count: default_trial_count(),
            invocations_per_trial: default_invocations_per_trial(),
            strategy: Strategy::default(),
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            shared_client: default_shared_client(),
            worker_threads: default_worker_threads(),
            enable_color: default_enable_color(),
            json_logs: false,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Size of the runtime's blocking thread pool.
    ///
    /// Every blocking-join operation parked on its second call holds one pool
    /// thread, and that call may need another for name resolution. A pool
    /// smaller than that leaves no thread to drive the timer and I/O.
    pub fn blocking_thread_limit(&self) -> usize {
        self.invocations_per_trial
            .saturating_mul(2)
            .saturating_add(self.worker_threads)
            .max(crate::defaults::MIN_BLOCKING_THREADS)
    }

    /// Validate the configuration and return the first error found
    pub fn validate(&self) -> Result<()> {
        if self.trial_count == 0 {
            return Err(AppError::config("Trial count must be greater than 0"));
        }

        if self.invocations_per_trial == 0 {
            return Err(AppError::config("Invocations per trial must be greater than 0"));
        }

        if self.endpoint.trim().is_empty() {
            return Err(AppError::config("Endpoint URL cannot be empty"));
        }

        match url::Url::parse(&self.endpoint) {
            Ok(parsed) => {
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::config(format!(
                        "Endpoint URL must use http or https: {}",
                        self.endpoint
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid endpoint URL '{}': {}",
                    self.endpoint, e
                )));
            }
        }

        if self.connect_timeout_ms == 0 {
            return Err(AppError::config("Connection timeout must be greater than 0"));
        }

        if self.worker_threads == 0 {
            return Err(AppError::config("Worker thread count must be greater than 0"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(trials) = std::env::var("TRIAL_COUNT") {
            self.trial_count = trials.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid TRIAL_COUNT value '{}': {}", trials, e))
            })?;
        }

        if let Ok(invocations) = std::env::var("INVOCATIONS_PER_TRIAL") {
            self.invocations_per_trial = invocations.trim().parse().map_err(|e| {
                AppError::config(format!(
                    "Invalid INVOCATIONS_PER_TRIAL value '{}': {}",
                    invocations, e
                ))
            })?;
        }

        if let Ok(strategy) = std::env::var("STRATEGY") {
            self.strategy = strategy.parse()?;
        }

        if let Ok(endpoint) = std::env::var("ENDPOINT_URL") {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                self.endpoint = endpoint.to_string();
            }
        }

        if let Ok(timeout) = std::env::var("CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = timeout.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid CONNECT_TIMEOUT_MS value '{}': {}", timeout, e))
            })?;
        }

        if let Ok(shared) = std::env::var("SHARED_CLIENT") {
            self.shared_client = shared.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid SHARED_CLIENT value '{}': {}", shared, e))
            })?;
        }

        if let Ok(workers) = std::env::var("WORKER_THREADS") {
            self.worker_threads = workers.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid WORKER_THREADS value '{}': {}", workers, e))
            })?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_trial_count() -> u32 {
    crate::defaults::DEFAULT_TRIAL_COUNT
}

fn default_invocations_per_trial() -> usize {
    crate::defaults::DEFAULT_INVOCATIONS_PER_TRIAL
}

fn default_endpoint() -> String {
    crate::defaults::DEFAULT_ENDPOINT.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

fn default_shared_client() -> bool {
    crate::defaults::DEFAULT_SHARED_CLIENT
}

fn default_worker_threads() -> usize {
    num_cpus::get().max(1)
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_fixed_constants() {
        let config = Config::default();
        assert_eq!(config.trial_count, 20);
        assert_eq!(config.invocations_per_trial, 1000);
        assert_eq!(config.strategy, Strategy::SeparatePendingResult);
        assert_eq!(config.endpoint, "http://amazon.com");
        assert_eq!(config.connect_timeout(), Duration::from_millis(10));
        assert!(!config.shared_client);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_counts_invalid() {
        let config = Config {
            trial_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            invocations_per_trial: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_validation() {
        let mut config = Config::default();

        config.endpoint = "".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "ftp://example.com".to_string();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("http or https"));

        config.endpoint = "https://states.us-east-1.amazonaws.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_and_workers_invalid() {
        let config = Config {
            connect_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            worker_threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blocking_thread_limit_covers_every_parked_operation() {
        let config = Config {
            invocations_per_trial: 1000,
            worker_threads: 4,
            ..Default::default()
        };
        assert_eq!(config.blocking_thread_limit(), 2004);

        let config = Config {
            invocations_per_trial: 10,
            worker_threads: 4,
            ..Default::default()
        };
        assert_eq!(config.blocking_thread_limit(), 512);

        let config = Config {
            invocations_per_trial: usize::MAX,
            ..Default::default()
        };
        assert_eq!(config.blocking_thread_limit(), usize::MAX);
    }

    #[test]
    fn test_deserialize_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"trial_count": 3, "strategy": "blocking-join"}"#).unwrap();
        assert_eq!(config.trial_count, 3);
        assert_eq!(config.strategy, Strategy::BlockingJoin);
        assert_eq!(config.invocations_per_trial, 1000);
        assert_eq!(config.connect_timeout_ms, 10);
    }
}
