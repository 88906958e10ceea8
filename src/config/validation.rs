//! Configuration validation rules that produce non-fatal warnings

use crate::{defaults::MIN_BLOCKING_THREADS, error::Result, models::Config, strategy::Strategy};
use colored::Colorize;

/// Connection timeouts above this stop exercising the failure path quickly
const LONG_CONNECT_TIMEOUT_MS: u64 = 1_000;

/// Invocation counts above this make a single trial very memory hungry
const LARGE_INVOCATION_COUNT: usize = 10_000;

/// Configuration validator with advisory rules on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration, returning warnings for settings that are
    /// legal but likely to distort the measurement
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_endpoint(config));
        warnings.extend(Self::validate_workload(config));
        warnings.extend(Self::validate_runtime(config));

        Ok(warnings)
    }

    fn validate_endpoint(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.connect_timeout_ms > LONG_CONNECT_TIMEOUT_MS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Connection timeout of {}ms is long; trials will mostly measure the timeout rather than composition overhead",
                    config.connect_timeout_ms
                ),
            ));
        }

        if let Ok(parsed) = url::Url::parse(&config.endpoint) {
            if let Some(url::Host::Ipv4(ip)) = parsed.host() {
                if ip.is_loopback() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!(
                            "Endpoint {} is on localhost; refused connections fail faster than timeouts",
                            config.endpoint
                        ),
                    ));
                }
            }
        }

        warnings
    }

    fn validate_workload(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.invocations_per_trial > LARGE_INVOCATION_COUNT {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} invocations per trial will hold that many pending operations in memory at once",
                    config.invocations_per_trial
                ),
            ));
        }

        if config.trial_count < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "{} trial(s) may not provide reliable statistics",
                    config.trial_count
                ),
            ));
        }

        warnings
    }

    fn validate_runtime(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.strategy == Strategy::BlockingJoin && config.worker_threads == 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Blocking-join with a single worker thread serializes every compensating call",
            ));
        }

        if config.strategy == Strategy::BlockingJoin
            && config.invocations_per_trial > MIN_BLOCKING_THREADS
        {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Blocking-join parks one thread per failed operation; each trial may hold up to {} blocking threads",
                    config.blocking_thread_limit()
                ),
            ));
        }

        if config.shared_client {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Both calls share one client and its connection pool",
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new<S: Into<String>>(level: ValidationLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if !use_color {
            return format!("{} {}", tag, self.message);
        }

        let tag = match self.level {
            ValidationLevel::Info => tag.blue(),
            ValidationLevel::Warning => tag.yellow(),
            ValidationLevel::Error => tag.red(),
        };
        format!("{} {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
