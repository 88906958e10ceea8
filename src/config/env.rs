//! Environment variable handling and .env file management

use crate::error::{AppError, ErrorContext, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load an env file if it exists.
    ///
    /// Variables already present in the process environment are not
    /// overwritten.
    pub fn load_env_file(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).map_err(|e| {
                AppError::config(format!("Failed to load {}: {}", path.display(), e))
            })?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Compose Bench Configuration
#
# Values here are used as defaults and can be overridden by environment
# variables and command-line arguments.

# Number of sequential trials
# TRIAL_COUNT=20

# Concurrent operations started per trial
# INVOCATIONS_PER_TRIAL=1000

# Composition strategy: exceptionally-compose, blocking-join or
# separate-pending-result
# STRATEGY=separate-pending-result

# Endpoint both calls are sent to
# ENDPOINT_URL=http://amazon.com

# Connection timeout in milliseconds
# CONNECT_TIMEOUT_MS=10

# Use a single client instance for both calls (true/false)
# SHARED_CLIENT=false

# Runtime worker threads (defaults to the number of CPUs)
# WORKER_THREADS=8

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .with_context(|| format!("Failed to write example env file {}", path.display()))
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TRIAL_COUNT", "Number of sequential trials", "20"),
            ("INVOCATIONS_PER_TRIAL", "Concurrent operations per trial", "1000"),
            ("STRATEGY", "Composition strategy under test", "separate-pending-result"),
            ("ENDPOINT_URL", "Endpoint both calls are sent to", "http://amazon.com"),
            ("CONNECT_TIMEOUT_MS", "Connection timeout in milliseconds", "10"),
            ("SHARED_CLIENT", "Use one client for both calls", "false"),
            ("WORKER_THREADS", "Runtime worker threads", "8"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
