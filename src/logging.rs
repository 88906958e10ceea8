//! Structured logging for the benchmark
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console and JSON output formats
//! - A session-wide context shared by every logger from one factory
//! - [`BenchmarkLogger`], which reports run progress and the final
//!   statistics

use crate::error::{AppError, Result};
use crate::harness::Trial;
use crate::models::Config;
use crate::stats::SummaryStatistics;
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - per-trial details
    Debug = 1,
    /// Info level - run progress and results
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but the run can continue
    Error = 4,
    /// Fatal level - errors that end the process
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    fn colorize(&self, text: &str) -> String {
        match self {
            LogLevel::Trace => text.white().to_string(),
            LogLevel::Debug => text.cyan().to_string(),
            LogLevel::Info => text.green().to_string(),
            LogLevel::Warn => text.yellow().to_string(),
            LogLevel::Error => text.red().to_string(),
            LogLevel::Fatal => text.magenta().bold().to_string(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    /// Thread name if available
    pub thread_id: Option<String>,
    /// File and line information
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Logger with multiple output formats.
///
/// Entries below `Warn` go to stdout, the rest to stderr.
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with level and format taken from the configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        // The statistics are the program's output, so Info is the floor
        let min_level = if config.debug {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        let format = if config.json_logs || config.debug {
            LogFormat::Json
        } else {
            LogFormat::Console
        };

        Self {
            min_level,
            use_color: config.enable_color && format == LogFormat::Console,
            include_location: config.debug,
            format,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set output format
    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    /// Enable or disable colored output
    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation.
    ///
    /// Entries logged until [`Logger::end_operation`] carry the returned ID.
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started operation: {}", operation_name))
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!(
            "Completed operation: {} (success: {})",
            operation_name, success
        ))
        .correlation_id(correlation_id)
        .field("operation", operation_name)
        .field("operation_type", "end")
        .field("success", success)
        .log()
        .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert(
                "session_id".to_string(),
                serde_json::Value::String(session_id.clone()),
            );
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
        }
        drop(context);

        let output = self.render(&entry);

        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level = format!("{:>5}", entry.level.as_str());
        let level = if self.use_color {
            entry.level.colorize(&level)
        } else {
            level
        };

        let mut output = format!("{} {} [{}] {}", timestamp, level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        // Session ID is only useful to machines; keep console lines readable
        let mut fields: Vec<String> = entry
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !fields.is_empty() {
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|_| {
            serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string()
        })
    }
}

/// Builder for log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                thread_id: std::thread::current().name().map(String::from),
                location: None,
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add location information
    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Reports benchmark progress and results
pub struct BenchmarkLogger {
    logger: Logger,
}

impl BenchmarkLogger {
    /// Create a benchmark logger from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("BENCH".to_string(), config),
        }
    }

    /// Wrap an existing logger
    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// The underlying logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the start of a run and open its correlation scope
    pub async fn log_run_start(
        &self,
        strategy: Strategy,
        trial_count: u32,
        invocations_per_trial: usize,
        shared_client: bool,
    ) -> String {
        let correlation_id = self.logger.start_operation("benchmark").await;

        self.logger
            .info(&format!(
                "Running {} trials of {} operations with {}",
                trial_count, invocations_per_trial, strategy
            ))
            .field("strategy", strategy)
            .field("trial_count", trial_count)
            .field("invocations_per_trial", invocations_per_trial)
            .field("shared_client", shared_client)
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await;

        correlation_id
    }

    /// Log one completed trial
    pub async fn log_trial(&self, trial: &Trial) {
        if !self.logger.would_log(LogLevel::Debug) {
            return;
        }

        self.logger
            .debug(&format!(
                "Trial {} finished in {}ms",
                trial.index + 1,
                trial.duration.as_millis()
            ))
            .field("trial", trial.index + 1)
            .field("started_at", trial.started_at)
            .field("duration_ms", trial.duration.as_millis() as u64)
            .field("succeeded", trial.succeeded)
            .field("failed", trial.failed)
            .field("panicked", trial.panicked)
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await;
    }

    /// Log the summary statistics, one line per figure, and close the run's
    /// correlation scope
    pub async fn log_summary(&self, correlation_id: &str, statistics: &SummaryStatistics) {
        for line in statistics.report_lines() {
            self.logger.info(&line).log().await;
        }

        self.logger
            .end_operation(correlation_id, "benchmark", true)
            .await;
    }

    /// Log a failure that ends the run
    pub async fn log_failure(&self, correlation_id: &str, error: &AppError) {
        self.logger
            .error(&format!("Benchmark aborted: {}", error))
            .error_info(error)
            .log()
            .await;

        self.logger
            .end_operation(correlation_id, "benchmark", false)
            .await;
    }
}

/// Creates loggers that share one session ID
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    /// Create a new logger factory
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    /// Create the benchmark reporter
    pub async fn create_benchmark_logger(&self) -> BenchmarkLogger {
        BenchmarkLogger::from_logger(self.create_logger("BENCH").await)
    }

    /// Get session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            logger: "TEST".to_string(),
            correlation_id: None,
            fields: HashMap::new(),
            thread_id: None,
            location: None,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_logger_with_config() {
        let logger = Logger::with_config("TEST".to_string(), &Config::default());
        assert_eq!(logger.min_level, LogLevel::Info);
        assert_eq!(logger.format, LogFormat::Console);
        assert!(!logger.include_location);

        let config = Config {
            debug: true,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(logger.include_location);
        assert!(!logger.use_color);

        let config = Config {
            json_logs: true,
            verbose: true,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Info);
        assert_eq!(logger.format, LogFormat::Json);
    }

    #[test]
    fn test_would_log() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_level(LogLevel::Warn);

        assert!(!logger.would_log(LogLevel::Debug));
        assert!(!logger.would_log(LogLevel::Info));
        assert!(logger.would_log(LogLevel::Warn));
        assert!(logger.would_log(LogLevel::Fatal));
    }

    #[tokio::test]
    async fn test_operation_correlation() {
        let logger = Logger::new("TEST".to_string());
        let correlation_id = logger.start_operation("run").await;
        assert_eq!(
            logger.context.read().await.current_correlation_id.as_deref(),
            Some(correlation_id.as_str())
        );

        logger.end_operation(&correlation_id, "run", true).await;
        assert!(logger.context.read().await.current_correlation_id.is_none());
    }

    #[tokio::test]
    async fn test_context_fields() {
        let logger = Logger::new("TEST".to_string());
        logger.set_session_id("test-session".to_string()).await;
        logger.add_context_field("strategy".to_string(), "blocking-join").await;

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some("test-session"));
        assert!(context.context_fields.contains_key("strategy"));
    }

    #[test]
    fn test_console_format() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_color(false);

        let mut entry = entry(LogLevel::Info, "Total test runs: 20");
        entry.correlation_id = Some("0123456789abcdef".to_string());
        entry.fields.insert("session_id".to_string(), serde_json::json!("hidden"));
        entry.fields.insert("trial".to_string(), serde_json::json!(3));

        let output = logger.format_console(&entry);
        assert!(output.contains(" INFO [TEST] Total test runs: 20"));
        assert!(output.contains("[01234567]"));
        assert!(output.contains("trial=3"));
        assert!(!output.contains("hidden"));
    }

    #[test]
    fn test_console_format_short_correlation_id() {
        let logger = Logger::new("TEST".to_string());
        let mut entry = entry(LogLevel::Warn, "short");
        entry.correlation_id = Some("abc".to_string());
        assert!(logger.format_console(&entry).contains("[abc]"));
    }

    #[test]
    fn test_json_format() {
        let logger = Logger::new("TEST".to_string());
        let entry = entry(LogLevel::Debug, "Trial 1 finished in 12ms");

        let json: serde_json::Value = serde_json::from_str(&logger.format_json(&entry)).unwrap();
        assert_eq!(json["level"], "Debug");
        assert_eq!(json["message"], "Trial 1 finished in 12ms");
    }

    #[test]
    fn test_log_entry_serialization() {
        let entry = entry(LogLevel::Info, "Test");
        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: LogEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.level, LogLevel::Info);
        assert_eq!(deserialized.message, "Test");
        assert_eq!(deserialized.logger, "TEST");
    }

    #[tokio::test]
    async fn test_logger_factory_shares_session() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("A").await;
        let bench = factory.create_benchmark_logger().await;

        assert_eq!(logger.name, "A");
        assert_eq!(bench.logger().name, "BENCH");
        assert_eq!(
            bench.logger().context.read().await.session_id.as_deref(),
            Some(factory.session_id())
        );
    }

    #[tokio::test]
    async fn test_benchmark_logger_lifecycle() {
        let config = Config {
            enable_color: false,
            ..Default::default()
        };
        let bench = BenchmarkLogger::new(&config);

        let correlation_id = bench
            .log_run_start(Strategy::BlockingJoin, 1, 10, false)
            .await;
        bench
            .log_trial(&Trial {
                index: 0,
                started_at: Utc::now(),
                duration: Duration::from_millis(7),
                succeeded: 0,
                failed: 10,
                panicked: 0,
            })
            .await;

        let statistics = SummaryStatistics::from_millis(&[7]).unwrap();
        bench.log_summary(&correlation_id, &statistics).await;
        assert!(bench.logger().context.read().await.current_correlation_id.is_none());
    }
}
