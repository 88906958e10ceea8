//! Data models for the composition benchmark

pub mod config;

// Re-export main model types
pub use config::Config;
