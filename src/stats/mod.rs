//! Summary statistics over trial durations
//!
//! Durations are truncated to whole milliseconds before aggregation, so the
//! sum always equals the sum of the reported per-trial figures.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Count, sum, average, max and min of a set of trial durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of trials
    pub count: u64,
    /// Total run time in milliseconds
    pub sum_ms: u64,
    /// Mean trial duration in milliseconds
    pub average_ms: f64,
    /// Longest trial in milliseconds
    pub max_ms: u64,
    /// Shortest trial in milliseconds
    pub min_ms: u64,
    /// Population standard deviation in milliseconds
    pub std_dev_ms: f64,
}

impl SummaryStatistics {
    /// Summarize a set of trial durations
    pub fn from_durations(durations: &[Duration]) -> Result<Self> {
        let millis: Vec<u64> = durations
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect();
        Self::from_millis(&millis)
    }

    /// Summarize a set of durations already expressed in milliseconds
    pub fn from_millis(millis: &[u64]) -> Result<Self> {
        if millis.is_empty() {
            return Err(AppError::statistics(
                "Cannot summarize an empty set of trial durations",
            ));
        }

        let count = millis.len() as u64;
        let sum_ms = millis
            .iter()
            .try_fold(0u64, |acc, &ms| acc.checked_add(ms))
            .ok_or_else(|| AppError::statistics("Total run time overflowed"))?;
        let max_ms = millis.iter().copied().max().unwrap_or(0);
        let min_ms = millis.iter().copied().min().unwrap_or(0);

        let average_ms = sum_ms as f64 / count as f64;
        let variance = millis
            .iter()
            .map(|&ms| {
                let diff = ms as f64 - average_ms;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        Ok(Self {
            count,
            sum_ms,
            average_ms,
            max_ms,
            min_ms,
            std_dev_ms: variance.sqrt(),
        })
    }

    /// The report, one figure per line
    pub fn report_lines(&self) -> Vec<String> {
        vec![
            "Test statistics:".to_string(),
            format!("Total test runs: {}", self.count),
            format!("Total run time (ms): {}", self.sum_ms),
            format!("Average (ms): {:?}", self.average_ms),
            format!("Max (ms): {}", self.max_ms),
            format!("Min (ms): {}", self.min_ms),
        ]
    }
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report_lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_summary_of_known_durations() {
        let durations: Vec<Duration> = [10, 20, 30, 40, 50]
            .iter()
            .map(|&ms| Duration::from_millis(ms))
            .collect();
        let stats = SummaryStatistics::from_durations(&durations).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.sum_ms, 150);
        assert_eq!(stats.average_ms, 30.0);
        assert_eq!(stats.max_ms, 50);
        assert_eq!(stats.min_ms, 10);
        assert!((stats.std_dev_ms - 200f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_sub_millisecond_durations_truncate() {
        let durations = [Duration::from_micros(900), Duration::from_micros(1_900)];
        let stats = SummaryStatistics::from_durations(&durations).unwrap();

        assert_eq!(stats.min_ms, 0);
        assert_eq!(stats.max_ms, 1);
        assert_eq!(stats.sum_ms, 1);
    }

    #[test]
    fn test_single_sample() {
        let stats = SummaryStatistics::from_millis(&[42]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min_ms, 42);
        assert_eq!(stats.max_ms, 42);
        assert_eq!(stats.std_dev_ms, 0.0);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let error = SummaryStatistics::from_durations(&[]).unwrap_err();
        assert_eq!(error.category(), "STATS");
    }

    #[test]
    fn test_overflowing_sum_is_an_error() {
        assert!(SummaryStatistics::from_millis(&[u64::MAX, 1]).is_err());
    }

    #[test]
    fn test_report_lines() {
        let stats = SummaryStatistics::from_millis(&[10, 20, 30, 40, 50]).unwrap();
        assert_eq!(
            stats.report_lines(),
            vec![
                "Test statistics:",
                "Total test runs: 5",
                "Total run time (ms): 150",
                "Average (ms): 30.0",
                "Max (ms): 50",
                "Min (ms): 10",
            ]
        );
        assert!(stats.to_string().starts_with("Test statistics:\nTotal test runs: 5"));
    }

    #[test]
    fn test_average_is_printed_unrounded() {
        let stats = SummaryStatistics::from_millis(&[10, 20, 70]).unwrap();
        assert_eq!(stats.report_lines()[3], "Average (ms): 33.333333333333336");
    }

    proptest! {
        #[test]
        fn prop_summary_invariants(millis in proptest::collection::vec(0u64..100_000, 1..200)) {
            let stats = SummaryStatistics::from_millis(&millis).unwrap();

            prop_assert_eq!(stats.count, millis.len() as u64);
            prop_assert_eq!(stats.sum_ms, millis.iter().sum::<u64>());
            prop_assert!(stats.min_ms <= stats.max_ms);
            prop_assert!(stats.min_ms as f64 <= stats.average_ms + 1e-9);
            prop_assert!(stats.average_ms <= stats.max_ms as f64 + 1e-9);
            prop_assert!(stats.std_dev_ms >= 0.0);
        }
    }
}
