//! Metric computation over raw trade and account data.

mod calculator;

pub use calculator::MetricCalculator;
