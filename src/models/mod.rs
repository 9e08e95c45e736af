//! Data models for trades, account snapshots, metrics and score reports.

mod account;
mod metric;
mod score;
mod trade;

pub use account::{AccountSnapshot, EquityPoint};
pub use metric::{MetricName, MetricResult, MetricStatus};
pub use score::{
    BlockName, BlockResult, ConfidenceTier, DataQuality, PenaltyResult, ReliabilityFactors,
    ScoreReport, TraderCategory,
};
pub use trade::TradeRecord;
