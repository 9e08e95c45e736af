//! Trader performance scoring engine.
//!
//! Converts a heterogeneous, possibly-incomplete set of closed trades and
//! an account snapshot into a single normalized 0-100 skill score with
//! explicit trust accounting: dependency-aware metric computation,
//! coverage-based block exclusion with dynamic weight redistribution, a
//! trade-count reliability discount, a coverage confidence discount, and
//! verifiable anti-manipulation penalties.
//!
//! The engine is synchronous, stateless and pure: it does not fetch data,
//! persist results, or decide when to recompute. Ingestion and storage are
//! external collaborators.
//!
//! ```
//! use chrono::{Duration, Utc};
//! use rust_decimal_macros::dec;
//! use trader_elo::{AccountSnapshot, EloCalculator, EquityPoint, TradeRecord};
//!
//! let now = Utc::now();
//! let trades: Vec<TradeRecord> = (0..30)
//!     .map(|i| {
//!         let close = now - Duration::days(i);
//!         TradeRecord::new(close - Duration::hours(2), close, dec!(45))
//!     })
//!     .collect();
//!
//! let mut account = AccountSnapshot::new(dec!(10000));
//! account.equity_history = Some(vec![
//!     EquityPoint { date: now - Duration::days(30), value: dec!(10000) },
//!     EquityPoint { date: now, value: dec!(11350) },
//! ]);
//! account.account_age_days = Some(30);
//!
//! let report = EloCalculator::calculate(Some("demo".into()), &trades, &account).unwrap();
//! assert!(report.elo_score >= 0.0 && report.elo_score <= 100.0);
//! ```

pub mod error;
pub mod metrics;
pub mod models;
pub mod scoring;

pub use error::ScoreError;
pub use metrics::MetricCalculator;
pub use models::{
    AccountSnapshot, BlockName, BlockResult, ConfidenceTier, DataQuality, EquityPoint,
    MetricName, MetricResult, MetricStatus, PenaltyResult, ReliabilityFactors, ScoreReport,
    TradeRecord, TraderCategory,
};
pub use scoring::{BlockCalculator, EloCalculator};
