//! Trade record model: one closed trade as supplied by the ingestion layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One closed trade.
///
/// Only the timestamps and realized P&L are guaranteed; everything else is
/// optional because statement files and broker APIs differ wildly in what
/// they export. Metric dependency checks are presence-based, so ingestion
/// must pass these fields through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// When the position was opened
    pub open_time: DateTime<Utc>,

    /// When the position was closed (must not precede `open_time`)
    pub close_time: DateTime<Utc>,

    /// Realized profit or loss in account currency (signed)
    pub pnl: Decimal,

    // === Optional fills from richer statements ===
    /// Entry fill price
    #[serde(default)]
    pub entry_price: Option<Decimal>,

    /// Exit fill price
    #[serde(default)]
    pub exit_price: Option<Decimal>,

    /// Stop-loss level at entry
    #[serde(default)]
    pub stop_loss: Option<Decimal>,

    /// Take-profit level at entry
    #[serde(default)]
    pub take_profit: Option<Decimal>,

    /// Position size in units/lots
    #[serde(default)]
    pub position_size: Option<Decimal>,

    /// Risk taken on the trade as a percent of account (1.5 = 1.5%)
    #[serde(default)]
    pub risk_percent: Option<f64>,

    /// Realized risk-reward ratio reported by the broker
    #[serde(default)]
    pub realized_risk_reward: Option<f64>,

    /// Holding duration in minutes, when the statement carries it
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

impl TradeRecord {
    /// A minimal record carrying only the required fields.
    pub fn new(open_time: DateTime<Utc>, close_time: DateTime<Utc>, pnl: Decimal) -> Self {
        Self {
            open_time,
            close_time,
            pnl,
            entry_price: None,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            position_size: None,
            risk_percent: None,
            realized_risk_reward: None,
            duration_minutes: None,
        }
    }

    /// Whether the trade closed in profit.
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// Risk-reward ratio, preferring broker-reported realized RR over one
    /// derived from stop/target distances.
    pub fn risk_reward(&self) -> Option<f64> {
        if let Some(rr) = self.realized_risk_reward {
            return Some(rr);
        }
        self.derived_risk_reward()
    }

    /// RR derived from entry, stop and target: reward distance over risk
    /// distance. None when any level is missing or the stop sits on entry.
    pub fn derived_risk_reward(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        let entry = self.entry_price?;
        let stop = self.stop_loss?;
        let target = self.take_profit?;

        let risk = (entry - stop).abs();
        if risk.is_zero() {
            return None;
        }
        let reward = (target - entry).abs();
        (reward / risk).to_f64()
    }

    /// Planned risk as a fraction of the given account balance, from the
    /// explicit risk percent when present, else from stop distance × size.
    pub fn risk_fraction(&self, initial_balance: Decimal) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        if let Some(pct) = self.risk_percent {
            return Some(pct / 100.0);
        }

        let entry = self.entry_price?;
        let stop = self.stop_loss?;
        let size = self.position_size?;
        if initial_balance <= Decimal::ZERO {
            return None;
        }
        let risk_amount = (entry - stop).abs() * size;
        (risk_amount / initial_balance).to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_trade(pnl: Decimal) -> TradeRecord {
        let now = Utc::now();
        TradeRecord::new(now - chrono::Duration::hours(2), now, pnl)
    }

    #[test]
    fn test_realized_rr_preferred_over_derived() {
        let mut trade = base_trade(dec!(100));
        trade.entry_price = Some(dec!(1.10));
        trade.stop_loss = Some(dec!(1.09));
        trade.take_profit = Some(dec!(1.13));
        trade.realized_risk_reward = Some(1.7);

        assert_eq!(trade.risk_reward(), Some(1.7));
        // Derived path: reward 0.03 / risk 0.01 = 3.0
        assert!((trade.derived_risk_reward().unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_rr_requires_all_levels() {
        let mut trade = base_trade(dec!(50));
        trade.entry_price = Some(dec!(1.10));
        trade.stop_loss = Some(dec!(1.09));
        assert_eq!(trade.risk_reward(), None);

        // Stop on entry means undefined risk distance
        trade.take_profit = Some(dec!(1.12));
        trade.stop_loss = Some(dec!(1.10));
        assert_eq!(trade.risk_reward(), None);
    }

    #[test]
    fn test_risk_fraction_paths() {
        let mut trade = base_trade(dec!(-20));
        trade.risk_percent = Some(2.0);
        assert!((trade.risk_fraction(dec!(10000)).unwrap() - 0.02).abs() < 1e-12);

        trade.risk_percent = None;
        trade.entry_price = Some(dec!(100));
        trade.stop_loss = Some(dec!(98));
        trade.position_size = Some(dec!(50));
        // (100-98) * 50 = 100 risked on a 10k account
        assert!((trade.risk_fraction(dec!(10000)).unwrap() - 0.01).abs() < 1e-12);
    }
}
