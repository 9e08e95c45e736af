//! Calculator for the fixed trader-metric catalogue: performance, risk,
//! consistency and anti-manipulation metrics.
//!
//! Every metric either computes from real input or reports `missing_data`;
//! nothing is approximated, interpolated or defaulted. All functions are
//! pure over the borrowed trade slice and account snapshot.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{AccountSnapshot, MetricName, MetricResult, TradeRecord};

/// Minimum sample sizes, as documented per metric.
const MIN_TRADES_DISTRIBUTION: usize = 10;
const MIN_TRADES_REGIME: usize = 20;
const MIN_RISK_SAMPLES: usize = 5;
const MIN_EQUITY_POINTS_SMOOTHNESS: usize = 10;
const MIN_DISTINCT_WEEKS: usize = 4;
const REGIME_WINDOW_DAYS: usize = 7;

/// Calculator for the full metric catalogue.
pub struct MetricCalculator;

impl MetricCalculator {
    /// Compute every catalogue metric, in canonical order. Exactly one
    /// result per [`MetricName`] variant.
    pub fn calculate_all(trades: &[TradeRecord], account: &AccountSnapshot) -> Vec<MetricResult> {
        MetricName::ALL
            .iter()
            .map(|&name| Self::calculate(name, trades, account))
            .collect()
    }

    /// Compute a single metric.
    pub fn calculate(
        name: MetricName,
        trades: &[TradeRecord],
        account: &AccountSnapshot,
    ) -> MetricResult {
        let confidence = Self::confidence_for(name, trades);
        let value = match name {
            MetricName::AnnualizedReturn => Self::annualized_return(account),
            MetricName::WinRate => Self::win_rate(trades),
            MetricName::AverageRr => Self::average_rr(trades),
            MetricName::Expectancy => Self::expectancy(trades),
            MetricName::MaxDrawdown => Self::max_drawdown(account),
            MetricName::Volatility => Self::volatility(account),
            MetricName::AverageRiskPerTrade => Self::average_risk_per_trade(trades, account),
            MetricName::RiskSpike => Self::risk_spike(trades, account),
            MetricName::EquitySmoothness => Self::equity_smoothness(account),
            MetricName::MonthlyPositiveRatio => Self::monthly_positive_ratio(account),
            MetricName::ProfitConcentrationIndex => Self::profit_concentration(trades),
            MetricName::HumanVariability => Self::human_variability(trades),
            MetricName::MarketRegimeBalance => Self::market_regime_balance(trades, account),
            MetricName::TradeFrequencyStability => Self::trade_frequency_stability(trades),
        };

        match value {
            Some(v) if v.is_finite() => MetricResult::available(name, v, confidence),
            _ => MetricResult::missing(name),
        }
    }

    /// Per-metric confidence: the fraction of the metric's declared
    /// optional dependencies present anywhere in the input (1.0 when the
    /// metric declares none).
    fn confidence_for(name: MetricName, trades: &[TradeRecord]) -> f64 {
        let optional = name.optional_fields();
        if optional.is_empty() {
            return 1.0;
        }
        let present = optional
            .iter()
            .filter(|&&field| Self::field_present(field, trades))
            .count();
        present as f64 / optional.len() as f64
    }

    fn field_present(field: &str, trades: &[TradeRecord]) -> bool {
        match field {
            "realizedRiskReward" => trades.iter().any(|t| t.realized_risk_reward.is_some()),
            "stopLoss" => trades.iter().any(|t| t.stop_loss.is_some()),
            "riskPercent" => trades.iter().any(|t| t.risk_percent.is_some()),
            "positionSize" => trades.iter().any(|t| t.position_size.is_some()),
            "durationMinutes" => trades.iter().any(|t| t.duration_minutes.is_some()),
            _ => false,
        }
    }

    // === Performance ===

    /// Compound yearly return from the account curve, as a signed fraction
    /// clamped to [-1.0, 10.0] (-100% .. +1000%).
    fn annualized_return(account: &AccountSnapshot) -> Option<f64> {
        let final_balance = account.final_balance()?;
        let days = account.account_age_days.filter(|&d| d > 0)?;
        if account.initial_balance <= Decimal::ZERO {
            return None;
        }

        let total_return =
            ((final_balance - account.initial_balance) / account.initial_balance).to_f64()?;
        // A wiped account makes the growth base 0, not negative
        let base = (1.0 + total_return).max(0.0);
        let annualized = base.powf(365.0 / days as f64) - 1.0;
        Some(annualized.clamp(-1.0, 10.0))
    }

    /// Winning trades over total trades, 0-100.
    fn win_rate(trades: &[TradeRecord]) -> Option<f64> {
        if trades.is_empty() {
            return None;
        }
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        Some(winners as f64 / trades.len() as f64 * 100.0)
    }

    /// Mean per-trade risk-reward ratio, realized data preferred over
    /// stop/target-derived, clamped to [0, 10].
    fn average_rr(trades: &[TradeRecord]) -> Option<f64> {
        let ratios: Vec<f64> = trades.iter().filter_map(|t| t.risk_reward()).collect();
        if ratios.is_empty() {
            return None;
        }
        Some(ratios.mean().clamp(0.0, 10.0))
    }

    /// `p·avgWin − (1−p)·avgLoss` in account currency. Needs at least one
    /// winner and one loser; wide ±1e6 guard window.
    fn expectancy(trades: &[TradeRecord]) -> Option<f64> {
        let wins: Vec<f64> = trades
            .iter()
            .filter(|t| t.pnl > Decimal::ZERO)
            .filter_map(|t| t.pnl.to_f64())
            .collect();
        let losses: Vec<f64> = trades
            .iter()
            .filter(|t| t.pnl < Decimal::ZERO)
            .filter_map(|t| t.pnl.abs().to_f64())
            .collect();
        if wins.is_empty() || losses.is_empty() {
            return None;
        }

        let p = wins.len() as f64 / trades.len() as f64;
        let avg_win = wins.mean();
        let avg_loss = losses.mean();
        Some((p * avg_win - (1.0 - p) * avg_loss).clamp(-1_000_000.0, 1_000_000.0))
    }

    // === Risk control ===

    /// Deepest peak-to-trough decline of the account curve, as a percent of
    /// the peak, 0-100.
    fn max_drawdown(account: &AccountSnapshot) -> Option<f64> {
        let curve = account.curve()?;
        if curve.len() < 2 {
            return None;
        }

        let mut peak = Decimal::MIN;
        let mut max_dd_pct = 0.0f64;
        for point in curve {
            if point.value > peak {
                peak = point.value;
            }
            if peak > Decimal::ZERO {
                let dd = peak - point.value;
                let dd_pct = (dd / peak).to_f64().unwrap_or(0.0);
                if dd_pct > max_dd_pct {
                    max_dd_pct = dd_pct;
                }
            }
        }
        Some((max_dd_pct * 100.0).clamp(0.0, 100.0))
    }

    /// Annualized daily-return volatility: `stdev · √252 · 100`, clamped to
    /// [0, 500].
    fn volatility(account: &AccountSnapshot) -> Option<f64> {
        let returns = account.daily_returns.as_deref()?;
        if returns.len() < 2 {
            return None;
        }
        let annualized = returns.std_dev() * (252.0f64).sqrt() * 100.0;
        Some(annualized.clamp(0.0, 500.0))
    }

    /// Mean per-trade risk fraction × 100, clamped to [0, 100].
    fn average_risk_per_trade(trades: &[TradeRecord], account: &AccountSnapshot) -> Option<f64> {
        let risks = Self::risk_fractions(trades, account);
        if risks.is_empty() {
            return None;
        }
        Some((risks.mean() * 100.0).clamp(0.0, 100.0))
    }

    /// Largest per-trade risk over the mean risk, clamped to [1, 20].
    /// Needs at least five risk samples and a non-zero mean.
    fn risk_spike(trades: &[TradeRecord], account: &AccountSnapshot) -> Option<f64> {
        let risks = Self::risk_fractions(trades, account);
        if risks.len() < MIN_RISK_SAMPLES {
            return None;
        }
        let mean = risks.clone().mean();
        if mean <= 0.0 {
            return None;
        }
        let max = risks.iter().copied().fold(f64::MIN, f64::max);
        Some((max / mean).clamp(1.0, 20.0))
    }

    fn risk_fractions(trades: &[TradeRecord], account: &AccountSnapshot) -> Vec<f64> {
        trades
            .iter()
            .filter_map(|t| t.risk_fraction(account.initial_balance))
            .filter(|r| r.is_finite() && *r >= 0.0)
            .collect()
    }

    // === Consistency ===

    /// Inverse coefficient of variation of the equity curve, clamped to
    /// [0, 100]. A flat curve is perfectly smooth.
    fn equity_smoothness(account: &AccountSnapshot) -> Option<f64> {
        let curve = account.curve()?;
        if curve.len() < MIN_EQUITY_POINTS_SMOOTHNESS {
            return None;
        }

        let values: Vec<f64> = curve.iter().filter_map(|p| p.value.to_f64()).collect();
        let mean = values.clone().mean();
        if mean <= 0.0 {
            return None;
        }
        let cov = values.std_dev() / mean;
        if cov <= f64::EPSILON {
            return Some(100.0);
        }
        Some((1.0 / cov).clamp(0.0, 100.0))
    }

    /// Share of profitable months × 100.
    fn monthly_positive_ratio(account: &AccountSnapshot) -> Option<f64> {
        let returns = account.monthly_returns.as_deref()?;
        if returns.is_empty() {
            return None;
        }
        let positive = returns.iter().filter(|&&r| r > 0.0).count();
        Some(positive as f64 / returns.len() as f64 * 100.0)
    }

    /// Share of gross profit held by the top-10%-by-PnL trades, 0-1.
    /// High concentration means the record hinges on a few lucky trades.
    fn profit_concentration(trades: &[TradeRecord]) -> Option<f64> {
        if trades.len() < MIN_TRADES_DISTRIBUTION {
            return None;
        }

        let mut pnls: Vec<f64> = trades.iter().filter_map(|t| t.pnl.to_f64()).collect();
        let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
        if gross_profit <= 0.0 {
            return None;
        }

        pnls.sort_by(|a, b| b.total_cmp(a));
        let top_count = pnls.len().div_ceil(10);
        let top_profit: f64 = pnls.iter().take(top_count).map(|p| p.max(0.0)).sum();
        Some((top_profit / gross_profit).clamp(0.0, 1.0))
    }

    // === Account health (anti-manipulation) ===

    /// Behavioural variability score, 0-100. Low values look bot-like:
    /// repeated sizes, repeated RR, clockwork entry times, round lots.
    /// Four components, each 0-100, weighted 25 each and subtracted from 100.
    fn human_variability(trades: &[TradeRecord]) -> Option<f64> {
        let usable: Vec<&TradeRecord> = trades
            .iter()
            .filter(|t| t.position_size.is_some() && t.risk_reward().is_some())
            .collect();
        if usable.len() < MIN_TRADES_DISTRIBUTION {
            return None;
        }
        let n = usable.len() as f64;

        // Share of trades at the modal position size
        let mut size_counts: HashMap<Decimal, usize> = HashMap::new();
        for trade in &usable {
            if let Some(size) = trade.position_size {
                *size_counts.entry(size.normalize()).or_insert(0) += 1;
            }
        }
        let size_repetition =
            size_counts.values().copied().max().unwrap_or(0) as f64 / n * 100.0;

        // Share of trades at the modal RR, bucketed to 0.1
        let mut rr_counts: HashMap<i64, usize> = HashMap::new();
        for trade in &usable {
            if let Some(rr) = trade.risk_reward() {
                *rr_counts.entry((rr * 10.0).round() as i64).or_insert(0) += 1;
            }
        }
        let rr_repetition = rr_counts.values().copied().max().unwrap_or(0) as f64 / n * 100.0;

        // Inverse entropy of the hour-of-day entry histogram
        let mut hour_counts = [0usize; 24];
        for trade in &usable {
            hour_counts[trade.open_time.hour() as usize] += 1;
        }
        let entropy: f64 = hour_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum();
        let max_entropy = (usable.len().min(24) as f64).ln();
        let time_entropy_inverse = if max_entropy > 0.0 {
            (1.0 - entropy / max_entropy).clamp(0.0, 1.0) * 100.0
        } else {
            0.0
        };

        // Excess share of round (whole, multiple-of-ten) lot sizes beyond a
        // coin-flip; round sizing alone is not suspicious
        let ten = Decimal::from(10);
        let round = usable
            .iter()
            .filter_map(|t| t.position_size)
            .filter(|s| s.fract().is_zero() && (s % ten).is_zero())
            .count();
        let round_bias = ((round as f64 / n - 0.5) * 2.0).clamp(0.0, 1.0) * 100.0;

        let score = 100.0
            - 0.25 * (size_repetition + rr_repetition + time_entropy_inverse + round_bias);
        Some(score.clamp(0.0, 100.0))
    }

    /// Balance of trading activity between high- and low-volatility 7-day
    /// windows, 0-100; trading only one regime scores 0.
    ///
    /// The dateless `daily_returns` series is anchored so its last entry
    /// falls on the latest trade close date.
    fn market_regime_balance(trades: &[TradeRecord], account: &AccountSnapshot) -> Option<f64> {
        let returns = account.daily_returns.as_deref()?;
        if trades.len() < MIN_TRADES_REGIME || returns.len() < REGIME_WINDOW_DAYS {
            return None;
        }

        let last_close = trades.iter().map(|t| t.close_time).max()?;
        let first_day = last_close - Duration::days(returns.len() as i64 - 1);

        // Trailing window volatility per day index
        let window_vols: Vec<f64> = (REGIME_WINDOW_DAYS - 1..returns.len())
            .map(|i| returns[i + 1 - REGIME_WINDOW_DAYS..=i].std_dev())
            .collect();
        let mut sorted = window_vols.clone();
        sorted.sort_by(f64::total_cmp);
        let median = sorted[sorted.len() / 2];

        let mut high = 0usize;
        let mut classified = 0usize;
        for trade in trades {
            let idx = (trade.close_time.date_naive() - first_day.date_naive()).num_days();
            let Ok(idx) = usize::try_from(idx) else {
                continue;
            };
            if idx < REGIME_WINDOW_DAYS - 1 || idx >= returns.len() {
                continue;
            }
            classified += 1;
            if window_vols[idx + 1 - REGIME_WINDOW_DAYS] > median {
                high += 1;
            }
        }
        if classified == 0 {
            return None;
        }

        let share_high = high as f64 / classified as f64;
        Some(((1.0 - (share_high - 0.5).abs() * 2.0) * 100.0).clamp(0.0, 100.0))
    }

    // === Longevity ===

    /// `100 · (1 − CoV(weekly trade counts))`, clamped to [0, 100]. Needs
    /// ten trades across at least four distinct ISO weeks.
    fn trade_frequency_stability(trades: &[TradeRecord]) -> Option<f64> {
        if trades.len() < MIN_TRADES_DISTRIBUTION {
            return None;
        }

        let mut weekly: HashMap<(i32, u32), usize> = HashMap::new();
        for trade in trades {
            let week = trade.close_time.iso_week();
            *weekly.entry((week.year(), week.week())).or_insert(0) += 1;
        }
        if weekly.len() < MIN_DISTINCT_WEEKS {
            return None;
        }

        let counts: Vec<f64> = weekly.values().map(|&c| c as f64).collect();
        let mean = counts.clone().mean();
        if mean <= 0.0 {
            return None;
        }
        let cov = counts.std_dev() / mean;
        Some((100.0 * (1.0 - cov)).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquityPoint, MetricStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade_at(days_ago: i64, pnl: Decimal) -> TradeRecord {
        let close = Utc::now() - Duration::days(days_ago);
        TradeRecord::new(close - Duration::hours(3), close, pnl)
    }

    fn account_with_curve(values: &[Decimal]) -> AccountSnapshot {
        let mut account = AccountSnapshot::new(dec!(10000));
        let start = Utc::now() - Duration::days(values.len() as i64);
        account.equity_history = Some(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| EquityPoint {
                    date: start + Duration::days(i as i64),
                    value,
                })
                .collect(),
        );
        account
    }

    #[test]
    fn test_annualized_return_compounds_and_clamps() {
        let mut account = account_with_curve(&[dec!(10000), dec!(11000)]);
        account.account_age_days = Some(30);

        let result =
            MetricCalculator::calculate(MetricName::AnnualizedReturn, &[], &account);
        // (1.1)^(365/30) - 1 ≈ 2.19
        let value = result.value.unwrap();
        assert!((value - 2.19).abs() < 0.02, "got {value}");

        // Explosive short-window growth hits the 1000% ceiling
        let mut account = account_with_curve(&[dec!(10000), dec!(30000)]);
        account.account_age_days = Some(10);
        let result =
            MetricCalculator::calculate(MetricName::AnnualizedReturn, &[], &account);
        assert_eq!(result.value, Some(10.0));
    }

    #[test]
    fn test_annualized_return_missing_without_age() {
        let account = account_with_curve(&[dec!(10000), dec!(11000)]);
        let result =
            MetricCalculator::calculate(MetricName::AnnualizedReturn, &[], &account);
        assert_eq!(result.status, MetricStatus::MissingData);
        assert_eq!(result.value, None);
    }

    #[test]
    fn test_win_rate() {
        let trades = vec![
            trade_at(3, dec!(100)),
            trade_at(2, dec!(-50)),
            trade_at(1, dec!(80)),
            trade_at(0, dec!(20)),
        ];
        let account = AccountSnapshot::new(dec!(10000));
        let result = MetricCalculator::calculate(MetricName::WinRate, &trades, &account);
        assert_eq!(result.value, Some(75.0));
    }

    #[test]
    fn test_expectancy_needs_both_sides() {
        let account = AccountSnapshot::new(dec!(10000));
        let all_winners = vec![trade_at(1, dec!(100)), trade_at(0, dec!(50))];
        let result =
            MetricCalculator::calculate(MetricName::Expectancy, &all_winners, &account);
        assert_eq!(result.status, MetricStatus::MissingData);

        let mixed = vec![
            trade_at(2, dec!(100)),
            trade_at(1, dec!(100)),
            trade_at(0, dec!(-40)),
        ];
        let result = MetricCalculator::calculate(MetricName::Expectancy, &mixed, &account);
        // p=2/3, avgWin=100, avgLoss=40 => 66.67 - 13.33 = 53.33
        assert!((result.value.unwrap() - 53.333).abs() < 0.01);
    }

    #[test]
    fn test_max_drawdown_peak_to_trough() {
        let account = account_with_curve(&[
            dec!(10000),
            dec!(12000),
            dec!(9000),
            dec!(11000),
            dec!(12500),
        ]);
        let result = MetricCalculator::calculate(MetricName::MaxDrawdown, &[], &account);
        // Peak 12000 -> trough 9000 = 25%
        assert!((result.value.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_annualizes_stdev() {
        let mut account = AccountSnapshot::new(dec!(10000));
        account.daily_returns = Some(vec![0.01, -0.01, 0.02, -0.02, 0.0]);
        let result = MetricCalculator::calculate(MetricName::Volatility, &[], &account);
        let expected = [0.01f64, -0.01, 0.02, -0.02, 0.0]
            .as_slice()
            .std_dev()
            * 252.0f64.sqrt()
            * 100.0;
        assert!((result.value.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_risk_spike_ratio() {
        let account = AccountSnapshot::new(dec!(10000));
        let mut trades: Vec<TradeRecord> = (0..5).map(|i| trade_at(i, dec!(10))).collect();
        for trade in trades.iter_mut() {
            trade.risk_percent = Some(1.0);
        }
        trades[0].risk_percent = Some(6.0);

        let result = MetricCalculator::calculate(MetricName::RiskSpike, &trades, &account);
        // mean = (6+1+1+1+1)/5 = 2.0 (percent), spike = 6/2 = 3
        assert!((result.value.unwrap() - 3.0).abs() < 1e-9);
        // Both optional deps (riskPercent, positionSize) only half present
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_profit_concentration_top_decile() {
        let account = AccountSnapshot::new(dec!(10000));
        // 9 trades of +100 and one of +900: top 10% (1 trade) holds 0.5
        let mut trades: Vec<TradeRecord> =
            (0..9).map(|i| trade_at(i, dec!(100))).collect();
        trades.push(trade_at(9, dec!(900)));

        let result =
            MetricCalculator::calculate(MetricName::ProfitConcentrationIndex, &trades, &account);
        assert!((result.value.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_human_variability_flags_clockwork_bot() {
        let account = AccountSnapshot::new(dec!(10000));
        // Identical size, identical RR, same entry hour, round lots
        let trades: Vec<TradeRecord> = (0u32..12)
            .map(|i| {
                let open = Utc.with_ymd_and_hms(2026, 3, 1 + i, 14, 0, 0).unwrap();
                let mut t = TradeRecord::new(open, open + Duration::hours(1), dec!(10));
                t.position_size = Some(dec!(10));
                t.realized_risk_reward = Some(2.0);
                t
            })
            .collect();

        let result =
            MetricCalculator::calculate(MetricName::HumanVariability, &trades, &account);
        // All four components max out: 100 - 0.25*400 = 0
        assert!(result.value.unwrap() < 1.0);
    }

    #[test]
    fn test_human_variability_rewards_varied_trading() {
        let account = AccountSnapshot::new(dec!(10000));
        let trades: Vec<TradeRecord> = (0u32..12)
            .map(|i| {
                let open = Utc
                    .with_ymd_and_hms(2026, 3, 1 + i, (7 + i * 2) % 24, 30, 0)
                    .unwrap();
                let mut t = TradeRecord::new(open, open + Duration::hours(2), dec!(10));
                t.position_size = Some(Decimal::from(3 + i as i64));
                t.realized_risk_reward = Some(0.8 + 0.3 * i as f64);
                t
            })
            .collect();

        let result =
            MetricCalculator::calculate(MetricName::HumanVariability, &trades, &account);
        assert!(result.value.unwrap() > 60.0);
    }

    #[test]
    fn test_trade_frequency_stability_even_weeks() {
        let account = AccountSnapshot::new(dec!(10000));
        // 3 trades in each of 4 consecutive weeks
        let trades: Vec<TradeRecord> = (0..12)
            .map(|i| trade_at((i / 3) * 7 + (i % 3), dec!(10)))
            .collect();
        let result =
            MetricCalculator::calculate(MetricName::TradeFrequencyStability, &trades, &account);
        // Equal weekly counts: CoV = 0 -> 100
        assert_eq!(result.value, Some(100.0));
    }

    #[test]
    fn test_market_regime_balance_single_regime_scores_zero() {
        let mut account = AccountSnapshot::new(dec!(10000));
        // First half calm, second half volatile
        let mut returns = vec![0.001; 20];
        returns.extend([0.05, -0.04, 0.06, -0.05, 0.04, -0.06, 0.05, -0.04, 0.06, -0.05]);
        account.daily_returns = Some(returns);

        // All 20 trades close inside the volatile tail
        let trades: Vec<TradeRecord> = (0..20).map(|i| trade_at(i % 5, dec!(10))).collect();
        let result =
            MetricCalculator::calculate(MetricName::MarketRegimeBalance, &trades, &account);
        assert_eq!(result.value, Some(0.0));
    }

    #[test]
    fn test_every_metric_reports_once() {
        let account = AccountSnapshot::new(dec!(10000));
        let results = MetricCalculator::calculate_all(&[], &account);
        assert_eq!(results.len(), MetricName::ALL.len());
        for (result, &name) in results.iter().zip(MetricName::ALL.iter()) {
            assert_eq!(result.name, name);
        }
        // Nothing is computable from an empty input
        assert!(results.iter().all(|r| r.status == MetricStatus::MissingData));
    }
}
