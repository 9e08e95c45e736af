//! Score orchestrator: validates input, runs the metric and block layers,
//! applies trust discounts and penalties, and assembles the final report.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ScoreError;
use crate::metrics::MetricCalculator;
use crate::models::{
    AccountSnapshot, ConfidenceTier, DataQuality, MetricName, MetricResult, PenaltyResult,
    ReliabilityFactors, ScoreReport, TradeRecord, TraderCategory,
};
use crate::scoring::blocks::BlockCalculator;

/// Trade count at which the reliability discount reaches 1.0.
const FULL_RELIABILITY_TRADES: f64 = 300.0;

/// Penalty thresholds, all checked against Available metric values only.
const CONCENTRATION_PENALTY_THRESHOLD: f64 = 0.6;
const RISK_SPIKE_SEVERE_THRESHOLD: f64 = 5.0;
const RISK_SPIKE_MODERATE_THRESHOLD: f64 = 3.0;
const HUMAN_VARIABILITY_THRESHOLD: f64 = 30.0;

/// The scoring entry point. Stateless; each call is a pure function of the
/// supplied trades and snapshot, so concurrent calls need no coordination.
pub struct EloCalculator;

impl EloCalculator {
    /// Score one trader. Generates a trader id when the caller supplies
    /// none. Never panics: unexpected internal failures surface as
    /// [`ScoreError::CalculationFailed`].
    pub fn calculate(
        trader_id: Option<String>,
        trades: &[TradeRecord],
        account: &AccountSnapshot,
    ) -> Result<ScoreReport, ScoreError> {
        let trader_id = trader_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        match catch_unwind(AssertUnwindSafe(|| Self::run(&trader_id, trades, account))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown internal error".to_string());
                warn!(trader_id = %trader_id, error = %message, "scoring run panicked");
                Err(ScoreError::CalculationFailed(message))
            }
        }
    }

    fn run(
        trader_id: &str,
        trades: &[TradeRecord],
        account: &AccountSnapshot,
    ) -> Result<ScoreReport, ScoreError> {
        Self::validate_minimal_data(trades, account)?;

        let metrics = MetricCalculator::calculate_all(trades, account);
        let available: Vec<MetricResult> =
            metrics.iter().filter(|m| m.is_available()).cloned().collect();
        debug!(
            trader_id,
            available = available.len(),
            total = metrics.len(),
            "metrics computed"
        );

        let blocks = BlockCalculator::compute_all_blocks(&available);
        let raw_score = BlockCalculator::compute_final_score(&blocks);

        let reliability =
            Self::reliability_factors(trades.len(), available.len(), metrics.len());
        let discounted = raw_score
            * reliability.reliability_multiplier
            * reliability.confidence_coefficient;

        let penalties = Self::compute_penalties(&metrics);
        let penalty_total: f64 = penalties.iter().map(|p| p.value).sum();

        let elo_score = (discounted + penalty_total).clamp(0.0, 100.0);

        let any_included = blocks.iter().any(|b| !b.is_excluded());
        let category = if any_included {
            TraderCategory::from_score(elo_score)
        } else {
            TraderCategory::InsufficientData
        };

        let missing_metrics: Vec<MetricName> = metrics
            .iter()
            .filter(|m| !m.is_available())
            .map(|m| m.name)
            .collect();
        let low_confidence_blocks: Vec<_> = blocks
            .iter()
            .filter(|b| b.confidence_tier == ConfidenceTier::Low)
            .map(|b| b.name)
            .collect();
        let excluded_blocks: Vec<_> = blocks
            .iter()
            .filter(|b| b.is_excluded())
            .map(|b| b.name)
            .collect();

        info!(
            trader_id,
            elo_score,
            raw_score,
            ?category,
            penalties = penalties.len(),
            "score computed"
        );

        Ok(ScoreReport {
            trader_id: trader_id.to_string(),
            elo_score,
            raw_score,
            data_quality: DataQuality {
                available_metrics: available.len(),
                total_metrics: metrics.len(),
                coverage_percent: reliability.data_coverage * 100.0,
                excluded_blocks,
            },
            reliability,
            blocks,
            penalties,
            missing_metrics,
            low_confidence_blocks,
            category,
            calculated_at: Utc::now(),
        })
    }

    /// Minimal-data gate. Failure short-circuits the pipeline; no partial
    /// report is produced.
    fn validate_minimal_data(
        trades: &[TradeRecord],
        account: &AccountSnapshot,
    ) -> Result<(), ScoreError> {
        if trades.is_empty() {
            return Err(ScoreError::InsufficientData(
                "no trades supplied".to_string(),
            ));
        }
        if let Some(idx) = trades.iter().position(|t| t.close_time < t.open_time) {
            return Err(ScoreError::InsufficientData(format!(
                "trade {idx} closes before it opens"
            )));
        }
        if account.initial_balance <= Decimal::ZERO {
            return Err(ScoreError::InsufficientData(
                "account initial balance must be positive".to_string(),
            ));
        }
        if account.curve().is_none() {
            return Err(ScoreError::InsufficientData(
                "account needs an equity or balance history".to_string(),
            ));
        }
        Ok(())
    }

    /// Trade-count reliability and catalogue-coverage confidence.
    ///
    /// Coverage uses the real count of available metrics over the full
    /// catalogue, so the confidence coefficient spans its whole [0.5, 1.0]
    /// range instead of sticking at the floor.
    fn reliability_factors(
        total_trades: usize,
        available_metrics: usize,
        total_metrics: usize,
    ) -> ReliabilityFactors {
        let reliability_multiplier =
            (total_trades as f64 / FULL_RELIABILITY_TRADES).sqrt().min(1.0);
        let data_coverage = if total_metrics > 0 {
            available_metrics as f64 / total_metrics as f64
        } else {
            0.0
        };
        ReliabilityFactors {
            total_trades,
            reliability_multiplier,
            data_coverage,
            confidence_coefficient: 0.5 + 0.5 * data_coverage,
        }
    }

    /// Verifiable anti-manipulation penalties. A penalty is only emitted
    /// when its source metric actually computed; absence of evidence is
    /// never penalized.
    fn compute_penalties(metrics: &[MetricResult]) -> Vec<PenaltyResult> {
        let value_of = |name: MetricName| {
            metrics
                .iter()
                .find(|m| m.name == name)
                .and_then(|m| m.value)
        };
        let mut penalties = Vec::new();

        if let Some(concentration) = value_of(MetricName::ProfitConcentrationIndex) {
            if concentration > CONCENTRATION_PENALTY_THRESHOLD {
                penalties.push(PenaltyResult {
                    name: "profitConcentration",
                    value: -15.0,
                    reason: format!(
                        "top-10% trades hold {:.0}% of gross profit",
                        concentration * 100.0
                    ),
                    applied: true,
                });
            }
        }

        if let Some(spike) = value_of(MetricName::RiskSpike) {
            if spike > RISK_SPIKE_SEVERE_THRESHOLD {
                penalties.push(PenaltyResult {
                    name: "riskSpike",
                    value: -30.0,
                    reason: format!("maximum trade risk is {spike:.1}x the mean risk"),
                    applied: true,
                });
            } else if spike > RISK_SPIKE_MODERATE_THRESHOLD {
                penalties.push(PenaltyResult {
                    name: "riskSpike",
                    value: -15.0,
                    reason: format!("maximum trade risk is {spike:.1}x the mean risk"),
                    applied: true,
                });
            }
        }

        if let Some(variability) = value_of(MetricName::HumanVariability) {
            if variability < HUMAN_VARIABILITY_THRESHOLD {
                let deduction =
                    ((HUMAN_VARIABILITY_THRESHOLD - variability) / 2.0).clamp(10.0, 25.0);
                penalties.push(PenaltyResult {
                    name: "botLikeTrading",
                    value: -deduction,
                    reason: format!(
                        "behavioural variability {variability:.0} is below {HUMAN_VARIABILITY_THRESHOLD:.0}"
                    ),
                    applied: true,
                });
            }
        }

        penalties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EquityPoint;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn valid_account() -> AccountSnapshot {
        let mut account = AccountSnapshot::new(dec!(10000));
        let now = Utc::now();
        account.equity_history = Some(vec![
            EquityPoint {
                date: now - Duration::days(30),
                value: dec!(10000),
            },
            EquityPoint {
                date: now,
                value: dec!(11000),
            },
        ]);
        account
    }

    fn valid_trades(count: usize) -> Vec<TradeRecord> {
        (0..count)
            .map(|i| {
                let close = Utc::now() - Duration::days(i as i64);
                TradeRecord::new(close - Duration::hours(1), close, dec!(100))
            })
            .collect()
    }

    #[test]
    fn test_reliability_curve() {
        let factors = EloCalculator::reliability_factors(0, 7, 14);
        assert_eq!(factors.reliability_multiplier, 0.0);

        let factors = EloCalculator::reliability_factors(75, 7, 14);
        assert!((factors.reliability_multiplier - 0.5).abs() < 1e-12);

        let factors = EloCalculator::reliability_factors(300, 7, 14);
        assert_eq!(factors.reliability_multiplier, 1.0);

        // Capped beyond the full sample
        let factors = EloCalculator::reliability_factors(1200, 7, 14);
        assert_eq!(factors.reliability_multiplier, 1.0);
    }

    #[test]
    fn test_confidence_coefficient_bounds() {
        let floor = EloCalculator::reliability_factors(10, 0, 14);
        assert_eq!(floor.confidence_coefficient, 0.5);

        let ceiling = EloCalculator::reliability_factors(10, 14, 14);
        assert_eq!(ceiling.confidence_coefficient, 1.0);

        let half = EloCalculator::reliability_factors(10, 7, 14);
        assert!((half.confidence_coefficient - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_empty_trades() {
        let err = EloCalculator::calculate(None, &[], &valid_account()).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_validation_rejects_unordered_trade() {
        let mut trades = valid_trades(3);
        trades[1].close_time = trades[1].open_time - Duration::minutes(5);
        let err = EloCalculator::calculate(None, &trades, &valid_account()).unwrap_err();
        assert!(matches!(err, ScoreError::InsufficientData(_)));
    }

    #[test]
    fn test_validation_rejects_account_without_history() {
        let account = AccountSnapshot::new(dec!(10000));
        let err = EloCalculator::calculate(None, &valid_trades(5), &account).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_trader_id_generated_when_absent() {
        let report =
            EloCalculator::calculate(None, &valid_trades(5), &valid_account()).unwrap();
        assert!(!report.trader_id.is_empty());

        let report = EloCalculator::calculate(
            Some("trader-42".to_string()),
            &valid_trades(5),
            &valid_account(),
        )
        .unwrap();
        assert_eq!(report.trader_id, "trader-42");
    }

    #[test]
    fn test_penalty_thresholds() {
        let metrics = vec![
            MetricResult::available(MetricName::ProfitConcentrationIndex, 0.65, 1.0),
            MetricResult::available(MetricName::RiskSpike, 3.5, 1.0),
            MetricResult::available(MetricName::HumanVariability, 10.0, 1.0),
        ];
        let penalties = EloCalculator::compute_penalties(&metrics);
        assert_eq!(penalties.len(), 3);

        let by_name = |name: &str| penalties.iter().find(|p| p.name == name).unwrap();
        assert_eq!(by_name("profitConcentration").value, -15.0);
        assert_eq!(by_name("riskSpike").value, -15.0);
        // (30 - 10) / 2 = 10, within the [10, 25] clamp
        assert_eq!(by_name("botLikeTrading").value, -10.0);
        assert!(penalties.iter().all(|p| p.applied && p.value <= 0.0));
    }

    #[test]
    fn test_severe_risk_spike_penalty() {
        let metrics = vec![MetricResult::available(MetricName::RiskSpike, 7.0, 1.0)];
        let penalties = EloCalculator::compute_penalties(&metrics);
        assert_eq!(penalties.len(), 1);
        assert_eq!(penalties[0].value, -30.0);
    }

    #[test]
    fn test_no_penalties_from_missing_metrics() {
        let metrics = vec![
            MetricResult::missing(MetricName::ProfitConcentrationIndex),
            MetricResult::missing(MetricName::RiskSpike),
            MetricResult::missing(MetricName::HumanVariability),
        ];
        assert!(EloCalculator::compute_penalties(&metrics).is_empty());
    }

    #[test]
    fn test_bot_penalty_clamp_window() {
        let metrics = vec![MetricResult::available(MetricName::HumanVariability, 0.0, 1.0)];
        let penalties = EloCalculator::compute_penalties(&metrics);
        // (30 - 0) / 2 = 15, inside the [10, 25] window
        assert_eq!(penalties[0].value, -15.0);

        let metrics =
            vec![MetricResult::available(MetricName::HumanVariability, 29.0, 1.0)];
        let penalties = EloCalculator::compute_penalties(&metrics);
        // (30 - 29) / 2 = 0.5, raised to the clamp floor of 10
        assert_eq!(penalties[0].value, -10.0);
    }

    #[test]
    fn test_report_shape() {
        let report =
            EloCalculator::calculate(None, &valid_trades(10), &valid_account()).unwrap();
        assert_eq!(report.blocks.len(), 5);
        assert!(report.elo_score >= 0.0 && report.elo_score <= 100.0);
        assert_eq!(
            report.data_quality.available_metrics + report.missing_metrics.len(),
            report.data_quality.total_metrics
        );
        let adjusted: f64 = report
            .blocks
            .iter()
            .filter(|b| !b.is_excluded())
            .map(|b| b.adjusted_weight)
            .sum();
        assert!((adjusted - 1.0).abs() < 1e-9);
    }
}
