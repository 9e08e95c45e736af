//! Metric result model and the closed metric catalogue.

use serde::{Deserialize, Serialize};

use crate::models::score::BlockName;

/// The fixed metric catalogue. Every scoring run produces exactly one
/// [`MetricResult`] per variant, in this declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    AnnualizedReturn,
    WinRate,
    #[serde(rename = "averageRR")]
    AverageRr,
    Expectancy,
    MaxDrawdown,
    Volatility,
    AverageRiskPerTrade,
    RiskSpike,
    EquitySmoothness,
    MonthlyPositiveRatio,
    ProfitConcentrationIndex,
    HumanVariability,
    MarketRegimeBalance,
    TradeFrequencyStability,
}

impl MetricName {
    /// Every catalogue entry, in canonical order.
    pub const ALL: [MetricName; 14] = [
        MetricName::AnnualizedReturn,
        MetricName::WinRate,
        MetricName::AverageRr,
        MetricName::Expectancy,
        MetricName::MaxDrawdown,
        MetricName::Volatility,
        MetricName::AverageRiskPerTrade,
        MetricName::RiskSpike,
        MetricName::EquitySmoothness,
        MetricName::MonthlyPositiveRatio,
        MetricName::ProfitConcentrationIndex,
        MetricName::HumanVariability,
        MetricName::MarketRegimeBalance,
        MetricName::TradeFrequencyStability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::AnnualizedReturn => "annualizedReturn",
            MetricName::WinRate => "winRate",
            MetricName::AverageRr => "averageRR",
            MetricName::Expectancy => "expectancy",
            MetricName::MaxDrawdown => "maxDrawdown",
            MetricName::Volatility => "volatility",
            MetricName::AverageRiskPerTrade => "averageRiskPerTrade",
            MetricName::RiskSpike => "riskSpike",
            MetricName::EquitySmoothness => "equitySmoothness",
            MetricName::MonthlyPositiveRatio => "monthlyPositiveRatio",
            MetricName::ProfitConcentrationIndex => "profitConcentrationIndex",
            MetricName::HumanVariability => "humanVariability",
            MetricName::MarketRegimeBalance => "marketRegimeBalance",
            MetricName::TradeFrequencyStability => "tradeFrequencyStability",
        }
    }

    /// The scoring block this metric contributes to.
    pub fn block(&self) -> BlockName {
        match self {
            MetricName::AnnualizedReturn
            | MetricName::WinRate
            | MetricName::AverageRr
            | MetricName::Expectancy => BlockName::Performance,
            MetricName::MaxDrawdown
            | MetricName::Volatility
            | MetricName::AverageRiskPerTrade
            | MetricName::RiskSpike => BlockName::RiskControl,
            MetricName::EquitySmoothness
            | MetricName::MonthlyPositiveRatio
            | MetricName::ProfitConcentrationIndex => BlockName::Consistency,
            MetricName::HumanVariability | MetricName::MarketRegimeBalance => {
                BlockName::AccountHealth
            }
            MetricName::TradeFrequencyStability => BlockName::Longevity,
        }
    }

    /// Input fields this metric cannot be computed without.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            MetricName::AnnualizedReturn => {
                &["initialBalance", "equityHistory|balanceHistory", "accountAgeDays"]
            }
            MetricName::WinRate => &["pnl"],
            MetricName::AverageRr => &["realizedRiskReward|stopLoss+takeProfit+entryPrice"],
            MetricName::Expectancy => &["pnl"],
            MetricName::MaxDrawdown => &["equityHistory|balanceHistory"],
            MetricName::Volatility => &["dailyReturns"],
            MetricName::AverageRiskPerTrade => {
                &["riskPercent|stopLoss+positionSize+entryPrice"]
            }
            MetricName::RiskSpike => &["riskPercent|stopLoss+positionSize+entryPrice"],
            MetricName::EquitySmoothness => &["equityHistory|balanceHistory"],
            MetricName::MonthlyPositiveRatio => &["monthlyReturns"],
            MetricName::ProfitConcentrationIndex => &["pnl"],
            MetricName::HumanVariability => {
                &["openTime", "positionSize", "realizedRiskReward"]
            }
            MetricName::MarketRegimeBalance => &["closeTime", "dailyReturns"],
            MetricName::TradeFrequencyStability => &["closeTime"],
        }
    }

    /// Optional fields that sharpen the metric; per-metric confidence is
    /// the fraction of these actually present in the input.
    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            MetricName::AverageRr => &["realizedRiskReward", "stopLoss"],
            MetricName::AverageRiskPerTrade | MetricName::RiskSpike => {
                &["riskPercent", "positionSize"]
            }
            MetricName::HumanVariability => &["durationMinutes"],
            _ => &[],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricName::AnnualizedReturn => "Compound yearly return from the account curve",
            MetricName::WinRate => "Share of trades closed in profit",
            MetricName::AverageRr => "Mean realized (or stop/target-derived) risk-reward ratio",
            MetricName::Expectancy => "Expected P&L per trade in account currency",
            MetricName::MaxDrawdown => "Deepest peak-to-trough equity decline",
            MetricName::Volatility => "Annualized standard deviation of daily returns",
            MetricName::AverageRiskPerTrade => "Mean fraction of account risked per trade",
            MetricName::RiskSpike => "Largest per-trade risk relative to the mean risk",
            MetricName::EquitySmoothness => "Inverse coefficient of variation of the equity curve",
            MetricName::MonthlyPositiveRatio => "Share of profitable months",
            MetricName::ProfitConcentrationIndex => {
                "Share of gross profit produced by the top 10% of trades"
            }
            MetricName::HumanVariability => {
                "Behavioural variability across sizing, RR and entry timing"
            }
            MetricName::MarketRegimeBalance => {
                "Balance of activity between calm and volatile market windows"
            }
            MetricName::TradeFrequencyStability => "Stability of weekly trade counts over time",
        }
    }
}

/// Whether a metric could be computed from the given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Available,
    MissingData,
}

/// One computed (or explicitly missing) metric.
///
/// `value` is `Some` exactly when `status` is `Available`; a metric that
/// genuinely computed to zero carries `Some(0.0)`, never `None`.
/// Serialize-only: results flow out to the presentation layer, never back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub name: MetricName,
    pub value: Option<f64>,
    pub status: MetricStatus,
    /// Fraction of the metric's optional dependencies present in the input
    pub confidence: f64,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    pub description: &'static str,
}

impl MetricResult {
    /// A computed metric. The value must already be finite and clamped to
    /// the metric's documented domain.
    pub fn available(name: MetricName, value: f64, confidence: f64) -> Self {
        debug_assert!(value.is_finite());
        Self {
            name,
            value: Some(value),
            status: MetricStatus::Available,
            confidence: confidence.clamp(0.0, 1.0),
            required_fields: name.required_fields(),
            optional_fields: name.optional_fields(),
            description: name.description(),
        }
    }

    /// A metric whose dependencies were absent or under the minimum sample.
    pub fn missing(name: MetricName) -> Self {
        Self {
            name,
            value: None,
            status: MetricStatus::MissingData,
            confidence: 0.0,
            required_fields: name.required_fields(),
            optional_fields: name.optional_fields(),
            description: name.description(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == MetricStatus::Available
    }
}
