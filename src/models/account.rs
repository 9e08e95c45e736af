//! Account snapshot model: balance level plus whatever time series the
//! statement or broker API could provide.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point on an equity or balance curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: DateTime<Utc>,
    pub value: Decimal,
}

/// Account-level snapshot taken at ingestion time.
///
/// `initial_balance` is the only required field; the rest feed individual
/// metrics and simply leave those metrics in `missing_data` status when
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    /// Account balance at the start of the analysed period
    pub initial_balance: Decimal,

    /// Equity curve, ordered by date
    #[serde(default)]
    pub equity_history: Option<Vec<EquityPoint>>,

    /// Balance curve, ordered by date (fallback when equity is absent)
    #[serde(default)]
    pub balance_history: Option<Vec<EquityPoint>>,

    /// Daily returns as signed fractions, ordered, most recent last
    #[serde(default)]
    pub daily_returns: Option<Vec<f64>>,

    /// Monthly returns as signed fractions, ordered
    #[serde(default)]
    pub monthly_returns: Option<Vec<f64>>,

    /// Account leverage, when known
    #[serde(default)]
    pub leverage: Option<f64>,

    /// Age of the account in days
    #[serde(default)]
    pub account_age_days: Option<u32>,

    /// Average trades per week reported by the broker
    #[serde(default)]
    pub trades_per_week: Option<f64>,
}

impl AccountSnapshot {
    /// A snapshot carrying only the required balance.
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            equity_history: None,
            balance_history: None,
            daily_returns: None,
            monthly_returns: None,
            leverage: None,
            account_age_days: None,
            trades_per_week: None,
        }
    }

    /// The preferred curve for drawdown/smoothness work: equity when
    /// present, else balance. None when neither series has points.
    pub fn curve(&self) -> Option<&[EquityPoint]> {
        fn pick(series: &Option<Vec<EquityPoint>>) -> Option<&[EquityPoint]> {
            series.as_deref().filter(|points| !points.is_empty())
        }
        pick(&self.equity_history).or_else(|| pick(&self.balance_history))
    }

    /// Latest known account value from whichever curve is present.
    pub fn final_balance(&self) -> Option<Decimal> {
        self.curve().and_then(|points| points.last()).map(|p| p.value)
    }
}
