//! Score report models: blocks, reliability, penalties, categories and the
//! final report record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::metric::MetricName;

/// The five weighted scoring blocks. Weights are fixed and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockName {
    Performance,
    RiskControl,
    Consistency,
    AccountHealth,
    Longevity,
}

impl BlockName {
    /// Canonical report order.
    pub const ALL: [BlockName; 5] = [
        BlockName::Performance,
        BlockName::RiskControl,
        BlockName::Consistency,
        BlockName::AccountHealth,
        BlockName::Longevity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockName::Performance => "performance",
            BlockName::RiskControl => "riskControl",
            BlockName::Consistency => "consistency",
            BlockName::AccountHealth => "accountHealth",
            BlockName::Longevity => "longevity",
        }
    }

    /// Fixed block weight.
    pub fn weight(&self) -> f64 {
        match self {
            BlockName::Performance => 0.40,
            BlockName::RiskControl => 0.30,
            BlockName::Consistency => 0.15,
            BlockName::AccountHealth => 0.10,
            BlockName::Longevity => 0.05,
        }
    }

    /// Size of this block's metric catalogue.
    pub fn catalogue_size(&self) -> usize {
        MetricName::ALL.iter().filter(|m| m.block() == *self).count()
    }
}

/// How much to trust a block's score, driven by metric coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Excluded,
}

/// One scored block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
    pub name: BlockName,
    /// Confidence-weighted mean of normalized metric scores, 0-100
    pub score: f64,
    pub confidence_tier: ConfidenceTier,
    pub available_metric_count: usize,
    pub total_metric_count: usize,
    /// `available / total × 100` against the fixed catalogue
    pub coverage_percent: f64,
    pub original_weight: f64,
    /// Weight after redistribution from excluded blocks; 0 when excluded
    pub adjusted_weight: f64,
}

impl BlockResult {
    pub fn is_excluded(&self) -> bool {
        self.confidence_tier == ConfidenceTier::Excluded
    }
}

/// Trust discounts applied to the raw weighted score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityFactors {
    pub total_trades: usize,
    /// `min(1, sqrt(totalTrades / 300))`
    pub reliability_multiplier: f64,
    /// Available metrics over the full catalogue, 0-1
    pub data_coverage: f64,
    /// `0.5 + 0.5 · dataCoverage`
    pub confidence_coefficient: f64,
}

/// A verifiable, data-triggered deduction. `value` is always ≤ 0.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyResult {
    pub name: &'static str,
    pub value: f64,
    pub reason: String,
    /// True only when the penalty was computed from real data
    pub applied: bool,
}

/// Final trader classification bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraderCategory {
    Elite,
    Professional,
    Consistent,
    Unstable,
    Speculative,
    #[serde(rename = "Insufficient_Data")]
    InsufficientData,
}

impl TraderCategory {
    /// Band thresholds over the final clamped score.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            TraderCategory::Elite
        } else if score >= 80.0 {
            TraderCategory::Professional
        } else if score >= 65.0 {
            TraderCategory::Consistent
        } else if score >= 50.0 {
            TraderCategory::Unstable
        } else {
            TraderCategory::Speculative
        }
    }
}

/// Coverage summary attached to every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub available_metrics: usize,
    pub total_metrics: usize,
    pub coverage_percent: f64,
    pub excluded_blocks: Vec<BlockName>,
}

/// The terminal output of one scoring run. Immutable once assembled and,
/// like the metric results it carries, serialize-only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub trader_id: String,

    /// Final skill score after discounts and penalties, clamped to [0,100]
    pub elo_score: f64,

    /// Weighted block score before reliability/confidence/penalties
    pub raw_score: f64,

    pub reliability: ReliabilityFactors,

    /// All five blocks in canonical order, excluded ones included
    pub blocks: Vec<BlockResult>,

    pub penalties: Vec<PenaltyResult>,

    /// Metrics that reported `missing_data`
    pub missing_metrics: Vec<MetricName>,

    /// Blocks scored at the low confidence tier
    pub low_confidence_blocks: Vec<BlockName>,

    pub category: TraderCategory,

    pub calculated_at: DateTime<Utc>,

    pub data_quality: DataQuality,
}
