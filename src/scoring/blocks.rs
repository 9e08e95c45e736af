//! Block-level scoring: groups metric results into the five weighted
//! blocks, excludes under-covered blocks and redistributes their weight.

use tracing::debug;

use crate::models::{BlockName, BlockResult, ConfidenceTier, MetricName, MetricResult};

/// Blocks below this coverage carry too little signal to score.
const EXCLUSION_COVERAGE_PCT: f64 = 30.0;
const HIGH_TIER_COVERAGE_PCT: f64 = 50.0;
const MEDIUM_TIER_COVERAGE_PCT: f64 = 35.0;
/// Score for an included block that somehow matched no metrics.
const NEUTRAL_SCORE: f64 = 50.0;

/// Groups available metrics into weighted blocks and produces the raw
/// weighted score. Knows nothing about reliability discounts or penalties.
pub struct BlockCalculator;

impl BlockCalculator {
    /// Score a single block from the available metrics that belong to it.
    ///
    /// `adjusted_weight` starts equal to the original weight (0 when
    /// excluded); [`compute_all_blocks`](Self::compute_all_blocks) applies
    /// the cross-block redistribution.
    pub fn compute_block(name: BlockName, available: &[MetricResult]) -> BlockResult {
        let matched: Vec<&MetricResult> = available
            .iter()
            .filter(|m| m.is_available() && m.name.block() == name)
            .collect();

        let total = name.catalogue_size();
        let coverage_percent = matched.len() as f64 / total as f64 * 100.0;

        if coverage_percent < EXCLUSION_COVERAGE_PCT {
            debug!(
                block = name.as_str(),
                coverage = coverage_percent,
                "block excluded for insufficient coverage"
            );
            return BlockResult {
                name,
                score: 0.0,
                confidence_tier: ConfidenceTier::Excluded,
                available_metric_count: matched.len(),
                total_metric_count: total,
                coverage_percent,
                original_weight: name.weight(),
                adjusted_weight: 0.0,
            };
        }

        let confidence_tier = if coverage_percent >= HIGH_TIER_COVERAGE_PCT {
            ConfidenceTier::High
        } else if coverage_percent >= MEDIUM_TIER_COVERAGE_PCT {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };

        let score = Self::block_score(&matched).clamp(0.0, 100.0);

        BlockResult {
            name,
            score,
            confidence_tier,
            available_metric_count: matched.len(),
            total_metric_count: total,
            coverage_percent,
            original_weight: name.weight(),
            adjusted_weight: name.weight(),
        }
    }

    /// Confidence-weighted mean of the normalized metric scores. Falls back
    /// to an unweighted mean when every confidence is zero, and to the
    /// neutral score when nothing matched at all.
    fn block_score(matched: &[&MetricResult]) -> f64 {
        let scored: Vec<(f64, f64)> = matched
            .iter()
            .filter_map(|m| m.value.map(|v| (Self::normalize(m.name, v), m.confidence)))
            .collect();
        if scored.is_empty() {
            return NEUTRAL_SCORE;
        }

        let weight_sum: f64 = scored.iter().map(|(_, c)| c).sum();
        if weight_sum > 0.0 {
            scored.iter().map(|(s, c)| s * c).sum::<f64>() / weight_sum
        } else {
            scored.iter().map(|(s, _)| s).sum::<f64>() / scored.len() as f64
        }
    }

    /// Score all five blocks and redistribute the weight of excluded blocks
    /// to the survivors, proportional to their original weights. Weight is
    /// conserved: included adjusted weights always sum to 1.0 unless every
    /// block is excluded.
    pub fn compute_all_blocks(available: &[MetricResult]) -> Vec<BlockResult> {
        let mut blocks: Vec<BlockResult> = BlockName::ALL
            .iter()
            .map(|&name| Self::compute_block(name, available))
            .collect();

        let excluded_weight: f64 = blocks
            .iter()
            .filter(|b| b.is_excluded())
            .map(|b| b.original_weight)
            .sum();
        let included_weight: f64 = blocks
            .iter()
            .filter(|b| !b.is_excluded())
            .map(|b| b.original_weight)
            .sum();

        if excluded_weight > 0.0 && included_weight > 0.0 {
            for block in blocks.iter_mut().filter(|b| !b.is_excluded()) {
                block.adjusted_weight =
                    block.original_weight + excluded_weight * (block.original_weight / included_weight);
            }
        }

        blocks
    }

    /// Weighted mean of included block scores; 0 when nothing survived.
    pub fn compute_final_score(blocks: &[BlockResult]) -> f64 {
        let weight_sum: f64 = blocks
            .iter()
            .filter(|b| !b.is_excluded())
            .map(|b| b.adjusted_weight)
            .sum();
        if weight_sum <= 0.0 {
            return 0.0;
        }

        let weighted: f64 = blocks
            .iter()
            .filter(|b| !b.is_excluded())
            .map(|b| b.score * b.adjusted_weight)
            .sum();
        (weighted / weight_sum).clamp(0.0, 100.0)
    }

    /// Map a raw metric value onto a 0-100 goodness scale. Inputs are
    /// clamped to a fixed window first so outliers cannot dominate the
    /// weighted mean; "inverted" metrics score higher for lower raw values.
    pub fn normalize(name: MetricName, value: f64) -> f64 {
        let score = match name {
            // Fraction, -50%..+100% window
            MetricName::AnnualizedReturn => (value.clamp(-0.5, 1.0) + 0.5) / 1.5 * 100.0,
            MetricName::WinRate => value.clamp(0.0, 100.0),
            // RR of 3 or better is full marks
            MetricName::AverageRr => value.clamp(0.0, 3.0) / 3.0 * 100.0,
            // Account-currency window, -50..+150 per trade
            MetricName::Expectancy => (value.clamp(-50.0, 150.0) + 50.0) / 200.0 * 100.0,
            // Inverted: 0% drawdown is perfect, 50%+ scores zero
            MetricName::MaxDrawdown => 100.0 - value.clamp(0.0, 50.0) * 2.0,
            // Inverted: 80%+ annualized volatility scores zero
            MetricName::Volatility => 100.0 - value.clamp(0.0, 80.0) * 1.25,
            // Inverted: 10%+ average risk per trade scores zero
            MetricName::AverageRiskPerTrade => 100.0 - value.clamp(0.0, 10.0) * 10.0,
            // Inverted: a 10x spike over the mean risk scores zero
            MetricName::RiskSpike => (10.0 - value.clamp(1.0, 10.0)) / 9.0 * 100.0,
            MetricName::EquitySmoothness => value.clamp(0.0, 20.0) / 20.0 * 100.0,
            MetricName::MonthlyPositiveRatio => value.clamp(0.0, 100.0),
            // Inverted: all profit from one trade scores zero
            MetricName::ProfitConcentrationIndex => (1.0 - value.clamp(0.0, 1.0)) * 100.0,
            MetricName::HumanVariability => value.clamp(0.0, 100.0),
            MetricName::MarketRegimeBalance => value.clamp(0.0, 100.0),
            MetricName::TradeFrequencyStability => value.clamp(0.0, 100.0),
        };
        score.clamp(0.0, 100.0)
    }
}
