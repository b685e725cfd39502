//! Opportunity scoring and ranking.
//!
//! Funnel survivors get a composite score in [0, 100] built from the
//! timeframe-weighted trend, the risk/reward of the derived stop/target
//! geometry, and a volume-expansion bonus. Candidates below the configured
//! floor, with a flat weighted trend, or with degenerate stops are rejected.

use serde::Deserialize;
use tracing::debug;

use common::{Direction, Opportunity};

use crate::funnel::FunnelOutcome;
use crate::stops;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Minimum composite score for an opportunity to be reported.
    pub min_score: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self { min_score: 60.0 }
    }
}

/// Score all survivors and return the qualifying opportunities, best first.
///
/// Ranking is deterministic regardless of input order: score descending,
/// then risk/reward, then weighted-trend magnitude.
pub fn score_outcomes(outcomes: &[FunnelOutcome], cfg: &ScoreConfig) -> Vec<Opportunity> {
    let mut opportunities: Vec<Opportunity> =
        outcomes.iter().filter_map(|o| score_one(o, cfg)).collect();

    opportunities.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.risk_reward.total_cmp(&a.risk_reward))
            .then(b.weighted_trend.abs().total_cmp(&a.weighted_trend.abs()))
    });
    opportunities
}

fn score_one(outcome: &FunnelOutcome, cfg: &ScoreConfig) -> Option<Opportunity> {
    let stages = &outcome.stages;
    if stages.is_empty() {
        return None;
    }

    let weights = stage_weights(stages.len());
    let weighted: f64 = stages
        .iter()
        .zip(&weights)
        .map(|(stage, w)| w * f64::from(stage.assessment.trend.signed()))
        .sum();

    let direction = if weighted > 0.0 {
        Direction::Long
    } else if weighted < 0.0 {
        Direction::Short
    } else {
        debug!(symbol = %outcome.symbol, "rejecting candidate: flat weighted trend");
        return None;
    };

    let entry = outcome.ticker.last_price;
    let fine_trend = stages.last()?.assessment.trend;
    let (stop, target) = stops::derive_stop_target(&outcome.fine_candles, direction, fine_trend, entry);
    if stop <= 0.0 || target <= 0.0 {
        debug!(symbol = %outcome.symbol, "rejecting candidate: degenerate stop/target");
        return None;
    }

    let risk = (entry - stop).abs();
    if risk <= 0.0 {
        return None;
    }
    let risk_reward = (target - entry).abs() / risk;

    let base = weighted.abs() * 50.0;
    let rr_bonus = (risk_reward * 10.0).min(30.0);
    let vol_bonus = volume_bonus(stages.last()?.indicators.volume_change_pct);
    let score = (base + rr_bonus + vol_bonus).clamp(0.0, 100.0);

    if score < cfg.min_score {
        debug!(symbol = %outcome.symbol, score, floor = cfg.min_score, "score below floor");
        return None;
    }

    Some(Opportunity {
        symbol: outcome.symbol.clone(),
        direction,
        score,
        entry_price: entry,
        stop_price: stop,
        target_price: target,
        risk_reward,
        weighted_trend: weighted,
        trends: stages.iter().map(|s| s.assessment.clone()).collect(),
    })
}

/// Per-stage weights, coarse first, summing to 1. The coarsest stage always
/// carries 0.4; the remainder splits evenly across the finer stages.
fn stage_weights(n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![1.0],
        2 => vec![0.6, 0.4],
        _ => {
            let fine = 0.6 / (n - 1) as f64;
            std::iter::once(0.4)
                .chain(std::iter::repeat(fine).take(n - 1))
                .collect()
        }
    }
}

/// Volume-expansion bonus bands on the entry timeframe.
fn volume_bonus(volume_change_pct: f64) -> f64 {
    if volume_change_pct > 100.0 {
        20.0
    } else if volume_change_pct > 50.0 {
        15.0
    } else if volume_change_pct > 20.0 {
        10.0
    } else if volume_change_pct > 0.0 {
        5.0
    } else {
        0.0
    }
}
