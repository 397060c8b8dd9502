//! Run-level metrics: latency percentiles, throughput, tokens, cost, quality
//!
//! Everything here is a pure function of a `BenchmarkRun`. Metrics are
//! never persisted; recompute them from the run when needed.

use serde::{Deserialize, Serialize};

use crate::cost::{estimate_cost, round_to};
use crate::error::{BenchError, Result};
use crate::quality::score_quality;
use crate::runner::BenchmarkRun;

/// Percentile summary in milliseconds, each field rounded to 1 decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Reduce a non-empty series. Empty input is `EmptyRun`.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(BenchError::EmptyRun);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            p50_ms: round_to(percentile(&sorted, 50.0), 1),
            p95_ms: round_to(percentile(&sorted, 95.0), 1),
            p99_ms: round_to(percentile(&sorted, 99.0), 1),
            mean_ms: round_to(mean(&sorted), 1),
            min_ms: round_to(sorted[0], 1),
            max_ms: round_to(sorted[sorted.len() - 1], 1),
        })
    }
}

/// Linear-interpolation percentile over an ascending, non-empty slice.
///
/// rank = p/100 * (n-1); interpolates between the neighbouring values.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Aggregated metrics for a benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub model: String,
    pub suite: String,
    pub num_prompts: usize,
    pub ttft: LatencyStats,
    pub total_latency: LatencyStats,
    pub mean_tps: f64,
    pub median_tps: f64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub estimated_cost_usd: f64,
    /// 0.0 to 1.0
    pub mean_quality_score: f64,
}

impl RunMetrics {
    /// Reduce a run. Fails with `EmptyRun` when it has no results.
    pub fn compute(run: &BenchmarkRun) -> Result<Self> {
        let results = &run.results;
        if results.is_empty() {
            return Err(BenchError::EmptyRun);
        }

        let ttft: Vec<f64> = results.iter().map(|r| r.ttft_ms).collect();
        let total: Vec<f64> = results.iter().map(|r| r.total_latency_ms).collect();
        let mut tps: Vec<f64> = results.iter().map(|r| r.tokens_per_second).collect();
        tps.sort_by(f64::total_cmp);

        let total_prompt_tokens: u64 = results.iter().map(|r| r.prompt_tokens).sum();
        let total_completion_tokens: u64 = results.iter().map(|r| r.completion_tokens).sum();

        // Re-derived from the stored texts, not persisted per result
        let quality: Vec<f64> = results
            .iter()
            .map(|r| score_quality(&r.response_text, &r.reference))
            .collect();

        Ok(Self {
            model: run.model.clone(),
            suite: run.suite.clone(),
            num_prompts: results.len(),
            ttft: LatencyStats::from_values(&ttft)?,
            total_latency: LatencyStats::from_values(&total)?,
            mean_tps: round_to(mean(&tps), 1),
            median_tps: round_to(percentile(&tps, 50.0), 1),
            total_prompt_tokens,
            total_completion_tokens,
            // Once over the summed totals, not a sum of per-prompt costs
            estimated_cost_usd: estimate_cost(
                &run.model,
                total_prompt_tokens,
                total_completion_tokens,
            ),
            mean_quality_score: round_to(mean(&quality), 3),
        })
    }
}

/// Shorthand for `RunMetrics::compute`
pub fn aggregate(run: &BenchmarkRun) -> Result<RunMetrics> {
    RunMetrics::compute(run)
}
