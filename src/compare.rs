//! Head-to-head comparison of aggregated runs
//!
//! Seven fixed rows, each either lower-is-better or higher-is-better. The
//! overall winner is the model with the most row wins; ties on the count go
//! to the model listed first.

use serde::Serialize;

use crate::error::{BenchError, Result};
use crate::metrics::RunMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    fn better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::LowerIsBetter => a < b,
            Direction::HigherIsBetter => a > b,
        }
    }
}

/// Which metric a row compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Criterion {
    TtftP50,
    TtftP95,
    TotalP50,
    TotalP95,
    MeanTps,
    Cost,
    Quality,
}

impl Criterion {
    pub fn all() -> &'static [Criterion] {
        &[
            Criterion::TtftP50,
            Criterion::TtftP95,
            Criterion::TotalP50,
            Criterion::TotalP95,
            Criterion::MeanTps,
            Criterion::Cost,
            Criterion::Quality,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::TtftP50 => "TTFT p50 (ms)",
            Criterion::TtftP95 => "TTFT p95 (ms)",
            Criterion::TotalP50 => "Total Latency p50 (ms)",
            Criterion::TotalP95 => "Total Latency p95 (ms)",
            Criterion::MeanTps => "Mean TPS",
            Criterion::Cost => "Cost (USD)",
            Criterion::Quality => "Quality Score",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Criterion::MeanTps | Criterion::Quality => Direction::HigherIsBetter,
            _ => Direction::LowerIsBetter,
        }
    }

    pub fn value(&self, m: &RunMetrics) -> f64 {
        match self {
            Criterion::TtftP50 => m.ttft.p50_ms,
            Criterion::TtftP95 => m.ttft.p95_ms,
            Criterion::TotalP50 => m.total_latency.p50_ms,
            Criterion::TotalP95 => m.total_latency.p95_ms,
            Criterion::MeanTps => m.mean_tps,
            Criterion::Cost => m.estimated_cost_usd,
            Criterion::Quality => m.mean_quality_score,
        }
    }
}

/// One row of the comparison table
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub criterion: Criterion,
    pub values: Vec<f64>,
    /// Cells to highlight as best
    pub best: Vec<bool>,
    /// Index of the model credited with this row, if any
    pub winner: Option<usize>,
}

impl ComparisonRow {
    fn build(criterion: Criterion, metrics: &[RunMetrics]) -> Self {
        let values: Vec<f64> = metrics.iter().map(|m| criterion.value(m)).collect();
        let dir = criterion.direction();

        if let [a, b] = values[..] {
            // Head-to-head: only a strict win counts, a tie credits nobody
            let winner = if dir.better(a, b) {
                Some(0)
            } else if dir.better(b, a) {
                Some(1)
            } else {
                None
            };
            let best = vec![winner == Some(0), winner == Some(1)];
            return Self {
                criterion,
                values,
                best,
                winner,
            };
        }

        // First extremal value in input order takes the row
        let mut winner = 0;
        for (i, &v) in values.iter().enumerate().skip(1) {
            if dir.better(v, values[winner]) {
                winner = i;
            }
        }
        let top = values[winner];
        let best = values.iter().map(|&v| v == top).collect();

        Self {
            criterion,
            values,
            best,
            winner: Some(winner),
        }
    }
}

/// Full ranking across models
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub models: Vec<String>,
    pub rows: Vec<ComparisonRow>,
    /// Row wins per model, same order as `models`
    pub wins: Vec<usize>,
    pub winner: usize,
}

impl Comparison {
    pub fn winner_model(&self) -> &str {
        &self.models[self.winner]
    }

    pub fn winner_wins(&self) -> usize {
        self.wins[self.winner]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Rank two or more aggregated runs
pub fn compare(metrics: &[RunMetrics]) -> Result<Comparison> {
    if metrics.len() < 2 {
        return Err(BenchError::NotEnoughRuns(metrics.len()));
    }

    let rows: Vec<ComparisonRow> = Criterion::all()
        .iter()
        .map(|&c| ComparisonRow::build(c, metrics))
        .collect();

    let mut wins = vec![0usize; metrics.len()];
    for row in &rows {
        if let Some(w) = row.winner {
            wins[w] += 1;
        }
    }

    // Strictly greater keeps the earliest model on a tie
    let mut winner = 0;
    for (i, &w) in wins.iter().enumerate().skip(1) {
        if w > wins[winner] {
            winner = i;
        }
    }

    Ok(Comparison {
        models: metrics.iter().map(|m| m.model.clone()).collect(),
        rows,
        wins,
        winner,
    })
}
