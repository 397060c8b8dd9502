//! Plain-text reports for a run and for a comparison

use unicode_width::UnicodeWidthStr;

use crate::compare::{compare, Comparison, Criterion};
use crate::error::Result;
use crate::metrics::RunMetrics;
use crate::quality::score_quality;
use crate::runner::BenchmarkRun;

/// Left-align `s` in `width` terminal columns
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// Right-align `s` in `width` terminal columns
fn rpad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", " ".repeat(width.saturating_sub(w)), s)
}

fn format_value(criterion: Criterion, v: f64) -> String {
    match criterion {
        Criterion::Cost => format!("{:.4}", v),
        _ => format!("{}", v),
    }
}

pub fn render_run_report(run: &BenchmarkRun) -> Result<String> {
    let m = RunMetrics::compute(run)?;
    let mut report = String::new();

    report.push_str(&format!("═══ Benchmark Report: {} ═══\n", m.model));
    report.push_str(&format!(
        "Suite: {} | Prompts: {} | Cost: ${:.4}\n",
        m.suite, m.num_prompts, m.estimated_cost_usd
    ));
    if !run.timestamp.is_empty() {
        report.push_str(&format!("Started: {} | Endpoint: {}\n", run.timestamp, run.base_url));
    }

    report.push_str("\nLatency Summary\n");
    report.push_str(&format!("  {:6} {:>12} {:>20}\n", "Metric", "TTFT (ms)", "Total Latency (ms)"));
    let rows = [
        ("p50", m.ttft.p50_ms, m.total_latency.p50_ms),
        ("p95", m.ttft.p95_ms, m.total_latency.p95_ms),
        ("p99", m.ttft.p99_ms, m.total_latency.p99_ms),
        ("Mean", m.ttft.mean_ms, m.total_latency.mean_ms),
        ("Min", m.ttft.min_ms, m.total_latency.min_ms),
        ("Max", m.ttft.max_ms, m.total_latency.max_ms),
    ];
    for (label, ttft, total) in rows {
        report.push_str(&format!("  {:6} {:>12} {:>20}\n", label, ttft, total));
    }

    report.push_str("\nThroughput & Quality\n");
    report.push_str(&format!("  Mean TPS           {} tok/s\n", m.mean_tps));
    report.push_str(&format!("  Median TPS         {} tok/s\n", m.median_tps));
    report.push_str(&format!("  Quality Score      {:.1}%\n", m.mean_quality_score * 100.0));
    report.push_str(&format!("  Prompt Tokens      {}\n", m.total_prompt_tokens));
    report.push_str(&format!("  Completion Tokens  {}\n", m.total_completion_tokens));
    report.push_str(&format!("  Estimated Cost     ${:.4}\n", m.estimated_cost_usd));

    report.push_str("\nPer-Prompt Results\n");
    report.push_str(&format!(
        "  {:>3}  {:10} {:>10} {:>10} {:>8} {:>7} {:>8}\n",
        "#", "Category", "TTFT (ms)", "Total (ms)", "TPS", "Tokens", "Quality"
    ));
    for (i, r) in run.results.iter().enumerate() {
        let q = score_quality(&r.response_text, &r.reference);
        report.push_str(&format!(
            "  {:>3}  {} {:>10} {:>10} {:>8} {:>7} {:>7.0}%\n",
            i + 1,
            pad(&r.category, 10),
            r.ttft_ms,
            r.total_latency_ms,
            r.tokens_per_second,
            r.tokens_generated,
            q * 100.0
        ));
    }

    Ok(report)
}

/// Aggregate each run and render the head-to-head table
pub fn render_comparison_report(runs: &[BenchmarkRun]) -> Result<String> {
    let metrics = runs
        .iter()
        .map(RunMetrics::compute)
        .collect::<Result<Vec<_>>>()?;
    let comparison = compare(&metrics)?;
    Ok(render_comparison(&comparison))
}

/// Best cells are marked with `*`
pub fn render_comparison(c: &Comparison) -> String {
    let label_width = Criterion::all()
        .iter()
        .map(|k| k.label().len())
        .max()
        .unwrap_or(0);
    let col_width = c
        .models
        .iter()
        .map(|m| UnicodeWidthStr::width(m.as_str()))
        .max()
        .unwrap_or(0)
        .max(10)
        + 2;

    let mut s = String::new();
    s.push_str(&format!("═══ Model Comparison: {} ═══\n\n", c.models.join(" vs ")));

    s.push_str(&pad("Metric", label_width));
    for model in &c.models {
        s.push_str(&rpad(model, col_width));
    }
    s.push('\n');

    for row in &c.rows {
        s.push_str(&pad(row.criterion.label(), label_width));
        for (v, best) in row.values.iter().zip(&row.best) {
            let mark = if *best { "*" } else { " " };
            let cell = format!("{}{}", format_value(row.criterion, *v), mark);
            s.push_str(&rpad(&cell, col_width));
        }
        s.push('\n');
    }

    s.push_str(&format!(
        "\n👑 Winner: {} ({}/{} metrics)\n",
        c.winner_model(),
        c.winner_wins(),
        c.row_count()
    ));
    s
}
