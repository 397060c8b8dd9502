//! Cost estimation from per-1K-token rate table
//!
//! Rates are matched by substring against the lower-cased model id, first
//! match wins. Entry order is therefore part of the pricing policy: `gpt-4o`
//! sits before `gpt-4o-mini`, so every `gpt-4o-mini*` id is billed at the
//! `gpt-4o` rate. Reorder with care.

/// USD per 1000 tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRate {
    pub pattern: &'static str,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

const fn rate(pattern: &'static str, input_per_1k: f64, output_per_1k: f64) -> CostRate {
    CostRate {
        pattern,
        input_per_1k,
        output_per_1k,
    }
}

pub const COST_TABLE: &[CostRate] = &[
    rate("gpt-4o", 0.0025, 0.01),
    rate("gpt-4o-mini", 0.00015, 0.0006),
    rate("gpt-4-turbo", 0.01, 0.03),
    rate("gpt-4", 0.03, 0.06),
    rate("gpt-3.5-turbo", 0.0005, 0.0015),
    rate("claude-3-opus", 0.015, 0.075),
    rate("claude-3-sonnet", 0.003, 0.015),
    rate("claude-3-haiku", 0.00025, 0.00125),
    rate("claude-sonnet", 0.003, 0.015),
    rate("claude-opus", 0.015, 0.075),
];

/// Fallback for unknown models
pub const DEFAULT_RATE: CostRate = rate("", 0.002, 0.008);

/// First table entry whose pattern occurs in the model id
pub fn lookup_rate(model: &str) -> CostRate {
    let model = model.to_lowercase();
    COST_TABLE
        .iter()
        .find(|r| model.contains(r.pattern))
        .copied()
        .unwrap_or(DEFAULT_RATE)
}

/// Estimated USD cost, rounded to 6 decimals
pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    let r = lookup_rate(model);
    let cost = (prompt_tokens as f64 / 1000.0) * r.input_per_1k
        + (completion_tokens as f64 / 1000.0) * r.output_per_1k;
    round_to(cost, 6)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
