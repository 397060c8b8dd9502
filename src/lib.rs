//! llmbench - latency, throughput, cost and quality benchmarks for
//! OpenAI-compatible streaming chat endpoints.
//!
//! Suite → runner (one streamed request per prompt) → run → metrics →
//! comparison.

pub mod client;
pub mod compare;
pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod prompts;
pub mod quality;
pub mod report;
pub mod runner;
pub mod store;

pub use client::{ChatBackend, ChatRequest, ClientError, Endpoint, OpenAiClient, StreamEvent};
pub use compare::{compare, Comparison};
pub use error::BenchError;
pub use metrics::{aggregate, LatencyStats, RunMetrics};
pub use prompts::{get_suite, Prompt, PromptSuite};
pub use runner::{execute_prompt, BenchmarkResult, BenchmarkRun, BenchmarkRunner, ProgressSink};
