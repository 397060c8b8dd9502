// ═══════════════════════════════════════════════════════════════
// RUNNER: stream prompts at a model and time them
// ═══════════════════════════════════════════════════════════════
//
// One prompt at a time, each stream fully drained before the next is
// sent, so no request shares bandwidth or rate limit with a sibling.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{ChatBackend, ChatRequest, ClientError, StreamEvent};
use crate::cost::round_to;
use crate::error::{BenchError, Result};
use crate::prompts::{Prompt, PromptSuite};

// ═══════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════

/// One measurement of one prompt against one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub model: String,
    pub prompt_text: String,
    pub category: String,
    pub response_text: String,
    /// Time to first non-empty content chunk
    pub ttft_ms: f64,
    pub total_latency_ms: f64,
    pub tokens_generated: u64,
    pub tokens_per_second: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub reference: String,
}

/// All results of one suite against one model, in suite order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub model: String,
    pub suite: String,
    #[serde(default)]
    pub base_url: String,
    /// RFC 3339 / ISO-8601 UTC, set once when the run starts
    #[serde(default)]
    pub timestamp: String,
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkRun {
    pub fn new(model: &str, suite: &str, base_url: &str) -> Self {
        Self {
            model: model.to_string(),
            suite: suite.to_string(),
            base_url: base_url.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            results: Vec::new(),
        }
    }
}

/// Rough token count: words * 1.3, at least 1.
///
/// Not a tokenizer. Only feeds relative cost and throughput comparisons.
pub fn count_tokens_approx(text: &str) -> u64 {
    let words = text.split_whitespace().count() as f64;
    ((words * 1.3).round() as u64).max(1)
}

// ═══════════════════════════════════════════════════════════════
// PROGRESS
// ═══════════════════════════════════════════════════════════════

/// Receives `(completed, total, latest)` after every prompt.
///
/// Called synchronously from the run loop; implementations must return
/// quickly and must tolerate calls from concurrent model runs.
pub trait ProgressSink: Send + Sync {
    fn on_result(&self, completed: usize, total: usize, result: &BenchmarkResult);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &BenchmarkResult) + Send + Sync,
{
    fn on_result(&self, completed: usize, total: usize, result: &BenchmarkResult) {
        self(completed, total, result)
    }
}

// ═══════════════════════════════════════════════════════════════
// EXECUTOR
// ═══════════════════════════════════════════════════════════════

/// Stream one prompt and measure it.
///
/// TTFT is taken when the first non-empty delta arrives. Throughput uses
/// the generation window only (first token to stream end). A response
/// with no content at all gets `ttft_ms == total_latency_ms` and its
/// throughput is measured over the whole request.
pub async fn execute_prompt(
    backend: &dyn ChatBackend,
    model: &str,
    prompt: &Prompt,
    temperature: f32,
) -> Result<BenchmarkResult> {
    let request = ChatRequest::user(model, &prompt.text, prompt.max_tokens, temperature);

    let start = Instant::now();
    let mut first_token: Option<Instant> = None;
    let mut response = String::new();

    let mut rx = backend.stream_chat(request).await?;

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Delta(text) => {
                if text.is_empty() {
                    continue;
                }
                if first_token.is_none() {
                    let now = Instant::now();
                    debug!(model, ttft_ms = (now - start).as_secs_f64() * 1000.0, "first token");
                    first_token = Some(now);
                }
                response.push_str(&text);
            }
            StreamEvent::Done => break,
            StreamEvent::Error(e) => return Err(ClientError::Stream(e).into()),
        }
    }

    let end = Instant::now();

    let total_ms = (end - start).as_secs_f64() * 1000.0;
    let ttft_ms = match first_token {
        Some(t) => (t - start).as_secs_f64() * 1000.0,
        None => total_ms,
    };

    let completion_tokens = count_tokens_approx(&response);
    let prompt_tokens = count_tokens_approx(&prompt.text);

    let generation_secs = (end - first_token.unwrap_or(start)).as_secs_f64();
    let tps = if generation_secs > 0.0 {
        completion_tokens as f64 / generation_secs
    } else {
        0.0
    };

    Ok(BenchmarkResult {
        model: model.to_string(),
        prompt_text: prompt.text.clone(),
        category: prompt.category.clone(),
        response_text: response,
        ttft_ms: round_to(ttft_ms, 1),
        total_latency_ms: round_to(total_ms, 1),
        tokens_generated: completion_tokens,
        tokens_per_second: round_to(tps, 1),
        prompt_tokens,
        completion_tokens,
        reference: prompt.reference.clone(),
    })
}

// ═══════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════

/// Runs a whole suite against one model
pub struct BenchmarkRunner<'a> {
    backend: &'a dyn ChatBackend,
    model: &'a str,
    temperature: f32,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(backend: &'a dyn ChatBackend, model: &'a str) -> Self {
        Self {
            backend,
            model,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Execute every prompt strictly in suite order.
    ///
    /// Any error, authentication included, aborts the run; no partial
    /// run is returned.
    pub async fn run(
        &self,
        suite: &PromptSuite,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<BenchmarkRun> {
        let mut run = BenchmarkRun::new(self.model, &suite.name, self.backend.base_url());
        let total = suite.prompts.len();

        info!(model = self.model, suite = %suite.name, prompts = total, "starting run");

        for (i, prompt) in suite.prompts.iter().enumerate() {
            let result = execute_prompt(self.backend, self.model, prompt, self.temperature).await?;
            info!(
                model = self.model,
                prompt = i + 1,
                ttft_ms = result.ttft_ms,
                total_ms = result.total_latency_ms,
                tps = result.tokens_per_second,
                "prompt complete"
            );
            run.results.push(result);
            if let Some(sink) = progress {
                sink.on_result(i + 1, total, &run.results[i]);
            }
        }

        Ok(run)
    }
}

/// Run the same suite against several models.
///
/// Sequential by default. With `parallel`, model runs overlap but each
/// model still sends its own prompts one at a time. The first failure
/// aborts everything. A model named twice is rejected before any request.
pub async fn run_models(
    backend: &dyn ChatBackend,
    models: &[String],
    suite: &PromptSuite,
    temperature: f32,
    parallel: bool,
    progress: Option<&dyn ProgressSink>,
) -> Result<Vec<BenchmarkRun>> {
    let mut seen = HashSet::new();
    if let Some(dup) = models.iter().find(|m| !seen.insert(m.as_str())) {
        return Err(BenchError::DuplicateModel(dup.clone()));
    }

    if parallel {
        let runs = models.iter().map(|model| async move {
            BenchmarkRunner::new(backend, model)
                .with_temperature(temperature)
                .run(suite, progress)
                .await
        });
        return futures::future::try_join_all(runs).await;
    }

    let mut runs = Vec::with_capacity(models.len());
    for model in models {
        let run = BenchmarkRunner::new(backend, model)
            .with_temperature(temperature)
            .run(suite, progress)
            .await?;
        runs.push(run);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Replays `(delay_before_ms, delta)` pairs, then `Done`
    struct Scripted {
        steps: Vec<(u64, &'static str)>,
        connect_ms: u64,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn new(connect_ms: u64, steps: Vec<(u64, &'static str)>) -> Self {
            Self {
                steps,
                connect_ms,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for Scripted {
        async fn stream_chat(
            &self,
            request: ChatRequest,
        ) -> std::result::Result<mpsc::Receiver<StreamEvent>, ClientError> {
            self.requests.lock().unwrap().push(request);
            tokio::time::sleep(Duration::from_millis(self.connect_ms)).await;
            let (tx, rx) = mpsc::channel(16);
            let steps = self.steps.clone();
            tokio::spawn(async move {
                for (delay, text) in steps {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    let _ = tx.send(StreamEvent::Delta(text.to_string())).await;
                }
                let _ = tx.send(StreamEvent::Done).await;
            });
            Ok(rx)
        }

        fn base_url(&self) -> &str {
            "http://scripted.test/v1"
        }
    }

    struct Failing(fn() -> ClientError);

    #[async_trait]
    impl ChatBackend for Failing {
        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> std::result::Result<mpsc::Receiver<StreamEvent>, ClientError> {
            Err((self.0)())
        }

        fn base_url(&self) -> &str {
            "http://failing.test/v1"
        }
    }

    #[test]
    fn test_count_tokens_approx() {
        assert_eq!(count_tokens_approx(""), 1);
        assert_eq!(count_tokens_approx("one"), 1);
        assert_eq!(count_tokens_approx("one two"), 3);
        assert_eq!(count_tokens_approx("a b c d e f g h i j"), 13);
        assert_eq!(count_tokens_approx("  spaced\n\tout  "), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_measures_ttft_and_generation_window() {
        let backend = Scripted::new(
            0,
            vec![(100, "hello"), (0, ""), (200, " brave new"), (200, " world")],
        );
        let prompt = Prompt::new("say hello", "test").with_reference("hello world");

        let r = execute_prompt(&backend, "m", &prompt, 0.2).await.unwrap();

        assert_eq!(r.response_text, "hello brave new world");
        assert_eq!(r.ttft_ms, 100.0);
        assert_eq!(r.total_latency_ms, 500.0);
        // 4 words -> 5 tokens over 0.4s of generation
        assert_eq!(r.completion_tokens, 5);
        assert_eq!(r.tokens_generated, 5);
        assert_eq!(r.tokens_per_second, 12.5);
        assert_eq!(r.prompt_tokens, 3);
        assert_eq!(r.reference, "hello world");
        assert_eq!(r.category, "test");

        let req = &backend.requests.lock().unwrap()[0];
        assert_eq!(req.max_tokens, prompt.max_tokens);
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "say hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttft_includes_connect_time() {
        let backend = Scripted::new(50, vec![(25, "x")]);
        let r = execute_prompt(&backend, "m", &Prompt::new("p", "c"), 0.0)
            .await
            .unwrap();
        assert_eq!(r.ttft_ms, 75.0);
        assert!(r.ttft_ms <= r.total_latency_ms);
        // single token arriving at stream end: zero-length window
        assert_eq!(r.tokens_per_second, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_response_ttft_equals_total() {
        let backend = Scripted::new(0, vec![(30, ""), (30, "")]);
        let r = execute_prompt(&backend, "m", &Prompt::new("p", "c"), 0.0)
            .await
            .unwrap();
        assert_eq!(r.response_text, "");
        assert_eq!(r.ttft_ms, r.total_latency_ms);
        assert_eq!(r.total_latency_ms, 60.0);
        assert_eq!(r.completion_tokens, 1);
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        struct Broken;

        #[async_trait]
        impl ChatBackend for Broken {
            async fn stream_chat(
                &self,
                _request: ChatRequest,
            ) -> std::result::Result<mpsc::Receiver<StreamEvent>, ClientError> {
                let (tx, rx) = mpsc::channel(4);
                tx.send(StreamEvent::Delta("partial".into())).await.unwrap();
                tx.send(StreamEvent::Error("connection reset".into())).await.unwrap();
                Ok(rx)
            }

            fn base_url(&self) -> &str {
                ""
            }
        }

        let err = execute_prompt(&Broken, "m", &Prompt::new("p", "c"), 0.0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(!err.is_authentication());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_in_order_with_progress() {
        let backend = Scripted::new(10, vec![(10, "answer text")]);
        let suite = PromptSuite::new(
            "mini",
            "three prompts",
            vec![
                Prompt::new("first", "a"),
                Prompt::new("second", "b"),
                Prompt::new("third", "c"),
            ],
        );

        let seen = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize, r: &BenchmarkResult| {
            seen.lock().unwrap().push((done, total, r.prompt_text.clone()));
        };

        let run = BenchmarkRunner::new(&backend, "model-x")
            .run(&suite, Some(&sink))
            .await
            .unwrap();

        assert_eq!(run.model, "model-x");
        assert_eq!(run.suite, "mini");
        assert_eq!(run.base_url, "http://scripted.test/v1");
        assert!(chrono::DateTime::parse_from_rfc3339(&run.timestamp).is_ok());
        let texts: Vec<_> = run.results.iter().map(|r| r.prompt_text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);

        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                (1, 3, "first".to_string()),
                (2, 3, "second".to_string()),
                (3, 3, "third".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_run() {
        let backend = Failing(|| ClientError::Authentication("invalid_api_key".into()));
        let suite = crate::prompts::get_suite("reasoning").unwrap();
        let err = BenchmarkRunner::new(&backend, "gpt-4o")
            .run(suite, None)
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_models_parallel_keeps_input_order() {
        let backend = Scripted::new(5, vec![(5, "ok")]);
        let suite = PromptSuite::new("one", "", vec![Prompt::new("p", "c")]);
        let models = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        for parallel in [false, true] {
            let runs = run_models(&backend, &models, &suite, 0.0, parallel, None)
                .await
                .unwrap();
            let names: Vec<_> = runs.iter().map(|r| r.model.as_str()).collect();
            assert_eq!(names, ["a", "b", "c"]);
            assert!(runs.iter().all(|r| r.results.len() == 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_progress_counts_per_model() {
        // 10ms per prompt: prompt k of every model lands at k*10ms
        let backend = Scripted::new(5, vec![(5, "ok")]);
        let suite = PromptSuite::new(
            "three",
            "",
            vec![Prompt::new("p1", "c"), Prompt::new("p2", "c"), Prompt::new("p3", "c")],
        );
        let models = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let calls = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize, r: &BenchmarkResult| {
            calls.lock().unwrap().push((r.model.clone(), done, total));
        };

        let runs = run_models(&backend, &models, &suite, 0.0, true, Some(&sink))
            .await
            .unwrap();
        assert_eq!(runs.len(), 3);

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 9);
        for model in &models {
            let mine: Vec<_> = calls
                .iter()
                .filter(|(m, _, _)| m == model)
                .map(|(_, done, total)| (*done, *total))
                .collect();
            assert_eq!(mine, vec![(1, 3), (2, 3), (3, 3)], "model {}", model);
        }

        // Runs really overlapped: b finished its first prompt before a finished its last
        let pos = |m: &str, d: usize| calls.iter().position(|(x, done, _)| x == m && *done == d).unwrap();
        assert!(pos("b", 1) < pos("a", 3));
    }

    #[tokio::test]
    async fn test_run_models_rejects_duplicate_names() {
        let backend = Scripted::new(0, vec![(0, "ok")]);
        let suite = PromptSuite::new("one", "", vec![Prompt::new("p", "c")]);
        let models = vec!["a".to_string(), "b".to_string(), "a".to_string()];

        for parallel in [false, true] {
            let err = run_models(&backend, &models, &suite, 0.0, parallel, None)
                .await
                .unwrap_err();
            assert!(matches!(err, BenchError::DuplicateModel(ref m) if m == "a"));
        }
        assert!(backend.requests.lock().unwrap().is_empty());
    }
}
