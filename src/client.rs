//! OpenAI-compatible chat client with SSE streaming
//!
//! Opens a streaming Chat Completions request and forwards text deltas
//! over a channel as they arrive. Credential failures are detected before
//! the stream starts so callers can abort the whole run.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// TCP/TLS connect timeout in seconds
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Whole-request ceiling in seconds, body included
const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Longest silence tolerated between two body chunks
const IDLE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint rejected the credential (401)
    #[error(
        "Authentication failed. Please check your API key.\n\
         Set it via --api-key or the OPENAI_API_KEY environment variable."
    )]
    Authentication(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to reach endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stream read error: {0}")]
    Stream(String),
}

/// Stream events from the API
#[derive(Debug)]
pub enum StreamEvent {
    /// A chunk of generated text
    Delta(String),
    /// Stream exhausted
    Done,
    /// Error occurred mid-stream
    Error(String),
}

/// Where and as whom to talk to the endpoint
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

/// Anything that can turn a chat request into a stream of text deltas.
///
/// The returned receiver yields `Delta`s followed by a single `Done` or
/// `Error`. A closed channel without `Done` also counts as exhaustion.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ClientError>;

    /// Base URL recorded into each run
    fn base_url(&self) -> &str;
}

/// HTTP implementation against `{base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl OpenAiClient {
    pub fn new(endpoint: Endpoint) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ClientError> {
        let url = self.endpoint.completions_url();
        debug!(%url, model = %request.model, "opening completion stream");

        let mut builder = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "completion request rejected");
            return Err(rejection(status.as_u16(), body));
        }

        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(async move {
            let idle = Duration::from_secs(IDLE_TIMEOUT_SECS);
            match pump_sse(response.bytes_stream(), idle, &tx).await {
                Ok(()) => {
                    let _ = tx.send(StreamEvent::Done).await;
                }
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(e)).await;
                }
            }
        });

        Ok(rx)
    }

    fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }
}

/// Map a non-2xx status. Only 401 is a credential problem; 403 is a
/// permission or quota refusal and stays a plain status error.
fn rejection(status: u16, body: String) -> ClientError {
    if status == 401 {
        ClientError::Authentication(body)
    } else {
        ClientError::Status { status, body }
    }
}

/// Read SSE lines off the body and forward non-empty deltas.
///
/// Bytes are buffered raw and only complete lines are decoded, so a
/// multi-byte character split across two chunks survives intact.
async fn pump_sse<S, B, E>(
    mut chunks: S,
    idle: Duration,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<(), String>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    // Bytes of the current, not yet terminated line
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let chunk = match tokio::time::timeout(idle, chunks.next()).await {
            Ok(Some(chunk)) => chunk.map_err(|e| e.to_string())?,
            Ok(None) => break,
            Err(_) => return Err(format!("no data for {}s", idle.as_secs())),
        };
        buffer.extend_from_slice(chunk.as_ref());

        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&raw);

            match parse_sse_line(line.trim()) {
                SseLine::Delta(content) => {
                    if tx.send(StreamEvent::Delta(content)).await.is_err() {
                        // Receiver gone, nobody is timing this stream any more
                        return Ok(());
                    }
                }
                SseLine::Done => return Ok(()),
                SseLine::Skip => {}
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Delta(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
        return SseLine::Skip;
    };

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|c| !c.is_empty())
        .map(SseLine::Delta)
        .unwrap_or(SseLine::Skip)
}

// ═══════════════════════════════════════════════════════════════
// API Types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    /// Single user message, streamed
    pub fn user(model: &str, content: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: content.to_string(),
            }],
            stream: true,
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
