//! Streaming completion client.
//!
//! Defines the [`CompletionClient`] seam between the session layer and the
//! hosted completion service, plus the concrete [`OpenAiClient`] that calls
//! an OpenAI-style `POST /chat/completions` endpoint with `stream: true`
//! and decodes the SSE response into incremental text fragments.
//!
//! There is no retry: any rejection or mid-stream failure aborts the
//! current turn and is surfaced to the caller.

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::config::CompletionConfig;
use crate::models::Message;

/// Failures of the completion boundary, local to a single turn.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key provided")]
    MissingCredential,

    #[error("completion service rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed stream payload: {0}")]
    Protocol(String),
}

/// A pull stream of incremental response text fragments.
///
/// Yields `Ok(fragment)` until the service signals end-of-stream, then
/// `None`. A mid-stream failure yields one `Err` and the stream ends.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>,
}

impl CompletionStream {
    /// Next text fragment, or `None` once the stream has terminated.
    pub async fn next(&mut self) -> Option<Result<String, CompletionError>> {
        self.inner.next().await
    }

    /// Build a stream from pre-computed items. Used by scripted test clients.
    pub fn from_results(items: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            inner: Box::pin(futures_util::stream::iter(items)),
        }
    }
}

/// Interface to a chat completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Dispatch a completion request and return the response stream.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<CompletionStream, CompletionError>;
}

/// Client for the OpenAI chat completions API.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client from configuration and an API key.
    ///
    /// An empty key is rejected up front so no request is ever sent
    /// without a credential.
    pub fn new(
        config: &CompletionConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<CompletionStream, CompletionError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let chunks = response
            .bytes_stream()
            .map(|r| r.map(|b| b.to_vec()).map_err(CompletionError::Network));

        Ok(decode_sse(chunks))
    }
}

// ============ SSE decoding ============

/// Classification of one line of the event stream.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    /// A `data:` payload carrying response text.
    Fragment(String),
    /// The `data: [DONE]` terminator.
    Done,
    /// Blank lines, comments, payloads without delta content.
    Ignore,
    /// A `data:` payload that failed to parse.
    Invalid(String),
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Ignore;
    };

    let payload = payload.trim();
    if payload == "[DONE]" {
        return SseLine::Done;
    }
    if payload.is_empty() {
        return SseLine::Ignore;
    }

    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => match value
            .pointer("/choices/0/delta/content")
            .and_then(|v| v.as_str())
        {
            Some(text) if !text.is_empty() => SseLine::Fragment(text.to_string()),
            // Role-only and finish chunks carry no content.
            _ => SseLine::Ignore,
        },
        Err(err) => SseLine::Invalid(format!("invalid SSE data payload: {err}")),
    }
}

/// Pop the next complete line out of the byte buffer, if one is present.
fn take_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buf.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned())
}

/// Decode a stream of SSE byte chunks into text fragments.
///
/// Chunk boundaries carry no meaning: bytes accumulate in a buffer and
/// lines are processed as they complete. The stream ends on `[DONE]`, on
/// exhaustion of the underlying bytes, or after the first error.
fn decode_sse<S>(chunks: S) -> CompletionStream
where
    S: Stream<Item = Result<Vec<u8>, CompletionError>> + Send + 'static,
{
    let stream = futures_util::stream::unfold(
        (Box::pin(chunks), Vec::<u8>::new(), false),
        |(mut chunks, mut buf, done)| async move {
            if done {
                return None;
            }
            loop {
                while let Some(line) = take_line(&mut buf) {
                    match parse_sse_line(&line) {
                        SseLine::Fragment(text) => return Some((Ok(text), (chunks, buf, false))),
                        SseLine::Done => return None,
                        SseLine::Invalid(msg) => {
                            return Some((
                                Err(CompletionError::Protocol(msg)),
                                (chunks, buf, true),
                            ))
                        }
                        SseLine::Ignore => {}
                    }
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                    Some(Err(err)) => return Some((Err(err), (chunks, buf, true))),
                    None => return None,
                }
            }
        },
    );

    CompletionStream {
        inner: Box::pin(stream),
    }
}
