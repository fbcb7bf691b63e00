//! GeminiChatProvider - streaming chat sessions over the Gemini REST API.
//!
//! Each session keeps its own history, seeded from the replayed turns it was
//! opened with. Replies are requested with `streamGenerateContent?alt=sse`
//! and surfaced as a lazy fragment stream; a reply is committed to the
//! session history only once the stream completes cleanly.

use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use gitmate_core::chat::{
    ChatProvider, ChatSession, FragmentStream, HistoryTurn, SessionConfig, Speaker, TurnContent,
};
use gitmate_core::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_TEMPERATURE};
use gitmate_core::error::{GitMateError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Mutex;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Opens streaming chat sessions against the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiChatProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
}

impl GeminiChatProvider {
    /// Creates a provider. A missing key is accepted here and reported when a
    /// session is opened.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Overrides the models endpoint (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl ChatProvider for GeminiChatProvider {
    fn create_session(&self, config: SessionConfig) -> Result<Arc<dyn ChatSession>> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GitMateError::config("Gemini API key is not configured"))?
            .to_string();

        tracing::debug!(
            model = %config.model,
            history_len = config.history.len(),
            "Opening Gemini chat session"
        );

        Ok(Arc::new(GeminiChatSession {
            client: self.client.clone(),
            api_key,
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            history: Arc::new(Mutex::new(config.history.clone())),
            config,
        }))
    }
}

/// A live Gemini chat session.
pub struct GeminiChatSession {
    client: Client,
    api_key: String,
    base_url: String,
    temperature: f32,
    config: SessionConfig,
    history: Arc<Mutex<Vec<HistoryTurn>>>,
}

impl GeminiChatSession {
    fn build_request(&self, history: &[HistoryTurn], message: &TurnContent) -> StreamRequest {
        build_request(&self.config, self.temperature, history, message)
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn history(&self) -> Vec<HistoryTurn> {
        self.history.lock().await.clone()
    }

    async fn stream_reply(&self, message: TurnContent) -> Result<FragmentStream> {
        let history = self.history.lock().await.clone();
        let request = self.build_request(&history, &message);

        let url = format!(
            "{}/{model}:streamGenerateContent?alt=sse",
            self.base_url,
            model = self.config.model.id(),
        );

        // The key stays out of the URL, which reqwest errors echo.
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                GitMateError::provider(format!(
                    "Gemini API request failed: {}",
                    err.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(reply_stream(
            Box::pin(response.bytes_stream()),
            self.history.clone(),
            message,
        ))
    }
}

// ============================================================================
// Streaming
// ============================================================================

struct ReplyState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    reply: String,
    message: Option<TurnContent>,
    history: Arc<Mutex<Vec<HistoryTurn>>>,
    exhausted: bool,
    done: bool,
}

impl<S> ReplyState<S> {
    fn decode(&mut self, data: &str) -> Result<()> {
        let fragments = parse_fragments(data)?;
        self.pending.extend(fragments);
        Ok(())
    }

    async fn commit(&mut self) {
        if let Some(message) = self.message.take() {
            let reply = std::mem::take(&mut self.reply);
            let mut history = self.history.lock().await;
            history.push(HistoryTurn::new(Speaker::User, message));
            history.push(HistoryTurn::new(Speaker::Assistant, TurnContent::text(reply)));
        }
    }
}

/// Turns an SSE byte stream into a fragment stream.
///
/// On clean completion the user turn and the full reply are appended to
/// `history`; after any error the stream ends and `history` is untouched.
fn reply_stream<S, B, E>(
    bytes: S,
    history: Arc<Mutex<Vec<HistoryTurn>>>,
    message: TurnContent,
) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = ReplyState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        reply: String::new(),
        message: Some(message),
        history,
        exhausted: false,
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if let Some(fragment) = state.pending.pop_front() {
                state.reply.push_str(&fragment);
                return Some((Ok(fragment), state));
            }

            if state.exhausted {
                state.commit().await;
                state.done = true;
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(chunk.as_ref()) {
                        if let Err(err) = state.decode(&data) {
                            state.done = true;
                            return Some((Err(err), state));
                        }
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!("Gemini stream interrupted: {}", err);
                    state.done = true;
                    return Some((
                        Err(GitMateError::provider(format!("Gemini stream failed: {err}"))),
                        state,
                    ));
                }
                None => {
                    state.exhausted = true;
                    if let Some(data) = state.decoder.finish() {
                        if let Err(err) = state.decode(&data) {
                            state.done = true;
                            return Some((Err(err), state));
                        }
                    }
                }
            }
        }
    })
    .boxed()
}

/// Extracts the non-empty, non-thought text parts of one streamed chunk.
fn parse_fragments(data: &str) -> Result<Vec<String>> {
    let chunk: StreamChunk = serde_json::from_str(data).map_err(|err| {
        GitMateError::provider(format!("Failed to parse Gemini stream chunk: {err}"))
    })?;

    if let Some(error) = chunk.error {
        return Err(GitMateError::provider(error.describe(data)));
    }

    Ok(chunk
        .candidates
        .unwrap_or_default()
        .into_iter()
        .take(1)
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter(|part| !part.thought.unwrap_or(false))
        .filter_map(|part| part.text)
        .filter(|text| !text.is_empty())
        .collect())
}

// ============================================================================
// Wire types
// ============================================================================

fn to_content(turn: &HistoryTurn) -> Option<Content> {
    let role = match turn.speaker {
        Speaker::User => "user",
        Speaker::Assistant => "model",
    };

    let mut parts = Vec::new();
    if !turn.content.body().is_empty() {
        parts.push(Part::Text {
            text: turn.content.body().to_string(),
        });
    }
    if let Some(image) = turn.content.image() {
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
    }

    if parts.is_empty() {
        return None;
    }
    Some(Content {
        role: role.to_string(),
        parts,
    })
}

fn build_request(
    config: &SessionConfig,
    temperature: f32,
    history: &[HistoryTurn],
    message: &TurnContent,
) -> StreamRequest {
    let mut contents: Vec<Content> = history.iter().filter_map(to_content).collect();
    contents.extend(to_content(&HistoryTurn::new(Speaker::User, message.clone())));

    StreamRequest {
        contents,
        system_instruction: Some(SystemInstruction {
            parts: vec![Part::Text {
                text: config.instruction.clone(),
            }],
        }),
        generation_config: GenerationConfig {
            temperature,
            thinking_config: config.reasoning_budget.map(|budget| ThinkingConfig {
                thinking_budget: budget,
            }),
        },
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct StreamChunk {
    candidates: Option<Vec<Candidate>>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(self, raw: &str) -> String {
        let status_text = self.status.unwrap_or_default();
        let msg = self.message.unwrap_or_else(|| raw.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

fn map_http_error(status: StatusCode, body: String) -> GitMateError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| body.clone());

    tracing::warn!(status = status.as_u16(), "Gemini API returned an error");
    GitMateError::provider(format!("HTTP {}: {message}", status.as_u16()))
}
