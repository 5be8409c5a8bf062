use futures_util::{future, StreamExt};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::types::{
    AnthropicContentBlock, AnthropicContentDelta, AnthropicMessage, AnthropicRequest,
    AnthropicResponse, AnthropicStreamEvent,
};
use crate::provider::ChatProvider;
use crate::providers::{cancellable, check_status, http_client};
use crate::sse_stream::SseStreamExt;
use crate::types::{
    ChatRequest, ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, StreamChoice,
    StreamDelta, StreamResponse, ToolCall,
};
use crate::{ChatStream, Error};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Sent when the request leaves `max_tokens` unset; the Messages API requires one.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Provider for Anthropic's Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

/// What a single stream frame means for the reader.
enum Step {
    Emit(StreamResponse),
    Skip,
    Stop,
    Fail(Error),
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, ANTHROPIC_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        Ok(Self {
            client: http_client()?,
            api_key,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn convert_request(&self, request: &ChatRequest, stream: bool) -> AnthropicRequest {
        let mut system_parts = Vec::new();
        let mut messages = Vec::new();

        for msg in &request.messages {
            match &msg.role {
                Role::System => system_parts.push(msg.content.as_str()),
                Role::User | Role::Assistant => messages.push(AnthropicMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content.clone(),
                }),
                Role::Other(raw) => {
                    tracing::warn!(role = %raw, "no Anthropic equivalent for role, passing through");
                    messages.push(AnthropicMessage {
                        role: raw.clone(),
                        content: msg.content.clone(),
                    });
                }
            }
        }

        AnthropicRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.effective_max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<reqwest::Response, Error> {
        tracing::debug!(
            provider = "anthropic",
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream.unwrap_or(false),
            "sending messages request"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;
        check_status("anthropic", response).await
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, Error> {
        let body = self.convert_request(request, false);
        let response = self.send(&body).await?;
        let bytes = response.bytes().await?;
        let parsed: AnthropicResponse = serde_json::from_slice(&bytes)?;
        Ok(convert_response(parsed))
    }

    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatStream, Error> {
        let body = self.convert_request(request, true);
        let response = self.send(&body).await?;

        let events = response
            .bytes_stream()
            .sse_events()
            .map(|frame| match frame {
                Ok(frame) => parse_stream_frame(&frame.data),
                Err(e) => Step::Fail(e),
            })
            .take_while(|step| future::ready(!matches!(step, Step::Stop)))
            .filter_map(|step| {
                future::ready(match step {
                    Step::Emit(chunk) => Some(Ok(chunk)),
                    Step::Fail(e) => Some(Err(e)),
                    Step::Skip | Step::Stop => None,
                })
            });

        Ok(ChatStream::new(events, cancel))
    }
}

#[async_trait::async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat_completion(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, Error> {
        cancellable(cancel, self.complete(request)).await
    }

    async fn stream_chat_completion(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, Error> {
        cancellable(cancel, self.open_stream(request, cancel.clone())).await
    }
}

fn parse_stream_frame(data: &str) -> Step {
    let data = data.trim();
    if !data.starts_with('{') {
        return Step::Skip;
    }
    match serde_json::from_str::<AnthropicStreamEvent>(data) {
        Ok(event) => convert_stream_event(event),
        Err(e) => Step::Fail(e.into()),
    }
}

/// Anthropic has a single choice, so every chunk lands on index 0.
fn convert_stream_event(event: AnthropicStreamEvent) -> Step {
    let emit = |delta: StreamDelta| Step::Emit(StreamResponse::new(vec![StreamChoice::delta(delta)]));

    match event {
        AnthropicStreamEvent::ContentBlockStart { content_block, .. } => match content_block {
            AnthropicContentBlock::Text { text } if !text.is_empty() => emit(StreamDelta::text(text)),
            AnthropicContentBlock::ToolUse { id, name, input } => {
                // Arguments usually follow as input_json_delta fragments.
                let arguments = match &input {
                    serde_json::Value::Object(map) if !map.is_empty() => input.to_string(),
                    _ => String::new(),
                };
                emit(StreamDelta {
                    tool_calls: vec![ToolCall {
                        id,
                        kind: "function".to_string(),
                        function: FunctionCall { name, arguments },
                    }],
                    ..StreamDelta::default()
                })
            }
            _ => Step::Skip,
        },
        AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
            AnthropicContentDelta::TextDelta { text } if !text.is_empty() => {
                emit(StreamDelta::text(text))
            }
            AnthropicContentDelta::InputJsonDelta { partial_json } if !partial_json.is_empty() => {
                emit(StreamDelta {
                    tool_calls: vec![ToolCall {
                        function: FunctionCall {
                            arguments: partial_json,
                            ..FunctionCall::default()
                        },
                        ..ToolCall::default()
                    }],
                    ..StreamDelta::default()
                })
            }
            _ => Step::Skip,
        },
        AnthropicStreamEvent::MessageDelta { delta } => {
            let reason = from_anthropic_stop_reason(delta.stop_reason.as_deref());
            if reason.is_none() {
                Step::Skip
            } else {
                Step::Emit(StreamResponse::new(vec![StreamChoice::finished(reason)]))
            }
        }
        AnthropicStreamEvent::MessageStop => Step::Stop,
        AnthropicStreamEvent::Error { error } => {
            tracing::warn!(kind = %error.kind, "anthropic stream error");
            Step::Fail(Error::streaming(format!(
                "anthropic: {}: {}",
                error.kind, error.message
            )))
        }
        AnthropicStreamEvent::MessageStart { .. }
        | AnthropicStreamEvent::ContentBlockStop { .. }
        | AnthropicStreamEvent::Ping => Step::Skip,
        AnthropicStreamEvent::Unknown => {
            tracing::debug!("skipping unrecognized anthropic event");
            Step::Skip
        }
    }
}

fn convert_response(response: AnthropicResponse) -> ChatResponse {
    let content: String = response
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let role = match response.role.as_str() {
        "assistant" => Role::Assistant,
        "user" => Role::User,
        other => {
            tracing::warn!(role = %other, "unexpected Anthropic role, passing through");
            Role::Other(other.to_string())
        }
    };

    ChatResponse {
        choices: vec![Choice {
            index: 0,
            message: Message { role, content },
            finish_reason: from_anthropic_stop_reason(response.stop_reason.as_deref()),
        }],
    }
}

pub(crate) fn from_anthropic_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("") => FinishReason::None,
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::MaxTokens,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(other) => {
            tracing::warn!(reason = %other, "unmapped Anthropic stop reason");
            FinishReason::Unknown(other.to_string())
        }
    }
}
