use futures_util::{future, StreamExt};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChunkDelta,
    FunctionCallDelta, OpenAIMessage, StreamPayload,
};
use crate::provider::ChatProvider;
use crate::providers::{cancellable, check_status, http_client};
use crate::sse_stream::SseStreamExt;
use crate::types::{
    ChatRequest, ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, StreamChoice,
    StreamDelta, StreamResponse, ToolCall,
};
use crate::{ChatStream, Error};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

/// Chat Completions provider for OpenAI and every host speaking the same
/// wire format (Gemini, Groq and SambaNova through their compatible endpoints).
pub struct OpenAIProvider {
    name: String,
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a provider talking to api.openai.com.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, OPENAI_BASE_URL.to_string())
    }

    /// Create a provider for an OpenAI-compatible endpoint.
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        Ok(Self {
            name: "openai".to_string(),
            client: http_client()?,
            api_key,
            base_url,
        })
    }

    /// Name reported in logs and transport errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn convert_request(&self, request: &ChatRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|msg| OpenAIMessage {
                    role: to_openai_role(&msg.role),
                    content: msg.content.clone(),
                })
                .collect(),
            max_tokens: request.effective_max_tokens(),
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<reqwest::Response, Error> {
        tracing::debug!(
            provider = %self.name,
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream.unwrap_or(false),
            "sending chat completion"
        );
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        check_status(&self.name, response).await
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, Error> {
        let body = self.convert_request(request, false);
        let response = self.send(&body).await?;
        let bytes = response.bytes().await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        if parsed.choices.is_empty() {
            tracing::warn!(provider = %self.name, "response carried no choices");
            return Err(Error::empty_response(&self.name));
        }
        Ok(convert_response(parsed))
    }

    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatStream, Error> {
        let body = self.convert_request(request, true);
        let response = self.send(&body).await?;
        let provider = self.name.clone();

        let events = response
            .bytes_stream()
            .sse_events()
            .take_while(|frame| future::ready(!matches!(frame, Ok(f) if f.is_done())))
            .filter_map(move |frame| {
                future::ready(match frame {
                    Ok(frame) => parse_stream_frame(&provider, &frame.data),
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(ChatStream::new(events, cancel))
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
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

/// Decode one `data:` payload. Non-JSON frames are skipped.
fn parse_stream_frame(provider: &str, data: &str) -> Option<Result<StreamResponse, Error>> {
    let data = data.trim();
    if !data.starts_with('{') {
        tracing::trace!(provider = %provider, "skipping non-JSON frame");
        return None;
    }
    match serde_json::from_str::<StreamPayload>(data) {
        Ok(StreamPayload::Chunk(chunk)) => Some(Ok(convert_chunk(chunk))),
        Ok(StreamPayload::Error(err)) => Some(Err(Error::streaming(format!(
            "{provider}: {}",
            err.error.message
        )))),
        Err(e) => Some(Err(e.into())),
    }
}

fn convert_response(response: ChatCompletionResponse) -> ChatResponse {
    let choices = response
        .choices
        .into_iter()
        .map(|choice| Choice {
            index: choice.index,
            message: Message {
                role: from_openai_role(&choice.message.role),
                content: choice.message.content.unwrap_or_default(),
            },
            finish_reason: from_openai_finish_reason(choice.finish_reason.as_deref()),
        })
        .collect();
    ChatResponse { choices }
}

fn convert_chunk(chunk: ChatCompletionChunk) -> StreamResponse {
    let choices = chunk
        .choices
        .into_iter()
        .map(|choice| StreamChoice {
            index: choice.index,
            delta: convert_delta(choice.delta),
            finish_reason: from_openai_finish_reason(choice.finish_reason.as_deref()),
        })
        .collect();
    StreamResponse {
        id: chunk.id,
        model: chunk.model,
        choices,
    }
}

fn convert_delta(delta: ChunkDelta) -> StreamDelta {
    StreamDelta {
        content: delta.content.unwrap_or_default(),
        role: delta
            .role
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(from_openai_role),
        function_call: delta.function_call.map(convert_function),
        tool_calls: delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id.unwrap_or_default(),
                kind: call.kind.unwrap_or_default(),
                function: call.function.map(convert_function).unwrap_or_default(),
            })
            .collect(),
        refusal: delta.refusal.filter(|r| !r.is_empty()),
    }
}

fn convert_function(function: FunctionCallDelta) -> FunctionCall {
    FunctionCall {
        name: function.name.unwrap_or_default(),
        arguments: function.arguments.unwrap_or_default(),
    }
}

pub(crate) fn to_openai_role(role: &Role) -> String {
    if let Role::Other(raw) = role {
        tracing::warn!(role = %raw, "no OpenAI equivalent for role, passing through");
    }
    role.as_str().to_string()
}

pub(crate) fn from_openai_role(role: &str) -> Role {
    match role {
        "user" => Role::User,
        "system" => Role::System,
        "assistant" => Role::Assistant,
        other => {
            tracing::warn!(role = %other, "unexpected OpenAI role, passing through");
            Role::Other(other.to_string())
        }
    }
}

pub(crate) fn from_openai_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("") => FinishReason::None,
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::MaxTokens,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(other) => {
            tracing::warn!(reason = %other, "unmapped OpenAI finish reason");
            FinishReason::Unknown(other.to_string())
        }
    }
}
