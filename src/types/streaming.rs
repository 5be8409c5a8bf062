//! Types for streaming responses.

use serde::{Deserialize, Serialize};

use crate::types::{FinishReason, FunctionCall, Role, ToolCall};

/// An incremental contribution to one choice's eventual message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

impl StreamDelta {
    /// A plain text fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when the delta carries nothing a caller could observe.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.role.is_none()
            && self.function_call.is_none()
            && self.tool_calls.is_empty()
            && self.refusal.is_none()
    }
}

/// One choice inside a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: FinishReason,
}

impl StreamChoice {
    /// A content-bearing choice for index 0.
    pub fn delta(delta: StreamDelta) -> Self {
        Self {
            index: 0,
            delta,
            finish_reason: FinishReason::None,
        }
    }

    /// A terminal choice for index 0.
    pub fn finished(finish_reason: FinishReason) -> Self {
        Self {
            index: 0,
            delta: StreamDelta::default(),
            finish_reason,
        }
    }
}

/// One normalized streaming event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

impl StreamResponse {
    pub fn new(choices: Vec<StreamChoice>) -> Self {
        Self {
            choices,
            ..Self::default()
        }
    }

    /// Text carried by the first choice.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.delta.content.as_str())
            .unwrap_or_default()
    }

    /// Finish reason of the first choice.
    pub fn finish_reason(&self) -> FinishReason {
        self.choices
            .first()
            .map(|c| c.finish_reason.clone())
            .unwrap_or_default()
    }
}
