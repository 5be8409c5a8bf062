//! Delta accumulation logic for streaming responses.

use std::collections::BTreeMap;

use crate::types::{
    ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, StreamDelta, StreamResponse,
    ToolCall,
};

/// Accumulates streamed chunks into a complete response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    choices: BTreeMap<u32, ChoiceState>,
}

/// Everything received so far for one choice.
#[derive(Debug, Default)]
struct ChoiceState {
    role: Option<Role>,
    content: String,
    function_call: Option<FunctionCall>,
    tool_calls: Vec<ToolCall>,
    refusal: Option<String>,
    finish_reason: FinishReason,
}

impl ChoiceState {
    fn apply(&mut self, delta: &StreamDelta) {
        if self.role.is_none() {
            self.role = delta.role.clone();
        }
        self.content.push_str(&delta.content);

        if let Some(fragment) = &delta.function_call {
            let call = self.function_call.get_or_insert_with(FunctionCall::default);
            merge_function(call, fragment);
        }

        for fragment in &delta.tool_calls {
            // A fragment without an id continues the call opened last.
            match self.tool_calls.last_mut() {
                Some(last) if fragment.id.is_empty() || fragment.id == last.id => {
                    if last.kind.is_empty() {
                        last.kind.clone_from(&fragment.kind);
                    }
                    merge_function(&mut last.function, &fragment.function);
                }
                _ => self.tool_calls.push(fragment.clone()),
            }
        }

        if let Some(refusal) = &delta.refusal {
            self.refusal.get_or_insert_with(String::new).push_str(refusal);
        }
    }
}

fn merge_function(call: &mut FunctionCall, fragment: &FunctionCall) {
    if call.name.is_empty() {
        call.name.clone_from(&fragment.name);
    }
    call.arguments.push_str(&fragment.arguments);
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk into the accumulated state.
    pub fn process(&mut self, chunk: &StreamResponse) {
        for choice in &chunk.choices {
            let state = self.choices.entry(choice.index).or_default();
            state.apply(&choice.delta);
            if choice.finish_reason.is_terminal() {
                state.finish_reason = choice.finish_reason.clone();
            }
        }
    }

    /// Text accumulated so far for the primary choice.
    pub fn current_content(&self) -> &str {
        self.choices
            .get(&0)
            .map(|c| c.content.as_str())
            .unwrap_or_default()
    }

    /// Finish reason of the primary choice, `None` while still streaming.
    pub fn finish_reason(&self) -> FinishReason {
        self.choices
            .get(&0)
            .map(|c| c.finish_reason.clone())
            .unwrap_or_default()
    }

    /// Tool calls assembled so far for a choice.
    pub fn tool_calls(&self, index: u32) -> &[ToolCall] {
        self.choices
            .get(&index)
            .map(|c| c.tool_calls.as_slice())
            .unwrap_or_default()
    }

    /// Legacy function call assembled so far for a choice.
    pub fn function_call(&self, index: u32) -> Option<&FunctionCall> {
        self.choices.get(&index)?.function_call.as_ref()
    }

    /// Refusal text accumulated for a choice, if the model refused.
    pub fn refusal(&self, index: u32) -> Option<&str> {
        self.choices.get(&index)?.refusal.as_deref()
    }

    /// Finalize into a complete response, one choice per index seen.
    pub fn finalize(self) -> ChatResponse {
        let choices = self
            .choices
            .into_iter()
            .map(|(index, state)| Choice {
                index,
                message: Message {
                    role: state.role.unwrap_or(Role::Assistant),
                    content: state.content,
                },
                finish_reason: state.finish_reason,
            })
            .collect();
        ChatResponse { choices }
    }
}
