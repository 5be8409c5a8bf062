use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message participant.
///
/// `Other` carries a role string a vendor returned that has no normalized
/// counterpart; it is passed through rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message with role and text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new message with role and text content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A function invocation requested by the model. Arguments stay as the
/// vendor's JSON text; nothing here executes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A tool call descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    /// Tool kind as reported by the vendor, normally "function".
    pub kind: String,
    pub function: FunctionCall,
}

/// Reason why generation finished.
///
/// `None` means generation is still running. Vendor codes without a
/// normalized counterpart are kept in `Unknown` with the raw string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    None,
    Stop,
    MaxTokens,
    ContentFilter,
    Unknown(String),
}

impl FinishReason {
    pub fn is_none(&self) -> bool {
        matches!(self, FinishReason::None)
    }

    /// True once the choice has stopped generating, for any reason.
    pub fn is_terminal(&self) -> bool {
        !self.is_none()
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::None => Ok(()),
            FinishReason::Stop => f.write_str("stop"),
            FinishReason::MaxTokens => f.write_str("max_tokens"),
            FinishReason::ContentFilter => f.write_str("content_filter"),
            FinishReason::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}
