//! One chat-completion interface over several LLM vendors.
//!
//! Models are addressed as `"<provider>:<model>"`. The [`Client`] resolves the
//! provider, authenticates, and translates requests and (streamed) responses
//! to and from the vendor's wire format. OpenAI, Gemini, Groq and SambaNova are
//! served through the OpenAI Chat Completions format; Anthropic through its
//! Messages API.
//!
//! ```no_run
//! # async fn run() -> Result<(), llm_suite::Error> {
//! use llm_suite::{ApiKeys, ChatRequest, Client, Message};
//!
//! let client = Client::new(ApiKeys::default());
//! let request = ChatRequest::new("groq:llama-3.1-8b-instant", vec![Message::user("Hi")]);
//!
//! let mut stream = client.stream_chat_completion(&request).await?;
//! while let Some(chunk) = stream.next().await? {
//!     print!("{}", chunk.content());
//! }
//! stream.close();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod accumulator;
pub mod registry;
pub mod factory;
pub mod client;

// Re-export core types for easy usage
pub use error::{Error, TransportError};
pub use types::*;
pub use provider::ChatProvider;
pub use providers::*;
pub use response::*;
pub use sse_stream::SseEvent;
pub use accumulator::*;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use factory::ProviderType;
pub use client::{split_model, Client};
