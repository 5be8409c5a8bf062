use tokio_util::sync::CancellationToken;

use crate::{ChatRequest, ChatResponse, ChatStream, Error};

/// A vendor adapter: translates normalized requests into one vendor's wire
/// format and the vendor's answers back.
///
/// Requests reaching an adapter carry the bare vendor model id.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// Provider name, used for logging.
    fn name(&self) -> &str;

    /// Run a full round trip and return the vendor's complete response.
    async fn chat_completion(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, Error>;

    /// Open a streaming session. Resolves once the session is established;
    /// the returned reader yields the events.
    async fn stream_chat_completion(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, Error>;
}
