//! Provider implementations for different LLM services.

pub mod anthropic;
pub mod openai;

// Re-export commonly used provider types
pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::Error;

/// HTTP client shared by the adapters' constructors.
///
/// Only the connect phase is bounded; a total timeout would cut off long streams.
pub(crate) fn http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()?)
}

/// Race `fut` against the caller's cancellation token.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Turn a non-success response into a transport error carrying the vendor's body.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider = %provider, status = %status, "vendor returned error");
    Err(Error::api(provider, status.as_u16(), body))
}
