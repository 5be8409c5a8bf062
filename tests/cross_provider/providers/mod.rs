pub mod anthropic;
pub mod groq;
pub mod openai;

use llm_suite::{ChatRequest, Client, Message};
use wiremock::MockServer;

/// Provider configuration for cross-provider testing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: &'static str,
    /// Prefix in the model string.
    pub provider: &'static str,
    pub model: &'static str,
    /// Directory under `tests/fixtures` holding this wire format's streams.
    pub fixture_dir: &'static str,
}

impl ProviderConfig {
    pub fn fixture(&self, name: &str) -> String {
        load_fixture(&format!("tests/fixtures/{}/{name}", self.fixture_dir))
    }

    pub fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::new(
            format!("{}:{}", self.provider, self.model),
            vec![
                Message::system("You have access to weather data."),
                Message::user(prompt),
            ],
        )
        .max_tokens(150)
    }
}

/// Trait for provider-specific test setup
#[async_trait::async_trait]
pub trait ProviderTestSetup {
    /// Get the provider configuration
    fn get_config() -> ProviderConfig;

    /// A client routing this provider to the mock server.
    fn create_client(base_url: &str) -> Client;

    /// Answer the streamed request built by [`ProviderConfig::request`] with `fixture`.
    async fn mount_stream_mock(mock_server: &MockServer, prompt: &str, fixture: &str);
}

/// Load test fixture from file
pub fn load_fixture(filename: &str) -> String {
    std::fs::read_to_string(filename)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {filename}"))
}

pub fn sse_response(body: String) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/event-stream")
        .insert_header("cache-control", "no-cache")
}
