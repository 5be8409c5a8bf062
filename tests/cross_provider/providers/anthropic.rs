use super::{sse_response, ProviderConfig, ProviderTestSetup};
use llm_suite::{ApiKeys, Client};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer};

pub struct AnthropicTestSetup;

#[async_trait::async_trait]
impl ProviderTestSetup for AnthropicTestSetup {
    fn get_config() -> ProviderConfig {
        ProviderConfig {
            name: "Anthropic",
            provider: "anthropic",
            model: "claude-3-5-haiku-latest",
            fixture_dir: "anthropic",
        }
    }

    fn create_client(base_url: &str) -> Client {
        Client::new(ApiKeys {
            anthropic: Some("test-api-key".into()),
            ..ApiKeys::default()
        })
        .with_base_url("anthropic", base_url)
    }

    async fn mount_stream_mock(mock_server: &MockServer, prompt: &str, fixture: &str) {
        let config = Self::get_config();
        // The system message travels outside the message list.
        let request_payload = json!({
            "model": config.model,
            "system": "You have access to weather data.",
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": 150,
            "stream": true
        });

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_json(request_payload))
            .respond_with(sse_response(config.fixture(fixture)))
            .expect(1)
            .mount(mock_server)
            .await;
    }
}
