use super::{sse_response, ProviderConfig, ProviderTestSetup};
use llm_suite::{ApiKeys, Client};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer};

pub struct OpenAITestSetup;

#[async_trait::async_trait]
impl ProviderTestSetup for OpenAITestSetup {
    fn get_config() -> ProviderConfig {
        ProviderConfig {
            name: "OpenAI",
            provider: "openai",
            model: "gpt-4o-mini",
            fixture_dir: "openai",
        }
    }

    fn create_client(base_url: &str) -> Client {
        Client::new(ApiKeys {
            openai: Some("test-api-key".into()),
            ..ApiKeys::default()
        })
        .with_base_url("openai", format!("{base_url}/v1"))
    }

    async fn mount_stream_mock(mock_server: &MockServer, prompt: &str, fixture: &str) {
        let config = Self::get_config();
        let request_payload = json!({
            "model": config.model,
            "messages": [
                {"role": "system", "content": "You have access to weather data."},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": 150,
            "stream": true
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_json(request_payload))
            .respond_with(sse_response(config.fixture(fixture)))
            .expect(1)
            .mount(mock_server)
            .await;
    }
}
