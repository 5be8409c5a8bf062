use llm_suite::accumulator::ResponseAccumulator;
use llm_suite::{Error, FinishReason, Role};
use wiremock::MockServer;

use super::providers::{
    anthropic::AnthropicTestSetup, groq::GroqTestSetup, openai::OpenAITestSetup,
    ProviderTestSetup,
};

/// Stream a plain answer and check the normalized chunk sequence.
async fn run_text_stream_test<T: ProviderTestSetup>() {
    let config = T::get_config();
    let mock_server = MockServer::start().await;
    let prompt = "Say hello";
    T::mount_stream_mock(&mock_server, prompt, "hello_stream.sse").await;

    let client = T::create_client(&mock_server.uri());
    let mut stream = client
        .stream_chat_completion(&config.request(prompt))
        .await
        .unwrap_or_else(|e| panic!("{}: failed to open stream: {e}", config.name));

    let mut accumulator = ResponseAccumulator::new();
    let mut terminal_seen = false;
    while let Some(chunk) = stream.next().await.expect("stream should parse") {
        assert!(
            !terminal_seen,
            "{}: chunk delivered after the terminal event",
            config.name
        );
        terminal_seen = chunk.finish_reason().is_terminal();
        accumulator.process(&chunk);
    }
    stream.close();

    assert!(terminal_seen, "{}: no terminal event", config.name);
    assert_eq!(accumulator.current_content(), "Hello", "{}", config.name);
    assert_eq!(accumulator.finish_reason(), FinishReason::Stop, "{}", config.name);

    let response = accumulator.finalize();
    assert_eq!(response.choices[0].message.role, Role::Assistant);
}

/// Tool-call descriptors arrive in fragments and are transported, not executed.
async fn run_tool_call_stream_test<T: ProviderTestSetup>() {
    let config = T::get_config();
    let mock_server = MockServer::start().await;
    let prompt = "What's the weather like in Paris?";
    T::mount_stream_mock(&mock_server, prompt, "tool_call_stream.sse").await;

    let client = T::create_client(&mock_server.uri());
    let stream = client
        .stream_chat_completion(&config.request(prompt))
        .await
        .unwrap_or_else(|e| panic!("{}: failed to open stream: {e}", config.name));

    let mut accumulator = ResponseAccumulator::new();
    let mut stream = stream;
    while let Some(chunk) = stream.next().await.expect("stream should parse") {
        accumulator.process(&chunk);
    }

    let calls = accumulator.tool_calls(0);
    assert_eq!(calls.len(), 1, "{}: expected one tool call", config.name);
    assert_eq!(calls[0].function.name, "get_weather");
    assert!(
        calls[0].function.arguments.contains("Paris"),
        "{}: arguments should contain Paris, got {}",
        config.name,
        calls[0].function.arguments
    );
    let arguments: serde_json::Value = serde_json::from_str(&calls[0].function.arguments)
        .expect("reassembled arguments should be valid JSON");
    assert_eq!(arguments["location"], "Paris");

    // Vendor-specific tool stop reasons are preserved rather than dropped.
    assert!(
        matches!(accumulator.finish_reason(), FinishReason::Unknown(_)),
        "{}: got {:?}",
        config.name,
        accumulator.finish_reason()
    );
}

/// An in-band vendor error fails the read and releases the session.
async fn run_error_stream_test<T: ProviderTestSetup>() {
    let config = T::get_config();
    let mock_server = MockServer::start().await;
    let prompt = "Say hello";
    T::mount_stream_mock(&mock_server, prompt, "error_in_stream.sse").await;

    let client = T::create_client(&mock_server.uri());
    let mut stream = client
        .stream_chat_completion(&config.request(prompt))
        .await
        .unwrap_or_else(|e| panic!("{}: failed to open stream: {e}", config.name));

    let err = loop {
        match stream.next().await {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("{}: stream ended without the vendor error", config.name),
            Err(e) => break e,
        }
    };
    assert!(err.is_transport(), "{}: {err:?}", config.name);
    assert!(stream.is_closed());
    assert!(matches!(stream.next().await, Err(Error::InvalidState)));
}

#[tokio::test]
async fn test_openai_text_stream() {
    run_text_stream_test::<OpenAITestSetup>().await;
}

#[tokio::test]
async fn test_groq_text_stream() {
    run_text_stream_test::<GroqTestSetup>().await;
}

#[tokio::test]
async fn test_anthropic_text_stream() {
    run_text_stream_test::<AnthropicTestSetup>().await;
}

#[tokio::test]
async fn test_openai_tool_call_stream() {
    run_tool_call_stream_test::<OpenAITestSetup>().await;
}

#[tokio::test]
async fn test_anthropic_tool_call_stream() {
    run_tool_call_stream_test::<AnthropicTestSetup>().await;
}

#[tokio::test]
async fn test_groq_error_stream() {
    run_error_stream_test::<GroqTestSetup>().await;
}

#[tokio::test]
async fn test_anthropic_error_stream() {
    run_error_stream_test::<AnthropicTestSetup>().await;
}
